//! Core traits and types for unconstrained multivariate minimization.
//!
//! This crate provides the foundation shared by the minimization algorithms
//! in `quantmin-optim`: the objective/gradient capability traits, the
//! minimizer contracts, the error taxonomy, and the one-dimensional
//! collaborators (minimum bracketing, scalar minimization, finite-difference
//! gradient estimation) that vector line searches are built from.
//!
//! # Modules
//!
//! - [`function`]: Objective, gradient and 1-D function capabilities
//! - [`minimizer`]: The two minimizer contracts exposed to calibration code
//! - [`error`]: Error taxonomy for minimization failures
//! - [`bracket`]: Minimum bracketing for line searches
//! - [`scalar`]: One-dimensional scalar minimization
//! - [`differentiation`]: Finite-difference gradient estimation
//! - [`types`]: Type aliases and numerical constants

pub mod bracket;
pub mod differentiation;
pub mod error;
pub mod function;
pub mod minimizer;
pub mod scalar;
pub mod types;

// Re-export commonly used items at the crate root
pub use error::{MinimizerError, Result};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use quantmin_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::bracket::ParabolicBracketer;
    pub use crate::differentiation::FiniteDifferenceGradient;
    pub use crate::error::{MinimizerError, Result};
    pub use crate::function::{
        Function1D, GradientFunction, ObjectiveFunction, QuadraticObjective,
    };
    pub use crate::minimizer::{Minimizer, MinimizerWithGradient};
    pub use crate::scalar::{BrentMinimizer, ScalarMinimizer};
    pub use crate::types::{DMatrix, DVector, SMALL};
}
