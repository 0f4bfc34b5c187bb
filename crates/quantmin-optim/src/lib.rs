//! Unconstrained multivariate minimization algorithms.
//!
//! Three minimizers built on the contracts and one-dimensional collaborators
//! of `quantmin-core`:
//!
//! - [`ConjugateDirection`]: Powell's derivative-free direction-set method
//! - [`ConjugateGradient`]: Polak-Ribiere conjugate gradient with restarts
//! - [`QuasiNewton`]: BFGS/DFP quasi-Newton with backtracking line search
//!
//! Every minimizer is configured through a `*Config` struct with validated
//! builder setters and returns either a converged point or a diagnostic
//! [`MinimizerError`](quantmin_core::MinimizerError); none silently returns
//! a non-converged iterate.
//!
//! # Example
//!
//! ```
//! use quantmin_core::prelude::*;
//! use quantmin_optim::ConjugateGradient;
//!
//! let f = |x: &DVector| (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2);
//! let minimizer = ConjugateGradient::with_default_config();
//! let start = DVector::from_vec(vec![-3.0, 5.0]);
//! let x = minimizer.minimize(&f, &start).unwrap();
//! assert!((x[0] - 1.0).abs() < 1e-4 && (x[1] + 2.0).abs() < 1e-4);
//! ```

pub mod conjugate_direction;
pub mod conjugate_gradient;
pub mod hessian_update;
pub mod line_search;
pub mod quasi_newton;

pub use conjugate_direction::{ConjugateDirection, ConjugateDirectionConfig};
pub use conjugate_gradient::{ConjugateGradient, ConjugateGradientConfig};
pub use hessian_update::{BfgsUpdate, DfpUpdate, InverseHessianUpdate};
pub use line_search::VectorLineSearch;
pub use quasi_newton::{QuasiNewton, QuasiNewtonConfig, QuasiNewtonState};

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use quantmin_optim::prelude::*;
/// ```
pub mod prelude {
    pub use crate::conjugate_direction::{ConjugateDirection, ConjugateDirectionConfig};
    pub use crate::conjugate_gradient::{ConjugateGradient, ConjugateGradientConfig};
    pub use crate::hessian_update::{BfgsUpdate, DfpUpdate, InverseHessianUpdate};
    pub use crate::line_search::VectorLineSearch;
    pub use crate::quasi_newton::{QuasiNewton, QuasiNewtonConfig, QuasiNewtonState};
    pub use quantmin_core::prelude::*;
}
