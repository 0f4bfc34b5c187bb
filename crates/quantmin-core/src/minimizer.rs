//! The minimizer contracts exposed to calibration code.
//!
//! Calibration and fitting pipelines are written against these two traits,
//! not against a specific algorithm: `Minimizer` for objectives with no
//! usable gradient, `MinimizerWithGradient` when an analytic (or externally
//! estimated) gradient is available. Every top-level algorithm in
//! `quantmin-optim` implements both, so the algorithm choice is a one-line
//! swap at the call site.

use crate::error::Result;
use crate::function::{GradientFunction, ObjectiveFunction};
use crate::types::DVector;

/// Minimize an objective function without gradient information.
pub trait Minimizer {
    /// Finds a local minimum of `function` starting from `start`.
    ///
    /// Returns the minimizing point, or a convergence error if the iteration
    /// budget is exhausted before the stopping test is satisfied. A
    /// non-converged point is never returned silently.
    fn minimize<F>(&self, function: &F, start: &DVector) -> Result<DVector>
    where
        F: ObjectiveFunction;
}

/// Minimize an objective function with a supplied gradient.
pub trait MinimizerWithGradient {
    /// Finds a local minimum of `function` starting from `start`, using
    /// `gradient` for first-order information.
    ///
    /// Fails with a convergence or step-failure error; see
    /// [`MinimizerError`](crate::error::MinimizerError) for the taxonomy.
    fn minimize_with_gradient<F, G>(
        &self,
        function: &F,
        gradient: &G,
        start: &DVector,
    ) -> Result<DVector>
    where
        F: ObjectiveFunction,
        G: GradientFunction;
}
