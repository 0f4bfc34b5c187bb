//! Line search along a fixed direction in R^n.
//!
//! Reduces the n-dimensional minimization to a one-dimensional sub-problem:
//! given a base point `x` and a search direction `d`, find the step length
//! `lambda` approximately minimizing `f(x + lambda * d)`. Bracketing starts
//! from the interval `[0, 1]`, so a unit step is always probed first.
//!
//! The component is stateless and safe to reuse across calls; failures of
//! the bracketer or the scalar minimizer propagate as-is and are fatal to
//! the caller's iteration.

use quantmin_core::bracket::ParabolicBracketer;
use quantmin_core::error::Result;
use quantmin_core::function::ObjectiveFunction;
use quantmin_core::scalar::{BrentMinimizer, ScalarMinimizer};
use quantmin_core::types::DVector;

/// Minimizes an objective restricted to a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorLineSearch {
    bracketer: ParabolicBracketer,
    minimizer: BrentMinimizer,
}

impl VectorLineSearch {
    /// Creates a line search with the default bracketer and scalar minimizer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the step length `lambda` such that `point + lambda * direction`
    /// approximately minimizes `function` along the line.
    ///
    /// The caller applies the step; this component never moves the point.
    pub fn minimize<F>(&self, function: &F, direction: &DVector, point: &DVector) -> Result<f64>
    where
        F: ObjectiveFunction,
    {
        debug_assert_eq!(direction.len(), point.len());

        let line = |lambda: f64| function.value(&(point + direction * lambda));

        let (a, b, c) = self.bracketer.bracket(&line, 0.0, 1.0)?;

        // The scalar minimizer expects an increasing bracket
        let (lo, hi) = if c < a { (c, a) } else { (a, c) };
        self.minimizer.minimize(&line, b, lo, hi)
    }
}
