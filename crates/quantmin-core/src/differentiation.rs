//! Finite-difference gradient estimation.
//!
//! Supplies first-order information for objectives that come without an
//! analytic gradient, using central differences with a per-component step
//! scaled to the magnitude of the coordinate.

use crate::function::ObjectiveFunction;
use crate::types::DVector;

/// Central-difference gradient estimator.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FiniteDifferenceGradient {
    /// Base relative step; the per-component step is `step * max(1, |x_i|)`.
    step: f64,
}

impl FiniteDifferenceGradient {
    /// Creates an estimator with the default step, the square root of
    /// machine epsilon.
    pub fn new() -> Self {
        Self {
            step: f64::EPSILON.sqrt(),
        }
    }

    /// Sets the base relative step.
    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    /// Estimates the gradient of `f` at `x`.
    pub fn gradient<F>(&self, f: &F, x: &DVector) -> DVector
    where
        F: ObjectiveFunction,
    {
        let n = x.len();
        let mut grad = DVector::zeros(n);
        let mut probe = x.clone();

        for i in 0..n {
            let h = self.step * f64::max(1.0, x[i].abs());
            let xi = x[i];

            probe[i] = xi + h;
            let f_plus = f.value(&probe);
            probe[i] = xi - h;
            let f_minus = f.value(&probe);
            probe[i] = xi;

            grad[i] = (f_plus - f_minus) / (2.0 * h);
        }

        grad
    }

    /// Turns an objective into a gradient function by closing over this
    /// estimator.
    pub fn differentiate<'a, F>(&self, f: &'a F) -> impl Fn(&DVector) -> DVector + 'a
    where
        F: ObjectiveFunction,
    {
        let estimator = *self;
        move |x: &DVector| estimator.gradient(f, x)
    }
}

impl Default for FiniteDifferenceGradient {
    fn default() -> Self {
        Self::new()
    }
}
