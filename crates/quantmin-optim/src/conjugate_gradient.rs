//! Nonlinear conjugate gradient minimizer.
//!
//! Polak-Ribiere conjugate gradient with automatic restarts. Each iteration
//! line-minimizes along the current search direction, then combines the new
//! gradient with the previous direction. The direction is reset to steepest
//! descent whenever the Polak-Ribiere coefficient turns negative, whenever
//! `n` conjugate steps have accumulated since the last restart, or whenever
//! the combined direction fails to point downhill.
//!
//! For objectives without an analytic gradient the plain entry point falls
//! back to a central finite-difference estimate.
//!
//! # References
//!
//! - Polak & Ribiere, "Note sur la convergence de methodes de directions
//!   conjuguees" (1969)
//! - Shewchuk, "An introduction to the conjugate gradient method without
//!   the agonizing pain" (1994)

use crate::line_search::VectorLineSearch;
use quantmin_core::differentiation::FiniteDifferenceGradient;
use quantmin_core::error::{MinimizerError, Result};
use quantmin_core::function::{GradientFunction, ObjectiveFunction};
use quantmin_core::minimizer::{Minimizer, MinimizerWithGradient};
use quantmin_core::types::{DVector, DEFAULT_TOLERANCE, MIN_ABSOLUTE_TOLERANCE};

/// Configuration for the conjugate gradient minimizer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConjugateGradientConfig {
    /// Relative convergence tolerance, in `(0, 1)`.
    pub relative_tolerance: f64,
    /// Absolute convergence tolerance, must exceed `1e-25`.
    pub absolute_tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for ConjugateGradientConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: DEFAULT_TOLERANCE,
            absolute_tolerance: DEFAULT_TOLERANCE,
            max_iterations: 100,
        }
    }
}

impl ConjugateGradientConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relative convergence tolerance.
    pub fn with_relative_tolerance(mut self, relative_tolerance: f64) -> Self {
        self.relative_tolerance = relative_tolerance;
        self
    }

    /// Sets the absolute convergence tolerance.
    pub fn with_absolute_tolerance(mut self, absolute_tolerance: f64) -> Self {
        self.absolute_tolerance = absolute_tolerance;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.relative_tolerance <= 0.0 || self.relative_tolerance >= 1.0 {
            return Err(MinimizerError::invalid_configuration(
                "must lie strictly between 0 and 1",
                "relative_tolerance",
                self.relative_tolerance,
            ));
        }
        if self.absolute_tolerance <= MIN_ABSOLUTE_TOLERANCE {
            return Err(MinimizerError::invalid_configuration(
                "must exceed 1e-25",
                "absolute_tolerance",
                self.absolute_tolerance,
            ));
        }
        if self.max_iterations < 1 {
            return Err(MinimizerError::invalid_configuration(
                "must be at least 1",
                "max_iterations",
                self.max_iterations,
            ));
        }
        Ok(())
    }
}

/// Polak-Ribiere conjugate gradient minimizer with restarts.
#[derive(Debug, Clone)]
pub struct ConjugateGradient {
    config: ConjugateGradientConfig,
    line_search: VectorLineSearch,
}

impl ConjugateGradient {
    /// Creates a minimizer with the given configuration.
    ///
    /// Fails with [`MinimizerError::InvalidConfiguration`] before any
    /// iteration if a parameter is out of range.
    pub fn new(config: ConjugateGradientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            line_search: VectorLineSearch::new(),
        })
    }

    /// Creates a minimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self {
            config: ConjugateGradientConfig::default(),
            line_search: VectorLineSearch::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConjugateGradientConfig {
        &self.config
    }
}

/// Polak-Ribiere coefficient from the successive gradient inner products.
fn polak_ribiere_beta(delta_new: f64, delta_mid: f64, delta_old: f64) -> f64 {
    (delta_new - delta_mid) / delta_old
}

/// Chooses the next search direction and restart counter.
///
/// Resets to steepest descent when `beta` is negative, when `n` conjugate
/// steps have accumulated since the last restart, or when the combined
/// direction would not be a descent direction.
fn next_direction(
    direction: &DVector,
    grad_new: &DVector,
    beta: f64,
    steps_since_restart: usize,
    n: usize,
) -> (DVector, usize) {
    if beta < 0.0 || steps_since_restart >= n {
        return (-grad_new, 0);
    }
    let candidate = direction * beta - grad_new;
    if candidate.dot(grad_new) > 0.0 {
        (-grad_new, 0)
    } else {
        (candidate, steps_since_restart)
    }
}

impl MinimizerWithGradient for ConjugateGradient {
    fn minimize_with_gradient<F, G>(
        &self,
        function: &F,
        gradient: &G,
        start: &DVector,
    ) -> Result<DVector>
    where
        F: ObjectiveFunction,
        G: GradientFunction,
    {
        let rel = self.config.relative_tolerance;
        let abs = self.config.absolute_tolerance;
        let n = start.len();

        let mut x = start.clone();
        let mut grad = gradient.gradient(&x);
        let delta0 = grad.dot(&grad);

        // Starting from an already-converged point re-enters cleanly
        if delta0.sqrt() < rel * delta0 + abs {
            return Ok(x);
        }

        let mut direction = -&grad;
        let mut delta_old = delta0;
        let mut steps_since_restart = 0;

        for _ in 0..self.config.max_iterations {
            let lambda = self.line_search.minimize(function, &direction, &x)?;
            let delta_x = &direction * lambda;
            x += &delta_x;

            let grad_new = gradient.gradient(&x);
            let delta_mid = grad.dot(&grad_new);
            let delta_new = grad_new.dot(&grad_new);

            // Converged only when both the gradient and the step are small,
            // the step in norm and in every component
            if delta_new.sqrt() < rel * delta0 + abs
                && delta_x.norm() < rel * x.norm() + abs
                && delta_x
                    .iter()
                    .zip(x.iter())
                    .all(|(dxi, xi)| dxi.abs() <= rel * xi.abs() + abs)
            {
                return Ok(x);
            }

            let beta = polak_ribiere_beta(delta_new, delta_mid, delta_old);
            steps_since_restart += 1;
            let (next, counter) =
                next_direction(&direction, &grad_new, beta, steps_since_restart, n);
            direction = next;
            steps_since_restart = counter;

            delta_old = delta_new;
            grad = grad_new;
        }

        let last_value = function.value(&x);
        Err(MinimizerError::convergence_failure(
            self.config.max_iterations,
            abs,
            x,
            Some(last_value),
        ))
    }
}

impl Minimizer for ConjugateGradient {
    /// Minimizes without an analytic gradient, estimating it by central
    /// finite differences.
    fn minimize<F>(&self, function: &F, start: &DVector) -> Result<DVector>
    where
        F: ObjectiveFunction,
    {
        let estimator = FiniteDifferenceGradient::new();
        let gradient = estimator.differentiate(function);
        self.minimize_with_gradient(function, &gradient, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use quantmin_core::function::QuadraticObjective;
    use std::cell::Cell;

    fn anisotropic_quadratic() -> QuadraticObjective {
        let a = nalgebra::DMatrix::from_row_slice(3, 3, &[4.0, 1.0, 0.0, 1.0, 3.0, 0.5, 0.0, 0.5, 2.0]);
        let b = DVector::from_vec(vec![1.0, -2.0, 0.5]);
        QuadraticObjective::new(a, b)
    }

    #[test]
    fn test_config_validation() {
        assert!(ConjugateGradientConfig::new().validate().is_ok());
        assert!(ConjugateGradientConfig::new()
            .with_relative_tolerance(0.0)
            .validate()
            .is_err());
        assert!(ConjugateGradientConfig::new()
            .with_absolute_tolerance(1e-26)
            .validate()
            .is_err());
        assert!(ConjugateGradientConfig::new()
            .with_max_iterations(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_minimizes_quadratic_with_gradient() {
        let q = anisotropic_quadratic();
        let minimizer = ConjugateGradient::with_default_config();
        let start = DVector::from_vec(vec![10.0, -5.0, 3.0]);
        let grad = |x: &DVector| QuadraticObjective::gradient(&q, x);

        let x = minimizer.minimize_with_gradient(&q, &grad, &start).unwrap();
        assert_relative_eq!(x, q.minimizer(), epsilon = 1e-5);
    }

    #[test]
    fn test_quadratic_terminates_in_order_n_steps() {
        // On a positive-definite quadratic the minimizer is reached within n
        // conjugate steps; the stopping test needs a further small confirming
        // step before it fires, so the budget below is loose by that much
        let q = anisotropic_quadratic();
        let n = 3;
        let evaluations = Cell::new(0_usize);
        let grad = |x: &DVector| {
            evaluations.set(evaluations.get() + 1);
            QuadraticObjective::gradient(&q, x)
        };

        let minimizer = ConjugateGradient::with_default_config();
        let start = DVector::from_vec(vec![1.0, 2.0, -1.0]);
        let x = minimizer.minimize_with_gradient(&q, &grad, &start).unwrap();

        assert_relative_eq!(x, q.minimizer(), epsilon = 1e-5);
        // One evaluation at the start plus one per iteration
        assert!(
            evaluations.get() <= 2 * n + 1,
            "took {} gradient evaluations",
            evaluations.get()
        );
    }

    #[test]
    fn test_minimizes_without_gradient() {
        let q = anisotropic_quadratic();
        let minimizer = ConjugateGradient::with_default_config();
        let start = DVector::from_vec(vec![10.0, -5.0, 3.0]);

        let x = minimizer.minimize(&q, &start).unwrap();
        assert_relative_eq!(x, q.minimizer(), epsilon = 1e-4);
    }

    #[test]
    fn test_negative_beta_restarts() {
        let direction = DVector::from_vec(vec![1.0, 0.0]);
        let grad_new = DVector::from_vec(vec![0.5, 0.5]);
        let (next, counter) = next_direction(&direction, &grad_new, -0.1, 1, 2);
        assert_relative_eq!(next, -&grad_new);
        assert_eq!(counter, 0);
    }

    #[test]
    fn test_restart_after_n_steps() {
        // With a positive beta the counter alone forces steepest descent
        let direction = DVector::from_vec(vec![1.0, 1.0]);
        let grad_new = DVector::from_vec(vec![-0.5, 0.25]);
        let (next, counter) = next_direction(&direction, &grad_new, 0.5, 2, 2);
        assert_relative_eq!(next, -&grad_new);
        assert_eq!(counter, 0);
    }

    #[test]
    fn test_non_descent_combination_falls_back() {
        // beta * d - g points uphill here, so the combination is rejected
        let direction = DVector::from_vec(vec![1.0, 0.0]);
        let grad_new = DVector::from_vec(vec![1.0, 0.1]);
        let (next, counter) = next_direction(&direction, &grad_new, 5.0, 1, 10);
        assert_relative_eq!(next, -&grad_new);
        assert_eq!(counter, 0);
    }

    #[test]
    fn test_conjugate_combination_kept() {
        let direction = DVector::from_vec(vec![0.0, 1.0]);
        let grad_new = DVector::from_vec(vec![1.0, -0.5]);
        let beta = 0.25;
        let (next, counter) = next_direction(&direction, &grad_new, beta, 1, 10);
        assert_relative_eq!(next, &direction * beta - &grad_new);
        assert_eq!(counter, 1);
    }

    #[test]
    fn test_random_diagonal_quadratics() {
        use rand::rngs::SmallRng;
        use rand::{Rng, SeedableRng};

        let mut rng = SmallRng::seed_from_u64(42);
        let n = 4;
        for _ in 0..5 {
            let diag = DVector::from_fn(n, |_, _| rng.gen_range(0.5..5.0));
            let a = nalgebra::DMatrix::from_diagonal(&diag);
            let b = DVector::from_fn(n, |_, _| rng.gen_range(-2.0..2.0));
            let q = QuadraticObjective::new(a, b);

            let grad = |x: &DVector| QuadraticObjective::gradient(&q, x);
            let x = ConjugateGradient::with_default_config()
                .minimize_with_gradient(&q, &grad, &DVector::zeros(n))
                .unwrap();
            assert_relative_eq!(x, q.minimizer(), epsilon = 1e-5);
        }
    }

    #[test]
    fn test_restart_from_converged_point() {
        let q = anisotropic_quadratic();
        let minimizer = ConjugateGradient::with_default_config();
        let grad = |x: &DVector| QuadraticObjective::gradient(&q, x);
        let xstar = minimizer
            .minimize_with_gradient(&q, &grad, &DVector::from_vec(vec![10.0, -5.0, 3.0]))
            .unwrap();

        let again = minimizer.minimize_with_gradient(&q, &grad, &xstar).unwrap();
        assert_relative_eq!(again, xstar, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_budget_failure_carries_diagnostics() {
        let q = anisotropic_quadratic();
        let minimizer =
            ConjugateGradient::new(ConjugateGradientConfig::new().with_max_iterations(1)).unwrap();
        let grad = |x: &DVector| QuadraticObjective::gradient(&q, x);
        let start = DVector::from_vec(vec![100.0, -50.0, 30.0]);

        match minimizer.minimize_with_gradient(&q, &grad, &start) {
            Err(MinimizerError::ConvergenceFailure {
                iterations,
                last_value,
                ..
            }) => {
                assert_eq!(iterations, 1);
                assert!(last_value.is_some());
            }
            other => panic!("expected ConvergenceFailure, got {other:?}"),
        }
    }
}
