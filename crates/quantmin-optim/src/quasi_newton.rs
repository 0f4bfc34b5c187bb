//! Quasi-Newton minimization with backtracking line search.
//!
//! Maintains an approximation `H` of the inverse Hessian, refined after
//! every accepted step by a pluggable [`InverseHessianUpdate`] (BFGS by
//! default, DFP available). Steps follow the Newton-like direction
//! `p = -H * grad f`, with the step length chosen by a backtracking search:
//! a trial step is accepted when it achieves sufficient decrease relative
//! to the objective's directional slope along `p`, and rejected trials are
//! refined by quadratic, then cubic, interpolation of the observed values.
//!
//! Measuring the required decrease against the actual slope keeps the
//! acceptance test meaningful whatever the objective's value at the
//! minimum; the demand shrinks together with what a short step can achieve.
//!
//! When the backtracking search cannot find an acceptable step (or the
//! proposed direction is not a descent direction), the inverse Hessian
//! approximation is discarded for a fresh identity and the step is retried
//! once; a second consecutive failure is reported to the caller.

use crate::hessian_update::{BfgsUpdate, InverseHessianUpdate};
use quantmin_core::error::{MinimizerError, Result};
use quantmin_core::function::{GradientFunction, ObjectiveFunction};
use quantmin_core::minimizer::{Minimizer, MinimizerWithGradient};
use quantmin_core::types::{DMatrix, DVector, DEFAULT_TOLERANCE};

/// Sufficient-decrease slope fraction for the backtracking acceptance test.
const ALPHA: f64 = 1e-4;

/// Growth factor applied to the trial step after a full accepted step.
const STEP_GROWTH: f64 = 1.5;

/// Shrink factor used while hunting for a finite objective value.
const FINITE_SHRINK: f64 = 0.1;

/// Cubic interpolation attempts before the step search gives up.
const MAX_INTERPOLATION_ATTEMPTS: usize = 5;

/// Accepted steps between periodic inverse-Hessian resets.
const HESSIAN_RESET_PERIOD: usize = 200;

/// Iteration state shared between the step search and the Hessian updates.
///
/// `g0`, `g1`, `g2` hold objective values: at the current point, at the
/// latest trial step and at the trial before that. `lambda0` and `lambda1`
/// are the corresponding step lengths.
#[derive(Debug, Clone)]
pub struct QuasiNewtonState {
    /// Current iterate.
    pub x: DVector,
    /// Gradient of the objective at `x`.
    pub grad: DVector,
    /// Displacement of the last accepted step.
    pub delta_x: DVector,
    /// Gradient change over the last accepted step.
    pub delta_grad: DVector,
    /// Inverse Hessian approximation.
    pub h: DMatrix,
    /// Objective value at `x`.
    pub g0: f64,
    /// Objective value at the latest trial step.
    pub g1: f64,
    /// Objective value at the previous trial step.
    pub g2: f64,
    /// Latest trial step length.
    pub lambda0: f64,
    /// Previous trial step length.
    pub lambda1: f64,
}

impl QuasiNewtonState {
    /// Creates the state for a fresh minimization starting at `x`.
    pub fn new(x: DVector, grad: DVector, value: f64) -> Self {
        let n = x.len();
        Self {
            x,
            grad,
            delta_x: DVector::zeros(n),
            delta_grad: DVector::zeros(n),
            h: DMatrix::identity(n, n),
            g0: value,
            g1: 0.0,
            g2: 0.0,
            lambda0: 0.0,
            lambda1: 0.0,
        }
    }

    /// Commits an accepted step and records the quantities the Hessian
    /// updates need.
    fn apply_step(&mut self, direction: &DVector, lambda: f64, grad_new: DVector) {
        self.delta_x = direction * lambda;
        self.x += &self.delta_x;
        self.delta_grad = &grad_new - &self.grad;
        self.grad = grad_new;
        self.g0 = self.g1;
        self.lambda0 = lambda;
    }
}

/// Configuration for the quasi-Newton minimizer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuasiNewtonConfig {
    /// Absolute convergence tolerance, non-negative.
    pub absolute_tolerance: f64,
    /// Relative convergence tolerance, non-negative.
    pub relative_tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: usize,
}

impl Default for QuasiNewtonConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: DEFAULT_TOLERANCE,
            relative_tolerance: DEFAULT_TOLERANCE,
            max_iterations: 200,
        }
    }
}

impl QuasiNewtonConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute convergence tolerance.
    pub fn with_absolute_tolerance(mut self, absolute_tolerance: f64) -> Self {
        self.absolute_tolerance = absolute_tolerance;
        self
    }

    /// Sets the relative convergence tolerance.
    pub fn with_relative_tolerance(mut self, relative_tolerance: f64) -> Self {
        self.relative_tolerance = relative_tolerance;
        self
    }

    /// Sets the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.absolute_tolerance.is_nan() || self.absolute_tolerance < 0.0 {
            return Err(MinimizerError::invalid_configuration(
                "must be non-negative",
                "absolute_tolerance",
                self.absolute_tolerance,
            ));
        }
        if self.relative_tolerance.is_nan() || self.relative_tolerance < 0.0 {
            return Err(MinimizerError::invalid_configuration(
                "must be non-negative",
                "relative_tolerance",
                self.relative_tolerance,
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

/// Quasi-Newton minimizer with a pluggable inverse-Hessian update.
#[derive(Debug)]
pub struct QuasiNewton {
    config: QuasiNewtonConfig,
    update: Box<dyn InverseHessianUpdate>,
}

impl QuasiNewton {
    /// Creates a minimizer with the given configuration and the default
    /// BFGS update.
    ///
    /// Fails with [`MinimizerError::InvalidConfiguration`] before any
    /// iteration if a parameter is out of range.
    pub fn new(config: QuasiNewtonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            update: Box::new(BfgsUpdate),
        })
    }

    /// Creates a minimizer with default configuration and the BFGS update.
    pub fn with_default_config() -> Self {
        Self {
            config: QuasiNewtonConfig::default(),
            update: Box::new(BfgsUpdate),
        }
    }

    /// Replaces the inverse-Hessian update rule.
    pub fn with_update(mut self, update: Box<dyn InverseHessianUpdate>) -> Self {
        self.update = update;
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &QuasiNewtonConfig {
        &self.config
    }

    /// Finds and commits the next accepted step.
    fn next_position<F, G>(
        &self,
        function: &F,
        gradient: &G,
        state: &mut QuasiNewtonState,
    ) -> Result<()>
    where
        F: ObjectiveFunction,
        G: GradientFunction,
    {
        // Re-open with a full step after a full accepted step, growing it
        // when full steps keep succeeding
        state.lambda0 = if state.lambda0 >= 1.0 {
            f64::max(1.0, STEP_GROWTH * state.lambda0)
        } else {
            1.0
        };

        let direction = -(&state.h * &state.grad);
        let slope = state.grad.dot(&direction);
        if slope >= 0.0 {
            // The curvature estimate no longer yields a descent direction;
            // the caller's reset-and-retry recovers from this
            return Err(MinimizerError::step_failure(0, state.lambda0));
        }

        let g0 = state.g0;
        let mut lambda = state.lambda0;

        state.g2 = g0;
        state.g1 = function.value(&(&state.x + &direction * lambda));

        // Shrink until the objective values are finite; an overly long step
        // can leave the objective's domain
        while !(state.g1.is_finite() && state.g2.is_finite()) {
            lambda *= FINITE_SHRINK;
            state.g2 = state.g1;
            state.g1 = function.value(&(&state.x + &direction * lambda));
        }
        state.lambda0 = lambda;

        if step_accepted(g0, state.g1, lambda, slope) {
            let grad_new = gradient.gradient(&(&state.x + &direction * lambda));
            state.apply_step(&direction, lambda, grad_new);
            return Ok(());
        }

        // Quadratic backtrack through (0, g0) with the known slope and the
        // rejected trial
        let denom = 2.0 * (state.g1 - g0 - slope * lambda);
        if denom == 0.0 {
            return Err(MinimizerError::degenerate_step(
                "zero denominator in quadratic step interpolation",
            ));
        }
        let mut new_lambda = f64::max(0.01 * lambda, -slope * lambda * lambda / denom);
        state.lambda1 = lambda;
        state.g2 = state.g1;
        state.lambda0 = new_lambda;
        state.g1 = function.value(&(&state.x + &direction * new_lambda));
        if step_accepted(g0, state.g1, new_lambda, slope) {
            let grad_new = gradient.gradient(&(&state.x + &direction * new_lambda));
            state.apply_step(&direction, new_lambda, grad_new);
            return Ok(());
        }

        // Cubic backtracks through the last two trials
        for _ in 0..MAX_INTERPOLATION_ATTEMPTS {
            let l0 = state.lambda0;
            let l1 = state.lambda1;
            let rhs1 = state.g1 - g0 - l0 * slope;
            let rhs2 = state.g2 - g0 - l1 * slope;
            let spread = l0 - l1;
            if spread == 0.0 {
                return Err(MinimizerError::degenerate_step(
                    "coincident trial steps in cubic step interpolation",
                ));
            }
            let a = (rhs1 / (l0 * l0) - rhs2 / (l1 * l1)) / spread;
            let b = (-l1 * rhs1 / (l0 * l0) + l0 * rhs2 / (l1 * l1)) / spread;

            new_lambda = if a == 0.0 {
                // The cubic collapses to a quadratic
                if b == 0.0 {
                    return Err(MinimizerError::degenerate_step(
                        "flat cubic model in step interpolation",
                    ));
                }
                -slope / (2.0 * b)
            } else {
                let discriminant = b * b - 3.0 * a * slope;
                if discriminant < 0.0 {
                    return Err(MinimizerError::degenerate_step(
                        "negative discriminant in cubic step interpolation",
                    ));
                }
                (-b + discriminant.sqrt()) / (3.0 * a)
            };
            // Keep the new trial between a hundredth of the last step and
            // three quarters of the one before
            new_lambda = new_lambda.max(0.01 * l0).min(0.75 * l1);

            state.lambda1 = l0;
            state.g2 = state.g1;
            state.lambda0 = new_lambda;
            state.g1 = function.value(&(&state.x + &direction * new_lambda));
            if step_accepted(g0, state.g1, new_lambda, slope) {
                let grad_new = gradient.gradient(&(&state.x + &direction * new_lambda));
                state.apply_step(&direction, new_lambda, grad_new);
                return Ok(());
            }
        }

        Err(MinimizerError::step_failure(
            MAX_INTERPOLATION_ATTEMPTS,
            state.lambda0,
        ))
    }
}

/// Sufficient-decrease acceptance against the directional slope, with a
/// roundoff allowance so a step whose effect is below the objective's
/// resolution still counts as accepted.
fn step_accepted(g0: f64, g1: f64, lambda: f64, slope: f64) -> bool {
    g1 <= g0 + ALPHA * lambda * slope + f64::EPSILON * g0.abs()
}

impl MinimizerWithGradient for QuasiNewton {
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
        let abs = self.config.absolute_tolerance;
        let rel = self.config.relative_tolerance;

        let value = function.value(start);
        let mut state = QuasiNewtonState::new(start.clone(), gradient.gradient(start), value);

        // Starting from an already-converged point re-enters cleanly
        if state.grad.norm() < abs {
            return Ok(state.x);
        }

        let mut updates_since_reset = 0_usize;
        let mut reset_retry_used = false;

        for _ in 0..self.config.max_iterations {
            match self.next_position(function, gradient, &mut state) {
                Ok(()) => reset_retry_used = false,
                Err(MinimizerError::StepFailure { attempts, last_step }) => {
                    if reset_retry_used {
                        return Err(MinimizerError::step_failure(attempts, last_step));
                    }
                    // Discard the accumulated curvature and retry once
                    reset_retry_used = true;
                    let n = state.x.len();
                    state.h = DMatrix::identity(n, n);
                    updates_since_reset = 0;
                    continue;
                }
                Err(e) => return Err(e),
            }

            let converged = state.grad.norm() < abs
                && state
                    .delta_x
                    .iter()
                    .zip(state.x.iter())
                    .all(|(dxi, xi)| dxi.abs() <= abs + rel * xi.abs());
            if converged {
                return Ok(state.x.clone());
            }

            updates_since_reset += 1;
            if updates_since_reset >= HESSIAN_RESET_PERIOD {
                let n = state.x.len();
                state.h = DMatrix::identity(n, n);
                updates_since_reset = 0;
            } else {
                self.update.update(&mut state)?;
            }
        }

        Err(MinimizerError::convergence_failure(
            self.config.max_iterations,
            abs,
            state.x,
            None,
        ))
    }
}

impl Minimizer for QuasiNewton {
    /// Quasi-Newton needs first-order information; use the conjugate
    /// gradient minimizer for derivative-free problems.
    fn minimize<F>(&self, _function: &F, _start: &DVector) -> Result<DVector>
    where
        F: ObjectiveFunction,
    {
        Err(MinimizerError::unsupported_operation(
            "minimize without an explicit gradient",
            "use the conjugate gradient minimizer for derivative-free problems",
        ))
    }
}
