//! Powell's conjugate direction minimizer.
//!
//! A derivative-free method: it maintains a set of `n` search directions,
//! line-minimizes along each in turn, and periodically replaces the
//! direction of largest decrease with the overall displacement of the sweep.
//! Powell's extrapolation test guards the replacement so the direction set
//! never degenerates into a linearly dependent family.
//!
//! # Algorithm Overview
//!
//! One outer iteration:
//! 1. Line-minimize along every direction in order, tracking the single
//!    largest per-direction decrease.
//! 2. Stop when the sweep's total decrease is small relative to the
//!    objective value (with an absolute floor for objectives near zero).
//! 3. Evaluate the objective at the extrapolated point `x + (x - x0)`; if
//!    Powell's criterion accepts it, line-minimize along the sweep
//!    displacement and fold that displacement into the direction set.
//!
//! # References
//!
//! - Powell, "An efficient method for finding the minimum of a function of
//!   several variables without calculating derivatives" (1964)
//! - Press et al., "Numerical Recipes", section 10.5

use crate::line_search::VectorLineSearch;
use quantmin_core::error::{MinimizerError, Result};
use quantmin_core::function::{GradientFunction, ObjectiveFunction};
use quantmin_core::minimizer::{Minimizer, MinimizerWithGradient};
use quantmin_core::types::{DVector, DEFAULT_TOLERANCE, SMALL};

/// Configuration for the conjugate direction minimizer.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConjugateDirectionConfig {
    /// Relative convergence tolerance, in `(f64::MIN_POSITIVE, 1)`.
    pub tolerance: f64,
    /// Maximum number of outer iterations.
    pub max_iterations: usize,
}

impl Default for ConjugateDirectionConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: 100,
        }
    }
}

impl ConjugateDirectionConfig {
    /// Creates a configuration with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the relative convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the maximum number of outer iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.tolerance <= f64::MIN_POSITIVE || self.tolerance >= 1.0 {
            return Err(MinimizerError::invalid_configuration(
                "tolerance must lie strictly between the smallest normal double and 1",
                "tolerance",
                self.tolerance,
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

/// Powell's conjugate direction minimizer (derivative-free).
#[derive(Debug, Clone)]
pub struct ConjugateDirection {
    config: ConjugateDirectionConfig,
    line_search: VectorLineSearch,
}

impl ConjugateDirection {
    /// Creates a minimizer with the given configuration.
    ///
    /// Fails with [`MinimizerError::InvalidConfiguration`] before any
    /// iteration if a parameter is out of range.
    pub fn new(config: ConjugateDirectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            line_search: VectorLineSearch::new(),
        })
    }

    /// Creates a minimizer with default configuration.
    pub fn with_default_config() -> Self {
        Self {
            config: ConjugateDirectionConfig::default(),
            line_search: VectorLineSearch::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConjugateDirectionConfig {
        &self.config
    }
}

/// Folds the sweep displacement into the direction set: the direction of
/// largest decrease is evicted to the last slot, which is then overwritten.
/// The set keeps exactly `n` entries.
fn replace_direction(directions: &mut [DVector], largest_decrease_index: usize, delta_x: DVector) {
    let last = directions.len() - 1;
    directions.swap(largest_decrease_index, last);
    directions[last] = delta_x;
}

impl Minimizer for ConjugateDirection {
    fn minimize<F>(&self, function: &F, start: &DVector) -> Result<DVector>
    where
        F: ObjectiveFunction,
    {
        let n = start.len();
        let mut directions: Vec<DVector> = (0..n)
            .map(|i| {
                let mut e = DVector::zeros(n);
                e[i] = 1.0;
                e
            })
            .collect();

        let mut x0 = start.clone();

        for _ in 0..self.config.max_iterations {
            let f0 = function.value(&x0);
            let mut x = x0.clone();
            let mut f_current = f0;

            // Sweep: line-minimize along every direction, tracking the
            // single largest decrease
            let mut largest_decrease = 0.0;
            let mut largest_decrease_index = 0;
            for (i, direction) in directions.iter().enumerate() {
                let lambda = self.line_search.minimize(function, direction, &x)?;
                x += direction * lambda;
                let f_new = function.value(&x);
                let decrease = f_current - f_new;
                if decrease > largest_decrease {
                    largest_decrease = decrease;
                    largest_decrease_index = i;
                }
                f_current = f_new;
            }
            let f_final = f_current;

            // Relative-with-floor convergence test
            if f0 - f_final < self.config.tolerance * 0.5 * (f0.abs() + f_final.abs()) + SMALL {
                return Ok(x);
            }

            // Powell's extrapolation test: fold the sweep displacement into
            // the direction set only if it helps and the decrease was not
            // dominated by a single existing direction
            let delta_x = &x - &x0;
            let f_extrap = function.value(&(&x + &delta_x));
            if f_extrap < f0 {
                let t = 2.0 * (f0 - 2.0 * f_final + f_extrap)
                    * (f0 - f_final - largest_decrease).powi(2)
                    - (f0 - f_extrap).powi(2) * largest_decrease;
                if t < 0.0 {
                    let lambda = self.line_search.minimize(function, &delta_x, &x)?;
                    x += &delta_x * lambda;
                    replace_direction(&mut directions, largest_decrease_index, delta_x);
                }
            }

            x0 = x;
        }

        Err(MinimizerError::convergence_failure(
            self.config.max_iterations,
            self.config.tolerance,
            x0,
            None,
        ))
    }
}

impl MinimizerWithGradient for ConjugateDirection {
    /// Powell's method is derivative-free; the supplied gradient is ignored.
    fn minimize_with_gradient<F, G>(
        &self,
        function: &F,
        _gradient: &G,
        start: &DVector,
    ) -> Result<DVector>
    where
        F: ObjectiveFunction,
        G: GradientFunction,
    {
        self.minimize(function, start)
    }
}
