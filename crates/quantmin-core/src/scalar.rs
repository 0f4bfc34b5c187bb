//! One-dimensional scalar minimization.
//!
//! The vector line searches reduce an n-dimensional problem to minimizing a
//! function of a single step length within a bracket. [`BrentMinimizer`]
//! is the default implementation: golden-section search combined with
//! successive parabolic interpolation, which converges superlinearly on
//! smooth functions while never losing the bracket.

use crate::error::{MinimizerError, Result};
use crate::function::Function1D;
use crate::types::DVector;

/// Inverse squared golden ratio, the golden-section step fraction.
const CGOLD: f64 = 0.381_966_0;

/// Protects the convergence test when the minimum sits at zero.
const ZEPS: f64 = 1e-18;

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// A one-dimensional minimizer working within a bracket.
pub trait ScalarMinimizer {
    /// Minimizes `f` within `[lower, upper]`, starting from `guess`.
    ///
    /// `guess` must lie inside the interval with `f(guess)` not above the
    /// endpoint values; the bracketer produces exactly this configuration.
    fn minimize<F>(&self, f: &F, guess: f64, lower: f64, upper: f64) -> Result<f64>
    where
        F: Function1D;
}

/// Brent's method: golden-section search with parabolic interpolation.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrentMinimizer {
    /// Relative abscissa tolerance.
    tolerance: f64,
    /// Iteration budget.
    max_iterations: usize,
}

impl BrentMinimizer {
    /// Creates a Brent minimizer with the default tolerance.
    pub fn new() -> Self {
        Self {
            tolerance: 1e-9,
            max_iterations: 100,
        }
    }

    /// Sets the relative abscissa tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the iteration budget.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

impl Default for BrentMinimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ScalarMinimizer for BrentMinimizer {
    fn minimize<F>(&self, f: &F, guess: f64, lower: f64, upper: f64) -> Result<f64>
    where
        F: Function1D,
    {
        let mut a = lower.min(upper);
        let mut b = lower.max(upper);

        let mut x = guess;
        let mut w = guess;
        let mut v = guess;
        let mut fx = f.value(x);
        let mut fw = fx;
        let mut fv = fx;

        // d is the last step taken, e the one before it
        let mut d: f64 = 0.0;
        let mut e: f64 = 0.0;

        for _ in 0..self.max_iterations {
            let xm = 0.5 * (a + b);
            let tol1 = self.tolerance * x.abs() + ZEPS;
            let tol2 = 2.0 * tol1;

            if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
                return Ok(x);
            }

            let mut use_golden = true;
            if e.abs() > tol1 {
                // Trial parabolic fit through x, w, v
                let r = (x - w) * (fx - fv);
                let mut q = (x - v) * (fx - fw);
                let mut p = (x - v) * q - (x - w) * r;
                q = 2.0 * (q - r);
                if q > 0.0 {
                    p = -p;
                }
                q = q.abs();
                let etemp = e;
                e = d;

                // Accept the parabolic step only if it falls inside the
                // bracket and is smaller than half the step before last
                if p.abs() < (0.5 * q * etemp).abs() && p > q * (a - x) && p < q * (b - x) {
                    d = p / q;
                    let u = x + d;
                    if u - a < tol2 || b - u < tol2 {
                        d = sign(tol1, xm - x);
                    }
                    use_golden = false;
                }
            }

            if use_golden {
                e = if x >= xm { a - x } else { b - x };
                d = CGOLD * e;
            }

            let u = if d.abs() >= tol1 {
                x + d
            } else {
                x + sign(tol1, d)
            };
            let fu = f.value(u);

            if fu <= fx {
                if u >= x {
                    a = x;
                } else {
                    b = x;
                }
                v = w;
                fv = fw;
                w = x;
                fw = fx;
                x = u;
                fx = fu;
            } else {
                if u < x {
                    a = u;
                } else {
                    b = u;
                }
                if fu <= fw || w == x {
                    v = w;
                    fv = fw;
                    w = u;
                    fw = fu;
                } else if fu <= fv || v == x || v == w {
                    v = u;
                    fv = fu;
                }
            }
        }

        Err(MinimizerError::convergence_failure(
            self.max_iterations,
            self.tolerance,
            DVector::from_vec(vec![x]),
            Some(fx),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quadratic_minimum() {
        let f = |x: f64| (x - 1.5) * (x - 1.5) + 2.0;
        let brent = BrentMinimizer::new();
        let x = brent.minimize(&f, 1.0, 0.0, 3.0).unwrap();
        assert_relative_eq!(x, 1.5, epsilon = 1e-7);
    }

    #[test]
    fn test_quartic_minimum() {
        let f = |x: f64| x.powi(4) - 2.0 * x * x + x;
        // Global minimum where 4x^3 - 4x + 1 = 0, near x = -1.107157
        let brent = BrentMinimizer::new();
        let x = brent.minimize(&f, -1.0, -2.0, 0.0).unwrap();
        assert_relative_eq!(x, -1.107_157, epsilon = 1e-5);
    }

    #[test]
    fn test_cosine_minimum() {
        let brent = BrentMinimizer::new();
        let x = brent.minimize(&|x: f64| x.cos(), 3.0, 2.0, 4.5).unwrap();
        assert_relative_eq!(x, std::f64::consts::PI, epsilon = 1e-7);
    }

    #[test]
    fn test_iteration_budget_exhaustion() {
        let f = |x: f64| (x - 1.5) * (x - 1.5);
        let brent = BrentMinimizer::new()
            .with_tolerance(1e-14)
            .with_max_iterations(2);
        let result = brent.minimize(&f, 0.1, 0.0, 3.0);
        assert!(matches!(
            result,
            Err(MinimizerError::ConvergenceFailure { iterations: 2, .. })
        ));
    }
}
