//! Minimum bracketing for one-dimensional line searches.
//!
//! Before a scalar minimizer can refine a minimum it needs three abscissas
//! `(a, b, c)` with `f(b)` no greater than `f(a)` or `f(c)`. This module
//! finds such a triple by walking downhill from an initial interval, growing
//! the step by the golden ratio and attempting a parabolic extrapolation at
//! each stage.
//!
//! The returned triple is monotone in the walk direction but not necessarily
//! increasing: if the downhill direction is towards smaller abscissas the
//! triple comes back with `c < a`. Callers that need an increasing bracket
//! (the scalar minimizer does) must reorder it.

use crate::error::{MinimizerError, Result};
use crate::function::Function1D;

/// Golden-ratio step growth factor.
const GOLD: f64 = 1.618034;

/// Maximum magnification allowed for a parabolic-fit step.
const GROW_LIMIT: f64 = 100.0;

/// Guard against division by zero in the parabolic fit.
const TINY: f64 = 1e-20;

fn sign(a: f64, b: f64) -> f64 {
    if b >= 0.0 {
        a.abs()
    } else {
        -a.abs()
    }
}

/// Golden-section minimum bracketer with parabolic extrapolation.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParabolicBracketer {
    /// Bound on objective evaluations before the search is abandoned.
    max_evaluations: usize,
}

impl ParabolicBracketer {
    /// Creates a bracketer with the default evaluation budget.
    pub fn new() -> Self {
        Self {
            max_evaluations: 100,
        }
    }

    /// Sets the bound on objective evaluations.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    /// Brackets a minimum of `f` starting from the interval `[a, b]`.
    ///
    /// Returns `(a, b, c)` such that `b` lies between `a` and `c` and
    /// `f(b) <= min(f(a), f(c))`. The triple is ordered in the downhill
    /// direction, so `c < a` is possible.
    ///
    /// # Errors
    ///
    /// Returns [`MinimizerError::DegenerateStep`] if no bracket is found
    /// within the evaluation budget, which happens when the function keeps
    /// decreasing along the walk (no local minimum in reach).
    pub fn bracket<F>(&self, f: &F, a: f64, b: f64) -> Result<(f64, f64, f64)>
    where
        F: Function1D,
    {
        let (mut ax, mut bx) = (a, b);
        let mut fa = f.value(ax);
        let mut fb = f.value(bx);

        // Walk downhill: ensure f(b) <= f(a)
        if fb > fa {
            std::mem::swap(&mut ax, &mut bx);
            std::mem::swap(&mut fa, &mut fb);
        }

        let mut cx = bx + GOLD * (bx - ax);
        let mut fc = f.value(cx);
        let mut evaluations = 3;

        while fb > fc {
            if evaluations >= self.max_evaluations {
                return Err(MinimizerError::degenerate_step(format!(
                    "could not bracket a minimum within {} evaluations; \
                     the function may be unbounded below along this line",
                    self.max_evaluations
                )));
            }

            // Parabolic extrapolation from (a, b, c)
            let r = (bx - ax) * (fb - fc);
            let q = (bx - cx) * (fb - fa);
            let mut u =
                bx - ((bx - cx) * q - (bx - ax) * r) / (2.0 * sign(f64::max((q - r).abs(), TINY), q - r));
            let ulim = bx + GROW_LIMIT * (cx - bx);
            let mut fu;

            if (bx - u) * (u - cx) > 0.0 {
                // Parabolic u lies between b and c
                fu = f.value(u);
                evaluations += 1;
                if fu < fc {
                    return Ok((bx, u, cx));
                } else if fu > fb {
                    return Ok((ax, bx, u));
                }
                // Parabolic fit was no use; default magnification
                u = cx + GOLD * (cx - bx);
                fu = f.value(u);
                evaluations += 1;
            } else if (cx - u) * (u - ulim) > 0.0 {
                // Parabolic u lies between c and the magnification limit
                fu = f.value(u);
                evaluations += 1;
                if fu < fc {
                    bx = cx;
                    cx = u;
                    u = cx + GOLD * (cx - bx);
                    fb = fc;
                    fc = fu;
                    fu = f.value(u);
                    evaluations += 1;
                }
            } else if (u - ulim) * (ulim - cx) >= 0.0 {
                // Clamp u to the magnification limit
                u = ulim;
                fu = f.value(u);
                evaluations += 1;
            } else {
                // Reject the parabolic u; default magnification
                u = cx + GOLD * (cx - bx);
                fu = f.value(u);
                evaluations += 1;
            }

            ax = bx;
            bx = cx;
            cx = u;
            fa = fb;
            fb = fc;
            fc = fu;
        }

        Ok((ax, bx, cx))
    }
}

impl Default for ParabolicBracketer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_brackets_parabola() {
        let f = |x: f64| (x - 3.0) * (x - 3.0);
        let bracketer = ParabolicBracketer::new();
        let (a, b, c) = bracketer.bracket(&f, 0.0, 1.0).unwrap();

        let (fa, fb, fc) = (f(a), f(b), f(c));
        assert!(fb <= fa && fb <= fc);
        assert!((a - b) * (b - c) > 0.0, "b must lie between a and c");
        assert!(a.min(c) <= 3.0 && 3.0 <= a.max(c));
    }

    #[test]
    fn test_brackets_downhill_to_the_left() {
        // Minimum at x = -2, so the walk reverses through the start interval
        let f = |x: f64| (x + 2.0) * (x + 2.0);
        let bracketer = ParabolicBracketer::new();
        let (a, b, c) = bracketer.bracket(&f, 0.0, 1.0).unwrap();

        assert!(c < a, "bracket should come back in descending order");
        assert!(f(b) <= f(a) && f(b) <= f(c));
        assert!(c <= -2.0 && -2.0 <= a);
    }

    #[test]
    fn test_monotone_function_fails() {
        let f = |x: f64| x;
        let bracketer = ParabolicBracketer::new().with_max_evaluations(30);
        let result = bracketer.bracket(&f, 0.0, 1.0);
        assert!(matches!(
            result,
            Err(MinimizerError::DegenerateStep { .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_bracket_contains_quadratic_minimum(center in -50.0_f64..50.0, scale in 0.1_f64..10.0) {
            let f = move |x: f64| scale * (x - center) * (x - center);
            let bracketer = ParabolicBracketer::new();
            let (a, b, c) = bracketer.bracket(&f, 0.0, 1.0).unwrap();

            // Middle ordinate is never above the outer two
            prop_assert!(f(b) <= f(a));
            prop_assert!(f(b) <= f(c));
            // The true minimum lies inside the bracket
            prop_assert!(a.min(c) <= center && center <= a.max(c));
        }
    }
}
