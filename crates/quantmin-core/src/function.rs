//! Objective and gradient function capabilities.
//!
//! The minimizers are written against these traits rather than concrete
//! closures so that calibration code can supply anything from a plain
//! function pointer to a stateful pricing engine. Blanket implementations
//! make ordinary closures usable directly.
//!
//! Objectives are assumed pure and deterministic from the minimizer's point
//! of view; they may be arbitrarily expensive, so the algorithms are careful
//! about evaluation counts.

use crate::types::{DMatrix, DVector};

/// A scalar-valued function of a vector, `f: R^n -> R`.
pub trait ObjectiveFunction {
    /// Evaluates the objective at a point.
    fn value(&self, x: &DVector) -> f64;
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&DVector) -> f64,
{
    fn value(&self, x: &DVector) -> f64 {
        self(x)
    }
}

/// A vector-valued gradient function, `grad f: R^n -> R^n`.
///
/// The returned vector must have the same dimension as the input; violating
/// this is a programming-contract error, not a recoverable numeric failure.
pub trait GradientFunction {
    /// Evaluates the gradient at a point.
    fn gradient(&self, x: &DVector) -> DVector;
}

impl<G> GradientFunction for G
where
    G: Fn(&DVector) -> DVector,
{
    fn gradient(&self, x: &DVector) -> DVector {
        self(x)
    }
}

/// A one-dimensional function `f: R -> R`, the line-search sub-problem type.
pub trait Function1D {
    /// Evaluates the function at an abscissa.
    fn value(&self, x: f64) -> f64;
}

impl<F> Function1D for F
where
    F: Fn(f64) -> f64,
{
    fn value(&self, x: f64) -> f64 {
        self(x)
    }
}

/// A positive-definite quadratic objective for testing.
///
/// Computes `f(x) = 0.5 * x^T A x - b^T x`, whose unique minimizer is the
/// solution of `A x = b`.
#[derive(Debug, Clone)]
pub struct QuadraticObjective {
    /// The quadratic form matrix (must be symmetric positive-definite)
    pub a: DMatrix,
    /// The linear term
    pub b: DVector,
}

impl QuadraticObjective {
    /// Creates a new quadratic objective.
    pub fn new(a: DMatrix, b: DVector) -> Self {
        debug_assert_eq!(a.nrows(), a.ncols());
        debug_assert_eq!(a.nrows(), b.len());
        Self { a, b }
    }

    /// Creates the simplest quadratic, `f(x) = 0.5 * ||x||^2`.
    pub fn simple(dim: usize) -> Self {
        Self {
            a: DMatrix::identity(dim, dim),
            b: DVector::zeros(dim),
        }
    }

    /// The analytic gradient, `A x - b`.
    pub fn gradient(&self, x: &DVector) -> DVector {
        &self.a * x - &self.b
    }

    /// The exact minimizer, solving `A x = b`.
    ///
    /// # Panics
    ///
    /// Panics if `A` is singular; test fixtures are expected to be
    /// positive-definite.
    pub fn minimizer(&self) -> DVector {
        self.a
            .clone()
            .lu()
            .solve(&self.b)
            .expect("quadratic fixture matrix must be non-singular")
    }
}

impl ObjectiveFunction for QuadraticObjective {
    fn value(&self, x: &DVector) -> f64 {
        0.5 * x.dot(&(&self.a * x)) - self.b.dot(x)
    }
}

impl GradientFunction for QuadraticObjective {
    fn gradient(&self, x: &DVector) -> DVector {
        QuadraticObjective::gradient(self, x)
    }
}
