//! Type aliases and numerical constants.
//!
//! The minimizers operate on dense double-precision vectors and matrices.
//! Every numeric contract in this workspace (tolerances, convergence floors,
//! interpolation constants) is stated in `f64`, so the aliases here are
//! monomorphic rather than generic over a scalar type.

/// Dense column vector of doubles, the point/gradient/direction type.
pub type DVector = nalgebra::DVector<f64>;

/// Dense matrix of doubles, used for inverse-Hessian estimates.
pub type DMatrix = nalgebra::DMatrix<f64>;

/// Smallest positive normal double.
///
/// Used as the additive floor in relative convergence tests so that they
/// remain meaningful when the objective value is at or near zero.
pub const SMALL: f64 = f64::MIN_POSITIVE;

/// Default convergence tolerance shared by the solvers.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Lower bound on any absolute tolerance a solver will accept.
pub const MIN_ABSOLUTE_TOLERANCE: f64 = 1e-25;
