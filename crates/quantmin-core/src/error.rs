//! Error types for minimization.
//!
//! This module defines the single error enum shared by all minimizers and
//! their collaborators. Every failure is fatal to the call that produced it;
//! no minimizer silently returns a non-converged point.

use crate::types::DVector;
use thiserror::Error;

/// Errors that can occur while minimizing an objective function.
#[derive(Debug, Clone, Error)]
pub enum MinimizerError {
    /// Iteration budget exhausted without satisfying the stopping test.
    ///
    /// Carries the full diagnostics needed by calibration callers: how many
    /// iterations were attempted, the tolerance that was not met, the last
    /// iterate and (where the algorithm tracks one) the last objective value.
    #[error("failed to converge after {iterations} iterations (tolerance {tolerance:e})")]
    ConvergenceFailure {
        /// Number of iterations attempted
        iterations: usize,
        /// Convergence tolerance that was not met
        tolerance: f64,
        /// Last iterate reached before giving up
        last_point: DVector,
        /// Objective value at the last iterate, if the algorithm tracks it
        last_value: Option<f64>,
    },

    /// A denominator required by an update or interpolation formula is
    /// exactly zero, or a square-root argument is negative.
    ///
    /// Indicates the problem is not well-posed at the current iterate, for
    /// example a flat or non-convex region.
    #[error("degenerate step: {reason}")]
    DegenerateStep {
        /// Description of the degenerate quantity
        reason: String,
    },

    /// The backtracking line search exhausted its interpolation attempts
    /// without finding an acceptable step.
    #[error("line search failed to find an acceptable step after {attempts} attempts (last step size {last_step:e})")]
    StepFailure {
        /// Number of backtracking attempts made
        attempts: usize,
        /// Last step length tried
        last_step: f64,
    },

    /// The requested entry point is not supported by this minimizer.
    #[error("unsupported operation: {operation}. {hint}")]
    UnsupportedOperation {
        /// Name of the unsupported entry point
        operation: String,
        /// Suggested alternative
        hint: String,
    },

    /// Out-of-range parameter at minimizer construction.
    ///
    /// Raised before any iteration is attempted.
    #[error("invalid configuration: {reason} ({parameter} = {value})")]
    InvalidConfiguration {
        /// Description of the constraint that was violated
        reason: String,
        /// Name of the invalid parameter
        parameter: String,
        /// Value that was rejected
        value: String,
    },
}

impl MinimizerError {
    /// Create a ConvergenceFailure with full diagnostics.
    pub fn convergence_failure(
        iterations: usize,
        tolerance: f64,
        last_point: DVector,
        last_value: Option<f64>,
    ) -> Self {
        Self::ConvergenceFailure {
            iterations,
            tolerance,
            last_point,
            last_value,
        }
    }

    /// Create a DegenerateStep error with a custom reason.
    pub fn degenerate_step<S: Into<String>>(reason: S) -> Self {
        Self::DegenerateStep {
            reason: reason.into(),
        }
    }

    /// Create a StepFailure error.
    pub fn step_failure(attempts: usize, last_step: f64) -> Self {
        Self::StepFailure {
            attempts,
            last_step,
        }
    }

    /// Create an UnsupportedOperation error.
    pub fn unsupported_operation<S1, S2>(operation: S1, hint: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self::UnsupportedOperation {
            operation: operation.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidConfiguration error.
    pub fn invalid_configuration<S1, S2, S3>(reason: S1, parameter: S2, value: S3) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
        S3: std::fmt::Display,
    {
        Self::InvalidConfiguration {
            reason: reason.into(),
            parameter: parameter.into(),
            value: value.to_string(),
        }
    }
}

/// Result type alias for minimization operations.
pub type Result<T> = std::result::Result<T, MinimizerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_convergence_failure_context() {
        let err = MinimizerError::convergence_failure(
            100,
            1e-8,
            DVector::from_vec(vec![1.0, 2.0]),
            Some(0.5),
        );

        if let MinimizerError::ConvergenceFailure {
            iterations,
            tolerance,
            last_point,
            last_value,
        } = err
        {
            assert_eq!(iterations, 100);
            assert_eq!(tolerance, 1e-8);
            assert_eq!(last_point.len(), 2);
            assert_eq!(last_value, Some(0.5));
        } else {
            panic!("expected ConvergenceFailure variant");
        }
    }

    #[test]
    fn test_error_display() {
        let errors = vec![
            MinimizerError::convergence_failure(1, 1e-8, DVector::zeros(2), None),
            MinimizerError::degenerate_step("deltaX . deltaGrad is zero"),
            MinimizerError::step_failure(5, 1e-3),
            MinimizerError::unsupported_operation(
                "minimize without gradient",
                "use the conjugate gradient minimizer instead",
            ),
            MinimizerError::invalid_configuration("must be positive", "tolerance", -1.0),
        ];

        for err in errors {
            assert!(!err.to_string().is_empty());
        }
    }

    #[test]
    fn test_invalid_configuration_message() {
        let err = MinimizerError::invalid_configuration("must be at least 1", "max_iterations", 0);
        assert!(err.to_string().contains("max_iterations"));
        assert!(err.to_string().contains("must be at least 1"));
    }
}
