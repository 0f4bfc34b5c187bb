//! Inverse-Hessian update rules for the quasi-Newton minimizer.
//!
//! Both rules keep `H` symmetric and satisfy the secant equation
//! `H * delta_grad = delta_x` after the update, so the approximation agrees
//! with the most recent observed curvature. BFGS is the default; DFP is its
//! dual and is kept for objectives where it is known to behave better.

use crate::quasi_newton::QuasiNewtonState;
use quantmin_core::error::{MinimizerError, Result};

/// A rank-two refinement of the inverse Hessian approximation.
pub trait InverseHessianUpdate: std::fmt::Debug {
    /// A short human-readable name for diagnostics.
    fn name(&self) -> &'static str;

    /// Refines `state.h` from the last accepted step.
    ///
    /// # Errors
    ///
    /// Returns [`MinimizerError::DegenerateStep`] when a denominator of the
    /// update formula is exactly zero.
    fn update(&self, state: &mut QuasiNewtonState) -> Result<()>;
}

/// Davidon-Fletcher-Powell rank-two update.
#[derive(Debug, Clone, Copy, Default)]
pub struct DfpUpdate;

impl InverseHessianUpdate for DfpUpdate {
    fn name(&self) -> &'static str {
        "DFP"
    }

    fn update(&self, state: &mut QuasiNewtonState) -> Result<()> {
        let h_dg = &state.h * &state.delta_grad;
        let rho1 = state.delta_x.dot(&state.delta_grad);
        let rho2 = state.delta_grad.dot(&h_dg);
        if rho1 == 0.0 {
            return Err(MinimizerError::degenerate_step(
                "deltaX . deltaGrad is exactly zero in the DFP update",
            ));
        }
        if rho2 == 0.0 {
            return Err(MinimizerError::degenerate_step(
                "deltaGrad . H deltaGrad is exactly zero in the DFP update",
            ));
        }

        state.h += &state.delta_x * state.delta_x.transpose() / rho1;
        state.h -= &h_dg * h_dg.transpose() / rho2;
        Ok(())
    }
}

/// Broyden-Fletcher-Goldfarb-Shanno rank-two update, the default.
#[derive(Debug, Clone, Copy, Default)]
pub struct BfgsUpdate;

impl InverseHessianUpdate for BfgsUpdate {
    fn name(&self) -> &'static str {
        "BFGS"
    }

    fn update(&self, state: &mut QuasiNewtonState) -> Result<()> {
        let h_dg = &state.h * &state.delta_grad;
        let rho1 = state.delta_x.dot(&state.delta_grad);
        if rho1 == 0.0 {
            return Err(MinimizerError::degenerate_step(
                "deltaX . deltaGrad is exactly zero in the BFGS update",
            ));
        }
        let rho2 = state.delta_grad.dot(&h_dg);

        state.h +=
            (&state.delta_x * state.delta_x.transpose()) * ((1.0 + rho2 / rho1) / rho1);
        state.h -= (&state.delta_x * h_dg.transpose() + &h_dg * state.delta_x.transpose()) / rho1;
        Ok(())
    }
}
