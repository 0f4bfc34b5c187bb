//! Calibration-style acceptance scenario shared by all three minimizers.
//!
//! Fits `a * sin(b * x + c) + d` by least squares to samples of `sin(x)`
//! over one period. The residual surface has a unique minimum at
//! `(1, 1, 0, 0)` near the start used here, with zero residual, so every
//! minimizer must recover the parameters and drive the objective to the
//! noise floor.

use approx::assert_relative_eq;
use quantmin_core::prelude::*;
use quantmin_optim::prelude::*;
use std::f64::consts::PI;

/// Sample abscissas covering one period of the sine wave.
fn sample_points() -> Vec<f64> {
    (0..20).map(|i| -PI + i as f64 * PI / 10.0).collect()
}

/// Least-squares objective for the four-parameter sine model.
fn residual_sum(params: &DVector) -> f64 {
    let (a, b, c, d) = (params[0], params[1], params[2], params[3]);
    sample_points()
        .iter()
        .map(|&x| {
            let r = x.sin() - (a * (b * x + c).sin() + d);
            r * r
        })
        .sum()
}

/// Analytic gradient of [`residual_sum`].
fn residual_gradient(params: &DVector) -> DVector {
    let (a, b, c, d) = (params[0], params[1], params[2], params[3]);
    let mut grad = DVector::zeros(4);
    for x in sample_points() {
        let theta = b * x + c;
        let r = x.sin() - (a * theta.sin() + d);
        grad[0] += -2.0 * r * theta.sin();
        grad[1] += -2.0 * r * a * x * theta.cos();
        grad[2] += -2.0 * r * a * theta.cos();
        grad[3] += -2.0 * r;
    }
    grad
}

fn start() -> DVector {
    DVector::from_vec(vec![1.2, 0.8, -0.2, -0.3])
}

fn assert_calibrated(solution: &DVector) {
    assert_relative_eq!(solution[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(solution[1], 1.0, epsilon = 1e-4);
    assert!(solution[2].abs() < 1e-4, "phase was {}", solution[2]);
    assert!(solution[3].abs() < 1e-4, "offset was {}", solution[3]);
    assert!(
        residual_sum(solution) < 1e-8,
        "residual was {}",
        residual_sum(solution)
    );
}

#[test]
fn conjugate_direction_calibrates_sine_fit() {
    let minimizer = ConjugateDirection::with_default_config();
    let solution = minimizer.minimize(&residual_sum, &start()).unwrap();
    assert_calibrated(&solution);
}

#[test]
fn conjugate_gradient_calibrates_sine_fit() {
    let minimizer = ConjugateGradient::with_default_config();
    let solution = minimizer
        .minimize_with_gradient(&residual_sum, &residual_gradient, &start())
        .unwrap();
    assert_calibrated(&solution);
}

#[test]
fn conjugate_gradient_calibrates_without_analytic_gradient() {
    let minimizer = ConjugateGradient::with_default_config();
    let solution = minimizer.minimize(&residual_sum, &start()).unwrap();
    assert_calibrated(&solution);
}

#[test]
fn quasi_newton_bfgs_calibrates_sine_fit() {
    let minimizer = QuasiNewton::with_default_config();
    let solution = minimizer
        .minimize_with_gradient(&residual_sum, &residual_gradient, &start())
        .unwrap();
    assert_calibrated(&solution);
}

#[test]
fn quasi_newton_dfp_calibrates_sine_fit() {
    let minimizer = QuasiNewton::with_default_config().with_update(Box::new(DfpUpdate));
    let solution = minimizer
        .minimize_with_gradient(&residual_sum, &residual_gradient, &start())
        .unwrap();
    assert_calibrated(&solution);
}

#[test]
fn minimizers_are_idempotent_at_the_solution() {
    // Re-entering from a converged point must return essentially the same
    // point for every minimizer
    let cd = ConjugateDirection::with_default_config();
    let solution = cd.minimize(&residual_sum, &start()).unwrap();

    let again = cd.minimize(&residual_sum, &solution).unwrap();
    assert_relative_eq!(again, solution.clone(), epsilon = 1e-6);

    let cg = ConjugateGradient::with_default_config();
    let cg_solution = cg
        .minimize_with_gradient(&residual_sum, &residual_gradient, &start())
        .unwrap();
    let cg_again = cg
        .minimize_with_gradient(&residual_sum, &residual_gradient, &cg_solution)
        .unwrap();
    assert_relative_eq!(cg_again, cg_solution.clone(), epsilon = 1e-6);

    let qn = QuasiNewton::with_default_config();
    let qn_solution = qn
        .minimize_with_gradient(&residual_sum, &residual_gradient, &start())
        .unwrap();
    let qn_again = qn
        .minimize_with_gradient(&residual_sum, &residual_gradient, &qn_solution)
        .unwrap();
    assert_relative_eq!(qn_again, qn_solution.clone(), epsilon = 1e-6);
}

#[test]
fn exhausted_budget_reports_diagnostics_not_a_point() {
    let minimizer =
        ConjugateGradient::new(ConjugateGradientConfig::new().with_max_iterations(1)).unwrap();
    let result = minimizer.minimize_with_gradient(&residual_sum, &residual_gradient, &start());
    match result {
        Err(MinimizerError::ConvergenceFailure {
            iterations,
            last_point,
            last_value,
            ..
        }) => {
            assert_eq!(iterations, 1);
            assert_eq!(last_point.len(), 4);
            // The last iterate is still a descent from the start
            assert!(last_value.unwrap() < residual_sum(&start()));
        }
        other => panic!("expected ConvergenceFailure, got {other:?}"),
    }
}
