use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use super::{
    log_barrier::Barrier,
    multipliers::{update_multipliers, Lagrangian},
    InequalityConstraints, LinearConstraints, LogBarrierConfig, MultipliersConfig,
    NonlinearConstraints, Run,
};
use crate::{
    generic::{Algorithm, Tunables},
    iteration::MinimizerOptions,
    options::MinOptions,
    problem::Oracle,
    utils::{numerical_gradient, numerical_hessian},
    MinimizeError, Warning,
};

fn vector(values: &[f64]) -> DVector<f64> {
    DVector::from_row_slice(values)
}

fn f(x: &DVector<f64>) -> f64 {
    (x[0] - 2.0).powi(2) + (x[1] - 1.0).powi(2)
}

fn df(x: &DVector<f64>) -> DVector<f64> {
    vector(&[2.0 * (x[0] - 2.0), 2.0 * (x[1] - 1.0)])
}

fn d2f(_x: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::identity(2, 2) * 2.0
}

/// `$x_0 + x_1 \leq 2$`
fn half_plane() -> LinearConstraints {
    LinearConstraints::new(DMatrix::from_row_slice(1, 2, &[-1.0, -1.0]), vector(&[-2.0])).unwrap()
}

/// `$1 - x_0^2 - x_1^2 \geq 0$` and `$x_0 \geq 0$`
fn disc_c(x: &DVector<f64>) -> DVector<f64> {
    vector(&[1.0 - x[0] * x[0] - x[1] * x[1], x[0]])
}

fn disc_dc(x: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[-2.0 * x[0], -2.0 * x[1], 1.0, 0.0])
}

fn disc_d2c(_x: &DVector<f64>) -> Vec<DMatrix<f64>> {
    vec![DMatrix::identity(2, 2) * -2.0, DMatrix::zeros(2, 2)]
}

fn bfgs_run<'r, 'a>(
    oracle: Oracle<'a>,
    constraints: &'r dyn InequalityConstraints,
    inner_options: &'r MinOptions<'r>,
    options: &'r MinimizerOptions,
    tunables: &'r Tunables,
) -> Run<'r, 'a> {
    Run {
        oracle,
        constraints,
        inner: Algorithm::Bfgs,
        inner_options,
        options,
        tunables,
    }
}

#[test]
fn bounds_become_constraints() {
    let lower = vector(&[0.0, f64::NEG_INFINITY, -1.0]);
    let upper = vector(&[1.0, 5.0, f64::INFINITY]);
    let constraints = LinearConstraints::from_bounds(&lower, &upper).unwrap();
    assert_eq!(constraints.len(), 4);
    assert_eq!(
        constraints.a(),
        &DMatrix::from_row_slice(4, 3, &[1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0])
    );
    assert_eq!(constraints.b(), &vector(&[0.0, -1.0, -5.0, -1.0]));
    assert!(constraints.satisfied(&vector(&[0.5, 2.0, 0.0])));
    assert!(!constraints.satisfied(&vector(&[0.5, 6.0, 0.0])));

    let mismatch = LinearConstraints::from_bounds(&lower, &vector(&[1.0]));
    assert!(matches!(mismatch, Err(MinimizeError::DimensionMismatch(_))));
}

#[test]
fn linear_constraints_shape() {
    let constraints = LinearConstraints::new(DMatrix::zeros(2, 3), vector(&[1.0]));
    assert!(matches!(constraints, Err(MinimizeError::DimensionMismatch(_))));
}

#[test]
fn barrier_derivatives() {
    let (c, dc, d2c) = (disc_c, disc_dc, disc_d2c);
    let constraints = NonlinearConstraints::new(&c, &dc).with_hessians(&d2c);
    let oracle = Oracle::new(&f).with_gradient(&df).with_hessian(&d2f);
    let barrier = Barrier {
        oracle,
        constraints: &constraints,
        epsilon: 0.1,
    };
    let x = vector(&[0.3, -0.4]);
    let expected = f(&x) - 0.1 * (0.75f64.ln() + 0.3f64.ln());
    assert_relative_eq!(barrier.value(&x), expected, epsilon = 1e-12);

    let numeric = numerical_gradient(|y: &DVector<f64>| barrier.value(y), &x);
    assert_relative_eq!(barrier.gradient(&x), numeric, epsilon = 1e-6);
    let numeric = numerical_hessian(|y: &DVector<f64>| barrier.gradient(y), &x);
    assert_relative_eq!(barrier.hessian(&x), numeric, epsilon = 1e-5);

    assert_eq!(barrier.value(&vector(&[-0.1, 0.0])), f64::INFINITY);
}

#[test]
fn lagrangian_derivatives() {
    let (c, dc, d2c) = (disc_c, disc_dc, disc_d2c);
    let constraints = NonlinearConstraints::new(&c, &dc).with_hessians(&d2c);
    let oracle = Oracle::new(&f).with_gradient(&df).with_hessian(&d2f);
    // The first constraint is active, the second is not.
    let lambda = vector(&[2.0, 0.0]);
    let lagrangian = Lagrangian {
        oracle,
        constraints: &constraints,
        lambda: &lambda,
        mu: 0.5,
    };
    let x = vector(&[0.9, 0.8]);
    let c0 = 1.0 - 0.81 - 0.64;
    let expected = f(&x) - 2.0 * c0 + c0 * c0;
    assert_relative_eq!(lagrangian.value(&x), expected, epsilon = 1e-12);

    let numeric = numerical_gradient(|y: &DVector<f64>| lagrangian.value(y), &x);
    assert_relative_eq!(lagrangian.gradient(&x), numeric, epsilon = 1e-6);
    let numeric = numerical_hessian(|y: &DVector<f64>| lagrangian.gradient(y), &x);
    assert_relative_eq!(lagrangian.hessian(&x), numeric, epsilon = 1e-5);
}

#[test]
fn multipliers_stay_non_negative() {
    let mut lambda = vector(&[1.0, 1.0, 0.0]);
    update_multipliers(&mut lambda, &vector(&[-0.5, 1.0, 0.2]), 0.5);
    assert_eq!(lambda, vector(&[2.0, 0.0, 0.0]));
}

#[test]
fn barrier_stays_inside() {
    let g = |x: &DVector<f64>| (x[0] - 2.0).powi(2);
    let dg = |x: &DVector<f64>| vector(&[2.0 * (x[0] - 2.0)]);
    let constraints = LinearConstraints::new(DMatrix::from_element(1, 1, -1.0), vector(&[-1.0])).unwrap();
    let options = MinimizerOptions::new().with_func_tol(Some(1e-12)).with_maxiter(10_000);
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = bfgs_run(Oracle::new(&g).with_gradient(&dg), &constraints, &inner_options, &options, &tunables);

    let report = run.log_barrier(vector(&[0.0]), &LogBarrierConfig::default()).unwrap();
    assert_eq!(report.warning, None);
    assert!(report.x[0] < 1.0);
    assert_relative_eq!(report.x[0], 1.0, epsilon = 1e-6);
    assert_relative_eq!(report.f, 1.0, epsilon = 1e-6);
    assert!(report.f_count > report.iterations);
}

#[test]
fn barrier_needs_an_interior_start() {
    let constraints = half_plane();
    let options = MinimizerOptions::new();
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = bfgs_run(Oracle::new(&f).with_gradient(&df), &constraints, &inner_options, &options, &tunables);
    let result = run.log_barrier(vector(&[1.0, 1.0]), &LogBarrierConfig::default());
    assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })));
}

#[test]
fn barrier_iteration_limit() {
    let constraints = half_plane();
    let options = MinimizerOptions::new().with_maxiter(5);
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = bfgs_run(Oracle::new(&f).with_gradient(&df), &constraints, &inner_options, &options, &tunables);
    let report = run.log_barrier(vector(&[0.0, 0.0]), &LogBarrierConfig::default()).unwrap();
    assert_eq!(report.warning, Some(Warning::MaxIterations));
    assert_eq!(report.iterations, 5);
}

#[test]
fn multipliers_on_a_half_plane() {
    let constraints = half_plane();
    let options = MinimizerOptions::new();
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = bfgs_run(Oracle::new(&f).with_gradient(&df), &constraints, &inner_options, &options, &tunables);

    let report = run
        .method_of_multipliers(vector(&[0.0, 0.0]), &MultipliersConfig::default())
        .unwrap();
    assert_eq!(report.warning, None);
    assert_relative_eq!(report.x, vector(&[1.5, 0.5]), epsilon = 1e-6);
    assert_relative_eq!(report.f, 0.5, epsilon = 1e-6);
    assert_relative_eq!(report.f, f(&report.x));
}

#[test]
fn multipliers_on_a_disc() {
    let (c, dc, d2c) = (disc_c, disc_dc, disc_d2c);
    let constraints = NonlinearConstraints::new(&c, &dc).with_hessians(&d2c);
    let options = MinimizerOptions::new().with_func_tol(Some(1e-12));
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = bfgs_run(Oracle::new(&f).with_gradient(&df), &constraints, &inner_options, &options, &tunables);

    // The closest point of the unit disc to (2, 1).
    let report = run
        .method_of_multipliers(vector(&[0.5, 0.0]), &MultipliersConfig::default())
        .unwrap();
    assert_eq!(report.warning, None);
    let expected = vector(&[2.0, 1.0]) / 5f64.sqrt();
    assert_relative_eq!(report.x, expected, epsilon = 1e-5);
    assert_eq!(report.h_count, 0);
}

/// `$\frac{1}{2}(\vec{x} - \vec{c})^\top\mathbf{Q}(\vec{x} - \vec{c})$`, centred
/// at `$\vec{c} = (1, -2)$`.
fn skewed_bowl(x: &DVector<f64>) -> f64 {
    let d = x - vector(&[1.0, -2.0]);
    0.5 * d.dot(&(skewed_q() * &d))
}

fn skewed_bowl_gradient(x: &DVector<f64>) -> DVector<f64> {
    skewed_q() * (x - vector(&[1.0, -2.0]))
}

fn skewed_q() -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0])
}

#[test]
fn inner_warning_ends_the_outer_loop() {
    // x0 >= 2, steepest descent zigzags along the wall until its budget is spent
    let constraints = LinearConstraints::new(DMatrix::from_row_slice(1, 2, &[1.0, 0.0]), vector(&[2.0])).unwrap();
    let options = MinimizerOptions::new();
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let run = Run {
        oracle: Oracle::new(&skewed_bowl).with_gradient(&skewed_bowl_gradient),
        constraints: &constraints,
        inner: Algorithm::SteepestDescent,
        inner_options: &inner_options,
        options: &options,
        tunables: &tunables,
    };

    let report = run.log_barrier(vector(&[4.0, 3.0]), &LogBarrierConfig::default()).unwrap();
    assert_eq!(report.warning, Some(Warning::MaxIterations));
    assert_eq!(report.iterations, 500);
    assert!(report.x[0] > 2.0);
    assert!(report.f > 1.25);

    let report = run
        .method_of_multipliers(vector(&[4.0, 3.0]), &MultipliersConfig::default())
        .unwrap();
    assert_eq!(report.warning, Some(Warning::MaxIterations));
    assert_eq!(report.iterations, 500);
}

#[test]
fn constraints_must_match_the_parameters() {
    let options = MinimizerOptions::new();
    let (inner_options, tunables) = (MinOptions::default(), Tunables::default());
    let oracle = Oracle::new(&f).with_gradient(&df);

    let wide = LinearConstraints::new(DMatrix::from_row_slice(1, 3, &[1.0, 1.0, 1.0]), vector(&[-1.0])).unwrap();
    let run = bfgs_run(oracle, &wide, &inner_options, &options, &tunables);
    let result = run.log_barrier(vector(&[0.0, 0.0]), &LogBarrierConfig::default());
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));

    let narrow = LinearConstraints::from_bounds(&vector(&[-1.0]), &vector(&[1.0])).unwrap();
    let run = bfgs_run(oracle, &narrow, &inner_options, &options, &tunables);
    let result = run.method_of_multipliers(vector(&[0.0, 0.0]), &MultipliersConfig::default());
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));

    // a Jacobian with a column too many
    let dc = |x: &DVector<f64>| DMatrix::from_row_slice(2, 3, &[-2.0 * x[0], -2.0 * x[1], 0.0, 1.0, 0.0, 0.0]);
    let (c, dc) = (disc_c, dc);
    let constraints = NonlinearConstraints::new(&c, &dc);
    let run = bfgs_run(oracle, &constraints, &inner_options, &options, &tunables);
    let result = run.method_of_multipliers(vector(&[0.5, 0.0]), &MultipliersConfig::default());
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));
    let result = run.log_barrier(vector(&[0.5, 0.0]), &LogBarrierConfig::default());
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));
}
