use approx::assert_relative_eq;
use nalgebra::{DMatrix, DVector};

use super::test_helpers::{MockCall, MockProblem};
use super::*;

fn oracle_parts(
    problem: &MockProblem,
) -> (
    impl Fn(&DVector<f64>) -> f64 + '_,
    impl Fn(&DVector<f64>) -> DVector<f64> + '_,
    impl Fn(&DVector<f64>) -> DMatrix<f64> + '_,
) {
    (
        move |x: &DVector<f64>| problem.chi2(x),
        move |x: &DVector<f64>| problem.dchi2(x),
        move |x: &DVector<f64>| problem.jacobian(x),
    )
}

#[test]
fn setup_evaluates_function_gradient_and_jacobian_once() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let mut ev = Evaluator::new(Oracle::new(&f).with_gradient(&df));
    let lm = LM::new(&LevenbergMarquardt::new(), &mut ev, &jac, &problem.errors, DVector::zeros(2))
        .unwrap();
    assert_eq!(problem.calls(), [MockCall::Func, MockCall::Gradient, MockCall::Jacobian]);
    assert_eq!((ev.f_count, ev.g_count, ev.h_count), (1, 2, 0));
    assert_eq!(lm.lambda, 1e-3);
    // J^T W J for t = 0..3 and sigma = 0.5
    let expected = DMatrix::from_row_slice(2, 2, &[16.0, 24.0, 24.0, 56.0]);
    assert_relative_eq!(lm.alpha, expected, epsilon = 1e-12);
}

#[test]
fn step_solves_damped_normal_equations() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let mut ev = Evaluator::new(Oracle::new(&f).with_gradient(&df));
    let config = LevenbergMarquardt::new().with_lambda0(0.5);
    let mut lm = LM::new(&config, &mut ev, &jac, &problem.errors, DVector::zeros(2)).unwrap();
    lm.new_params(&mut ev).unwrap();

    let damped = DMatrix::from_row_slice(2, 2, &[16.0 * 1.5, 24.0, 24.0, 56.0 * 1.5]);
    let gradient = problem.dchi2(&DVector::zeros(2));
    let expected = damped.lu().solve(&(gradient * -0.5)).unwrap();
    assert_relative_eq!(lm.x_new, expected, epsilon = 1e-12);
    assert_relative_eq!(lm.f_new, problem.chi2(&expected), epsilon = 1e-12);
    assert_eq!(ev.f_count, 2);
}

#[test]
fn rejected_step_grows_lambda_without_new_derivatives() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let mut ev = Evaluator::new(Oracle::new(&f).with_gradient(&df));
    let mut lm =
        LM::new(&LevenbergMarquardt::new(), &mut ev, &jac, &problem.errors, DVector::zeros(2))
            .unwrap();
    lm.new_params(&mut ev).unwrap();
    lm.f_new = lm.f + 1.0;
    lm.update(&mut ev).unwrap();
    assert_relative_eq!(lm.lambda, 1e-2);
    assert_eq!(lm.x, DVector::zeros(2));
    assert_eq!(
        problem.calls(),
        [MockCall::Func, MockCall::Gradient, MockCall::Jacobian, MockCall::Func]
    );
}

#[test]
fn taken_step_shrinks_lambda_and_refreshes_derivatives() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let mut ev = Evaluator::new(Oracle::new(&f).with_gradient(&df));
    let mut lm =
        LM::new(&LevenbergMarquardt::new(), &mut ev, &jac, &problem.errors, DVector::zeros(2))
            .unwrap();
    lm.new_params(&mut ev).unwrap();
    assert!(lm.f_new < lm.f);
    lm.update(&mut ev).unwrap();
    assert_relative_eq!(lm.lambda, 1e-4);
    assert_eq!(lm.x, lm.x_new);
    assert_eq!(&problem.calls()[4..], [MockCall::Gradient, MockCall::Jacobian]);
}

#[test]
fn damping_is_bounded() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let mut ev = Evaluator::new(Oracle::new(&f).with_gradient(&df));
    let mut lm =
        LM::new(&LevenbergMarquardt::new(), &mut ev, &jac, &problem.errors, DVector::zeros(2))
            .unwrap();
    lm.lambda = 1e99;
    lm.f_new = lm.f + 1.0;
    lm.update(&mut ev).unwrap();
    assert_eq!(lm.lambda, 1e99);
    lm.lambda = 1e-99;
    lm.f_new = lm.f;
    lm.update(&mut ev).unwrap();
    assert_eq!(lm.lambda, 1e-99);
}

#[test]
fn fits_a_line() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let report = LevenbergMarquardt::new()
        .minimize(
            Oracle::new(&f).with_gradient(&df),
            &jac,
            &problem.errors,
            DVector::from_vec(vec![5.0, -3.0]),
            &MinimizerOptions::new().with_maxiter(1000),
        )
        .unwrap();
    assert_eq!(report.warning, None);
    assert_relative_eq!(report.x, DVector::from_vec(vec![1.0, 2.0]), epsilon = 1e-10);
    assert!(report.f < 1e-20);
    assert_eq!(report.f_count, problem.count(MockCall::Func));
    assert_eq!(
        report.g_count,
        problem.count(MockCall::Gradient) + problem.count(MockCall::Jacobian)
    );
    assert_eq!(report.h_count, 0);
}

#[test]
fn jacobian_shape_is_checked() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let errors = DVector::from_element(3, 0.5);
    let result = LevenbergMarquardt::new().minimize(
        Oracle::new(&f).with_gradient(&df),
        &jac,
        &errors,
        DVector::zeros(2),
        &MinimizerOptions::new(),
    );
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));
}

#[test]
fn errors_must_be_positive() {
    let problem = MockProblem::exact_line();
    let (f, df, jac) = oracle_parts(&problem);
    let errors = DVector::from_vec(vec![0.5, 0.0, 0.5, 0.5]);
    let result = LevenbergMarquardt::new().minimize(
        Oracle::new(&f).with_gradient(&df),
        &jac,
        &errors,
        DVector::zeros(2),
        &MinimizerOptions::new(),
    );
    assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })));
    assert!(problem.calls().is_empty());
}
