use nalgebra::{DMatrix, DVector};

use super::*;
use crate::problem::Oracle;

fn rosenbrock(x: &DVector<f64>) -> f64 {
    (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2)
}

fn rosenbrock_gradient(x: &DVector<f64>) -> DVector<f64> {
    DVector::from_vec(vec![
        -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
        200.0 * (x[1] - x[0] * x[0]),
    ])
}

fn assert_strong_wolfe(
    f: &dyn Fn(&DVector<f64>) -> f64,
    df: &dyn Fn(&DVector<f64>) -> DVector<f64>,
    x: &DVector<f64>,
    p: &DVector<f64>,
    kind: LineSearchKind,
    params: LineSearchParams,
) {
    let oracle = Oracle::new(f).with_gradient(df);
    let mut ev = Evaluator::new(oracle);
    let g = df(x);
    let f0 = f(x);
    let a = line_search(kind, &mut ev, x, f0, &g, p, &params).unwrap();

    let slope = g.dot(p);
    let x_new = x + p * a;
    assert!(a > 0.0);
    assert!(
        f(&x_new) <= f0 + params.mu * a * slope,
        "{:?}: no sufficient decrease at alpha = {}",
        kind,
        a
    );
    assert!(
        df(&x_new).dot(p).abs() <= params.eta * slope.abs(),
        "{:?}: curvature condition fails at alpha = {}",
        kind,
        a
    );
    assert!(ev.f_count <= 100);
}

fn wolfe_searches() -> [(LineSearchKind, LineSearchParams); 4] {
    [
        (LineSearchKind::MoreThuente, LineSearchParams::new(1e-3, 0.1)),
        (LineSearchKind::MoreThuente, LineSearchParams::new(1e-4, 0.9)),
        (LineSearchKind::NocedalWrightWolfe, LineSearchParams::new(1e-4, 0.1)),
        (LineSearchKind::NocedalWrightWolfe, LineSearchParams::new(1e-4, 0.9)),
    ]
}

#[test]
fn steepest_descent_on_rosenbrock() {
    for x in [DVector::from_vec(vec![-1.2, 1.0]), DVector::from_vec(vec![0.0, 0.0])] {
        let p = -rosenbrock_gradient(&x);
        for (kind, params) in wolfe_searches() {
            assert_strong_wolfe(&rosenbrock, &rosenbrock_gradient, &x, &p, kind, params);
        }
    }
}

#[test]
fn unit_direction_on_rosenbrock() {
    let x = DVector::from_vec(vec![-1.2, 1.0]);
    let g = rosenbrock_gradient(&x);
    let p = -&g / g.norm();
    for (kind, params) in wolfe_searches() {
        assert_strong_wolfe(&rosenbrock, &rosenbrock_gradient, &x, &p, kind, params);
    }
}

#[test]
fn steepest_descent_on_quadratic_bowl() {
    let q = DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0]);
    let centre = DVector::from_vec(vec![1.0, -2.0]);
    let f = |x: &DVector<f64>| 0.5 * (x - &centre).dot(&(&q * (x - &centre)));
    let df = |x: &DVector<f64>| &q * (x - &centre);
    let x = DVector::from_vec(vec![4.0, 3.0]);
    let p = -df(&x);
    for (kind, params) in wolfe_searches() {
        assert_strong_wolfe(&f, &df, &x, &p, kind, params);
    }
}

#[test]
fn fixed_step_without_search() {
    let f = |x: &DVector<f64>| x.norm_squared();
    let mut ev = Evaluator::new(Oracle::new(&f));
    let x = DVector::from_vec(vec![1.0]);
    let g = DVector::from_vec(vec![2.0]);
    let p = -&g;
    let params = LineSearchParams {
        a_init: 0.25,
        ..LineSearchParams::new(1e-4, 0.9)
    };
    let a = line_search(LineSearchKind::None, &mut ev, &x, 1.0, &g, &p, &params).unwrap();
    assert_eq!(a, 0.25);
    assert_eq!((ev.f_count, ev.g_count), (0, 0));
}
