use nalgebra::{DMatrix, DVector};

use super::*;
use crate::constrained::LinearConstraints;

fn bowl(x: &DVector<f64>) -> f64 {
    let (a, b) = (x[0] - 1.0, x[1] + 2.0);
    1.5 * a * a + a * b + b * b
}

fn bowl_gradient(x: &DVector<f64>) -> DVector<f64> {
    let (a, b) = (x[0] - 1.0, x[1] + 2.0);
    DVector::from_vec(vec![3.0 * a + b, a + 2.0 * b])
}

fn bowl_hessian(_x: &DVector<f64>) -> DMatrix<f64> {
    DMatrix::from_row_slice(2, 2, &[3.0, 1.0, 1.0, 2.0])
}

fn x0() -> DVector<f64> {
    DVector::from_vec(vec![4.0, 3.0])
}

#[test]
fn spelling_table() {
    let table = [
        ("cd", Algorithm::CoordinateDescent),
        ("Coordinate-Descent", Algorithm::CoordinateDescent),
        ("SD", Algorithm::SteepestDescent),
        ("steepest_descent", Algorithm::SteepestDescent),
        ("BFGS", Algorithm::Bfgs),
        ("Newton", Algorithm::Newton),
        ("NCG", Algorithm::NewtonCg),
        ("newton-cg", Algorithm::NewtonCg),
        ("Cauchy point", Algorithm::CauchyPoint),
        ("dogleg", Algorithm::Dogleg),
        ("CG-Steihaug", Algorithm::Steihaug),
        ("steihaug", Algorithm::Steihaug),
        ("Exact trust region", Algorithm::ExactTrustRegion),
        ("FR", Algorithm::FletcherReeves),
        ("Fletcher-Reeves", Algorithm::FletcherReeves),
        ("pr", Algorithm::PolakRibiere),
        ("Polak-Ribiere", Algorithm::PolakRibiere),
        ("PR+", Algorithm::PolakRibierePlus),
        ("Polak-Ribiere+", Algorithm::PolakRibierePlus),
        ("hs", Algorithm::HestenesStiefel),
        ("Hestenes_Stiefel", Algorithm::HestenesStiefel),
        ("Simplex", Algorithm::Simplex),
        ("LM", Algorithm::LevenbergMarquardt),
        ("Levenberg-Marquardt", Algorithm::LevenbergMarquardt),
        ("levenburg_marquardt", Algorithm::LevenbergMarquardt),
        ("MoM", Algorithm::MethodOfMultipliers),
        ("Method of Multipliers", Algorithm::MethodOfMultipliers),
        ("Log barrier", Algorithm::LogBarrier),
        ("SA", Algorithm::SimulatedAnnealing),
        ("simulated annealing", Algorithm::SimulatedAnnealing),
    ];
    for (name, algorithm) in table {
        assert_eq!(name.parse(), Ok(algorithm), "{}", name);
    }
}

#[test]
fn unknown_algorithm() {
    assert_eq!(
        Minimizer::from_name("Nelder-Mead").err(),
        Some(MinimizeError::UnknownAlgorithm("Nelder-Mead".into()))
    );
    assert!("".parse::<Algorithm>().is_err());
    assert!("bfgs2".parse::<Algorithm>().is_err());
}

#[test]
fn default_line_searches() {
    assert_eq!(Algorithm::Bfgs.default_line_search(), (LineSearchKind::Backtracking, 1e-4, 0.9));
    assert_eq!(Algorithm::Newton.default_line_search(), (LineSearchKind::MoreThuente, 1e-4, 0.9));
    assert_eq!(Algorithm::PolakRibierePlus.default_line_search(), (LineSearchKind::NocedalWrightWolfe, 1e-4, 0.1));
    assert_eq!(Algorithm::SteepestDescent.default_line_search(), (LineSearchKind::Backtracking, 1e-4, 0.1));
}

#[test]
fn unused_options_are_rejected() {
    let oracle_f = bowl;
    let oracle = Oracle::new(&oracle_f).with_gradient(&bowl_gradient).with_hessian(&bowl_hessian);
    let cases = [
        (Algorithm::Dogleg, MinOptions::new().with_line_search(LineSearchKind::MoreThuente)),
        (Algorithm::Bfgs, MinOptions::new().with_hessian_type(HessianType::Bfgs)),
        (Algorithm::Bfgs, MinOptions::new().with_hessian_mod(HessianModKind::Gmw)),
        (Algorithm::CauchyPoint, MinOptions::new().with_hessian_mod(HessianModKind::Eigenvalue)),
        (Algorithm::Steihaug, MinOptions::new().with_hessian_mod(HessianModKind::Cholesky)),
        (Algorithm::Simplex, MinOptions::new().with_line_search(LineSearchKind::Backtracking)),
        (Algorithm::Newton, MinOptions::new().with_inner_algorithm(Algorithm::Bfgs)),
    ];
    for (algorithm, options) in cases {
        let result = Minimizer::new(algorithm).with_min_options(options).minimize(oracle, x0());
        assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })), "{}", algorithm);
    }

    let jacobian = |_: &DVector<f64>| DMatrix::zeros(1, 2);
    let options = MinOptions::new().with_least_squares(&jacobian, DVector::from_element(1, 1.0));
    let result = Minimizer::new(Algorithm::Bfgs).with_min_options(options).minimize(oracle, x0());
    assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })));
}

#[test]
fn missing_oracles() {
    let f = bowl;
    let only_f = Oracle::new(&f);
    let with_gradient = Oracle::new(&f).with_gradient(&bowl_gradient);

    let result = Minimizer::new(Algorithm::Bfgs).minimize(only_f, x0());
    assert_eq!(
        result.err(),
        Some(MinimizeError::MissingOracle {
            algorithm: "BFGS",
            oracle: "gradient"
        })
    );
    let result = Minimizer::new(Algorithm::Newton).minimize(with_gradient, x0());
    assert!(matches!(result, Err(MinimizeError::MissingOracle { oracle: "Hessian", .. })));
    let result = Minimizer::new(Algorithm::Dogleg).minimize(with_gradient, x0());
    assert!(matches!(result, Err(MinimizeError::MissingOracle { oracle: "Hessian", .. })));

    // A BFGS model Hessian needs no Hessian oracle and simplex no derivatives.
    let report = Minimizer::new(Algorithm::Dogleg)
        .with_min_options(MinOptions::new().with_hessian_type(HessianType::Bfgs))
        .minimize(with_gradient, x0())
        .unwrap();
    assert_eq!(report.h_count, 0);
    let report = Minimizer::new(Algorithm::Simplex).minimize(only_f, x0()).unwrap();
    assert_eq!((report.g_count, report.h_count), (0, 0));
}

#[test]
fn zero_parameters() {
    let f = |x: &DVector<f64>| x.len() as f64 + 2.0;
    for algorithm in [Algorithm::Newton, Algorithm::LevenbergMarquardt, Algorithm::LogBarrier] {
        let report = Minimizer::new(algorithm).minimize(Oracle::new(&f), DVector::zeros(0)).unwrap();
        assert_eq!(report.f, 2.0);
        assert_eq!(report.warning, Some(Warning::NoOptimisation));
        assert_eq!((report.f_count, report.g_count, report.h_count), (1, 0, 0));
        assert_eq!(report.iterations, 0);
    }
}

#[test]
fn no_tolerance() {
    let f = bowl;
    let options = MinimizerOptions::new().with_func_tol(None);
    for algorithm in [Algorithm::Bfgs, Algorithm::Dogleg, Algorithm::Simplex] {
        let result = Minimizer::new(algorithm)
            .with_options(options)
            .minimize(Oracle::new(&f).with_gradient(&bowl_gradient).with_hessian(&bowl_hessian), x0());
        assert_eq!(result.err(), Some(MinimizeError::NoTolerance));
    }
}

#[test]
fn levenberg_marquardt_needs_least_squares() {
    let f = bowl;
    let oracle = Oracle::new(&f).with_gradient(&bowl_gradient);
    let result = Minimizer::new(Algorithm::LevenbergMarquardt).minimize(oracle, x0());
    assert!(matches!(result, Err(MinimizeError::MissingOracle { oracle: "Jacobian", .. })));

    let jacobian = |_: &DVector<f64>| DMatrix::identity(2, 2);
    let options = MinOptions {
        jacobian: Some(&jacobian),
        ..MinOptions::default()
    };
    let result = Minimizer::new(Algorithm::LevenbergMarquardt)
        .with_min_options(options)
        .minimize(oracle, x0());
    assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })));
}

#[test]
fn constrained_setup() {
    let f = bowl;
    let oracle = Oracle::new(&f).with_gradient(&bowl_gradient);
    let bounded = |minimizer: Minimizer<'static>| minimizer.with_bounds(DVector::from_element(2, -5.0), DVector::from_element(2, 5.0));

    let result = bounded(Minimizer::new(Algorithm::LogBarrier)).minimize(oracle, DVector::zeros(2));
    assert_eq!(result.err(), Some(MinimizeError::MissingInnerAlgorithm("logarithmic barrier function")));

    let inner = MinOptions::new().with_inner_algorithm(Algorithm::LevenbergMarquardt);
    let result = bounded(Minimizer::new(Algorithm::MethodOfMultipliers))
        .with_min_options(inner)
        .minimize(oracle, DVector::zeros(2));
    assert!(matches!(result, Err(MinimizeError::InvalidOptions { .. })));

    let inner = MinOptions::new().with_inner_algorithm(Algorithm::Newton);
    let result = bounded(Minimizer::new(Algorithm::MethodOfMultipliers))
        .with_min_options(inner)
        .minimize(oracle, DVector::zeros(2));
    assert!(matches!(result, Err(MinimizeError::MissingOracle { oracle: "Hessian", .. })));

    let inner = MinOptions::new().with_inner_algorithm(Algorithm::Bfgs);
    let result = Minimizer::new(Algorithm::MethodOfMultipliers)
        .with_min_options(inner)
        .minimize(oracle, DVector::zeros(2));
    assert_eq!(result.err(), Some(MinimizeError::MissingConstraints("method of multipliers")));
}

#[test]
fn constraints_sized_for_other_parameters() {
    let f = bowl;
    let oracle = Oracle::new(&f).with_gradient(&bowl_gradient);
    let inner = MinOptions::new().with_inner_algorithm(Algorithm::Bfgs);

    let wide = LinearConstraints::new(DMatrix::from_row_slice(1, 3, &[1.0, 0.0, 0.0]), DVector::from_element(1, -1.0)).unwrap();
    let result = Minimizer::new(Algorithm::LogBarrier)
        .with_min_options(inner.clone())
        .with_linear_constraints(wide)
        .minimize(oracle, DVector::zeros(2));
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));

    let result = Minimizer::new(Algorithm::MethodOfMultipliers)
        .with_min_options(inner)
        .with_bounds(DVector::from_element(1, -1.0), DVector::from_element(1, 5.0))
        .minimize(oracle, DVector::zeros(2));
    assert!(matches!(result, Err(MinimizeError::DimensionMismatch(_))));
}

#[test]
fn bounds_turn_into_constraints() {
    let f = bowl;
    let oracle = Oracle::new(&f).with_gradient(&bowl_gradient);
    // The bowl minimum (1, -2) lies outside x1 >= -1.
    let report = Minimizer::new(Algorithm::MethodOfMultipliers)
        .with_min_options(MinOptions::new().with_inner_algorithm(Algorithm::Bfgs))
        .with_bounds(DVector::from_element(2, -1.0), DVector::from_element(2, 5.0))
        .minimize(oracle, DVector::zeros(2))
        .unwrap();
    assert_eq!(report.warning, None);
    assert!((report.x[1] + 1.0).abs() < 1e-5);
    assert!((report.x[0] - 2.0 / 3.0).abs() < 1e-5);

    let explicit = LinearConstraints::new(DMatrix::from_row_slice(1, 2, &[0.0, 1.0]), DVector::from_element(1, -1.0)).unwrap();
    let same = Minimizer::new(Algorithm::MethodOfMultipliers)
        .with_min_options(MinOptions::new().with_inner_algorithm(Algorithm::Bfgs))
        .with_linear_constraints(explicit)
        .minimize(oracle, DVector::zeros(2))
        .unwrap();
    assert!((same.x[0] - report.x[0]).abs() < 1e-5);
}

#[test]
fn annealing_needs_bounds() {
    let f = bowl;
    let result = Minimizer::new(Algorithm::SimulatedAnnealing).minimize(Oracle::new(&f), x0());
    assert_eq!(result.err(), Some(MinimizeError::MissingBounds("simulated annealing")));
}
