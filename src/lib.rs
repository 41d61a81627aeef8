//! Unconstrained, constrained and global minimisers built on
//! [nalgebra](https://nalgebra.org).
//!
//! The algorithms solve
//! ```math
//! \min_{\vec{x}\in\R^n} f(\vec{x}),
//! ```
//! optionally subject to inequality constraints `$c_i(\vec{x}) \geq 0$`, for a
//! user supplied objective `$f\!:\R^n\to\R$`.
//!
//! # Inputs
//!
//! The problem is given as an [`Oracle`]: the function `$f$` and, depending
//! on the algorithm, its gradient `$\nabla f$` and Hessian `$\nabla^2 f$`.
//! Any extra data the objective needs is captured by the closures.
//!
//! Every minimiser is selected through [`Minimizer`], either by [`Algorithm`]
//! or by a spelling-tolerant name such as `"BFGS"`, `"newton"` or
//! `"Polak-Ribiere+"`. Algorithm specific settings go into [`MinOptions`]
//! (line search, Hessian modification, trust-region Hessian type, inner
//! algorithm of the constrained methods) and the termination settings into
//! [`MinimizerOptions`].
//!
//! | Family | Algorithms |
//! |---|---|
//! | Line search | coordinate descent, steepest descent, BFGS, Newton, Newton-CG, Fletcher-Reeves, Polak-Ribiere, Polak-Ribiere +, Hestenes-Stiefel |
//! | Trust region | Cauchy point, dogleg, CG-Steihaug, exact |
//! | Derivative free | Nelder-Mead simplex, simulated annealing, [`grid`] search |
//! | Least squares | Levenberg-Marquardt on [`chi2`] |
//! | Constrained | logarithmic barrier, method of multipliers |
//!
//! # Usage Example
//!
//! We minimise the [Rosenbrock function](https://en.wikipedia.org/wiki/Rosenbrock_function)
//! `$f(x, y) = 100(y - x^2)^2 + (1 - x)^2$` with Newton's method.
//!
//! ```
//! # use nalgebra::{DMatrix, DVector};
//! # use minimize::{Minimizer, MinimizerOptions, Oracle};
//! let f = |p: &DVector<f64>| 100.0 * (p[1] - p[0] * p[0]).powi(2) + (1.0 - p[0]).powi(2);
//! let df = |p: &DVector<f64>| {
//!     DVector::from_vec(vec![
//!         -400.0 * p[0] * (p[1] - p[0] * p[0]) - 2.0 * (1.0 - p[0]),
//!         200.0 * (p[1] - p[0] * p[0]),
//!     ])
//! };
//! let d2f = |p: &DVector<f64>| {
//!     DMatrix::from_row_slice(2, 2, &[
//!         1200.0 * p[0] * p[0] - 400.0 * p[1] + 2.0, -400.0 * p[0],
//!         -400.0 * p[0], 200.0,
//!     ])
//! };
//!
//! let report = Minimizer::from_name("Newton")
//!     .unwrap()
//!     .with_options(MinimizerOptions::new().with_maxiter(1000))
//!     .minimize(
//!         Oracle::new(&f).with_gradient(&df).with_hessian(&d2f),
//!         DVector::from_vec(vec![-1.2, 1.0]),
//!     )
//!     .unwrap();
//! assert!(report.warning.is_none());
//! assert!((report.x[0] - 1.0).abs() < 1e-6);
//! assert!((report.x[1] - 1.0).abs() < 1e-6);
//! ```
//!
//! # Errors and warnings
//!
//! Configuration problems are detected before the first iteration and returned
//! as a [`MinimizeError`]. A run which starts always returns a
//! [`MinimizationReport`] with the best point found; abnormal termination is
//! signalled by its [`Warning`].
//!
//! # Derivative checking
//!
//! Hand-written gradients can be checked against [`numerical_gradient`] and
//! Hessians against [`numerical_hessian`].
mod annealing;
mod chi2;
mod constrained;
mod convergence;
mod descent;
mod error;
mod generic;
mod grid;
mod hessian_mods;
mod iteration;
mod line_search;
mod lm;
mod options;
mod problem;
mod simplex;
mod trust_region;
mod utils;

pub use annealing::AnnealingConfig;
pub use chi2::{chi2, d2chi2, dchi2};
pub use constrained::{
    ConstraintFn, ConstraintHessiansFn, ConstraintJacobianFn, InequalityConstraints,
    LinearConstraints, LogBarrierConfig, MultipliersConfig, NonlinearConstraints,
};
pub use convergence::ConvergenceTest;
pub use error::{MinimizeError, Warning};
pub use generic::{Algorithm, Minimizer};
pub use grid::{grid, grid_point_array, GridSpec};
pub use iteration::{MinimizationReport, MinimizerOptions};
pub use line_search::LineSearchConfig;
pub use lm::LevenbergMarquardt;
pub use options::{HessianModKind, HessianType, LineSearchKind, MinOptions};
pub use problem::{GradientFn, HessianFn, JacobianFn, ObjectiveFn, Oracle};
pub use trust_region::TrustRegionConfig;
pub use utils::{derivative, numerical_gradient, numerical_hessian};
