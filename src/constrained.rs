//! Inequality constraints and the constrained minimisers.
//!
//! Both wrappers repeatedly minimise an augmented objective with an inner
//! unconstrained [`Algorithm`], tightening the augmentation between the
//! inner runs. The reported iteration count is the sum of the inner ones.
//!
//! The first inner run ending with a warning stops the outer loop, and its
//! warning becomes the warning of the whole run.
use nalgebra::{DMatrix, DVector};

use crate::{
    generic::{run_unconstrained, Algorithm, Tunables},
    iteration::{MinimizationReport, MinimizerOptions},
    options::MinOptions,
    problem::{Evaluator, GradientFn, HessianFn, ObjectiveFn, Oracle},
    MinimizeError, Warning,
};

mod log_barrier;
mod multipliers;

#[cfg(test)]
mod test_wrappers;

/// Constraint values `$c_i(\vec{x})$`.
pub type ConstraintFn<'a> = dyn Fn(&DVector<f64>) -> DVector<f64> + 'a;
/// Constraint gradients as the rows of an `$m\times n$` matrix.
pub type ConstraintJacobianFn<'a> = dyn Fn(&DVector<f64>) -> DMatrix<f64> + 'a;
/// One `$n\times n$` Hessian per constraint.
pub type ConstraintHessiansFn<'a> = dyn Fn(&DVector<f64>) -> Vec<DMatrix<f64>> + 'a;

/// Inequality constraints `$c_i(\vec{x}) \geq 0$`, `$i = 1, \ldots, m$`.
pub trait InequalityConstraints {
    fn values(&self, x: &DVector<f64>) -> DVector<f64>;

    /// Row `i` is `$\nabla c_i(\vec{x})^\top$`.
    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64>;

    /// Hessians of the constraints, `None` if they all vanish.
    fn hessians(&self, x: &DVector<f64>) -> Option<Vec<DMatrix<f64>>>;

    /// Number of parameters, if known without evaluating the constraints.
    fn parameters(&self) -> Option<usize> {
        None
    }
}

/// Linear constraints `$\mathbf{A}\vec{x} \geq \vec{b}$`.
///
/// ```
/// # use nalgebra::{DMatrix, DVector};
/// # use minimize::LinearConstraints;
/// // 0 <= q <= 1, q >= 1 - 2r and 0 <= r
/// let constraints = LinearConstraints::new(
///     DMatrix::from_row_slice(4, 2, &[1.0, 0.0, -1.0, 0.0, 1.0, 2.0, 0.0, 1.0]),
///     DVector::from_vec(vec![0.0, -1.0, 1.0, 0.0]),
/// )
/// .unwrap();
/// assert!(constraints.satisfied(&DVector::from_vec(vec![0.5, 0.5])));
/// assert!(!constraints.satisfied(&DVector::from_vec(vec![0.5, 0.2])));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct LinearConstraints {
    a: DMatrix<f64>,
    b: DVector<f64>,
}

impl LinearConstraints {
    /// # Errors
    ///
    /// Fails unless `A` has one row per element of `b`.
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Result<Self, MinimizeError> {
        if a.nrows() != b.len() {
            return Err(MinimizeError::DimensionMismatch(format!(
                "A has {} rows but b has {} elements",
                a.nrows(),
                b.len()
            )));
        }
        Ok(Self { a, b })
    }

    /// The constraints `$x_i \geq l_i$` and `$-x_i \geq -u_i$`, skipping
    /// infinite bounds.
    ///
    /// # Errors
    ///
    /// Fails if the bounds differ in length.
    pub fn from_bounds(lower: &DVector<f64>, upper: &DVector<f64>) -> Result<Self, MinimizeError> {
        let n = lower.len();
        if upper.len() != n {
            return Err(MinimizeError::DimensionMismatch(format!(
                "{} lower but {} upper bounds",
                n,
                upper.len()
            )));
        }
        let mut rows = Vec::new();
        for i in 0..n {
            if lower[i].is_finite() {
                rows.push((i, 1.0, lower[i]));
            }
            if upper[i].is_finite() {
                rows.push((i, -1.0, -upper[i]));
            }
        }
        let mut a = DMatrix::zeros(rows.len(), n);
        let mut b = DVector::zeros(rows.len());
        for (row, &(i, sign, bound)) in rows.iter().enumerate() {
            a[(row, i)] = sign;
            b[row] = bound;
        }
        Self::new(a, b)
    }

    pub fn a(&self) -> &DMatrix<f64> {
        &self.a
    }

    pub fn b(&self) -> &DVector<f64> {
        &self.b
    }

    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// `$\mathbf{A}\vec{x} - \vec{b}$`.
    pub fn evaluate(&self, x: &DVector<f64>) -> DVector<f64> {
        &self.a * x - &self.b
    }

    /// Whether `$\mathbf{A}\vec{x} \geq \vec{b}$` holds.
    pub fn satisfied(&self, x: &DVector<f64>) -> bool {
        self.evaluate(x).iter().all(|&c| c >= 0.0)
    }
}

impl InequalityConstraints for LinearConstraints {
    fn values(&self, x: &DVector<f64>) -> DVector<f64> {
        self.evaluate(x)
    }

    fn jacobian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
        self.a.clone()
    }

    fn hessians(&self, _x: &DVector<f64>) -> Option<Vec<DMatrix<f64>>> {
        None
    }

    fn parameters(&self) -> Option<usize> {
        Some(self.a.ncols())
    }
}

/// General constraints `$c_i(\vec{x}) \geq 0$` given as callbacks.
#[derive(Clone, Copy)]
pub struct NonlinearConstraints<'a> {
    c: &'a ConstraintFn<'a>,
    dc: &'a ConstraintJacobianFn<'a>,
    d2c: Option<&'a ConstraintHessiansFn<'a>>,
}

impl<'a> NonlinearConstraints<'a> {
    pub fn new(c: &'a ConstraintFn<'a>, dc: &'a ConstraintJacobianFn<'a>) -> Self {
        Self { c, dc, d2c: None }
    }

    /// Without constraint Hessians, the Hessian of the augmented objective
    /// drops their terms.
    pub fn with_hessians(self, d2c: &'a ConstraintHessiansFn<'a>) -> Self {
        Self {
            d2c: Some(d2c),
            ..self
        }
    }
}

impl InequalityConstraints for NonlinearConstraints<'_> {
    fn values(&self, x: &DVector<f64>) -> DVector<f64> {
        (self.c)(x)
    }

    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        (self.dc)(x)
    }

    fn hessians(&self, x: &DVector<f64>) -> Option<Vec<DMatrix<f64>>> {
        self.d2c.map(|d2c| d2c(x))
    }
}

/// Tunables of the logarithmic barrier method.
///
/// The defaults are `$\epsilon_0 = 10^{-5}$`, a scale of `$10^{-2}$` and 500
/// inner iterations.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LogBarrierConfig {
    pub(crate) epsilon0: f64,
    pub(crate) scale_epsilon: f64,
    pub(crate) inner_maxiter: usize,
}

impl LogBarrierConfig {
    pub fn new() -> Self {
        Self {
            epsilon0: 1e-5,
            scale_epsilon: 1e-2,
            inner_maxiter: 500,
        }
    }

    /// # Panics
    ///
    /// Panics if `$\epsilon_0 \leq 0$`.
    pub fn with_epsilon0(self, epsilon0: f64) -> Self {
        assert!(epsilon0 > 0.0, "epsilon0 must be > 0");
        Self { epsilon0, ..self }
    }

    /// # Panics
    ///
    /// Panics unless the scale is in `$(0, 1)$`.
    pub fn with_scale_epsilon(self, scale_epsilon: f64) -> Self {
        assert!(scale_epsilon > 0.0 && scale_epsilon < 1.0, "scale_epsilon must be in (0, 1)");
        Self { scale_epsilon, ..self }
    }

    /// # Panics
    ///
    /// Panics if `inner_maxiter` is zero.
    pub fn with_inner_maxiter(self, inner_maxiter: usize) -> Self {
        assert!(inner_maxiter > 0, "inner_maxiter must be > 0");
        Self { inner_maxiter, ..self }
    }
}

impl Default for LogBarrierConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables of the method of multipliers.
///
/// `mu` is the penalty parameter, `epsilon` and `gamma` bound the gradient
/// tolerance of each inner run. All three shrink by their scale after every
/// outer iteration. Multipliers of constraints violated at the start are set
/// to `init_lambda`, the others to zero.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MultipliersConfig {
    pub(crate) mu0: f64,
    pub(crate) epsilon0: f64,
    pub(crate) gamma0: f64,
    pub(crate) scale_mu: f64,
    pub(crate) scale_epsilon: f64,
    pub(crate) scale_gamma: f64,
    pub(crate) init_lambda: f64,
    pub(crate) inner_maxiter: usize,
}

impl MultipliersConfig {
    pub fn new() -> Self {
        Self {
            mu0: 1e-5,
            epsilon0: 1e-2,
            gamma0: 1e-2,
            scale_mu: 0.5,
            scale_epsilon: 1e-2,
            scale_gamma: 1e-2,
            init_lambda: 1e4,
            inner_maxiter: 500,
        }
    }

    /// # Panics
    ///
    /// Panics if `$\mu_0 \leq 0$`.
    pub fn with_mu0(self, mu0: f64) -> Self {
        assert!(mu0 > 0.0, "mu0 must be > 0");
        Self { mu0, ..self }
    }

    /// # Panics
    ///
    /// Panics if `$\epsilon_0 \leq 0$`.
    pub fn with_epsilon0(self, epsilon0: f64) -> Self {
        assert!(epsilon0 > 0.0, "epsilon0 must be > 0");
        Self { epsilon0, ..self }
    }

    /// # Panics
    ///
    /// Panics if `$\gamma_0 \leq 0$`.
    pub fn with_gamma0(self, gamma0: f64) -> Self {
        assert!(gamma0 > 0.0, "gamma0 must be > 0");
        Self { gamma0, ..self }
    }

    /// Set the scales of `mu`, `epsilon` and `gamma`.
    ///
    /// # Panics
    ///
    /// Panics unless every scale is in `$(0, 1)$`.
    pub fn with_scales(self, scale_mu: f64, scale_epsilon: f64, scale_gamma: f64) -> Self {
        for scale in [scale_mu, scale_epsilon, scale_gamma] {
            assert!(scale > 0.0 && scale < 1.0, "scales must be in (0, 1)");
        }
        Self {
            scale_mu,
            scale_epsilon,
            scale_gamma,
            ..self
        }
    }

    /// # Panics
    ///
    /// Panics if the initial multiplier is negative.
    pub fn with_init_lambda(self, init_lambda: f64) -> Self {
        assert!(init_lambda >= 0.0, "init_lambda must be >= 0");
        Self { init_lambda, ..self }
    }

    /// # Panics
    ///
    /// Panics if `inner_maxiter` is zero.
    pub fn with_inner_maxiter(self, inner_maxiter: usize) -> Self {
        assert!(inner_maxiter > 0, "inner_maxiter must be > 0");
        Self { inner_maxiter, ..self }
    }
}

impl Default for MultipliersConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a constrained minimisation needs besides its own tunables.
pub(crate) struct Run<'r, 'a> {
    pub oracle: Oracle<'a>,
    pub constraints: &'r dyn InequalityConstraints,
    pub inner: Algorithm,
    pub inner_options: &'r MinOptions<'r>,
    pub options: &'r MinimizerOptions,
    pub tunables: &'r Tunables,
}

impl Run<'_, '_> {
    /// The constraint Jacobian at `x0` must have one column per parameter.
    fn check_dimensions(&self, x0: &DVector<f64>) -> Result<(), MinimizeError> {
        let n = x0.len();
        if let Some(columns) = self.constraints.parameters() {
            if columns != n {
                return Err(MinimizeError::DimensionMismatch(format!(
                    "{} parameters but the constraints act on {}",
                    n, columns
                )));
            }
        }
        let m = self.constraints.values(x0).len();
        let (rows, columns) = self.constraints.jacobian(x0).shape();
        if (rows, columns) != (m, n) {
            return Err(MinimizeError::DimensionMismatch(format!(
                "{} constraints on {} parameters but a {}x{} constraint Jacobian",
                m, n, rows, columns
            )));
        }
        Ok(())
    }

    /// Options of the next inner run, given the outer iterations spent.
    fn inner_run_options(&self, spent: usize, inner_maxiter: usize) -> MinimizerOptions {
        let remaining = self.options.maxiter.saturating_sub(spent).max(1);
        self.options
            .with_maxiter(remaining.min(inner_maxiter))
            .with_verbosity(self.options.verbosity.saturating_sub(1))
    }

    /// The oracle of an augmented objective, with derivatives only where the
    /// user supplied them.
    fn augmented<'o>(
        &self,
        value: &'o ObjectiveFn<'o>,
        gradient: &'o GradientFn<'o>,
        hessian: &'o HessianFn<'o>,
    ) -> Oracle<'o> {
        let mut oracle = Oracle::new(value);
        if self.oracle.has_gradient() {
            oracle = oracle.with_gradient(gradient);
        }
        if self.oracle.has_hessian() {
            oracle = oracle.with_hessian(hessian);
        }
        oracle
    }

    /// Minimise an augmented objective with the inner algorithm.
    fn inner_run(
        &self,
        oracle: Oracle<'_>,
        x0: DVector<f64>,
        options: &MinimizerOptions,
    ) -> Result<MinimizationReport, MinimizeError> {
        let mut ev = Evaluator::new(oracle);
        let report = run_unconstrained(self.inner, &mut ev, x0, self.inner_options, options, self.tunables)?;
        report.log(options.verbosity);
        if let Some(warning) = &report.warning {
            log::debug!("{}: {}", self.inner.name(), warning);
        }
        Ok(report)
    }
}

/// Iteration and evaluation counts summed over the inner runs.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Totals {
    iterations: usize,
    f_count: usize,
    g_count: usize,
    h_count: usize,
}

impl Totals {
    fn add(&mut self, report: &MinimizationReport) {
        self.iterations += report.iterations;
        self.f_count += report.f_count;
        self.g_count += report.g_count;
        self.h_count += report.h_count;
    }

    fn report(
        &self,
        x: DVector<f64>,
        f: f64,
        warning: Option<Warning>,
    ) -> MinimizationReport {
        MinimizationReport {
            x,
            f,
            iterations: self.iterations,
            f_count: self.f_count,
            g_count: self.g_count,
            h_count: self.h_count,
            warning,
        }
    }
}
