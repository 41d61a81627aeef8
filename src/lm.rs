//! Levenberg-Marquardt for chi-squared targets.
use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};

use crate::{
    convergence::ConvergenceTest,
    iteration::{iterate, MinimizationReport, MinimizerOptions, Solver},
    problem::{Evaluator, JacobianFn, Oracle},
    MinimizeError, Warning,
};

#[cfg(test)]
mod test_helpers;
#[cfg(test)]
mod test_steps;

const LAMBDA_MIN: f64 = 1e-99;
const LAMBDA_MAX: f64 = 1e99;

/// Levenberg-Marquardt optimization algorithm.
///
/// Minimises a chi-squared function
/// ```math
///   \chi^2(\theta) = \sum_{i=1}^m \frac{(y_i - y_i(\theta))^2}{\sigma_i^2}
/// ```
/// given as the function and gradient of an [`Oracle`](crate::Oracle), the
/// Jacobian `$\partial y_i/\partial\theta_j$` of the back-calculated values and
/// the errors `$\sigma_i$`.
///
/// Each iteration solves the damped normal equations
/// ```math
///   \sum_k \alpha_{jk}\,\delta\theta_k = -\frac{1}{2}\frac{\partial\chi^2}{\partial\theta_j},
///   \qquad
///   \alpha_{jk} = \sum_i \frac{1}{\sigma_i^2}\frac{\partial y_i}{\partial\theta_j}\frac{\partial y_i}{\partial\theta_k}(1 + \lambda\delta_{jk}).
/// ```
/// A step which does not increase `$\chi^2$` is taken and `$\lambda$` shrinks,
/// any other step is rejected and `$\lambda$` grows. The gradient and the
/// Jacobian are only evaluated again after a taken step.
///
/// Jacobian evaluations are counted as gradient calls.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LevenbergMarquardt {
    lambda0: f64,
    shrink: f64,
    grow: f64,
}

impl LevenbergMarquardt {
    pub fn new() -> Self {
        Self {
            lambda0: 1e-3,
            shrink: 0.1,
            grow: 10.0,
        }
    }

    /// Set the initial damping `$\lambda_0$`.
    ///
    /// # Panics
    ///
    /// Panics if `$\lambda_0 \leq 0$`.
    pub fn with_lambda0(self, lambda0: f64) -> Self {
        assert!(lambda0 > 0.0, "lambda0 must be > 0");
        Self { lambda0, ..self }
    }

    /// Set the factor applied to `$\lambda$` after a taken step.
    ///
    /// # Panics
    ///
    /// Panics unless `$0 < \mathtt{shrink} < 1$`.
    pub fn with_shrink(self, shrink: f64) -> Self {
        assert!(shrink > 0.0 && shrink < 1.0, "shrink must be in (0, 1)");
        Self { shrink, ..self }
    }

    /// Set the factor applied to `$\lambda$` after a rejected step.
    ///
    /// # Panics
    ///
    /// Panics if `$\mathtt{grow} \leq 1$`.
    pub fn with_grow(self, grow: f64) -> Self {
        assert!(grow > 1.0, "grow must be > 1");
        Self { grow, ..self }
    }

    /// Try to minimise the chi-squared function from `x0`.
    ///
    /// # Errors
    ///
    /// Fails before iterating if no tolerance is set, if an error is not
    /// positive or if the Jacobian does not have one row per error and one
    /// column per parameter.
    pub fn minimize(
        &self,
        oracle: Oracle<'_>,
        jacobian: &JacobianFn<'_>,
        errors: &DVector<f64>,
        x0: DVector<f64>,
        options: &MinimizerOptions,
    ) -> Result<MinimizationReport, MinimizeError> {
        let mut ev = Evaluator::new(oracle);
        self.minimize_counted(&mut ev, jacobian, errors, x0, options)
    }

    pub(crate) fn minimize_counted(
        &self,
        ev: &mut Evaluator<'_>,
        jacobian: &JacobianFn<'_>,
        errors: &DVector<f64>,
        x0: DVector<f64>,
        options: &MinimizerOptions,
    ) -> Result<MinimizationReport, MinimizeError> {
        options.convergence_test()?;
        if errors.iter().any(|&sigma| !(sigma > 0.0)) {
            return Err(MinimizeError::InvalidOptions {
                algorithm: "Levenberg-Marquardt",
                reason: "the errors must be positive".into(),
            });
        }
        let mut solver = LM::new(self, ev, jacobian, errors, x0)?;
        iterate(&mut solver, ev, options)
    }
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new()
    }
}

fn counted_jacobian(
    ev: &mut Evaluator<'_>,
    jacobian: &JacobianFn<'_>,
    x: &DVector<f64>,
) -> DMatrix<f64> {
    ev.g_count += 1;
    jacobian(x)
}

/// The iteration state of [`LevenbergMarquardt`].
pub(crate) struct LM<'j, 'a> {
    config: LevenbergMarquardt,
    jacobian: &'j JacobianFn<'a>,
    /// `$1/\sigma_i^2$`
    weights: DVector<f64>,
    lambda: f64,

    x: DVector<f64>,
    f: f64,
    g: DVector<f64>,
    /// Undamped `$\alpha$`, recomputed after every taken step.
    alpha: DMatrix<f64>,

    x_new: DVector<f64>,
    f_new: f64,
}

impl<'j, 'a> LM<'j, 'a> {
    pub fn new(
        config: &LevenbergMarquardt,
        ev: &mut Evaluator<'_>,
        jacobian: &'j JacobianFn<'a>,
        errors: &DVector<f64>,
        x0: DVector<f64>,
    ) -> Result<Self, MinimizeError> {
        let f = ev.func(&x0);
        let g = ev.gradient(&x0);
        let jac = counted_jacobian(ev, jacobian, &x0);
        if jac.nrows() != errors.len() || jac.ncols() != x0.len() {
            return Err(MinimizeError::DimensionMismatch(format!(
                "the Jacobian is {}x{}, expected {}x{}",
                jac.nrows(),
                jac.ncols(),
                errors.len(),
                x0.len()
            )));
        }
        let weights = errors.map(|sigma| 1.0 / (sigma * sigma));
        let alpha = weighted_normal_matrix(&jac, &weights);
        Ok(Self {
            config: *config,
            jacobian,
            weights,
            lambda: config.lambda0,
            x_new: x0.clone(),
            f_new: f,
            x: x0,
            f,
            g,
            alpha,
        })
    }

    fn damped(&self) -> DMatrix<f64> {
        let mut damped = self.alpha.clone();
        for j in 0..damped.nrows() {
            damped[(j, j)] *= 1.0 + self.lambda;
        }
        damped
    }

    fn step(&self) -> Result<DVector<f64>, Warning> {
        let beta = &self.g * -0.5;
        let damped = self.damped();
        match Cholesky::<f64, Dyn>::new(damped.clone()) {
            Some(factor) => Ok(factor.solve(&beta)),
            None => damped.lu().solve(&beta).ok_or_else(Warning::singular),
        }
    }
}

/// `$\mathbf{J}^\top\mathbf{W}\mathbf{J}$` with `$\mathbf{W} = \operatorname{diag}(w)$`.
fn weighted_normal_matrix(jacobian: &DMatrix<f64>, weights: &DVector<f64>) -> DMatrix<f64> {
    let mut weighted = jacobian.clone();
    for (mut row, &w) in weighted.row_iter_mut().zip(weights.iter()) {
        row *= w;
    }
    jacobian.tr_mul(&weighted)
}

impl Solver for LM<'_, '_> {
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        let delta = self.step()?;
        self.x_new = &self.x + delta;
        self.f_new = ev.func(&self.x_new);
        Ok(())
    }

    fn update(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        if self.f_new <= self.f {
            self.x = self.x_new.clone();
            self.f = self.f_new;
            self.g = ev.gradient(&self.x);
            let jac = counted_jacobian(ev, self.jacobian, &self.x);
            self.alpha = weighted_normal_matrix(&jac, &self.weights);
            self.lambda = (self.lambda * self.config.shrink).max(LAMBDA_MIN);
        } else {
            self.lambda = (self.lambda * self.config.grow).min(LAMBDA_MAX);
        }
        Ok(())
    }

    fn current(&self) -> (&DVector<f64>, f64) {
        (&self.x, self.f)
    }

    fn trial(&self) -> (&DVector<f64>, f64) {
        (&self.x_new, self.f_new)
    }

    fn trial_gradient(&self) -> Option<&DVector<f64>> {
        None
    }

    fn converged(&self, test: &ConvergenceTest) -> bool {
        test.converged_on_accepted(self.f_new, self.f, None)
    }
}
