use nalgebra::{DMatrix, DVector};

use super::{InequalityConstraints, MultipliersConfig, Run, Totals};
use crate::{iteration::MinimizationReport, problem::Oracle, MinimizeError, Warning};

const MU_MIN: f64 = 1e-99;

/// The quadratic augmented Lagrangian
/// ```math
///   L_A(\vec{x}, \vec\lambda; \mu) = f(\vec{x}) + \sum_i \psi(c_i(\vec{x}), \lambda_i; \mu),
///   \qquad
///   \psi(t, s; \mu) = \begin{cases}
///     -st + t^2/2\mu & t \leq \mu s, \\
///     -\mu s^2/2 & \text{otherwise}.
///   \end{cases}
/// ```
pub(super) struct Lagrangian<'l, 'a> {
    pub oracle: Oracle<'a>,
    pub constraints: &'l dyn InequalityConstraints,
    pub lambda: &'l DVector<f64>,
    pub mu: f64,
}

impl Lagrangian<'_, '_> {
    fn active(&self, ci: f64, i: usize) -> bool {
        ci <= self.mu * self.lambda[i]
    }

    pub fn value(&self, x: &DVector<f64>) -> f64 {
        let c = self.constraints.values(x);
        let mut value = self.oracle.value(x);
        for (i, &ci) in c.iter().enumerate() {
            let lambda = self.lambda[i];
            if self.active(ci, i) {
                value += -lambda * ci + 0.5 * ci * ci / self.mu;
            } else {
                value -= 0.5 * self.mu * lambda * lambda;
            }
        }
        value
    }

    pub fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let c = self.constraints.values(x);
        let dc = self.constraints.jacobian(x);
        let mut gradient = self.oracle.gradient(x);
        for (i, &ci) in c.iter().enumerate() {
            if self.active(ci, i) {
                gradient -= dc.row(i).transpose() * (self.lambda[i] - ci / self.mu);
            }
        }
        gradient
    }

    pub fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let c = self.constraints.values(x);
        let dc = self.constraints.jacobian(x);
        let d2c = self.constraints.hessians(x);
        let mut hessian = self.oracle.hessian(x);
        for (i, &ci) in c.iter().enumerate() {
            if !self.active(ci, i) {
                continue;
            }
            let dci = dc.row(i).transpose();
            hessian += &dci * dci.transpose() / self.mu;
            if let Some(d2c) = &d2c {
                hessian -= &d2c[i] * (self.lambda[i] - ci / self.mu);
            }
        }
        hessian
    }
}

/// `$\lambda_i \leftarrow \max(\lambda_i - c_i/\mu, 0)$`.
pub(super) fn update_multipliers(lambda: &mut DVector<f64>, c: &DVector<f64>, mu: f64) {
    for (lambda_i, &ci) in lambda.iter_mut().zip(c.iter()) {
        *lambda_i = (*lambda_i - ci / mu).max(0.0);
    }
}

impl Run<'_, '_> {
    /// Method of multipliers, also known as the augmented Lagrangian method.
    ///
    /// Each inner run stops on the gradient tolerance
    /// `$\min(\epsilon, \gamma\|\vec{c}(\vec{x})\|)$`.
    pub(crate) fn method_of_multipliers(
        &self,
        x0: DVector<f64>,
        config: &MultipliersConfig,
    ) -> Result<MinimizationReport, MinimizeError> {
        let test = self.options.convergence_test()?;
        self.check_dimensions(&x0)?;
        let mut totals = Totals::default();
        let mut mu = config.mu0;
        let mut epsilon = config.epsilon0;
        let mut gamma = config.gamma0;

        let mut x = x0;
        let mut c = self.constraints.values(&x);
        let mut lambda = c.map(|ci| if ci <= 0.0 { config.init_lambda } else { 0.0 });
        let mut la = Lagrangian {
            oracle: self.oracle,
            constraints: self.constraints,
            lambda: &lambda,
            mu,
        }
        .value(&x);
        totals.f_count += 1;

        let mut k = 0;
        let (x_new, warning) = loop {
            if self.options.verbosity >= 1 {
                log::info!("k: {:<8} xk: {:?}  L: {}", k, x.as_slice(), la);
            }
            if self.options.verbosity >= 2 {
                log::debug!("mu: {}  epsilon: {}  gamma: {}", mu, epsilon, gamma);
                log::debug!("Lagrange multipliers: {:?}", lambda.as_slice());
            }
            let tk = epsilon.min(gamma * c.norm()).max(0.0);
            let lagrangian = Lagrangian {
                oracle: self.oracle,
                constraints: self.constraints,
                lambda: &lambda,
                mu,
            };
            let value = |y: &DVector<f64>| lagrangian.value(y);
            let gradient = |y: &DVector<f64>| lagrangian.gradient(y);
            let hessian = |y: &DVector<f64>| lagrangian.hessian(y);
            let options = self
                .inner_run_options(totals.iterations, config.inner_maxiter)
                .with_func_tol(None)
                .with_grad_tol(Some(tk));
            let report = self.inner_run(self.augmented(&value, &gradient, &hessian), x.clone(), &options)?;
            totals.add(&report);

            if totals.iterations + 1 >= self.options.maxiter {
                break (report.x, Some(Warning::MaxIterations));
            }
            if let Some(warning) = report.warning {
                break (report.x, Some(warning));
            }
            let dla = lagrangian.gradient(&report.x);
            totals.g_count += 1;
            if test.converged(report.f, la, Some(&dla)) {
                break (report.x, None);
            }
            if report.f == f64::INFINITY {
                break (report.x, Some(Warning::InfiniteFunction));
            }

            c = self.constraints.values(&report.x);
            update_multipliers(&mut lambda, &c, mu);
            mu *= config.scale_mu;
            epsilon *= config.scale_epsilon;
            gamma *= config.scale_gamma;
            if mu < MU_MIN {
                break (report.x, Some(Warning::MuTooSmall));
            }
            x = report.x;
            la = report.f;
            k += 1;
        };

        let f = self.oracle.value(&x_new);
        totals.f_count += 1;
        Ok(totals.report(x_new, f, warning))
    }
}
