use nalgebra::{DMatrix, DVector};

use super::{InequalityConstraints, LogBarrierConfig, Run, Totals};
use crate::{iteration::MinimizationReport, problem::Oracle, MinimizeError, Warning};

/// `$\psi(\vec{x}) = f(\vec{x}) - \epsilon\sum_i \log c_i(\vec{x})$`, infinite
/// outside the interior of the feasible region.
pub(super) struct Barrier<'b, 'a> {
    pub oracle: Oracle<'a>,
    pub constraints: &'b dyn InequalityConstraints,
    pub epsilon: f64,
}

impl Barrier<'_, '_> {
    pub fn value(&self, x: &DVector<f64>) -> f64 {
        let c = self.constraints.values(x);
        if c.iter().any(|&ci| !(ci > 0.0)) {
            return f64::INFINITY;
        }
        self.oracle.value(x) - self.epsilon * c.iter().map(|ci| ci.ln()).sum::<f64>()
    }

    pub fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        let c = self.constraints.values(x);
        let dc = self.constraints.jacobian(x);
        let mut gradient = self.oracle.gradient(x);
        for (i, &ci) in c.iter().enumerate() {
            if ci > 0.0 {
                gradient -= dc.row(i).transpose() * (self.epsilon / ci);
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
            if !(ci > 0.0) {
                continue;
            }
            let dci = dc.row(i).transpose();
            hessian += &dci * dci.transpose() * (self.epsilon / (ci * ci));
            if let Some(d2c) = &d2c {
                hessian -= &d2c[i] * (self.epsilon / ci);
            }
        }
        hessian
    }
}

impl Run<'_, '_> {
    /// Logarithmic barrier method.
    ///
    /// The starting point must be strictly feasible. Each outer iteration
    /// minimises the barrier function, then shrinks `$\epsilon$`.
    pub(crate) fn log_barrier(
        &self,
        x0: DVector<f64>,
        config: &LogBarrierConfig,
    ) -> Result<MinimizationReport, MinimizeError> {
        let test = self.options.convergence_test()?;
        self.check_dimensions(&x0)?;
        if self.constraints.values(&x0).iter().any(|&ci| !(ci > 0.0)) {
            return Err(MinimizeError::InvalidOptions {
                algorithm: "logarithmic barrier function",
                reason: "the starting point must be strictly feasible".into(),
            });
        }

        let mut totals = Totals::default();
        let mut epsilon = config.epsilon0;
        let mut x = x0;
        let mut psi = Barrier {
            oracle: self.oracle,
            constraints: self.constraints,
            epsilon,
        }
        .value(&x);
        totals.f_count += 1;

        let mut k = 0;
        let (x_new, warning) = loop {
            if self.options.verbosity >= 1 {
                log::info!("k: {:<8} xk: {:?}  psi: {}", k, x.as_slice(), psi);
                log::debug!("Entering sub-algorithm, epsilon = {}", epsilon);
            }
            let barrier = Barrier {
                oracle: self.oracle,
                constraints: self.constraints,
                epsilon,
            };
            let value = |y: &DVector<f64>| barrier.value(y);
            let gradient = |y: &DVector<f64>| barrier.gradient(y);
            let hessian = |y: &DVector<f64>| barrier.hessian(y);
            let options = self.inner_run_options(totals.iterations, config.inner_maxiter);
            let report = self.inner_run(self.augmented(&value, &gradient, &hessian), x.clone(), &options)?;
            totals.add(&report);

            if totals.iterations + 1 >= self.options.maxiter {
                break (report.x, Some(Warning::MaxIterations));
            }
            if let Some(warning) = report.warning {
                break (report.x, Some(warning));
            }
            if test.converged(report.f, psi, None) {
                break (report.x, None);
            }
            if report.f == f64::INFINITY {
                break (report.x, Some(Warning::InfiniteFunction));
            }

            epsilon *= config.scale_epsilon;
            x = report.x;
            psi = report.f;
            k += 1;
        };

        let f = self.oracle.value(&x_new);
        totals.f_count += 1;
        Ok(totals.report(x_new, f, warning))
    }
}
