use nalgebra::{DMatrix, DVector};

use super::DirectionRule;
use crate::{problem::Evaluator, Warning};

/// Quasi-Newton direction `$\vec{p}_k = -\mathbf{H}_k\nabla f_k$` from the
/// BFGS inverse Hessian approximation.
#[derive(Clone, Debug)]
pub(crate) struct Bfgs {
    h: DMatrix<f64>,
    first: bool,
}

impl Bfgs {
    pub fn new(n: usize) -> Self {
        Self {
            h: DMatrix::identity(n, n),
            first: true,
        }
    }

    #[cfg(test)]
    pub fn inverse_hessian(&self) -> &DMatrix<f64> {
        &self.h
    }
}

impl DirectionRule for Bfgs {
    fn direction(
        &mut self,
        _ev: &mut Evaluator<'_>,
        _x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning> {
        Ok(-(&self.h * g))
    }

    /// `$\mathbf{H}_{k+1} = (\mathbf{I} - \rho\vec{s}\vec{y}^\top)\mathbf{H}_k(\mathbf{I} - \rho\vec{y}\vec{s}^\top) + \rho\vec{s}\vec{s}^\top$`
    /// with `$\rho = 1/\vec{y}^\top\vec{s}$`.
    fn accepted(
        &mut self,
        s: &DVector<f64>,
        _p: &DVector<f64>,
        g_old: &DVector<f64>,
        g_new: &DVector<f64>,
    ) {
        let y = g_new - g_old;
        let ys = y.dot(s);
        if ys == 0.0 {
            log::warn!("BFGS update skipped, the matrix is indefinite (y's = 0)");
            return;
        }
        if ys < 0.0 {
            log::warn!("BFGS update skipped, the curvature condition y's > 0 fails");
            return;
        }
        if self.first {
            self.h *= ys / y.norm_squared();
            self.first = false;
        }
        let rho = 1.0 / ys;
        let n = s.len();
        let left = DMatrix::identity(n, n) - s * y.transpose() * rho;
        let right = left.transpose();
        self.h = &left * &self.h * right + s * s.transpose() * rho;
    }
}
