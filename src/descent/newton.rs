use nalgebra::{DMatrix, DVector};

use super::DirectionRule;
use crate::{hessian_mods::modify, options::HessianModKind, problem::Evaluator, Warning};

/// Newton direction `$\mathbf{B}_k\vec{p}_k = -\nabla f_k$`, with
/// `$\mathbf{B}_k$` the Hessian after modification.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Newton {
    hessian_mod: HessianModKind,
    verbosity: u8,
}

impl Newton {
    pub fn new(hessian_mod: HessianModKind, verbosity: u8) -> Self {
        Self {
            hessian_mod,
            verbosity,
        }
    }
}

impl DirectionRule for Newton {
    fn direction(
        &mut self,
        ev: &mut Evaluator<'_>,
        x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning> {
        let hessian = ev.hessian(x);
        Ok(modify(self.hessian_mod, &hessian, g, self.verbosity)?.direction)
    }
}

/// Line-search Newton-CG (Nocedal and Wright, Algorithm 7.1).
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct NewtonCg;

impl DirectionRule for NewtonCg {
    fn direction(
        &mut self,
        ev: &mut Evaluator<'_>,
        x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning> {
        let hessian = ev.hessian(x);
        Ok(truncated_cg(&hessian, g))
    }
}

/// Inner CG iterations on `$\mathbf{H}\vec{p} = -\vec{g}$`, stopped on
/// negative curvature or once the residual drops below
/// `$\min(0.5, \sqrt{\|\vec{g}\|})\|\vec{g}\|$`.
pub(crate) fn truncated_cg(hessian: &DMatrix<f64>, g: &DVector<f64>) -> DVector<f64> {
    let n = g.len();
    let g_norm = g.norm();
    let mut z = DVector::zeros(n);
    if g_norm == 0.0 {
        return z;
    }
    let epsilon = 0.5f64.min(g_norm.sqrt()) * g_norm;
    let mut r = g.clone();
    let mut d = -g;

    for j in 0..(10 * n) {
        let hd = hessian * &d;
        let curvature = d.dot(&hd);
        if curvature <= 0.0 {
            return if j == 0 { -g } else { z };
        }
        let r_norm2 = r.norm_squared();
        let alpha = r_norm2 / curvature;
        z += &d * alpha;
        r += hd * alpha;
        if r.norm() <= epsilon {
            break;
        }
        let beta = r.norm_squared() / r_norm2;
        d = &d * beta - &r;
    }
    z
}
