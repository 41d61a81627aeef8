use nalgebra::{DMatrix, DVector};

use super::to_boundary;

/// CG-Steihaug (Nocedal and Wright, Algorithm 7.2).
///
/// Conjugate gradients on the model, stopping on the boundary when the
/// iterate leaves the trust region or a direction of non-positive curvature
/// shows up. The residual tolerance is
/// `$\epsilon = \min(0.5, \sqrt{\|\vec{g}\|})\|\vec{g}\|$`.
pub(super) fn steihaug(g: &DVector<f64>, b: &DMatrix<f64>, delta: f64) -> DVector<f64> {
    let n = g.len();
    let g_norm = g.norm();
    let mut z = DVector::zeros(n);
    if g_norm == 0.0 {
        return z;
    }
    let epsilon = 0.5f64.min(g_norm.sqrt()) * g_norm;
    let mut r = g.clone();
    let mut d = -g;

    for _ in 0..(10 * n) {
        let bd = b * &d;
        let curvature = d.dot(&bd);
        if curvature <= 0.0 {
            let tau = to_boundary(&z, &d, delta);
            return z + d * tau;
        }
        let r_norm2 = r.norm_squared();
        let alpha = r_norm2 / curvature;
        let z_new = &z + &d * alpha;
        if z_new.norm() >= delta {
            let tau = to_boundary(&z, &d, delta);
            return z + d * tau;
        }
        r += bd * alpha;
        if r.norm() < epsilon {
            return z_new;
        }
        let beta = r.norm_squared() / r_norm2;
        d = &d * beta - &r;
        z = z_new;
    }
    z
}
