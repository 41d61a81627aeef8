use nalgebra::{DMatrix, DVector};

use super::to_boundary;

/// The dogleg step (Nocedal and Wright, section 4.1).
///
/// Follows `$-\vec{g}$` to the unconstrained minimiser `$\vec{p}^U$` of the
/// model along it, then turns towards the full step `$\vec{p}^B$` until the
/// path leaves the trust region. `b` must be positive definite and `p_full`
/// must solve `$\mathbf{B}\vec{p}^B = -\vec{g}$`.
pub(super) fn dogleg(
    g: &DVector<f64>,
    b: &DMatrix<f64>,
    p_full: &DVector<f64>,
    delta: f64,
) -> DVector<f64> {
    if p_full.norm() <= delta {
        return p_full.clone();
    }
    let curvature = g.dot(&(b * g));
    let p_u = g * (-g.norm_squared() / curvature);
    let p_u_norm = p_u.norm();
    if !p_u_norm.is_finite() || p_u_norm >= delta {
        return g * (-delta / g.norm());
    }
    let leg = p_full - &p_u;
    let tau = to_boundary(&p_u, &leg, delta);
    p_u + leg * tau
}
