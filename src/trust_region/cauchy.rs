use nalgebra::{DMatrix, DVector};

/// The Cauchy point, the minimiser of the model along `$-\vec{g}$` within the
/// radius (Nocedal and Wright, equation 4.12).
pub(super) fn cauchy_point(g: &DVector<f64>, b: &DMatrix<f64>, delta: f64) -> DVector<f64> {
    let g_norm = g.norm();
    if g_norm == 0.0 {
        return DVector::zeros(g.len());
    }
    let curvature = g.dot(&(b * g));
    let tau = if curvature <= 0.0 {
        1.0
    } else {
        (g_norm.powi(3) / (delta * curvature)).min(1.0)
    };
    g * (-tau * delta / g_norm)
}
