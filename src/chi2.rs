//! The chi-squared target function and its derivatives.
//!
//! ```math
//!   \chi^2(\theta) = \sum_{i=1}^m \frac{(y_i - y_i(\theta))^2}{\sigma_i^2}
//! ```
//!
//! All functions take the measured values `$y_i$`, the back-calculated
//! values `$y_i(\theta)$` and the errors `$\sigma_i$`. Derivatives of the
//! back-calculated values are passed as the `$m\times n$` Jacobian
//! `$\partial y_i/\partial\theta_j$` and one `$n\times n$` Hessian per point.
use nalgebra::{DMatrix, DVector};

/// `$\chi^2$`.
///
/// ```
/// # use nalgebra::DVector;
/// # use minimize::chi2;
/// let data = DVector::from_vec(vec![1.0, 1.5, 2.0, 2.5, 3.0]);
/// let back_calc = DVector::from_vec(vec![0.9, 1.45, 2.0, 2.55, 3.1]);
/// let errors = DVector::from_element(5, 0.1);
/// assert!((chi2(&data, &back_calc, &errors) - 2.5).abs() < 1e-12);
/// ```
pub fn chi2(data: &DVector<f64>, back_calc: &DVector<f64>, errors: &DVector<f64>) -> f64 {
    (data - back_calc)
        .component_div(errors)
        .norm_squared()
}

/// `$\partial\chi^2/\partial\theta_j = -2\sum_i \frac{y_i - y_i(\theta)}{\sigma_i^2}\frac{\partial y_i}{\partial\theta_j}$`.
pub fn dchi2(
    data: &DVector<f64>,
    back_calc: &DVector<f64>,
    back_calc_grad: &DMatrix<f64>,
    errors: &DVector<f64>,
) -> DVector<f64> {
    let weighted = weighted_residuals(data, back_calc, errors);
    back_calc_grad.tr_mul(&weighted) * -2.0
}

/// `$\partial^2\chi^2/\partial\theta_j\partial\theta_k = 2\sum_i \frac{1}{\sigma_i^2}\left(\frac{\partial y_i}{\partial\theta_j}\frac{\partial y_i}{\partial\theta_k} - (y_i - y_i(\theta))\frac{\partial^2 y_i}{\partial\theta_j\partial\theta_k}\right)$`.
///
/// # Panics
///
/// Panics if `back_calc_hess` does not hold one matrix per point.
pub fn d2chi2(
    data: &DVector<f64>,
    back_calc: &DVector<f64>,
    back_calc_grad: &DMatrix<f64>,
    back_calc_hess: &[DMatrix<f64>],
    errors: &DVector<f64>,
) -> DMatrix<f64> {
    assert_eq!(back_calc_hess.len(), data.len(), "one Hessian per point required");
    let weights = errors.map(|sigma| 1.0 / (sigma * sigma));
    let weighted = weighted_residuals(data, back_calc, errors);
    let mut hessian = back_calc_grad.tr_mul(&DMatrix::from_diagonal(&weights)) * back_calc_grad;
    for (i, point_hessian) in back_calc_hess.iter().enumerate() {
        hessian -= point_hessian * weighted[i];
    }
    hessian * 2.0
}

/// `$(y_i - y_i(\theta))/\sigma_i^2$`.
fn weighted_residuals(data: &DVector<f64>, back_calc: &DVector<f64>, errors: &DVector<f64>) -> DVector<f64> {
    (data - back_calc).component_div(&errors.component_mul(errors))
}
