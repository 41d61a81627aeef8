use nalgebra::{DMatrix, DVector};

mod finite_difference;

pub use finite_difference::derivative;

/// Compute a [numerical approximation](https://en.wikipedia.org/wiki/Numerical_differentiation)
/// to the gradient of `f` at `x`.
///
/// The function is intended to be used for checking a hand-written gradient.
/// Each component is an adaptive central difference (see [`derivative`]), so
/// the cost is a few dozen evaluations of `f` per parameter.
///
/// Computing derivatives numerically is unstable: you can construct functions
/// where the result is catastrophically wrong. Components that cannot be
/// estimated are `NaN`.
///
/// # Example
///
/// ```
/// # use nalgebra::DVector;
/// # use minimize::numerical_gradient;
/// let f = |x: &DVector<f64>| x[0] * x[0] + 3.0 * x[1];
/// let g = numerical_gradient(f, &DVector::from_vec(vec![2.0, -1.0]));
/// assert!((g[0] - 4.0).abs() < 1e-8);
/// assert!((g[1] - 3.0).abs() < 1e-8);
/// ```
pub fn numerical_gradient(
    f: impl Fn(&DVector<f64>) -> f64,
    x: &DVector<f64>,
) -> DVector<f64> {
    DVector::from_iterator(
        x.len(),
        (0..x.len()).map(|i| {
            derivative(x[i], |xi| {
                let mut probe = x.clone();
                probe[i] = xi;
                f(&probe)
            })
            .unwrap_or(f64::NAN)
        }),
    )
}

/// Numerical Hessian from a gradient function.
///
/// Column `j` is the derivative of the gradient along `$\vec{e}_j$`. The
/// result is symmetrised.
pub fn numerical_hessian(
    gradient: impl Fn(&DVector<f64>) -> DVector<f64>,
    x: &DVector<f64>,
) -> DMatrix<f64> {
    let n = x.len();
    let mut hessian = DMatrix::zeros(n, n);
    for j in 0..n {
        for i in 0..n {
            hessian[(i, j)] = derivative(x[j], |xj| {
                let mut probe = x.clone();
                probe[j] = xj;
                gradient(&probe)[i]
            })
            .unwrap_or(f64::NAN);
        }
    }
    (&hessian + hessian.transpose()) * 0.5
}
