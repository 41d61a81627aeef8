use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};

use super::Modified;
use crate::Warning;

const MAX_RETRIES: usize = 100;

/// Cholesky with added multiple of the identity (Nocedal and Wright,
/// Algorithm 3.3).
///
/// Try `$\mathbf{H} + \tau_k\mathbf{I}$`, starting from `$\tau_0 = 0$` if the
/// diagonal is positive and from half the Frobenius norm otherwise, and at
/// least double `$\tau_k$` after each failed factorisation.
pub(super) fn cholesky_with_multiple_of_identity(
    hessian: DMatrix<f64>,
    gradient: &DVector<f64>,
) -> Result<Modified, Warning> {
    let n = hessian.nrows();
    let half_norm = (0.5 * hessian.norm()).max(f64::EPSILON.sqrt());
    let min_diagonal = hessian.diagonal().min();
    let mut tau = if min_diagonal > 0.0 { 0.0 } else { half_norm };

    for _ in 0..MAX_RETRIES {
        let matrix = &hessian + DMatrix::<f64>::identity(n, n) * tau;
        if let Some(factor) = Cholesky::<f64, Dyn>::new(matrix.clone()) {
            return Ok(Modified {
                direction: -factor.solve(gradient),
                matrix,
            });
        }
        tau = (2.0 * tau).max(half_norm);
    }
    Err(Warning::not_positive_definite())
}
