use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};

use crate::Warning;

const REFINEMENTS: usize = 3;

/// Nearly exact subproblem solution (Nocedal and Wright, Algorithm 4.3).
///
/// Three Newton iterations on the secular equation
/// `$1/\Delta - 1/\|\vec{p}(\lambda)\| = 0$`, with
/// `$(\mathbf{B} + \lambda\mathbf{I})\vec{p}(\lambda) = -\vec{g}$` and
/// `$\lambda$` kept nonnegative. `b` must be positive definite.
pub(super) fn exact(g: &DVector<f64>, b: &DMatrix<f64>, delta: f64) -> Result<DVector<f64>, Warning> {
    let n = g.len();
    let shifted = |lambda: f64| {
        Cholesky::<f64, Dyn>::new(b + DMatrix::<f64>::identity(n, n) * lambda)
            .ok_or_else(Warning::not_positive_definite)
    };

    let mut lambda: f64 = 0.0;
    for _ in 0..REFINEMENTS {
        let factor = shifted(lambda)?;
        let p = -factor.solve(g);
        let p_norm2 = p.norm_squared();
        let q = factor
            .l_dirty()
            .solve_lower_triangular(&p)
            .ok_or_else(Warning::not_positive_definite)?;
        let p_norm = p_norm2.sqrt();
        lambda += (p_norm2 / q.norm_squared()) * ((p_norm - delta) / delta);
        lambda = lambda.max(0.0);
    }
    Ok(-shifted(lambda)?.solve(g))
}
