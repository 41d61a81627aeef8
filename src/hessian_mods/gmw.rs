use nalgebra::{DMatrix, DVector};

use super::{descent, swap_symmetric, unpermute, Modified};
use crate::Warning;

/// The Gill, Murray and Wright modified Cholesky factorisation.
///
/// > P. E. Gill, W. Murray and M. H. Wright. Practical Optimization.
/// > Academic Press, 1981, section 4.4.2.2.
///
/// Computes `$\mathbf{P}(\mathbf{H} + \mathbf{E})\mathbf{P}^\top = \mathbf{L}\mathbf{D}\mathbf{L}^\top$`
/// with symmetric pivoting on the largest remaining diagonal element. Each
/// `$d_j$` is raised just enough that the elements of `$\mathbf{L}\mathbf{D}^{1/2}$`
/// stay bounded by `$\beta$`, which keeps `$\mathbf{E}$` small when
/// `$\mathbf{H}$` is already positive definite.
pub(super) fn gmw(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Result<Modified, Warning> {
    let n = hessian.nrows();
    let eps = f64::EPSILON;

    let gamma = hessian.diagonal().amax();
    let mut xi: f64 = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j {
                xi = xi.max(hessian[(i, j)].abs());
            }
        }
    }
    let delta = eps * (gamma + xi).max(1.0);
    let beta = if n > 1 {
        let nu = ((n * n - 1) as f64).sqrt();
        gamma.max(xi / nu).max(eps).sqrt()
    } else {
        gamma.max(eps).sqrt()
    };

    let mut c = hessian;
    let mut l = DMatrix::<f64>::identity(n, n);
    let mut d = DVector::<f64>::zeros(n);
    let mut perm: Vec<usize> = (0..n).collect();

    for j in 0..n {
        let q = (j..n)
            .max_by(|&a, &b| c[(a, a)].abs().total_cmp(&c[(b, b)].abs()))
            .unwrap_or(j);
        if q != j {
            swap_symmetric(&mut c, q, j);
            perm.swap(q, j);
            for s in 0..j {
                l.swap((q, s), (j, s));
            }
        }

        let theta = ((j + 1)..n).map(|i| c[(i, j)].abs()).fold(0.0, f64::max);
        d[j] = c[(j, j)].abs().max((theta / beta).powi(2)).max(delta);

        for i in (j + 1)..n {
            l[(i, j)] = c[(i, j)] / d[j];
        }
        for i in (j + 1)..n {
            for k in (j + 1)..n {
                c[(i, k)] -= c[(i, j)] * c[(k, j)] / d[j];
            }
        }
    }

    let factored = &l * DMatrix::from_diagonal(&d) * l.transpose();
    descent(unpermute(&factored, &perm), gradient)
}
