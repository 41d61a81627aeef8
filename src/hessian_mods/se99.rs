use nalgebra::{DMatrix, DVector, Matrix2};

use super::{descent, swap_symmetric, unpermute, Modified};
use crate::Warning;

const MU: f64 = 0.1;

/// The revised modified Cholesky factorisation of Schnabel and Eskow.
///
/// > R. B. Schnabel and E. Eskow. A revised modified Cholesky factorization
/// > algorithm. SIAM J. Optim. 9 (1999), pp. 1135-1148.
///
/// Phase one is an ordinary Cholesky factorisation with diagonal pivoting,
/// continued while the remaining Schur complement is safely positive
/// definite. Phase two shifts each remaining diagonal element by the amount
/// its Gerschgorin bound requires, the shifts never decreasing. The last
/// `$2\times2$` block is shifted using its eigenvalues.
pub(super) fn se99(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Result<Modified, Warning> {
    let n = hessian.nrows();
    let tau = f64::EPSILON.cbrt();
    let tau_bar = tau * tau;
    let gamma = match hessian.diagonal().amax() {
        g if g == 0.0 => 1.0,
        g => g,
    };

    let mut work = Work {
        a: hessian,
        l: DMatrix::zeros(n, n),
        perm: (0..n).collect(),
    };

    // phase one
    let mut j = 0;
    while j < n {
        let max_d = (j..n).map(|i| work.a[(i, i)]).fold(f64::NEG_INFINITY, f64::max);
        let min_d = (j..n).map(|i| work.a[(i, i)]).fold(f64::INFINITY, f64::min);
        if max_d < tau_bar * gamma || min_d < -MU * max_d {
            break;
        }
        let pivot = (j..n)
            .max_by(|&a, &b| work.a[(a, a)].total_cmp(&work.a[(b, b)]))
            .unwrap_or(j);
        work.swap(pivot, j);
        let next_min = ((j + 1)..n)
            .map(|i| work.a[(i, i)] - work.a[(i, j)].powi(2) / work.a[(j, j)])
            .fold(f64::INFINITY, f64::min);
        if next_min < -MU * gamma {
            break;
        }
        work.factor_column(j);
        j += 1;
    }

    // phase two
    if j + 1 == n {
        let a = work.a[(j, j)];
        let delta = -a + (-tau * a / (1.0 - tau)).max(tau_bar * gamma);
        work.a[(j, j)] += delta;
        work.factor_column(j);
    } else if j < n {
        let mut bounds = DVector::zeros(n);
        for i in j..n {
            let off: f64 = (j..n).filter(|&k| k != i).map(|k| work.a[(i, k)].abs()).sum();
            bounds[i] = work.a[(i, i)] - off;
        }

        let mut delta_prev: f64 = 0.0;
        for k in j..(n - 2) {
            let pivot = (k..n)
                .max_by(|&a, &b| bounds[a].total_cmp(&bounds[b]))
                .unwrap_or(k);
            work.swap(pivot, k);
            bounds.swap_rows(pivot, k);

            let norm: f64 = ((k + 1)..n).map(|i| work.a[(i, k)].abs()).sum();
            let delta = (-work.a[(k, k)] + norm.max(tau_bar * gamma))
                .max(delta_prev)
                .max(0.0);
            if delta > 0.0 {
                work.a[(k, k)] += delta;
                delta_prev = delta;
            }
            if work.a[(k, k)] != norm {
                let scale = 1.0 - norm / work.a[(k, k)];
                for i in (k + 1)..n {
                    bounds[i] += work.a[(i, k)].abs() * scale;
                }
            }
            work.factor_column(k);
        }

        let (p, q) = (n - 2, n - 1);
        let block = Matrix2::new(work.a[(p, p)], work.a[(q, p)], work.a[(q, p)], work.a[(q, q)]);
        let eigenvalues = block.symmetric_eigenvalues();
        let (lo, hi) = (eigenvalues.min(), eigenvalues.max());
        let delta = (-lo + (tau * (hi - lo) / (1.0 - tau)).max(tau_bar * gamma))
            .max(delta_prev)
            .max(0.0);
        work.a[(p, p)] += delta;
        work.a[(q, q)] += delta;
        work.factor_column(p);
        work.factor_column(q);
    }

    let factored = &work.l * work.l.transpose();
    descent(unpermute(&factored, &work.perm), gradient)
}

/// The Schur complement still to factor, the computed columns of
/// `$\mathbf{L}$` and the pivoting order.
struct Work {
    a: DMatrix<f64>,
    l: DMatrix<f64>,
    perm: Vec<usize>,
}

impl Work {
    fn swap(&mut self, i: usize, j: usize) {
        if i != j {
            swap_symmetric(&mut self.a, i, j);
            self.l.swap_rows(i, j);
            self.perm.swap(i, j);
        }
    }

    fn factor_column(&mut self, j: usize) {
        let n = self.a.nrows();
        let pivot = self.a[(j, j)].sqrt();
        self.l[(j, j)] = pivot;
        for i in (j + 1)..n {
            self.l[(i, j)] = self.a[(i, j)] / pivot;
        }
        for i in (j + 1)..n {
            for k in (j + 1)..n {
                self.a[(i, k)] -= self.l[(i, j)] * self.l[(k, j)];
            }
        }
    }
}
