//! Hessian modifications for Newton-type minimisers.
//!
//! Each strategy turns a symmetric, possibly indefinite, Hessian `$\mathbf{H}$`
//! into a positive definite `$\mathbf{B}$` and returns it together with the
//! descent direction `$\vec{p} = -\mathbf{B}^{-1}\vec{g}$`.
use nalgebra::{linalg::Cholesky, DMatrix, DVector, Dyn};

use crate::{options::HessianModKind, Warning};

mod cholesky;
mod eigenvalue;
mod gmw;
mod se99;
mod unmodified;

#[cfg(test)]
mod test_positive_definite;

/// The direction and the matrix it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Modified {
    pub direction: DVector<f64>,
    pub matrix: DMatrix<f64>,
}

pub(crate) fn modify(
    kind: HessianModKind,
    hessian: &DMatrix<f64>,
    gradient: &DVector<f64>,
    verbosity: u8,
) -> Result<Modified, Warning> {
    let hessian = symmetrize(hessian);
    let modified = match kind {
        HessianModKind::Unmodified => unmodified::unmodified(hessian, gradient),
        HessianModKind::Eigenvalue => eigenvalue::eigenvalue(hessian, gradient),
        HessianModKind::Cholesky => cholesky::cholesky_with_multiple_of_identity(hessian, gradient),
        HessianModKind::Gmw => gmw::gmw(hessian, gradient),
        HessianModKind::Se99 => se99::se99(hessian, gradient),
    }?;
    if verbosity >= 3 {
        log::trace!("{:?} Hessian modification: pk = {:?}", kind, modified.direction.as_slice());
    }
    Ok(modified)
}

fn symmetrize(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    (matrix + matrix.transpose()) * 0.5
}

/// Solve `$\mathbf{B}\vec{p} = -\vec{g}$` for a positive definite `$\mathbf{B}$`.
fn descent(matrix: DMatrix<f64>, gradient: &DVector<f64>) -> Result<Modified, Warning> {
    let factor = Cholesky::<f64, Dyn>::new(matrix.clone()).ok_or_else(Warning::not_positive_definite)?;
    Ok(Modified {
        direction: -factor.solve(gradient),
        matrix,
    })
}

/// Put `perm[i]` back in place `i` of a matrix built for the pivoted order.
fn unpermute(permuted: &DMatrix<f64>, perm: &[usize]) -> DMatrix<f64> {
    let n = perm.len();
    let mut matrix = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            matrix[(perm[i], perm[j])] = permuted[(i, j)];
        }
    }
    matrix
}

/// Swap rows and columns `i` and `j` of a symmetric working matrix.
fn swap_symmetric(matrix: &mut DMatrix<f64>, i: usize, j: usize) {
    if i != j {
        matrix.swap_rows(i, j);
        matrix.swap_columns(i, j);
    }
}
