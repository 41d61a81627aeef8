use nalgebra::{DMatrix, DVector};

use super::Modified;
use crate::Warning;

/// Replace every eigenvalue below `$\sqrt{\epsilon}$` by `$\sqrt{\epsilon}$`.
pub(super) fn eigenvalue(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Result<Modified, Warning> {
    let floor = f64::EPSILON.sqrt();
    let eigen = hessian.symmetric_eigen();
    if eigen.eigenvalues.iter().any(|v| !v.is_finite()) {
        return Err(Warning::LinAlg("Eigenvalues did not converge".into()));
    }
    let values = eigen.eigenvalues.map(|v| v.max(floor));
    let q = &eigen.eigenvectors;

    let matrix = q * DMatrix::from_diagonal(&values) * q.transpose();
    let projected = q.transpose() * gradient;
    let direction = -(q * projected.component_div(&values));
    Ok(Modified { direction, matrix })
}
