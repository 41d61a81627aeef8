use nalgebra::{DMatrix, DVector};

use super::Modified;
use crate::Warning;

/// The plain Newton direction. The Hessian must be nonsingular but may be
/// indefinite, in which case the direction need not descend.
pub(super) fn unmodified(hessian: DMatrix<f64>, gradient: &DVector<f64>) -> Result<Modified, Warning> {
    let direction = hessian
        .clone()
        .lu()
        .solve(&-gradient)
        .ok_or_else(Warning::singular)?;
    Ok(Modified {
        direction,
        matrix: hessian,
    })
}
