use nalgebra::DVector;

use super::DirectionRule;
use crate::{problem::Evaluator, Warning};

/// `$\vec{p}_k = -\nabla f_k$`.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct SteepestDescent;

impl DirectionRule for SteepestDescent {
    fn direction(
        &mut self,
        _ev: &mut Evaluator<'_>,
        _x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning> {
        Ok(-g)
    }

    fn adapts_step_length(&self) -> bool {
        true
    }
}
