use nalgebra::DVector;

use super::DirectionRule;
use crate::{problem::Evaluator, Warning};

/// Restart once successive gradients lose orthogonality by this much.
const RESTART: f64 = 0.1;

/// The `$\beta_k$` formulas of the nonlinear conjugate gradient family.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Beta {
    FletcherReeves,
    PolakRibiere,
    PolakRibierePlus,
    HestenesStiefel,
}

impl Beta {
    fn value(self, g_new: &DVector<f64>, g_old: &DVector<f64>, p_old: &DVector<f64>) -> f64 {
        match self {
            Beta::FletcherReeves => g_new.norm_squared() / g_old.norm_squared(),
            Beta::PolakRibiere => g_new.dot(&(g_new - g_old)) / g_old.norm_squared(),
            Beta::PolakRibierePlus => {
                (g_new.dot(&(g_new - g_old)) / g_old.norm_squared()).max(0.0)
            }
            Beta::HestenesStiefel => {
                let y = g_new - g_old;
                g_new.dot(&y) / p_old.dot(&y)
            }
        }
    }
}

/// `$\vec{p}_{k+1} = -\nabla f_{k+1} + \beta_k\vec{p}_k$`.
#[derive(Clone, Debug)]
pub(crate) struct ConjugateGradient {
    beta: Beta,
    /// Gradient and direction of the previous iteration.
    previous: Option<(DVector<f64>, DVector<f64>)>,
}

impl ConjugateGradient {
    pub fn new(beta: Beta) -> Self {
        Self {
            beta,
            previous: None,
        }
    }
}

impl DirectionRule for ConjugateGradient {
    fn direction(
        &mut self,
        _ev: &mut Evaluator<'_>,
        _x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning> {
        let Some((g_old, p_old)) = &self.previous else {
            return Ok(-g);
        };
        let g_norm2 = g.norm_squared();
        if g_norm2 == 0.0 || g.dot(g_old).abs() / g_norm2 >= RESTART {
            return Ok(-g);
        }
        let beta = self.beta.value(g, g_old, p_old);
        if !beta.is_finite() {
            return Ok(-g);
        }
        let p = p_old * beta - g;
        if g.dot(&p) >= 0.0 {
            return Ok(-g);
        }
        Ok(p)
    }

    fn accepted(
        &mut self,
        _s: &DVector<f64>,
        p: &DVector<f64>,
        g_old: &DVector<f64>,
        _g_new: &DVector<f64>,
    ) {
        self.previous = Some((g_old.clone(), p.clone()));
    }

    fn adapts_step_length(&self) -> bool {
        true
    }
}
