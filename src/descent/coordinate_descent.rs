use nalgebra::DVector;

use super::LineSearchSetup;
use crate::{
    iteration::Solver,
    line_search::line_search,
    problem::Evaluator,
    Warning,
};

/// Back-and-forth coordinate descent.
///
/// One iteration sweeps every coordinate axis with a line search along
/// `$-\frac{\partial f}{\partial x_i}\vec{e}_i$`, alternating the sweep order.
/// The partial derivatives all come from the gradient at the start of the
/// sweep, which is evaluated again only once the sweep is complete.
pub(crate) struct CoordinateDescent {
    setup: LineSearchSetup,
    backwards: bool,

    x: DVector<f64>,
    f: f64,
    g: DVector<f64>,

    x_new: DVector<f64>,
    f_new: f64,
    g_new: DVector<f64>,
}

impl CoordinateDescent {
    pub fn new(ev: &mut Evaluator<'_>, x0: DVector<f64>, setup: LineSearchSetup) -> Self {
        let f = ev.func(&x0);
        let g = ev.gradient(&x0);
        Self {
            setup,
            backwards: false,
            x_new: x0.clone(),
            f_new: f,
            g_new: g.clone(),
            x: x0,
            f,
            g,
        }
    }

    fn axes(&self) -> Vec<usize> {
        let n = self.x.len();
        if self.backwards {
            (0..n).rev().collect()
        } else {
            (0..n).collect()
        }
    }
}

impl Solver for CoordinateDescent {
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        let n = self.x.len();
        let mut y = self.x.clone();
        let mut fy = self.f;
        for i in self.axes() {
            if self.g[i] == 0.0 {
                continue;
            }
            let mut p = DVector::zeros(n);
            p[i] = -self.g[i];
            let alpha = line_search(self.setup.kind, ev, &y, fy, &self.g, &p, &self.setup.params)?;
            y[i] += alpha * p[i];
            fy = ev.func(&y);
        }
        self.g_new = ev.gradient(&y);
        self.x_new = y;
        self.f_new = fy;
        Ok(())
    }

    fn update(&mut self, _ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        self.x = self.x_new.clone();
        self.f = self.f_new;
        self.g = self.g_new.clone();
        self.backwards = !self.backwards;
        Ok(())
    }

    fn current(&self) -> (&DVector<f64>, f64) {
        (&self.x, self.f)
    }

    fn trial(&self) -> (&DVector<f64>, f64) {
        (&self.x_new, self.f_new)
    }

    fn trial_gradient(&self) -> Option<&DVector<f64>> {
        Some(&self.g_new)
    }
}
