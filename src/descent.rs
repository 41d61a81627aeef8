//! Line-search minimisers.
//!
//! All of them share one iteration: compute a search direction
//! `$\vec{p}_k$`, find a step length `$\alpha_k$` along it, move to
//! `$\vec{x}_{k+1} = \vec{x}_k + \alpha_k\vec{p}_k$` and evaluate
//! `$f$` and `$\nabla f$` there. They differ only in the direction rule.
use nalgebra::DVector;

use crate::{
    iteration::{iterate, MinimizationReport, MinimizerOptions, Solver},
    line_search::{line_search, LineSearchParams},
    options::LineSearchKind,
    problem::Evaluator,
    MinimizeError, Warning,
};

mod bfgs;
mod conjugate_gradient;
mod coordinate_descent;
mod newton;
mod steepest_descent;


pub(crate) use bfgs::Bfgs;
pub(crate) use conjugate_gradient::{Beta, ConjugateGradient};
pub(crate) use coordinate_descent::CoordinateDescent;
pub(crate) use newton::{Newton, NewtonCg};
pub(crate) use steepest_descent::SteepestDescent;

/// The part of a line-search minimiser which picks the search direction.
pub(crate) trait DirectionRule {
    /// Search direction at `x` with gradient `g`.
    fn direction(
        &mut self,
        ev: &mut Evaluator<'_>,
        x: &DVector<f64>,
        g: &DVector<f64>,
    ) -> Result<DVector<f64>, Warning>;

    /// Learn from an accepted step `s` along `p`, with the gradient changing
    /// from `g_old` to `g_new`.
    fn accepted(
        &mut self,
        _s: &DVector<f64>,
        _p: &DVector<f64>,
        _g_old: &DVector<f64>,
        _g_new: &DVector<f64>,
    ) {
    }

    /// Whether the initial step length is rescaled from the previous step.
    fn adapts_step_length(&self) -> bool {
        false
    }
}

/// Line search and its constants, after applying a minimiser's defaults.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct LineSearchSetup {
    pub kind: LineSearchKind,
    pub params: LineSearchParams,
}

pub(crate) struct Descent<D> {
    rule: D,
    setup: LineSearchSetup,

    x: DVector<f64>,
    f: f64,
    g: DVector<f64>,

    x_new: DVector<f64>,
    f_new: f64,
    g_new: DVector<f64>,

    p: DVector<f64>,
    alpha: f64,
    /// `$\alpha_{k-1}\nabla f_{k-1}^\top\vec{p}_{k-1}$`, the decrease expected
    /// of the last step.
    last_decrease: Option<f64>,
}

impl<D: DirectionRule> Descent<D> {
    pub fn new(ev: &mut Evaluator<'_>, x0: DVector<f64>, rule: D, setup: LineSearchSetup) -> Self {
        let f = ev.func(&x0);
        let g = ev.gradient(&x0);
        Self {
            rule,
            setup,
            x_new: x0.clone(),
            f_new: f,
            g_new: g.clone(),
            p: DVector::zeros(x0.len()),
            alpha: setup.params.a_init,
            last_decrease: None,
            x: x0,
            f,
            g,
        }
    }

    fn initial_step(&self) -> f64 {
        match self.last_decrease {
            Some(decrease) if self.rule.adapts_step_length() => {
                let a0 = decrease / self.g.dot(&self.p);
                if a0.is_finite() && a0 > 0.0 {
                    a0
                } else {
                    1.0
                }
            }
            _ => self.setup.params.a_init,
        }
    }
}

impl<D: DirectionRule> Solver for Descent<D> {
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        self.p = self.rule.direction(ev, &self.x, &self.g)?;
        let params = LineSearchParams {
            a_init: self.initial_step(),
            ..self.setup.params
        };
        self.alpha = line_search(self.setup.kind, ev, &self.x, self.f, &self.g, &self.p, &params)?;
        self.x_new = &self.x + &self.p * self.alpha;
        self.f_new = ev.func(&self.x_new);
        self.g_new = ev.gradient(&self.x_new);
        Ok(())
    }

    fn update(&mut self, _ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        let s = &self.x_new - &self.x;
        self.rule.accepted(&s, &self.p, &self.g, &self.g_new);
        self.last_decrease = Some(self.alpha * self.g.dot(&self.p));
        self.x = self.x_new.clone();
        self.f = self.f_new;
        self.g = self.g_new.clone();
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

/// Run a line-search minimiser from `x0`.
pub(crate) fn minimize<D: DirectionRule>(
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    rule: D,
    setup: LineSearchSetup,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    options.convergence_test()?;
    let mut solver = Descent::new(ev, x0, rule, setup);
    iterate(&mut solver, ev, options)
}

/// Run back-and-forth coordinate descent from `x0`.
pub(crate) fn minimize_coordinates(
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    setup: LineSearchSetup,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    options.convergence_test()?;
    let mut solver = CoordinateDescent::new(ev, x0, setup);
    iterate(&mut solver, ev, options)
}
