//! Trust-region minimisers.
//!
//! Every iteration approximately solves the subproblem
//! ```math
//!   \min_{\vec{p}\in\R^n} f_k + \vec{g}_k^\top\vec{p} + \frac{1}{2}\vec{p}^\top\mathbf{B}_k\vec{p}
//!   \quad\text{subject to}\quad\|\vec{p}\|\leq\Delta_k,
//! ```
//! compares the actual with the predicted reduction and adapts the radius
//! `$\Delta_k$` (Nocedal and Wright, Algorithm 4.1).
use nalgebra::{DMatrix, DVector};

use crate::{
    convergence::ConvergenceTest,
    hessian_mods::{modify, Modified},
    iteration::{iterate, MinimizationReport, MinimizerOptions, Solver},
    options::{HessianModKind, HessianType},
    problem::Evaluator,
    MinimizeError, Warning,
};

mod cauchy;
mod dogleg;
mod exact;
mod steihaug;


/// The subproblem solvers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Subproblem {
    Cauchy,
    Dogleg,
    Steihaug,
    Exact,
}

impl Subproblem {
    pub fn name(&self) -> &'static str {
        match self {
            Subproblem::Cauchy => "Cauchy point",
            Subproblem::Dogleg => "dogleg",
            Subproblem::Steihaug => "CG-Steihaug",
            Subproblem::Exact => "exact trust region",
        }
    }

    /// Dogleg and the exact solver need a positive definite model Hessian.
    pub fn default_hessian_mod(&self) -> Option<HessianModKind> {
        match self {
            Subproblem::Dogleg | Subproblem::Exact => Some(HessianModKind::Gmw),
            Subproblem::Cauchy | Subproblem::Steihaug => None,
        }
    }
}

/// Trust-region radius control.
///
/// The defaults are `$\Delta_0 = 1$`, `$\Delta_{\max} = 10^5$` and
/// `$\eta = 0.2$`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrustRegionConfig {
    delta0: f64,
    delta_max: f64,
    eta: f64,
}

impl TrustRegionConfig {
    pub fn new() -> Self {
        Self {
            delta0: 1.0,
            delta_max: 1e5,
            eta: 0.2,
        }
    }

    /// Set the initial radius.
    ///
    /// # Panics
    ///
    /// Panics if `$\Delta_0 \leq 0$`.
    pub fn with_delta0(self, delta0: f64) -> Self {
        assert!(delta0 > 0.0, "delta0 must be > 0");
        Self { delta0, ..self }
    }

    /// Set the largest radius.
    ///
    /// # Panics
    ///
    /// Panics if `$\Delta_{\max} \leq 0$`.
    pub fn with_delta_max(self, delta_max: f64) -> Self {
        assert!(delta_max > 0.0, "delta_max must be > 0");
        Self { delta_max, ..self }
    }

    /// A step is accepted if the ratio of actual to predicted reduction
    /// exceeds `eta`.
    ///
    /// # Panics
    ///
    /// Panics unless `$0 \leq \eta < 0.25$`.
    pub fn with_eta(self, eta: f64) -> Self {
        assert!((0.0..0.25).contains(&eta), "eta must be in [0, 0.25)");
        Self { eta, ..self }
    }
}

impl Default for TrustRegionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Radius and acceptance decision of one trust-region iteration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct RadiusUpdate {
    pub delta: f64,
    pub rho: f64,
    pub accept: bool,
}

/// Nocedal and Wright, Algorithm 4.1.
///
/// Besides `$\rho > \eta$`, acceptance requires a predicted decrease. An
/// uphill step under an indefinite model then stays rejected even though
/// `$\rho > 0$`. An infinite trial value gives `$\rho = -\infty$`.
pub(crate) fn update_radius(
    config: &TrustRegionConfig,
    delta: f64,
    actual: f64,
    predicted: f64,
    step_norm: f64,
) -> RadiusUpdate {
    let rho = if actual == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else if predicted == 0.0 {
        1e99
    } else {
        actual / predicted
    };
    let delta = if rho < 0.25 || predicted < 0.0 {
        0.25 * delta
    } else if rho > 0.75 && (step_norm - delta).abs() < 1e-5 {
        (2.0 * delta).min(config.delta_max)
    } else {
        delta
    };
    RadiusUpdate {
        delta,
        rho,
        accept: rho > config.eta && predicted > 0.0,
    }
}

/// The positive `$\tau$` with `$\|\vec{z} + \tau\vec{d}\| = \Delta$`.
pub(crate) fn to_boundary(z: &DVector<f64>, d: &DVector<f64>, delta: f64) -> f64 {
    let a = d.norm_squared();
    let b = 2.0 * z.dot(d);
    let c = z.norm_squared() - delta * delta;
    if a == 0.0 {
        return 0.0;
    }
    (-b + (b * b - 4.0 * a * c).max(0.0).sqrt()) / (2.0 * a)
}

/// BFGS update of the model Hessian itself,
/// `$\mathbf{B}_{k+1} = \mathbf{B}_k - \frac{\mathbf{B}_k\vec{s}\vec{s}^\top\mathbf{B}_k}{\vec{s}^\top\mathbf{B}_k\vec{s}} + \frac{\vec{y}\vec{y}^\top}{\vec{y}^\top\vec{s}}$`.
///
/// The update is skipped when it would lose positive definiteness.
pub(crate) fn bfgs_update_hessian(b: &mut DMatrix<f64>, s: &DVector<f64>, y: &DVector<f64>) {
    let bs = &*b * s;
    let s_bs = s.dot(&bs);
    let ys = y.dot(s);
    if ys <= 0.0 || s_bs <= 0.0 {
        log::warn!("BFGS update skipped, the curvature condition y's > 0 fails");
        return;
    }
    *b -= &bs * bs.transpose() / s_bs;
    *b += y * y.transpose() / ys;
}

pub(crate) struct TrustRegion {
    subproblem: Subproblem,
    hessian_type: HessianType,
    hessian_mod: Option<HessianModKind>,
    config: TrustRegionConfig,
    delta: f64,
    verbosity: u8,

    x: DVector<f64>,
    f: f64,
    g: DVector<f64>,
    /// Model Hessian, the true Hessian or its BFGS approximation.
    b: DMatrix<f64>,

    x_new: DVector<f64>,
    f_new: f64,
    g_new: DVector<f64>,
    p: DVector<f64>,
}

impl TrustRegion {
    pub fn new(
        ev: &mut Evaluator<'_>,
        x0: DVector<f64>,
        subproblem: Subproblem,
        hessian_type: HessianType,
        hessian_mod: Option<HessianModKind>,
        config: TrustRegionConfig,
        verbosity: u8,
    ) -> Self {
        let n = x0.len();
        let f = ev.func(&x0);
        let g = ev.gradient(&x0);
        let b = match hessian_type {
            HessianType::Newton => ev.hessian(&x0),
            HessianType::Bfgs => DMatrix::identity(n, n),
        };
        Self {
            subproblem,
            hessian_type,
            hessian_mod,
            config,
            delta: config.delta0,
            verbosity,
            x_new: x0.clone(),
            f_new: f,
            g_new: g.clone(),
            p: DVector::zeros(n),
            x: x0,
            f,
            g,
            b,
        }
    }

    fn modified(&self) -> Result<Modified, Warning> {
        let kind = self.hessian_mod.unwrap_or(HessianModKind::Unmodified);
        modify(kind, &self.b, &self.g, self.verbosity)
    }

    fn step(&self) -> Result<DVector<f64>, Warning> {
        match self.subproblem {
            Subproblem::Cauchy => Ok(cauchy::cauchy_point(&self.g, &self.b, self.delta)),
            Subproblem::Steihaug => Ok(steihaug::steihaug(&self.g, &self.b, self.delta)),
            Subproblem::Dogleg => {
                let modified = self.modified()?;
                Ok(dogleg::dogleg(&self.g, &modified.matrix, &modified.direction, self.delta))
            }
            Subproblem::Exact => {
                let modified = self.modified()?;
                exact::exact(&self.g, &modified.matrix, self.delta)
            }
        }
    }
}

impl Solver for TrustRegion {
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        self.p = self.step()?;
        self.x_new = &self.x + &self.p;
        self.f_new = ev.func(&self.x_new);
        self.g_new = ev.gradient(&self.x_new);
        Ok(())
    }

    fn update(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        let actual = self.f - self.f_new;
        let predicted = -self.g.dot(&self.p) - 0.5 * self.p.dot(&(&self.b * &self.p));
        let radius = update_radius(&self.config, self.delta, actual, predicted, self.p.norm());
        if self.verbosity >= 3 {
            log::trace!(
                "{}: rho = {}, delta = {} -> {}, accept = {}",
                self.subproblem.name(),
                radius.rho,
                self.delta,
                radius.delta,
                radius.accept
            );
        }
        self.delta = radius.delta;
        if !radius.accept {
            return Ok(());
        }

        let s = &self.x_new - &self.x;
        let y = &self.g_new - &self.g;
        self.x = self.x_new.clone();
        self.f = self.f_new;
        self.g = self.g_new.clone();
        match self.hessian_type {
            HessianType::Newton => self.b = ev.hessian(&self.x),
            HessianType::Bfgs => bfgs_update_hessian(&mut self.b, &s, &y),
        }
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

    fn converged(&self, test: &ConvergenceTest) -> bool {
        self.f_new.is_finite() && test.converged(self.f_new, self.f, Some(&self.g_new))
    }

    /// An infinite trial value is an ordinary rejected step, the radius
    /// shrinks and the subproblem is solved again.
    fn trial_warning(&self) -> Option<Warning> {
        if self.f_new.is_nan() {
            Some(Warning::NanFunction)
        } else {
            None
        }
    }
}

/// Run a trust-region minimiser from `x0`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn minimize(
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    subproblem: Subproblem,
    hessian_type: HessianType,
    hessian_mod: Option<HessianModKind>,
    config: TrustRegionConfig,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    options.convergence_test()?;
    let mut solver = TrustRegion::new(
        ev,
        x0,
        subproblem,
        hessian_type,
        hessian_mod,
        config,
        options.verbosity,
    );
    iterate(&mut solver, ev, options)
}
