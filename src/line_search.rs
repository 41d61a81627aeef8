//! Step length selection along a search direction.
//!
//! All searches work on the restriction `$\phi(\alpha) = f(\vec{x} + \alpha\vec{p})$`
//! and return the accepted step length. A failure that makes further
//! progress impossible is returned as a [`Warning`].
use nalgebra::DVector;

use crate::{options::LineSearchKind, problem::Evaluator, Warning};

mod backtrack;
mod interpolate;
mod more_thuente;
mod nocedal_wright;

#[cfg(test)]
mod test_wolfe;

pub(crate) use interpolate::{cubic, cubic_ext, quadratic, secant};

/// User tunables of the line searches.
///
/// Unset constants take the default of the minimiser, see
/// [`Algorithm`](crate::Algorithm).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineSearchConfig {
    mu: Option<f64>,
    eta: Option<f64>,
    a0: f64,
}

impl LineSearchConfig {
    pub fn new() -> Self {
        Self {
            mu: None,
            eta: None,
            a0: 1.0,
        }
    }

    /// Set the sufficient decrease constant `$\mu$`.
    ///
    /// # Panics
    ///
    /// Panics unless `$0 < \mu < 1$`.
    pub fn with_mu(self, mu: f64) -> Self {
        assert!(mu > 0.0 && mu < 1.0, "mu must be in (0, 1)");
        Self { mu: Some(mu), ..self }
    }

    /// Set the curvature constant `$\eta$`.
    ///
    /// # Panics
    ///
    /// Panics unless `$0 < \eta < 1$`.
    pub fn with_eta(self, eta: f64) -> Self {
        assert!(eta > 0.0 && eta < 1.0, "eta must be in (0, 1)");
        Self {
            eta: Some(eta),
            ..self
        }
    }

    /// Set the initial step length.
    ///
    /// # Panics
    ///
    /// Panics if `$\alpha_0 \leq 0$`.
    pub fn with_a0(self, a0: f64) -> Self {
        assert!(a0 > 0.0, "a0 must be > 0");
        Self { a0, ..self }
    }

    /// Resolve against the defaults of a minimiser.
    pub(crate) fn params(&self, mu: f64, eta: f64, verbosity: u8) -> LineSearchParams {
        LineSearchParams {
            a_init: self.a0,
            mu: self.mu.unwrap_or(mu),
            eta: self.eta.unwrap_or(eta),
            verbosity,
        }
    }
}

impl Default for LineSearchConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Tunables shared by the line searches.
///
/// `mu` is the sufficient decrease constant and `eta` the curvature constant,
/// with `$0 < \mu < \eta < 1$`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct LineSearchParams {
    pub a_init: f64,
    pub mu: f64,
    pub eta: f64,
    pub verbosity: u8,
}

impl LineSearchParams {
    pub fn new(mu: f64, eta: f64) -> Self {
        Self {
            a_init: 1.0,
            mu,
            eta,
            verbosity: 0,
        }
    }
}

/// The restriction of the objective to a ray.
pub(crate) struct Phi<'s, 'a> {
    ev: &'s mut Evaluator<'a>,
    x: &'s DVector<f64>,
    p: &'s DVector<f64>,
}

impl<'s, 'a> Phi<'s, 'a> {
    pub fn new(ev: &'s mut Evaluator<'a>, x: &'s DVector<f64>, p: &'s DVector<f64>) -> Self {
        Self { ev, x, p }
    }

    fn point(&self, a: f64) -> DVector<f64> {
        self.x + self.p * a
    }

    pub fn value(&mut self, a: f64) -> f64 {
        let point = self.point(a);
        self.ev.func(&point)
    }

    pub fn slope(&mut self, a: f64) -> f64 {
        let point = self.point(a);
        self.ev.slope(&point, self.p)
    }
}

/// Run the selected line search from `x` with value `f` and gradient `g`.
pub(crate) fn line_search(
    kind: LineSearchKind,
    ev: &mut Evaluator<'_>,
    x: &DVector<f64>,
    f: f64,
    g: &DVector<f64>,
    p: &DVector<f64>,
    params: &LineSearchParams,
) -> Result<f64, Warning> {
    let slope = g.dot(p);
    let mut phi = Phi::new(ev, x, p);
    let alpha = match kind {
        LineSearchKind::Backtracking => Ok(backtrack::backtrack(&mut phi, f, slope, params)),
        LineSearchKind::NocedalWrightInterpolation => {
            Ok(nocedal_wright::interpolation(&mut phi, f, slope, params))
        }
        LineSearchKind::NocedalWrightWolfe => Ok(nocedal_wright::wolfe(&mut phi, f, slope, params)),
        LineSearchKind::MoreThuente => more_thuente::more_thuente(&mut phi, f, slope, params),
        LineSearchKind::None => Ok(params.a_init),
    }?;
    if params.verbosity >= 3 {
        log::trace!("{:?} line search: alpha = {}", kind, alpha);
    }
    Ok(alpha)
}
