//! The line search of More and Thuente.
//!
//! > J. J. More and D. J. Thuente. Line search algorithms with guaranteed
//! > sufficient decrease. ACM Trans. Math. Softw. 20 (1994), pp. 286-307.
//!
//! The interval of uncertainty `$I_k = [\alpha_l, \alpha_u]$` is updated from
//! the auxiliary function `$\psi(\alpha) = \phi(\alpha) - \mu\phi'(0)\alpha$`
//! until a step with `$\psi(\alpha) \leq 0$` and `$\phi'(\alpha) \geq 0$` is
//! found, and from `$\phi$` itself afterwards.
use super::{cubic, cubic_ext, quadratic, secant, LineSearchParams, Phi};
use crate::Warning;

const A_MIN: f64 = 1e-25;
const A_TOL: f64 = 1e-10;
const MAX_EVALUATIONS: usize = 100;
/// Fraction of the interval width a bracketed step has to remove.
const SHRINK: f64 = 0.66;
/// Lower and upper extrapolation factors before the minimiser is bracketed.
const EXTRAPOLATE: (f64, f64) = (1.1, 4.0);

#[derive(Copy, Clone, Debug, PartialEq)]
struct Trial {
    a: f64,
    value: f64,
    slope: f64,
}

impl Trial {
    /// Shift into the auxiliary function `$\psi$`.
    fn psi(self, curv: f64) -> Self {
        Self {
            a: self.a,
            value: self.value - curv * self.a,
            slope: self.slope - curv,
        }
    }
}

enum IntervalUpdate {
    /// `$\alpha_u^+ = \alpha_t$`.
    Upper,
    /// `$\alpha_l^+ = \alpha_t$`.
    Lower,
    /// `$\alpha_l^+ = \alpha_t$` and `$\alpha_u^+ = \alpha_l$`.
    Swap,
}

impl IntervalUpdate {
    fn classify(t: &Trial, l: &Trial) -> Self {
        if t.value > l.value {
            Self::Upper
        } else if t.slope * (l.a - t.a) > 0.0 {
            Self::Lower
        } else {
            Self::Swap
        }
    }
}

pub(super) fn more_thuente(
    phi: &mut Phi<'_, '_>,
    f: f64,
    slope: f64,
    params: &LineSearchParams,
) -> Result<f64, Warning> {
    if slope > 0.0 {
        return Err(Warning::Fatal(
            "The gradient at point 0 of this line search is positive, ie p is not a descent \
             direction and the line search will not work."
                .into(),
        ));
    }
    let (mu, eta) = (params.mu, params.eta);
    let a_max = 4.0 * params.a_init.max(1.0);
    let curv = mu * slope;

    let mut limits = (0.0, 5.0 * params.a_init);
    let mut width = a_max - A_MIN;
    let mut width2 = 2.0 * width;
    let mut bracketed = false;
    let mut modified = true;

    let origin = Trial { a: 0.0, value: f, slope };
    let (mut lower, mut upper) = (origin, origin);
    let mut trial = Trial {
        a: params.a_init,
        value: phi.value(params.a_init),
        slope: phi.slope(params.a_init),
    };

    for k in 0..MAX_EVALUATIONS {
        if params.verbosity >= 3 {
            log::trace!(
                "More-Thuente k: {}  a: {}  phi: {}  dphi: {}  I: [{}, {}]  bracketed: {}",
                k,
                trial.a,
                trial.value,
                trial.slope,
                lower.a,
                upper.a,
                bracketed
            );
        }
        let suff_dec = f + trial.a * curv;
        if modified && trial.value <= suff_dec && trial.slope >= 0.0 {
            modified = false;
        }

        // strong Wolfe conditions
        if trial.value <= suff_dec && trial.slope.abs() <= eta * slope.abs() {
            return Ok(trial.a);
        }
        if trial.a == A_MIN && (trial.value > suff_dec || trial.slope >= curv) {
            return Ok(trial.a);
        }
        if trial.a == a_max && trial.value <= suff_dec && trial.slope <= curv {
            return Ok(trial.a);
        }
        if bracketed
            && (trial.a <= limits.0 || trial.a >= limits.1 || limits.1 - limits.0 <= A_TOL * limits.1)
        {
            return Ok(trial.a);
        }

        let (mut a_new, update) = if modified && trial.value <= lower.value && trial.value > suff_dec {
            let (t, l, u) = (trial.psi(curv), lower.psi(curv), upper.psi(curv));
            (select(&t, &l, &u, &mut bracketed, limits), IntervalUpdate::classify(&t, &l))
        } else {
            (
                select(&trial, &lower, &upper, &mut bracketed, limits),
                IntervalUpdate::classify(&trial, &lower),
            )
        };
        match update {
            IntervalUpdate::Upper => upper = trial,
            IntervalUpdate::Lower => lower = trial,
            IntervalUpdate::Swap => {
                upper = lower;
                lower = trial;
            }
        }
        if !a_new.is_finite() {
            // interpolation through an infinite value, bisect instead
            a_new = 0.5 * (lower.a + upper.a);
        }

        if bracketed {
            let size = (lower.a - upper.a).abs();
            if size >= SHRINK * width2 {
                a_new = 0.5 * (lower.a + upper.a);
            }
            width2 = width;
            width = size;
            limits = (lower.a.min(upper.a), lower.a.max(upper.a));
            if a_new <= limits.0 || a_new >= limits.1 || limits.1 - limits.0 <= A_TOL * limits.1 {
                // roundoff, fall back to the best step so far
                a_new = lower.a;
            }
        } else {
            limits = (
                a_new + EXTRAPOLATE.0 * (a_new - lower.a),
                a_new + EXTRAPOLATE.1 * (a_new - lower.a),
            );
        }
        let a_new = a_new.max(A_MIN).min(a_max);

        trial = Trial {
            a: a_new,
            value: phi.value(a_new),
            slope: phi.slope(a_new),
        };
    }
    Ok(trial.a)
}

/// Choose the next trial step from the trial `t` and the interval `[l, u]`.
fn select(t: &Trial, l: &Trial, u: &Trial, bracketed: &mut bool, limits: (f64, f64)) -> f64 {
    if t.value > l.value {
        // higher function value, the minimum is bracketed
        *bracketed = true;
        let ac = cubic(l.a, t.a, l.value, t.value, l.slope, t.slope);
        let aq = quadratic(l.a, t.a, l.value, t.value, l.slope);
        if (ac - l.a).abs() < (aq - l.a).abs() {
            ac
        } else {
            0.5 * (aq + ac)
        }
    } else if t.slope * l.slope < 0.0 {
        // derivatives of opposite sign, the minimum is bracketed
        *bracketed = true;
        let ac = cubic(l.a, t.a, l.value, t.value, l.slope, t.slope);
        let asec = secant(l.a, t.a, l.slope, t.slope);
        if (ac - t.a).abs() >= (asec - t.a).abs() {
            ac
        } else {
            asec
        }
    } else if t.slope.abs() <= l.slope.abs() {
        // the derivative magnitude decreases
        let ac = cubic_ext(l.a, t.a, l.value, t.value, l.slope, t.slope).unwrap_or({
            if t.a > l.a {
                limits.1
            } else {
                limits.0
            }
        });
        let asec = secant(l.a, t.a, l.slope, t.slope);
        if *bracketed {
            let a = if (ac - t.a).abs() < (asec - t.a).abs() { ac } else { asec };
            let bound = t.a + SHRINK * (u.a - t.a);
            if t.a > l.a {
                bound.min(a)
            } else {
                bound.max(a)
            }
        } else {
            let a = if (ac - t.a).abs() > (asec - t.a).abs() { ac } else { asec };
            if a < limits.0 {
                limits.0
            } else if a > limits.1 {
                limits.1
            } else {
                a
            }
        }
    } else if *bracketed {
        cubic(u.a, t.a, u.value, t.value, u.slope, t.slope)
    } else if t.a > l.a {
        limits.1
    } else {
        limits.0
    }
}
