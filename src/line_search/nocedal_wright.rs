//! The line searches of Nocedal and Wright, Numerical Optimization, chapter 3.
use super::{quadratic, LineSearchParams, Phi};

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;

/// Interpolation search on sufficient decrease only.
///
/// The first rejected step is replaced by the minimiser of the quadratic
/// through `$\phi(0)$`, `$\phi'(0)$` and `$\phi(\alpha_0)$`; later ones by
/// the minimiser of the cubic through the last two trials. Every new step is
/// kept within `$[0.1\alpha, 0.5\alpha]$` of the previous one.
pub(super) fn interpolation(
    phi: &mut Phi<'_, '_>,
    f: f64,
    slope: f64,
    params: &LineSearchParams,
) -> f64 {
    let sufficient = |a: f64, value: f64| value <= f + params.mu * a * slope;

    let mut a = params.a_init;
    let mut value = phi.value(a);
    if sufficient(a, value) {
        return a;
    }

    let mut a_prev = a;
    let mut value_prev = value;
    a = safeguard(-slope * a * a / (2.0 * (value - f - slope * a)), a);

    for _ in 0..MAX_ITERATIONS {
        value = phi.value(a);
        if sufficient(a, value) {
            return a;
        }

        let denom = a_prev * a_prev * a * a * (a - a_prev);
        let r = value - f - slope * a;
        let r_prev = value_prev - f - slope * a_prev;
        let c3 = (a_prev * a_prev * r - a * a * r_prev) / denom;
        let c2 = (-a_prev.powi(3) * r + a.powi(3) * r_prev) / denom;
        let a_new = if c3 == 0.0 {
            -slope / (2.0 * c2)
        } else {
            (-c2 + (c2 * c2 - 3.0 * c3 * slope).max(0.0).sqrt()) / (3.0 * c3)
        };

        a_prev = a;
        value_prev = value;
        a = safeguard(a_new, a);
    }
    a
}

fn safeguard(a_new: f64, a: f64) -> f64 {
    if a_new.is_finite() {
        a_new.clamp(0.1 * a, 0.5 * a)
    } else {
        0.5 * a
    }
}

/// Strong Wolfe search by bracketing and zoom (Algorithms 3.5 and 3.6).
///
/// If the bracket collapses without a Wolfe point, the best end found so far
/// is returned.
pub(super) fn wolfe(phi: &mut Phi<'_, '_>, f: f64, slope: f64, params: &LineSearchParams) -> f64 {
    let a_max = 100.0 * params.a_init.max(1.0);
    let mut a_prev = 0.0;
    let mut value_prev = f;
    let mut slope_prev = slope;
    let mut a = params.a_init;

    for i in 0..MAX_ITERATIONS {
        let value = phi.value(a);
        if value > f + params.mu * a * slope || (i > 0 && value >= value_prev) {
            let lo = Trial { a: a_prev, value: value_prev, slope: slope_prev };
            return zoom(phi, f, slope, lo, Trial { a, value, slope: 0.0 }, params);
        }
        let slope_a = phi.slope(a);
        if slope_a.abs() <= -params.eta * slope {
            return a;
        }
        if slope_a >= 0.0 {
            let lo = Trial { a, value, slope: slope_a };
            let hi = Trial { a: a_prev, value: value_prev, slope: slope_prev };
            return zoom(phi, f, slope, lo, hi, params);
        }
        if a >= a_max {
            return a;
        }
        a_prev = a;
        value_prev = value;
        slope_prev = slope_a;
        a = (2.0 * a).min(a_max);
    }
    a
}

#[derive(Copy, Clone, Debug)]
struct Trial {
    a: f64,
    value: f64,
    slope: f64,
}

fn zoom(
    phi: &mut Phi<'_, '_>,
    f: f64,
    slope: f64,
    mut lo: Trial,
    mut hi: Trial,
    params: &LineSearchParams,
) -> f64 {
    for _ in 0..MAX_ITERATIONS {
        let width = hi.a - lo.a;
        if width.abs() <= TOLERANCE * lo.a.abs().max(hi.a.abs()) {
            break;
        }

        let a_q = quadratic(lo.a, hi.a, lo.value, hi.value, lo.slope);
        let mut t = (a_q - lo.a) / width;
        if !t.is_finite() {
            t = 0.5;
        }
        let a = lo.a + t.clamp(0.1, 0.66) * width;

        let value = phi.value(a);
        if value > f + params.mu * a * slope || value >= lo.value {
            hi = Trial { a, value, slope: 0.0 };
            continue;
        }
        let slope_a = phi.slope(a);
        if slope_a.abs() <= -params.eta * slope {
            return a;
        }
        if slope_a * (hi.a - lo.a) >= 0.0 {
            hi = lo;
        }
        if (lo.value - value).abs() <= TOLERANCE * lo.value.abs() && lo.a != 0.0 {
            return a;
        }
        lo = Trial { a, value, slope: slope_a };
    }
    lo.a
}
