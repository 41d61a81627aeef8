//! Adaptive central difference quotients for scalar functions.
use nalgebra::Matrix3;
use num_traits::Float;

const STEP_RATIO: f64 = 2.0;

/// Approximate `$f'(x)$` with an adaptive central difference quotient.
///
/// The step selection follows
///
/// > R. S. Stepleman and N. D. Winarsky. Adaptive Numerical Differentiation.
/// > Mathematics of Computation, Vol. 33, No. 148 (Oct., 1979), pp. 1257-1264.
///
/// and the sequence of quotients is refined with a Richardson extrapolation
/// followed by Wynn's epsilon algorithm. Among the extrapolated values the one
/// with the smallest error estimate wins, where values far away from the
/// median are penalised.
///
/// Returns `None` if every quotient was `NaN`.
pub fn derivative<F: Float>(x: F, f: impl Fn(F) -> F) -> Option<F> {
    let ratio = constant::<F>(STEP_RATIO);
    let two = constant::<F>(2.0);
    let cbrt_eps = F::epsilon().cbrt();
    let central = |h: F| (f(x + h) - f(x - h)) / (two * h);

    let scale = if x.is_zero() { constant(0.01) } else { x };
    let mut h = (F::one() + x.abs()).ln().max(F::one()).max(ratio * cbrt_eps * scale);

    // grow h until the two function values differ by a resolvable amount
    let (upper, lower) = (f(x + h), f(x - h));
    if upper * lower > F::zero() && upper != lower {
        let fx = match f(x) {
            v if v.is_zero() => F::one(),
            v => v,
        };
        let spread = ((upper - lower) / fx).abs();
        if !spread.is_zero() {
            let mut digits = -spread.ln();
            let target = -(cbrt_eps * ratio).ln();
            while digits > target {
                h = h * ratio;
                digits = digits - ratio.ln();
            }
        }
    }

    let mut quotients = vec![central(h)];
    h = h / ratio;
    quotients.push(central(h));
    let mut shrink = 1;
    loop {
        h = h / ratio;
        if x + h == x || h < F::epsilon() {
            break;
        }
        let next = central(h);
        let last = quotients[quotients.len() - 1];
        let before = quotients[quotients.len() - 2];
        if shrink >= 4 && (next - last).abs() > (last - before).abs() * constant(10.0) {
            break;
        }
        quotients.push(next);
        shrink += 1;
    }

    let estimates = richardson(&quotients);
    if estimates.len() <= 2 {
        return estimates.last().copied().filter(|d| !d.is_nan());
    }
    robust_pick(wynn(&estimates))
}

fn constant<F: Float>(value: f64) -> F {
    F::from(value).unwrap_or_else(F::nan)
}

/// Eliminate the `$h^2$` and `$h^4$` error terms from consecutive triples.
fn richardson<F: Float>(quotients: &[F]) -> Vec<F> {
    if quotients.len() <= 3 {
        return quotients.last().copied().into_iter().collect();
    }
    let term = |i: i32, j: i32| STEP_RATIO.powi(-i * (2 * j + 2));
    #[rustfmt::skip]
    let system = Matrix3::new(
        1.0, 1.0,        1.0,
        1.0, term(1, 0), term(2, 0),
        1.0, term(1, 1), term(2, 1),
    );
    let weights = match system.pseudo_inverse(f64::EPSILON) {
        Ok(inverse) => [
            constant::<F>(inverse[(0, 0)]),
            constant::<F>(inverse[(1, 0)]),
            constant::<F>(inverse[(2, 0)]),
        ],
        Err(_) => return quotients.last().copied().into_iter().collect(),
    };
    quotients
        .windows(3)
        .map(|w| weights[0] * w[0] + weights[1] * w[1] + weights[2] * w[2])
        .collect()
}

/// Wynn's epsilon algorithm, returning `(estimate, error)` pairs.
fn wynn<F: Float>(estimates: &[F]) -> Vec<(F, F)> {
    let tiny = F::min_positive_value();
    let eps = F::epsilon();
    estimates
        .windows(3)
        .map(|w| {
            let (e0, e1, e2) = (w[0], w[1], w[2]);
            let err1 = (e1 - e0).abs();
            let err2 = (e2 - e1).abs();
            let d1 = if err1 < tiny { tiny } else { e1 - e0 };
            let d2 = if err2 < tiny { tiny } else { e2 - e1 };
            let tol1 = e1.abs().max(e0.abs()) * eps;
            let tol2 = e2.abs().max(e1.abs()) * eps;
            let ss = d2.recip() - d1.recip() + tiny;
            let converged = (err1 <= tol1 && err2 <= tol2) || (ss * e1).abs() <= constant(1.0e-3);
            if converged {
                (e2, err1 + err2 + tol2 * constant(10.0))
            } else {
                let value = e1 + ss.recip();
                (value, err1 + err2 + (value - e2).abs())
            }
        })
        .collect()
}

fn robust_pick<F: Float>(candidates: Vec<(F, F)>) -> Option<F> {
    let mut values: Vec<(F, F)> = candidates.into_iter().filter(|c| !c.0.is_nan()).collect();
    if values.is_empty() {
        return None;
    }
    values.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(core::cmp::Ordering::Equal));
    let last = (values.len() - 1) as f64;
    let percentile = |p: f64| {
        let pos = last * p;
        let weight = constant::<F>(pos.fract());
        values[pos.floor() as usize].0 * (F::one() - weight) + values[pos.ceil() as usize].0 * weight
    };
    let p25 = percentile(0.25);
    let median = percentile(0.5).abs();
    let p75 = percentile(0.75);
    let fence = (p75 - p25).abs() * constant(1.5);
    let trim = constant::<F>(10.0);

    values
        .iter()
        .map(|&(der, err)| {
            let far_from_median = median > constant(1.0e-8)
                && (der.abs() < median / trim || der.abs() > median * trim);
            let outside_fence = der < p25 - fence || p75 + fence < der;
            let penalty = if far_from_median || outside_fence {
                (der - median).abs()
            } else {
                F::zero()
            };
            (der, err + penalty)
        })
        .fold(None, |best: Option<(F, F)>, (der, err)| match best {
            Some((_, best_err)) if best_err <= err => best,
            _ => Some((der, err)),
        })
        .map(|(der, _)| der)
}
