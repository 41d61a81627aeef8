//! One-dimensional interpolation steps for the line searches.
//!
//! Each function returns the minimiser of a model fitted to function values
//! `fa`, `fb` and derivatives `ga`, `gb` at the two points `a` and `b`.

/// Minimiser of the cubic interpolating `fa`, `fb`, `ga` and `gb`.
pub(crate) fn cubic(a: f64, b: f64, fa: f64, fb: f64, ga: f64, gb: f64) -> f64 {
    let d1 = ga + gb - 3.0 * (fa - fb) / (a - b);
    let root = (d1 * d1 - ga * gb).max(0.0).sqrt();
    let d2 = if b < a { -root } else { root };
    let denom = gb - ga + 2.0 * d2;
    if denom == 0.0 {
        return 0.5 * (a + b);
    }
    b - (b - a) * (gb + d2 - d1) / denom
}

/// Minimiser of the cubic interpolating `fa`, `fb`, `ga` and `gb`, when it lies
/// beyond `b` on the side away from `a`.
///
/// Returns `None` if the cubic does not tend to infinity in the direction of
/// the step or its minimiser lies between the points.
pub(crate) fn cubic_ext(a: f64, b: f64, fa: f64, fb: f64, ga: f64, gb: f64) -> Option<f64> {
    let theta = 3.0 * (fa - fb) / (b - a) + ga + gb;
    let s = theta.abs().max(ga.abs()).max(gb.abs());
    if s == 0.0 {
        return None;
    }
    let mut gamma = s * ((theta / s).powi(2) - (ga / s) * (gb / s)).max(0.0).sqrt();
    if b > a {
        gamma = -gamma;
    }
    let p = (gamma - gb) + theta;
    let q = (gamma + (ga - gb)) + gamma;
    let r = p / q;
    if r < 0.0 && gamma != 0.0 {
        Some(b + r * (a - b))
    } else {
        None
    }
}

/// Minimiser of the quadratic interpolating `fa`, `fb` and `ga`.
pub(crate) fn quadratic(a: f64, b: f64, fa: f64, fb: f64, ga: f64) -> f64 {
    a + ((ga / ((fa - fb) / (b - a) + ga)) / 2.0) * (b - a)
}

/// Minimiser of the quadratic interpolating `ga` and `gb`.
pub(crate) fn secant(a: f64, b: f64, ga: f64, gb: f64) -> f64 {
    a + ga / (ga - gb) * (b - a)
}
