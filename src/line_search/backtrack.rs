use super::{LineSearchParams, Phi};

const CONTRACTION: f64 = 0.5;
const MAX_TRIES: usize = 500;

/// Armijo backtracking (Nocedal and Wright, Algorithm 3.1).
///
/// Halve the step until the sufficient decrease condition holds. Gives up
/// after a fixed number of contractions and returns the last, tiny, step.
pub(super) fn backtrack(phi: &mut Phi<'_, '_>, f: f64, slope: f64, params: &LineSearchParams) -> f64 {
    let mut a = params.a_init;
    for _ in 0..MAX_TRIES {
        let value = phi.value(a);
        if value <= f + params.mu * a * slope {
            return a;
        }
        a *= CONTRACTION;
    }
    a
}
