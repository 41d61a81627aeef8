//! Bound constrained simulated annealing.
use nalgebra::DVector;
use pcg_rand::Pcg64;
use rand::{
    distributions::{Distribution, Uniform},
    SeedableRng,
};

use crate::{
    iteration::{MinimizationReport, MinimizerOptions},
    problem::Evaluator,
    MinimizeError, Warning,
};

/// Cooling steps in a row without improvement before the run has converged.
const STALLED_COOLING: usize = 5;
/// Random points sampled to estimate the initial temperature.
const TEMPERATURE_SAMPLES: usize = 50;

/// Tunables of simulated annealing.
///
/// Each cooling step draws `dwell` trial points uniformly from a box around
/// the current point, accepting uphill moves with the Boltzmann probability
/// `$\exp(-\Delta f/T)$`. The box is the bounds scaled by `$T/T_0$`. After
/// every cooling step the chain restarts from the best point found and the
/// temperature is multiplied by `cooling`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AnnealingConfig {
    pub(crate) seed: u64,
    pub(crate) t0: Option<f64>,
    pub(crate) cooling: f64,
    pub(crate) dwell: usize,
    pub(crate) max_cooling: usize,
    pub(crate) max_accepted: Option<usize>,
}

impl AnnealingConfig {
    pub fn new() -> Self {
        Self {
            seed: 0,
            t0: None,
            cooling: 0.9,
            dwell: 50,
            max_cooling: 400,
            max_accepted: None,
        }
    }

    /// Seed of the random number generator. Equal seeds give equal runs.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Set the initial temperature. By default it is 1.2 times the spread of
    /// `$f$` over 50 random points inside the bounds.
    ///
    /// # Panics
    ///
    /// Panics if `$T_0 \leq 0$`.
    pub fn with_t0(self, t0: f64) -> Self {
        assert!(t0 > 0.0, "t0 must be > 0");
        Self { t0: Some(t0), ..self }
    }

    /// # Panics
    ///
    /// Panics unless the cooling factor is in `$(0, 1)$`.
    pub fn with_cooling(self, cooling: f64) -> Self {
        assert!(cooling > 0.0 && cooling < 1.0, "cooling must be in (0, 1)");
        Self { cooling, ..self }
    }

    /// # Panics
    ///
    /// Panics if `dwell` is zero.
    pub fn with_dwell(self, dwell: usize) -> Self {
        assert!(dwell > 0, "dwell must be > 0");
        Self { dwell, ..self }
    }

    /// # Panics
    ///
    /// Panics if `max_cooling` is zero.
    pub fn with_max_cooling(self, max_cooling: usize) -> Self {
        assert!(max_cooling > 0, "max_cooling must be > 0");
        Self { max_cooling, ..self }
    }

    /// Stop after this many accepted trial points.
    pub fn with_max_accepted(self, max_accepted: usize) -> Self {
        Self {
            max_accepted: Some(max_accepted),
            ..self
        }
    }
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn check_bounds(
    x0: &DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> Result<(), MinimizeError> {
    if lower.len() != x0.len() || upper.len() != x0.len() {
        return Err(MinimizeError::DimensionMismatch(format!(
            "{} parameters but {} lower and {} upper bounds",
            x0.len(),
            lower.len(),
            upper.len()
        )));
    }
    let valid = lower
        .iter()
        .zip(upper.iter())
        .all(|(&l, &u)| l.is_finite() && u.is_finite() && l <= u);
    if !valid {
        return Err(MinimizeError::InvalidOptions {
            algorithm: "simulated annealing",
            reason: "the bounds must be finite with lower <= upper".into(),
        });
    }
    Ok(())
}

fn initial_temperature(
    ev: &mut Evaluator<'_>,
    rng: &mut Pcg64,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
) -> f64 {
    let unit = Uniform::new(0.0, 1.0);
    let (mut min, mut max) = (f64::INFINITY, f64::NEG_INFINITY);
    for _ in 0..TEMPERATURE_SAMPLES {
        let point = lower.zip_map(upper, |l, u| l + unit.sample(rng) * (u - l));
        let value = ev.func(&point);
        if value.is_finite() {
            min = min.min(value);
            max = max.max(value);
        }
    }
    let t0 = 1.2 * (max - min);
    if t0.is_finite() && t0 > 0.0 {
        t0
    } else {
        1.0
    }
}

/// Minimise within `$l_i \leq x_i \leq u_i$` from `x0`, which is clamped
/// into the bounds first.
pub(crate) fn minimize(
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    lower: &DVector<f64>,
    upper: &DVector<f64>,
    config: &AnnealingConfig,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    let test = options.convergence_test()?;
    check_bounds(&x0, lower, upper)?;

    let mut rng = Pcg64::seed_from_u64(config.seed);
    let t0 = match config.t0 {
        Some(t0) => t0,
        None => initial_temperature(ev, &mut rng, lower, upper),
    };
    let step = Uniform::new_inclusive(-1.0, 1.0);
    let unit = Uniform::new(0.0, 1.0);
    let range = upper - lower;

    let mut x = x0.zip_zip_map(lower, upper, |xi, l, u| xi.clamp(l, u));
    let mut f = ev.func(&x);
    let (mut best_x, mut best_f) = (x.clone(), f);
    let mut temperature = t0;
    let (mut iterations, mut accepted, mut stalled) = (0, 0, 0);
    let mut cooling = 0;

    let warning = 'cooling: loop {
        if options.verbosity >= 2 {
            log::debug!("k: {:<8} T: {:e}  best: {}", cooling, temperature, best_f);
        }
        let previous_best = best_f;
        let scale = temperature / t0;
        for _ in 0..config.dwell {
            let trial = DVector::from_fn(x.len(), |i, _| {
                (x[i] + scale * range[i] * step.sample(&mut rng)).clamp(lower[i], upper[i])
            });
            let f_trial = ev.func(&trial);
            iterations += 1;

            let delta = f_trial - f;
            if delta < 0.0 || unit.sample(&mut rng) < (-delta / temperature).exp() {
                x = trial;
                f = f_trial;
                accepted += 1;
                if f < best_f {
                    best_x = x.clone();
                    best_f = f;
                }
            }
            if iterations >= options.maxiter {
                break 'cooling Some(Warning::MaxIterations);
            }
            if config.max_accepted.map_or(false, |max| accepted >= max) {
                break 'cooling Some(Warning::MaxAccepted);
            }
        }

        if test.converged(best_f, previous_best, None) && test.converged(f, best_f, None) {
            stalled += 1;
        } else {
            stalled = 0;
        }
        if stalled >= STALLED_COOLING {
            break None;
        }

        x = best_x.clone();
        f = best_f;
        temperature *= config.cooling;
        cooling += 1;
        if cooling >= config.max_cooling {
            break Some(Warning::MaxCooling);
        }
    };

    Ok(MinimizationReport::from_evaluator(best_x, best_f, iterations, ev, warning))
}
