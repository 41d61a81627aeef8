use nalgebra::DVector;

use crate::{
    convergence::ConvergenceTest,
    problem::Evaluator,
    MinimizeError, Warning,
};

/// Termination and tracing settings shared by all minimisers.
///
/// The defaults are a function tolerance of `1e-25`, no gradient tolerance,
/// `1_000_000` iterations and no tracing.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MinimizerOptions {
    pub(crate) func_tol: Option<f64>,
    pub(crate) grad_tol: Option<f64>,
    pub(crate) maxiter: usize,
    pub(crate) verbosity: u8,
}

impl MinimizerOptions {
    pub fn new() -> Self {
        Self {
            func_tol: Some(1e-25),
            grad_tol: None,
            maxiter: 1_000_000,
            verbosity: 0,
        }
    }

    /// Stop once `$|f_{k+1} - f_k| \leq \mathtt{func\_tol}$`.
    ///
    /// # Panics
    ///
    /// Panics if the tolerance is negative.
    pub fn with_func_tol(self, func_tol: Option<f64>) -> Self {
        assert!(func_tol.map_or(true, |t| t >= 0.0), "func_tol must be >= 0");
        Self { func_tol, ..self }
    }

    /// Stop once `$\|\nabla f(\vec{x}_{k+1})\| \leq \mathtt{grad\_tol}$`.
    ///
    /// # Panics
    ///
    /// Panics if the tolerance is negative.
    pub fn with_grad_tol(self, grad_tol: Option<f64>) -> Self {
        assert!(grad_tol.map_or(true, |t| t >= 0.0), "grad_tol must be >= 0");
        Self { grad_tol, ..self }
    }

    /// Set the maximal number of iterations.
    ///
    /// # Panics
    ///
    /// Panics if `$\mathtt{maxiter} = 0$`.
    pub fn with_maxiter(self, maxiter: usize) -> Self {
        assert!(maxiter > 0, "maxiter must be > 0");
        Self { maxiter, ..self }
    }

    /// Tracing level: 0 is silent, 1 logs the final result, 2 adds every
    /// iterate and 3 adds line-search and trust-region internals.
    ///
    /// Tracing goes through the `log` facade and never changes the numerics.
    pub fn with_verbosity(self, verbosity: u8) -> Self {
        Self { verbosity, ..self }
    }

    pub fn maxiter(&self) -> usize {
        self.maxiter
    }

    pub(crate) fn convergence_test(&self) -> Result<ConvergenceTest, MinimizeError> {
        ConvergenceTest::new(self.func_tol, self.grad_tol)
    }
}

impl Default for MinimizerOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about the minimisation.
///
/// `f` is always the true function value at `x`, never a stale estimate.
/// Use `warning` to check whether the run terminated abnormally.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizationReport {
    pub x: DVector<f64>,
    pub f: f64,
    pub iterations: usize,
    pub f_count: usize,
    pub g_count: usize,
    pub h_count: usize,
    pub warning: Option<Warning>,
}

impl MinimizationReport {
    pub(crate) fn from_evaluator(
        x: DVector<f64>,
        f: f64,
        iterations: usize,
        ev: &Evaluator<'_>,
        warning: Option<Warning>,
    ) -> Self {
        Self {
            x,
            f,
            iterations,
            f_count: ev.f_count,
            g_count: ev.g_count,
            h_count: ev.h_count,
            warning,
        }
    }

    pub(crate) fn log(&self, verbosity: u8) {
        if verbosity == 0 {
            return;
        }
        log::info!("Parameter values: {:?}", self.x.as_slice());
        log::info!("Function value:   {}", self.f);
        log::info!("Iterations:       {}", self.iterations);
        log::info!("Function calls:   {}", self.f_count);
        log::info!("Gradient calls:   {}", self.g_count);
        log::info!("Hessian calls:    {}", self.h_count);
        match &self.warning {
            Some(warning) => log::info!("Warning:          {}", warning),
            None => log::info!("Warning:          None"),
        }
    }
}

/// One iterative minimiser, driven by [`iterate`].
///
/// Implementors keep a current iterate `$\vec{x}_k$` and a trial iterate
/// `$\vec{x}_{k+1}$`, both with their function values.
pub(crate) trait Solver {
    /// Compute and evaluate the trial point.
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning>;

    /// Shift or reject the trial point and prepare the next iteration.
    fn update(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning>;

    fn current(&self) -> (&DVector<f64>, f64);

    fn trial(&self) -> (&DVector<f64>, f64);

    /// Gradient at the trial point, if the method computes one.
    fn trial_gradient(&self) -> Option<&DVector<f64>>;

    fn converged(&self, test: &ConvergenceTest) -> bool {
        let (_, f) = self.current();
        let (_, f_new) = self.trial();
        test.converged(f_new, f, self.trial_gradient())
    }

    /// Warning for a trial value the method cannot continue from.
    fn trial_warning(&self) -> Option<Warning> {
        let (_, f_new) = self.trial();
        if f_new == f64::INFINITY {
            Some(Warning::InfiniteFunction)
        } else if f_new.is_nan() {
            Some(Warning::NanFunction)
        } else {
            None
        }
    }
}

/// The main iteration loop.
///
/// Each pass computes new parameters, then tests in order for the iteration
/// limit, convergence and an unusable trial value before updating. The
/// reported point is the trial point unless it is worse than the current one.
pub(crate) fn iterate<S: Solver>(
    solver: &mut S,
    ev: &mut Evaluator<'_>,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    let test = options.convergence_test()?;
    let mut k = 0;
    let warning = loop {
        if options.verbosity >= 2 {
            let (x, f) = solver.current();
            log::debug!("k: {:<8} xk: {:?}  fk: {}", k, x.as_slice(), f);
        }
        if let Err(warning) = solver.new_params(ev) {
            let (x, f) = solver.current();
            return Ok(MinimizationReport::from_evaluator(x.clone(), f, k, ev, Some(warning)));
        }
        if k + 1 >= options.maxiter {
            break Some(Warning::MaxIterations);
        }
        if solver.converged(&test) {
            break None;
        }
        if let Some(warning) = solver.trial_warning() {
            break Some(warning);
        }
        if let Err(warning) = solver.update(ev) {
            break Some(warning);
        }
        k += 1;
    };

    let (x, f) = solver.current();
    let (x_new, f_new) = solver.trial();
    let (x, f) = if f_new <= f || f.is_nan() {
        (x_new, f_new)
    } else {
        (x, f)
    };
    Ok(MinimizationReport::from_evaluator(x.clone(), f, k + 1, ev, warning))
}
