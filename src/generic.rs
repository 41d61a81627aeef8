//! Algorithm selection and the common entry point.
use core::str::FromStr;

use nalgebra::DVector;

use crate::{
    annealing::{self, AnnealingConfig},
    constrained::{self, LinearConstraints, LogBarrierConfig, MultipliersConfig, NonlinearConstraints},
    descent::{self, Beta, Bfgs, ConjugateGradient, LineSearchSetup, Newton, NewtonCg, SteepestDescent},
    iteration::{MinimizationReport, MinimizerOptions},
    line_search::LineSearchConfig,
    lm::LevenbergMarquardt,
    options::{normalize, HessianModKind, HessianType, LineSearchKind, MinOptions},
    problem::{Evaluator, Oracle},
    simplex,
    trust_region::{self, Subproblem, TrustRegionConfig},
    MinimizeError, Warning,
};

#[cfg(test)]
mod test_dispatch;

/// Every selectable minimiser.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// Back-and-forth coordinate descent, `cd`.
    CoordinateDescent,
    /// `sd`
    SteepestDescent,
    /// Quasi-Newton BFGS, `bfgs`.
    Bfgs,
    /// `newton`
    Newton,
    /// Line-search Newton-CG, `ncg`.
    NewtonCg,
    /// Trust region with the Cauchy point, `cauchy*`.
    CauchyPoint,
    /// `dogleg*`
    Dogleg,
    /// `cg steihaug*` or `steihaug*`.
    Steihaug,
    /// Nearly exact trust-region subproblem solution, `exact*`.
    ExactTrustRegion,
    /// `fr`
    FletcherReeves,
    /// `pr`
    PolakRibiere,
    /// `pr+`
    PolakRibierePlus,
    /// `hs`
    HestenesStiefel,
    /// Nelder-Mead, `simplex`.
    Simplex,
    /// `lm`
    LevenbergMarquardt,
    /// Augmented Lagrangian, `mom`.
    MethodOfMultipliers,
    /// `log barrier`
    LogBarrier,
    /// `sa`
    SimulatedAnnealing,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::CoordinateDescent => "back-and-forth coordinate descent",
            Algorithm::SteepestDescent => "steepest descent",
            Algorithm::Bfgs => "BFGS",
            Algorithm::Newton => "Newton",
            Algorithm::NewtonCg => "Newton-CG",
            Algorithm::CauchyPoint => "Cauchy point",
            Algorithm::Dogleg => "dogleg",
            Algorithm::Steihaug => "CG-Steihaug",
            Algorithm::ExactTrustRegion => "exact trust region",
            Algorithm::FletcherReeves => "Fletcher-Reeves",
            Algorithm::PolakRibiere => "Polak-Ribiere",
            Algorithm::PolakRibierePlus => "Polak-Ribiere +",
            Algorithm::HestenesStiefel => "Hestenes-Stiefel",
            Algorithm::Simplex => "simplex",
            Algorithm::LevenbergMarquardt => "Levenberg-Marquardt",
            Algorithm::MethodOfMultipliers => "method of multipliers",
            Algorithm::LogBarrier => "logarithmic barrier function",
            Algorithm::SimulatedAnnealing => "simulated annealing",
        }
    }

    fn uses_line_search(&self) -> bool {
        matches!(
            self,
            Algorithm::CoordinateDescent
                | Algorithm::SteepestDescent
                | Algorithm::Bfgs
                | Algorithm::Newton
                | Algorithm::NewtonCg
        ) || self.conjugate_gradient().is_some()
    }

    fn subproblem(&self) -> Option<Subproblem> {
        match self {
            Algorithm::CauchyPoint => Some(Subproblem::Cauchy),
            Algorithm::Dogleg => Some(Subproblem::Dogleg),
            Algorithm::Steihaug => Some(Subproblem::Steihaug),
            Algorithm::ExactTrustRegion => Some(Subproblem::Exact),
            _ => None,
        }
    }

    fn conjugate_gradient(&self) -> Option<Beta> {
        match self {
            Algorithm::FletcherReeves => Some(Beta::FletcherReeves),
            Algorithm::PolakRibiere => Some(Beta::PolakRibiere),
            Algorithm::PolakRibierePlus => Some(Beta::PolakRibierePlus),
            Algorithm::HestenesStiefel => Some(Beta::HestenesStiefel),
            _ => None,
        }
    }

    /// Whether the algorithm can run inside a constrained wrapper.
    pub(crate) fn is_unconstrained(&self) -> bool {
        self.uses_line_search() || self.subproblem().is_some() || *self == Algorithm::Simplex
    }

    /// Line search and its `(mu, eta)` unless overridden.
    fn default_line_search(&self) -> (LineSearchKind, f64, f64) {
        match self {
            Algorithm::Bfgs => (LineSearchKind::Backtracking, 1e-4, 0.9),
            Algorithm::Newton | Algorithm::NewtonCg => (LineSearchKind::MoreThuente, 1e-4, 0.9),
            _ if self.conjugate_gradient().is_some() => (LineSearchKind::NocedalWrightWolfe, 1e-4, 0.1),
            _ => (LineSearchKind::Backtracking, 1e-4, 0.1),
        }
    }

    fn needs_gradient(&self) -> bool {
        !matches!(
            self,
            Algorithm::Simplex
                | Algorithm::SimulatedAnnealing
                | Algorithm::LogBarrier
                | Algorithm::MethodOfMultipliers
        )
    }

    fn needs_hessian(&self, hessian_type: HessianType) -> bool {
        match self {
            Algorithm::Newton | Algorithm::NewtonCg => true,
            _ if self.subproblem().is_some() => hessian_type == HessianType::Newton,
            _ => false,
        }
    }
}

impl core::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = MinimizeError;

    /// Case-insensitive, with ` `, `_` and `-` interchangeable.
    ///
    /// ```
    /// # use minimize::Algorithm;
    /// assert_eq!("BFGS".parse(), Ok(Algorithm::Bfgs));
    /// assert_eq!("Newton-CG".parse(), Ok(Algorithm::NewtonCg));
    /// assert_eq!("polak_ribiere+".parse(), Ok(Algorithm::PolakRibierePlus));
    /// assert!("Nelder".parse::<Algorithm>().is_err());
    /// ```
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let key = normalize(name);
        let algorithm = match key.as_str() {
            "cd" | "coordinate descent" => Algorithm::CoordinateDescent,
            "sd" | "steepest descent" => Algorithm::SteepestDescent,
            "bfgs" => Algorithm::Bfgs,
            "newton" => Algorithm::Newton,
            "ncg" | "newton cg" => Algorithm::NewtonCg,
            "fr" | "fletcher reeves" => Algorithm::FletcherReeves,
            "pr" | "polak ribiere" => Algorithm::PolakRibiere,
            "pr+" | "polak ribiere+" => Algorithm::PolakRibierePlus,
            "hs" | "hestenes stiefel" => Algorithm::HestenesStiefel,
            "simplex" => Algorithm::Simplex,
            "lm" | "levenberg marquardt" | "levenburg marquardt" => Algorithm::LevenbergMarquardt,
            "mom" => Algorithm::MethodOfMultipliers,
            "log barrier" => Algorithm::LogBarrier,
            "sa" | "simulated annealing" => Algorithm::SimulatedAnnealing,
            _ if key.starts_with("cauchy") => Algorithm::CauchyPoint,
            _ if key.starts_with("dogleg") => Algorithm::Dogleg,
            _ if key.starts_with("cg steihaug") || key.starts_with("steihaug") => Algorithm::Steihaug,
            _ if key.starts_with("exact") => Algorithm::ExactTrustRegion,
            _ if key.ends_with("method of multipliers") => Algorithm::MethodOfMultipliers,
            _ => return Err(MinimizeError::UnknownAlgorithm(name.into())),
        };
        Ok(algorithm)
    }
}

/// Tunables of the individual minimisers.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Tunables {
    pub line_search: LineSearchConfig,
    pub trust_region: TrustRegionConfig,
    pub levenberg_marquardt: LevenbergMarquardt,
    pub log_barrier: LogBarrierConfig,
    pub multipliers: MultipliersConfig,
    pub annealing: AnnealingConfig,
}

fn invalid(algorithm: Algorithm, reason: &str) -> MinimizeError {
    MinimizeError::InvalidOptions {
        algorithm: algorithm.name(),
        reason: reason.into(),
    }
}

/// Reject options the algorithm does not use and oracles it is missing.
pub(crate) fn check(algorithm: Algorithm, oracle: &Oracle<'_>, options: &MinOptions<'_>) -> Result<(), MinimizeError> {
    if options.line_search.is_some() && !algorithm.uses_line_search() {
        return Err(invalid(algorithm, "a line search is not used"));
    }
    if options.hessian_type.is_some() && algorithm.subproblem().is_none() {
        return Err(invalid(algorithm, "a Hessian type is only used by trust-region methods"));
    }
    if options.hessian_mod.is_some() {
        let modifiable = match algorithm.subproblem() {
            Some(subproblem) => subproblem.default_hessian_mod().is_some(),
            None => algorithm == Algorithm::Newton,
        };
        if !modifiable {
            return Err(invalid(algorithm, "the Hessian is not modified"));
        }
    }
    let least_squares = options.jacobian.is_some() || options.errors.is_some();
    if least_squares && algorithm != Algorithm::LevenbergMarquardt {
        return Err(invalid(algorithm, "a Jacobian and errors are only used by Levenberg-Marquardt"));
    }
    if options.inner_algorithm.is_some() && !matches!(algorithm, Algorithm::LogBarrier | Algorithm::MethodOfMultipliers) {
        return Err(invalid(algorithm, "an inner algorithm is only used by constrained methods"));
    }

    let hessian_type = options.hessian_type.unwrap_or(HessianType::Newton);
    if algorithm.needs_gradient() && !oracle.has_gradient() {
        return Err(MinimizeError::MissingOracle {
            algorithm: algorithm.name(),
            oracle: "gradient",
        });
    }
    if algorithm.needs_hessian(hessian_type) && !oracle.has_hessian() {
        return Err(MinimizeError::MissingOracle {
            algorithm: algorithm.name(),
            oracle: "Hessian",
        });
    }
    Ok(())
}

/// Run one of the unconstrained minimisers.
pub(crate) fn run_unconstrained(
    algorithm: Algorithm,
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    min_options: &MinOptions<'_>,
    options: &MinimizerOptions,
    tunables: &Tunables,
) -> Result<MinimizationReport, MinimizeError> {
    if algorithm == Algorithm::Simplex {
        return simplex::minimize(ev, x0, options);
    }
    if let Some(subproblem) = algorithm.subproblem() {
        let hessian_type = min_options.hessian_type.unwrap_or(HessianType::Newton);
        let hessian_mod = min_options.hessian_mod.or(subproblem.default_hessian_mod());
        return trust_region::minimize(
            ev,
            x0,
            subproblem,
            hessian_type,
            hessian_mod,
            tunables.trust_region,
            options,
        );
    }

    let (kind, mu, eta) = algorithm.default_line_search();
    let setup = LineSearchSetup {
        kind: min_options.line_search.unwrap_or(kind),
        params: tunables.line_search.params(mu, eta, options.verbosity),
    };
    let n = x0.len();
    match algorithm {
        Algorithm::CoordinateDescent => descent::minimize_coordinates(ev, x0, setup, options),
        Algorithm::SteepestDescent => descent::minimize(ev, x0, SteepestDescent, setup, options),
        Algorithm::Bfgs => descent::minimize(ev, x0, Bfgs::new(n), setup, options),
        Algorithm::Newton => {
            let hessian_mod = min_options.hessian_mod.unwrap_or(HessianModKind::Gmw);
            let rule = Newton::new(hessian_mod, options.verbosity);
            descent::minimize(ev, x0, rule, setup, options)
        }
        Algorithm::NewtonCg => descent::minimize(ev, x0, NewtonCg, setup, options),
        _ => match algorithm.conjugate_gradient() {
            Some(beta) => descent::minimize(ev, x0, ConjugateGradient::new(beta), setup, options),
            None => Err(invalid(algorithm, "not an unconstrained algorithm")),
        },
    }
}

/// The common entry point to every minimiser.
///
/// ```
/// # use nalgebra::DVector;
/// # use minimize::{Minimizer, MinimizerOptions, Oracle};
/// let f = |x: &DVector<f64>| (x[0] - 1.0).powi(2) + 10.0 * (x[1] + 2.0).powi(2);
/// let df = |x: &DVector<f64>| DVector::from_vec(vec![2.0 * (x[0] - 1.0), 20.0 * (x[1] + 2.0)]);
/// let report = Minimizer::from_name("bfgs")
///     .unwrap()
///     .with_options(MinimizerOptions::new().with_maxiter(1000))
///     .minimize(Oracle::new(&f).with_gradient(&df), DVector::zeros(2))
///     .unwrap();
/// assert!(report.warning.is_none());
/// assert!((report.x[1] + 2.0).abs() < 1e-6);
/// ```
#[derive(Clone)]
pub struct Minimizer<'a> {
    algorithm: Algorithm,
    min_options: MinOptions<'a>,
    options: MinimizerOptions,
    tunables: Tunables,
    linear: Option<LinearConstraints>,
    nonlinear: Option<NonlinearConstraints<'a>>,
    bounds: Option<(DVector<f64>, DVector<f64>)>,
}

impl<'a> Minimizer<'a> {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            min_options: MinOptions::default(),
            options: MinimizerOptions::default(),
            tunables: Tunables::default(),
            linear: None,
            nonlinear: None,
            bounds: None,
        }
    }

    /// # Errors
    ///
    /// Fails with [`MinimizeError::UnknownAlgorithm`] if the name matches no
    /// algorithm.
    pub fn from_name(name: &str) -> Result<Self, MinimizeError> {
        Ok(Self::new(name.parse()?))
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn with_min_options(self, min_options: MinOptions<'a>) -> Self {
        Self { min_options, ..self }
    }

    pub fn with_options(self, options: MinimizerOptions) -> Self {
        Self { options, ..self }
    }

    pub fn with_line_search_config(mut self, config: LineSearchConfig) -> Self {
        self.tunables.line_search = config;
        self
    }

    pub fn with_trust_region_config(mut self, config: TrustRegionConfig) -> Self {
        self.tunables.trust_region = config;
        self
    }

    pub fn with_levenberg_marquardt(mut self, config: LevenbergMarquardt) -> Self {
        self.tunables.levenberg_marquardt = config;
        self
    }

    pub fn with_log_barrier_config(mut self, config: LogBarrierConfig) -> Self {
        self.tunables.log_barrier = config;
        self
    }

    pub fn with_multipliers_config(mut self, config: MultipliersConfig) -> Self {
        self.tunables.multipliers = config;
        self
    }

    pub fn with_annealing_config(mut self, config: AnnealingConfig) -> Self {
        self.tunables.annealing = config;
        self
    }

    /// Linear inequality constraints `$\mathbf{A}\vec{x} \geq \vec{b}$`.
    pub fn with_linear_constraints(self, constraints: LinearConstraints) -> Self {
        Self {
            linear: Some(constraints),
            ..self
        }
    }

    /// General inequality constraints `$c_i(\vec{x}) \geq 0$`.
    pub fn with_nonlinear_constraints(self, constraints: NonlinearConstraints<'a>) -> Self {
        Self {
            nonlinear: Some(constraints),
            ..self
        }
    }

    /// Bounds `$l_i \leq x_i \leq u_i$`, required by simulated annealing.
    ///
    /// The constrained methods turn them into linear constraints when no
    /// other constraints are given.
    pub fn with_bounds(self, lower: DVector<f64>, upper: DVector<f64>) -> Self {
        Self {
            bounds: Some((lower, upper)),
            ..self
        }
    }

    /// Minimise from `x0`.
    ///
    /// A model without parameters is not optimised: `$f$` is evaluated once
    /// and the report carries [`Warning::NoOptimisation`].
    ///
    /// # Errors
    ///
    /// Every configuration problem is detected before the first iteration.
    pub fn minimize(&self, oracle: Oracle<'_>, x0: DVector<f64>) -> Result<MinimizationReport, MinimizeError> {
        let verbosity = self.options.verbosity;
        if x0.is_empty() {
            if verbosity >= 1 {
                log::info!("Cannot run optimisation on a model with zero parameters, directly calculating the function value.");
            }
            let mut ev = Evaluator::new(oracle);
            let f = ev.func(&x0);
            let report = MinimizationReport::from_evaluator(x0, f, 0, &ev, Some(Warning::NoOptimisation));
            report.log(verbosity);
            return Ok(report);
        }
        if verbosity >= 1 {
            log::info!("{}", self.algorithm.name());
        }

        let report = match self.algorithm {
            Algorithm::LevenbergMarquardt => self.levenberg_marquardt(oracle, x0),
            Algorithm::LogBarrier | Algorithm::MethodOfMultipliers => self.constrained(oracle, x0),
            Algorithm::SimulatedAnnealing => self.simulated_annealing(oracle, x0),
            algorithm => {
                check(algorithm, &oracle, &self.min_options)?;
                let mut ev = Evaluator::new(oracle);
                run_unconstrained(algorithm, &mut ev, x0, &self.min_options, &self.options, &self.tunables)
            }
        }?;
        report.log(verbosity);
        Ok(report)
    }

    fn levenberg_marquardt(&self, oracle: Oracle<'_>, x0: DVector<f64>) -> Result<MinimizationReport, MinimizeError> {
        let algorithm = Algorithm::LevenbergMarquardt;
        check(algorithm, &oracle, &self.min_options)?;
        let jacobian = self.min_options.jacobian.ok_or(MinimizeError::MissingOracle {
            algorithm: algorithm.name(),
            oracle: "Jacobian",
        })?;
        let errors = self
            .min_options
            .errors
            .as_ref()
            .ok_or_else(|| invalid(algorithm, "the measurement errors are required"))?;
        let mut ev = Evaluator::new(oracle);
        self.tunables
            .levenberg_marquardt
            .minimize_counted(&mut ev, jacobian, errors, x0, &self.options)
    }

    fn constrained(&self, oracle: Oracle<'_>, x0: DVector<f64>) -> Result<MinimizationReport, MinimizeError> {
        let algorithm = self.algorithm;
        let inner = self
            .min_options
            .inner_algorithm
            .ok_or(MinimizeError::MissingInnerAlgorithm(algorithm.name()))?;
        if !inner.is_unconstrained() {
            return Err(invalid(algorithm, "the inner algorithm must be unconstrained"));
        }
        let inner_options = self.min_options.inner();
        check(inner, &oracle, &inner_options)?;

        let from_bounds;
        let constraints: &dyn constrained::InequalityConstraints = match (&self.nonlinear, &self.linear, &self.bounds) {
            (Some(nonlinear), _, _) => nonlinear,
            (None, Some(linear), _) => linear,
            (None, None, Some((lower, upper))) => {
                from_bounds = LinearConstraints::from_bounds(lower, upper)?;
                &from_bounds
            }
            (None, None, None) => return Err(MinimizeError::MissingConstraints(algorithm.name())),
        };
        let run = constrained::Run {
            oracle,
            constraints,
            inner,
            inner_options: &inner_options,
            options: &self.options,
            tunables: &self.tunables,
        };
        match algorithm {
            Algorithm::LogBarrier => run.log_barrier(x0, &self.tunables.log_barrier),
            _ => run.method_of_multipliers(x0, &self.tunables.multipliers),
        }
    }

    fn simulated_annealing(&self, oracle: Oracle<'_>, x0: DVector<f64>) -> Result<MinimizationReport, MinimizeError> {
        let algorithm = Algorithm::SimulatedAnnealing;
        check(algorithm, &oracle, &self.min_options)?;
        let (lower, upper) = self
            .bounds
            .as_ref()
            .ok_or(MinimizeError::MissingBounds(algorithm.name()))?;
        let mut ev = Evaluator::new(oracle);
        annealing::minimize(&mut ev, x0, lower, upper, &self.tunables.annealing, &self.options)
    }
}
