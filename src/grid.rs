//! Exhaustive search over a grid of points.
use nalgebra::DVector;

use crate::{
    constrained::LinearConstraints,
    iteration::MinimizationReport,
    problem::{Evaluator, ObjectiveFn, Oracle},
    MinimizeError, Warning,
};

/// Grids of this many points or more are refused.
const MAX_GRID_SIZE: usize = 100_000_000;

/// The values searched along each dimension.
///
/// ```
/// # use minimize::GridSpec;
/// let spec = GridSpec::linear(&[3, 1], &[0.0, -1.0], &[1.0, 1.0]).unwrap();
/// assert_eq!(spec.increments(), &[vec![0.0, 0.5, 1.0], vec![0.0]]);
/// assert_eq!(spec.size(), Some(3));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GridSpec {
    increments: Vec<Vec<f64>>,
}

impl GridSpec {
    /// `num_incs[k]` evenly spaced values from `lower[k]` to `upper[k]`, or
    /// the midpoint for a single increment.
    ///
    /// # Errors
    ///
    /// Fails if the lengths differ or an increment count is zero.
    pub fn linear(num_incs: &[usize], lower: &[f64], upper: &[f64]) -> Result<Self, MinimizeError> {
        if lower.len() != num_incs.len() || upper.len() != num_incs.len() {
            return Err(MinimizeError::DimensionMismatch(format!(
                "{} increment counts, {} lower and {} upper bounds",
                num_incs.len(),
                lower.len(),
                upper.len()
            )));
        }
        let increments = num_incs
            .iter()
            .zip(lower.iter().zip(upper.iter()))
            .map(|(&num, (&l, &u))| match num {
                1 => vec![(l + u) / 2.0],
                _ => (0..num)
                    .map(|i| l + i as f64 * (u - l) / (num - 1) as f64)
                    .collect(),
            })
            .collect();
        Self::from_increments(increments)
    }

    /// Explicit values along each dimension.
    ///
    /// # Errors
    ///
    /// Fails if a dimension has no values.
    pub fn from_increments(increments: Vec<Vec<f64>>) -> Result<Self, MinimizeError> {
        if let Some(k) = increments.iter().position(|values| values.is_empty()) {
            return Err(MinimizeError::Grid(format!("dimension {} has no increments", k)));
        }
        Ok(Self { increments })
    }

    pub fn increments(&self) -> &[Vec<f64>] {
        &self.increments
    }

    /// Number of grid points, `None` on overflow.
    pub fn size(&self) -> Option<usize> {
        self.increments
            .iter()
            .try_fold(1usize, |size, values| size.checked_mul(values.len()))
    }

    pub fn dimension(&self) -> usize {
        self.increments.len()
    }
}

fn check_size(size: Option<usize>) -> Result<usize, MinimizeError> {
    match size {
        Some(size) if size < MAX_GRID_SIZE => Ok(size),
        Some(size) => Err(MinimizeError::Grid(format!(
            "a grid search of size {} is too large",
            size
        ))),
        None => Err(MinimizeError::Grid("the grid size overflows".into())),
    }
}

fn check_constraints(
    constraints: Option<&LinearConstraints>,
    n: usize,
) -> Result<(), MinimizeError> {
    match constraints {
        Some(constraints) if constraints.a().ncols() != n => {
            Err(MinimizeError::DimensionMismatch(format!(
                "{} grid dimensions but the constraints have {} columns",
                n,
                constraints.a().ncols()
            )))
        }
        _ => Ok(()),
    }
}

/// The lowest point found so far.
struct Best {
    x: Option<DVector<f64>>,
    f: f64,
}

impl Best {
    fn new() -> Self {
        Self {
            x: None,
            f: f64::INFINITY,
        }
    }

    /// Points violating the constraints are skipped without evaluating `$f$`.
    fn visit(
        &mut self,
        ev: &mut Evaluator<'_>,
        point: &DVector<f64>,
        constraints: Option<&LinearConstraints>,
        verbosity: u8,
    ) {
        if let Some(constraints) = constraints {
            if !constraints.satisfied(point) {
                if verbosity >= 3 {
                    log::trace!("Constraint violated, skipping grid point {:?}", point.as_slice());
                }
                return;
            }
        }
        let f = ev.func(point);
        if f < self.f || (self.x.is_none() && !f.is_nan()) {
            self.f = f;
            self.x = Some(point.clone());
            if verbosity >= 1 {
                log::info!("k: {:<8} xk: {:?}  fk: {}", ev.f_count - 1, point.as_slice(), f);
            }
        } else if verbosity >= 2 {
            log::debug!("k: {:<8} xk: {:?}  fk: {}", ev.f_count - 1, point.as_slice(), f);
        }
    }

    fn report(self, ev: &Evaluator<'_>) -> Result<MinimizationReport, MinimizeError> {
        let x = self.x.ok_or_else(|| {
            MinimizeError::Grid("no grid point satisfies the constraints".into())
        })?;
        Ok(MinimizationReport::from_evaluator(x, self.f, ev.f_count, ev, None))
    }
}

/// Evaluate `func` on every point of the grid satisfying the constraints
/// `$\mathbf{A}\vec{x} \geq \vec{b}$` and report the lowest.
///
/// The first dimension varies fastest. The reported iteration count is the
/// number of points evaluated. A grid without dimensions evaluates
/// `func([])` once and reports [`Warning::NoOptimisation`].
///
/// ```
/// # use nalgebra::DVector;
/// # use minimize::{grid, GridSpec};
/// let f = |x: &DVector<f64>| (x[0] - 0.2).powi(2) + (x[1] + 0.5).powi(2);
/// let spec = GridSpec::linear(&[5, 5], &[-1.0, -1.0], &[1.0, 1.0]).unwrap();
/// let report = grid(&f, &spec, None, 0).unwrap();
/// assert_eq!(report.x.as_slice(), &[0.0, -0.5]);
/// assert_eq!(report.iterations, 25);
/// ```
///
/// # Errors
///
/// Grids of `$10^8$` points or more are refused, as are constraints of the
/// wrong dimension and constraints that exclude every point.
pub fn grid(
    func: &ObjectiveFn<'_>,
    spec: &GridSpec,
    constraints: Option<&LinearConstraints>,
    verbosity: u8,
) -> Result<MinimizationReport, MinimizeError> {
    let mut ev = Evaluator::new(Oracle::new(func));
    let n = spec.dimension();
    if n == 0 {
        if verbosity >= 1 {
            log::info!("Cannot run a grid search on a model with zero parameters, directly calculating the function value.");
        }
        let x = DVector::zeros(0);
        let f = ev.func(&x);
        return Ok(MinimizationReport::from_evaluator(x, f, 1, &ev, Some(Warning::NoOptimisation)));
    }
    let size = check_size(spec.size())?;
    check_constraints(constraints, n)?;
    if verbosity >= 1 {
        log::info!("Grid search");
        log::info!("Searching through {} grid nodes.", size);
    }

    let increments = spec.increments();
    let mut step = vec![0; n];
    let mut point = DVector::from_iterator(n, increments.iter().map(|values| values[0]));
    let mut best = Best::new();
    for _ in 0..size {
        best.visit(&mut ev, &point, constraints, verbosity);
        for (j, values) in increments.iter().enumerate() {
            if step[j] + 1 < values.len() {
                step[j] += 1;
                point[j] = values[step[j]];
                break;
            }
            step[j] = 0;
            point[j] = values[0];
        }
    }
    let report = best.report(&ev)?;
    report.log(verbosity);
    Ok(report)
}

/// Grid search over an explicit list of points.
///
/// # Errors
///
/// Fails on an empty list, on points of differing dimensions and as [`grid`].
pub fn grid_point_array(
    func: &ObjectiveFn<'_>,
    points: &[DVector<f64>],
    constraints: Option<&LinearConstraints>,
    verbosity: u8,
) -> Result<MinimizationReport, MinimizeError> {
    let n = match points.first() {
        Some(point) => point.len(),
        None => return Err(MinimizeError::Grid("no grid points".into())),
    };
    if points.iter().any(|point| point.len() != n) {
        return Err(MinimizeError::DimensionMismatch(
            "the grid points differ in dimension".into(),
        ));
    }
    check_size(Some(points.len()))?;
    check_constraints(constraints, n)?;
    if verbosity >= 1 {
        log::info!("Searching through {} grid nodes.", points.len());
    }

    let mut ev = Evaluator::new(Oracle::new(func));
    let mut best = Best::new();
    for point in points {
        best.visit(&mut ev, point, constraints, verbosity);
    }
    let report = best.report(&ev)?;
    report.log(verbosity);
    Ok(report)
}
