//! Nelder-Mead downhill simplex.
use nalgebra::DVector;

use crate::{
    convergence::ConvergenceTest,
    iteration::{iterate, MinimizationReport, MinimizerOptions, Solver},
    problem::Evaluator,
    MinimizeError, Warning,
};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// The simplex, its vertices kept sorted by function value.
///
/// The initial simplex is `x0` and the `n` points `$\vec{x}_0 + \vec{e}_i$`.
pub(crate) struct Simplex {
    vertices: Vec<DVector<f64>>,
    values: Vec<f64>,

    x: DVector<f64>,
    f: f64,
    x_new: DVector<f64>,
    f_new: f64,
}

impl Simplex {
    pub fn new(ev: &mut Evaluator<'_>, x0: DVector<f64>) -> Self {
        let n = x0.len();
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(x0.clone());
        for i in 0..n {
            let mut vertex = x0.clone();
            vertex[i] += 1.0;
            vertices.push(vertex);
        }
        let values = vertices.iter().map(|vertex| ev.func(vertex)).collect();
        let mut simplex = Self {
            vertices,
            values,
            x_new: x0.clone(),
            f_new: 0.0,
            x: x0,
            f: 0.0,
        };
        simplex.sort();
        simplex.x = simplex.vertices[0].clone();
        simplex.f = simplex.values[0];
        simplex.x_new = simplex.x.clone();
        simplex.f_new = simplex.f;
        simplex
    }

    /// NaN sorts last.
    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    fn replace_worst(&mut self, vertex: DVector<f64>, value: f64) {
        let n = self.values.len() - 1;
        self.vertices[n] = vertex;
        self.values[n] = value;
    }

    /// Spread of the function values over the simplex.
    pub fn spread(&self) -> f64 {
        let n = self.values.len() - 1;
        self.values[n] - self.values[0]
    }

    fn step(&mut self, ev: &mut Evaluator<'_>) {
        let n = self.values.len() - 1;
        let centroid = self.vertices[..n]
            .iter()
            .fold(DVector::zeros(self.x.len()), |sum, vertex| sum + vertex)
            / n as f64;
        let worst = self.vertices[n].clone();

        let reflected = &centroid + (&centroid - &worst) * REFLECTION;
        let f_reflected = ev.func(&reflected);
        if f_reflected < self.values[0] {
            let expanded = &centroid + (&reflected - &centroid) * EXPANSION;
            let f_expanded = ev.func(&expanded);
            if f_expanded < f_reflected {
                self.replace_worst(expanded, f_expanded);
            } else {
                self.replace_worst(reflected, f_reflected);
            }
            return;
        }
        if f_reflected < self.values[n - 1] {
            self.replace_worst(reflected, f_reflected);
            return;
        }

        let contracted = if f_reflected < self.values[n] {
            let outside = &centroid + (&reflected - &centroid) * CONTRACTION;
            let f_outside = ev.func(&outside);
            (f_outside <= f_reflected).then_some((outside, f_outside))
        } else {
            let inside = &centroid + (&worst - &centroid) * CONTRACTION;
            let f_inside = ev.func(&inside);
            (f_inside < self.values[n]).then_some((inside, f_inside))
        };
        match contracted {
            Some((vertex, value)) => self.replace_worst(vertex, value),
            None => {
                let best = self.vertices[0].clone();
                for i in 1..=n {
                    self.vertices[i] = &best + (&self.vertices[i] - &best) * SHRINK;
                    self.values[i] = ev.func(&self.vertices[i]);
                }
            }
        }
    }
}

impl Solver for Simplex {
    fn new_params(&mut self, ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        self.step(ev);
        self.sort();
        self.x_new = self.vertices[0].clone();
        self.f_new = self.values[0];
        Ok(())
    }

    fn update(&mut self, _ev: &mut Evaluator<'_>) -> Result<(), Warning> {
        self.x = self.x_new.clone();
        self.f = self.f_new;
        Ok(())
    }

    fn current(&self) -> (&DVector<f64>, f64) {
        (&self.x, self.f)
    }

    fn trial(&self) -> (&DVector<f64>, f64) {
        (&self.x_new, self.f_new)
    }

    fn trial_gradient(&self) -> Option<&DVector<f64>> {
        None
    }

    /// Converged once the simplex values agree to within the function
    /// tolerance, or the gradient tolerance if that is the only one set.
    fn converged(&self, test: &ConvergenceTest) -> bool {
        match test.func_tol().or(test.grad_tol()) {
            Some(tol) => self.spread() <= tol,
            None => false,
        }
    }
}

/// Run the simplex method from `x0`. No derivatives are evaluated.
pub(crate) fn minimize(
    ev: &mut Evaluator<'_>,
    x0: DVector<f64>,
    options: &MinimizerOptions,
) -> Result<MinimizationReport, MinimizeError> {
    options.convergence_test()?;
    let mut solver = Simplex::new(ev, x0);
    iterate(&mut solver, ev, options)
}
