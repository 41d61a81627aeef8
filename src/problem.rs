use nalgebra::{DMatrix, DVector};

use crate::utils::{numerical_gradient, numerical_hessian};

/// Objective function `$f\!:\R^n\to\R$`.
pub type ObjectiveFn<'a> = dyn Fn(&DVector<f64>) -> f64 + 'a;
/// Gradient `$\nabla f\!:\R^n\to\R^n$`.
pub type GradientFn<'a> = dyn Fn(&DVector<f64>) -> DVector<f64> + 'a;
/// Hessian `$\nabla^2 f\!:\R^n\to\R^{n\times n}$`.
pub type HessianFn<'a> = dyn Fn(&DVector<f64>) -> DMatrix<f64> + 'a;
/// Jacobian `$\mathbf{J}\in\R^{m\times n}$` of a model with `$m$` back-calculated values.
pub type JacobianFn<'a> = dyn Fn(&DVector<f64>) -> DMatrix<f64> + 'a;

/// The function, gradient and Hessian callbacks of a minimisation problem.
///
/// Extra arguments of the objective are captured by the closures. The
/// oracle only borrows them; it is never mutated by a minimiser and every
/// callback is invoked synchronously.
///
/// ```
/// # use nalgebra::{DMatrix, DVector};
/// # use minimize::Oracle;
/// let f = |x: &DVector<f64>| x.norm_squared();
/// let df = |x: &DVector<f64>| x * 2.0;
/// let d2f = |x: &DVector<f64>| DMatrix::identity(x.len(), x.len()) * 2.0;
/// let oracle = Oracle::new(&f).with_gradient(&df).with_hessian(&d2f);
/// assert!(oracle.has_gradient() && oracle.has_hessian());
/// ```
#[derive(Clone, Copy)]
pub struct Oracle<'a> {
    func: &'a ObjectiveFn<'a>,
    gradient: Option<&'a GradientFn<'a>>,
    hessian: Option<&'a HessianFn<'a>>,
}

impl<'a> Oracle<'a> {
    pub fn new(func: &'a ObjectiveFn<'a>) -> Self {
        Self {
            func,
            gradient: None,
            hessian: None,
        }
    }

    pub fn with_gradient(self, gradient: &'a GradientFn<'a>) -> Self {
        Self {
            gradient: Some(gradient),
            ..self
        }
    }

    pub fn with_hessian(self, hessian: &'a HessianFn<'a>) -> Self {
        Self {
            hessian: Some(hessian),
            ..self
        }
    }

    pub fn has_gradient(&self) -> bool {
        self.gradient.is_some()
    }

    pub fn has_hessian(&self) -> bool {
        self.hessian.is_some()
    }

    /// Evaluate `$f$` without counting.
    pub fn value(&self, x: &DVector<f64>) -> f64 {
        (self.func)(x)
    }

    /// Falls back to an adaptive central difference of `$f$` if no gradient
    /// callback was supplied.
    pub(crate) fn gradient(&self, x: &DVector<f64>) -> DVector<f64> {
        match self.gradient {
            Some(gradient) => gradient(x),
            None => numerical_gradient(self.func, x),
        }
    }

    /// Falls back to differences of the gradient, or of `$f$` twice.
    pub(crate) fn hessian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        match (self.hessian, self.gradient) {
            (Some(hessian), _) => hessian(x),
            (None, Some(gradient)) => numerical_hessian(gradient, x),
            (None, None) => {
                let func = self.func;
                numerical_hessian(|y: &DVector<f64>| numerical_gradient(func, y), x)
            }
        }
    }
}

/// Helper to keep an oracle and the evaluation counters together.
///
/// Every call through the evaluator increments exactly one counter.
pub(crate) struct Evaluator<'a> {
    oracle: Oracle<'a>,
    pub f_count: usize,
    pub g_count: usize,
    pub h_count: usize,
}

impl<'a> Evaluator<'a> {
    pub fn new(oracle: Oracle<'a>) -> Self {
        Self {
            oracle,
            f_count: 0,
            g_count: 0,
            h_count: 0,
        }
    }

    pub fn func(&mut self, x: &DVector<f64>) -> f64 {
        self.f_count += 1;
        (self.oracle.func)(x)
    }

    pub fn gradient(&mut self, x: &DVector<f64>) -> DVector<f64> {
        self.g_count += 1;
        self.oracle.gradient(x)
    }

    pub fn hessian(&mut self, x: &DVector<f64>) -> DMatrix<f64> {
        self.h_count += 1;
        self.oracle.hessian(x)
    }

    /// Directional derivative `$\nabla f(\vec{x})^\top\vec{p}$`.
    pub fn slope(&mut self, x: &DVector<f64>, p: &DVector<f64>) -> f64 {
        self.gradient(x).dot(p)
    }
}
