use std::cell::RefCell;

use nalgebra::{DMatrix, DVector};

use crate::chi2::{chi2, dchi2};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Func,
    Gradient,
    Jacobian,
}

/// Straight line `$y(t) = \theta_0 + \theta_1 t$` fitted to fixed data,
/// recording every callback.
pub struct MockProblem {
    call_history: RefCell<Vec<MockCall>>,
    times: DVector<f64>,
    data: DVector<f64>,
    pub errors: DVector<f64>,
}

impl MockProblem {
    pub fn new(times: &[f64], data: &[f64], error: f64) -> Self {
        Self {
            call_history: RefCell::new(vec![]),
            times: DVector::from_row_slice(times),
            data: DVector::from_row_slice(data),
            errors: DVector::from_element(times.len(), error),
        }
    }

    /// Data on the line `$y = 1 + 2t$`.
    pub fn exact_line() -> Self {
        Self::new(&[0.0, 1.0, 2.0, 3.0], &[1.0, 3.0, 5.0, 7.0], 0.5)
    }

    fn back_calc(&self, x: &DVector<f64>) -> DVector<f64> {
        self.times.map(|t| x[0] + x[1] * t)
    }

    fn model_jacobian(&self) -> DMatrix<f64> {
        DMatrix::from_fn(self.times.len(), 2, |i, j| if j == 0 { 1.0 } else { self.times[i] })
    }

    pub fn chi2(&self, x: &DVector<f64>) -> f64 {
        self.call_history.borrow_mut().push(MockCall::Func);
        chi2(&self.data, &self.back_calc(x), &self.errors)
    }

    pub fn dchi2(&self, x: &DVector<f64>) -> DVector<f64> {
        self.call_history.borrow_mut().push(MockCall::Gradient);
        dchi2(&self.data, &self.back_calc(x), &self.model_jacobian(), &self.errors)
    }

    pub fn jacobian(&self, _x: &DVector<f64>) -> DMatrix<f64> {
        self.call_history.borrow_mut().push(MockCall::Jacobian);
        self.model_jacobian()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.call_history.borrow().clone()
    }

    pub fn count(&self, call: MockCall) -> usize {
        self.call_history.borrow().iter().filter(|&c| *c == call).count()
    }
}
