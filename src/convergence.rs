//! Termination tests shared by every iterative minimiser.
use nalgebra::DVector;

use crate::MinimizeError;

/// Function and gradient tolerance test.
///
/// With both tolerances set the run stops as soon as either is met. With only
/// a gradient tolerance, a step that leaves `$f$` unchanged also stops the run,
/// since quasi-Newton methods can otherwise stall forever on a flat step.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConvergenceTest {
    func_tol: Option<f64>,
    grad_tol: Option<f64>,
}

impl ConvergenceTest {
    /// # Errors
    ///
    /// Fails with [`MinimizeError::NoTolerance`] if both tolerances are `None`.
    pub fn new(func_tol: Option<f64>, grad_tol: Option<f64>) -> Result<Self, MinimizeError> {
        if func_tol.is_none() && grad_tol.is_none() {
            return Err(MinimizeError::NoTolerance);
        }
        Ok(Self { func_tol, grad_tol })
    }

    pub fn func_tol(&self) -> Option<f64> {
        self.func_tol
    }

    pub fn grad_tol(&self) -> Option<f64> {
        self.grad_tol
    }

    /// Test the step from `f_old` to `f_new`.
    ///
    /// `gradient` is the gradient at the new point, if the method has one.
    pub fn converged(&self, f_new: f64, f_old: f64, gradient: Option<&DVector<f64>>) -> bool {
        if let Some(func_tol) = self.func_tol {
            if (f_old - f_new).abs() <= func_tol {
                return true;
            }
        }
        if let Some(grad_tol) = self.grad_tol {
            if let Some(gradient) = gradient {
                if gradient.norm() <= grad_tol {
                    return true;
                }
            }
            if self.func_tol.is_none() && f_new - f_old == 0.0 {
                return true;
            }
        }
        false
    }

    /// Variant for methods which may reject a trial point.
    ///
    /// Only a step that did not increase `$f$` is tested; a rejected step never
    /// signals convergence.
    pub fn converged_on_accepted(
        &self,
        f_new: f64,
        f_old: f64,
        gradient: Option<&DVector<f64>>,
    ) -> bool {
        f_new <= f_old && self.converged(f_new, f_old, gradient)
    }
}
