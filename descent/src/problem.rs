//! The callables a solver needs, as traits.
//!
//! Implement these on your own types, or wrap plain closures with
//! [`FnObjective`], [`FnLeastSquares`] or [`FnTwiceDifferentiable`].
//! Problems are only ever borrowed immutably, so any parameters they
//! carry (see [`crate::test_functions::ShekelFoxholes`]) are never shared
//! mutable state.
use faer::Mat;

use crate::{Quantity, SolveError, vector::all_finite};

/// A smooth scalar function with a known gradient.
pub trait Objective {
    /// f(x).
    fn value(&self, x: &[f64]) -> f64;
    /// The gradient of f at x. Must have the same length as x.
    fn gradient(&self, x: &[f64]) -> Vec<f64>;
}

/// An objective which is the squared norm of a residual vector.
/// The Gauss-Newton solver needs the residual and its Jacobian.
pub trait LeastSquares: Objective {
    /// r(x), with m entries. m must not change during a solve.
    fn residual(&self, x: &[f64]) -> Vec<f64>;
    /// The m x n Jacobian of r at x.
    fn jacobian(&self, x: &[f64]) -> Mat<f64>;
}

/// An objective with second derivatives, for the Newton solver.
pub trait TwiceDifferentiable: Objective {
    /// The n x n Hessian of f at x.
    fn hessian(&self, x: &[f64]) -> Mat<f64>;

    /// The product of the Hessian at x with v.
    /// Override this to make Newton-CG Hessian-free.
    ///
    /// The default multiplies by [`Self::hessian`]. If that matrix isn't
    /// `v.len()` square, the product is empty, which the solver reports as a
    /// dimension mismatch.
    fn hessian_vector_product(&self, x: &[f64], v: &[f64]) -> Vec<f64> {
        let h = self.hessian(x);
        if h.nrows() != v.len() || h.ncols() != v.len() {
            return Vec::new();
        }
        mat_vec(&h, v)
    }
}

/// Dense matrix-vector product. Callers check the shapes.
pub(crate) fn mat_vec(a: &Mat<f64>, v: &[f64]) -> Vec<f64> {
    (0..a.nrows())
        .map(|row| (0..a.ncols()).map(|col| a[(row, col)] * v[col]).sum())
        .collect()
}

/// f(x) and g(x), both checked for length and finiteness.
pub(crate) fn evaluate<P>(problem: &P, x: &[f64], iteration: usize) -> Result<(f64, Vec<f64>), SolveError>
where
    P: Objective + ?Sized,
{
    let fx = problem.value(x);
    if !fx.is_finite() {
        return Err(SolveError::NonFinite {
            quantity: Quantity::Objective,
            iteration,
        });
    }
    let gx = problem.gradient(x);
    check_len(Quantity::Gradient, x.len(), gx.len())?;
    check_finite(Quantity::Gradient, &gx, iteration)?;
    Ok((fx, gx))
}

pub(crate) fn check_len(quantity: Quantity, expected: usize, actual: usize) -> Result<(), SolveError> {
    if expected == actual {
        Ok(())
    } else {
        Err(SolveError::DimensionMismatch {
            quantity,
            expected,
            actual,
        })
    }
}

pub(crate) fn check_finite(quantity: Quantity, v: &[f64], iteration: usize) -> Result<(), SolveError> {
    if all_finite(v) {
        Ok(())
    } else {
        Err(SolveError::NonFinite { quantity, iteration })
    }
}

/// Checks a matrix's shape, then that every entry is finite.
pub(crate) fn check_matrix(
    quantity: Quantity,
    a: &Mat<f64>,
    expected: (usize, usize),
    iteration: usize,
) -> Result<(), SolveError> {
    let actual = (a.nrows(), a.ncols());
    if actual != expected {
        return Err(SolveError::MatrixShape {
            quantity,
            expected,
            actual,
        });
    }
    let finite = (0..a.ncols()).all(|col| (0..a.nrows()).all(|row| a[(row, col)].is_finite()));
    if finite {
        Ok(())
    } else {
        Err(SolveError::NonFinite { quantity, iteration })
    }
}

/// An [`Objective`] made of two closures.
pub struct FnObjective<F, G> {
    /// Objective.
    pub f: F,
    /// Gradient.
    pub g: G,
}

impl<F, G> FnObjective<F, G>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
{
    /// Wrap an objective and its gradient.
    pub fn new(f: F, g: G) -> Self {
        Self { f, g }
    }
}

impl<F, G> Objective for FnObjective<F, G>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
{
    fn value(&self, x: &[f64]) -> f64 {
        (self.f)(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        (self.g)(x)
    }
}

/// A [`LeastSquares`] problem made of four closures.
pub struct FnLeastSquares<F, G, R, J> {
    /// Objective.
    pub f: F,
    /// Gradient of the objective.
    pub g: G,
    /// Residual.
    pub r: R,
    /// Jacobian of the residual.
    pub j: J,
}

impl<F, G, R, J> FnLeastSquares<F, G, R, J>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
    R: Fn(&[f64]) -> Vec<f64>,
    J: Fn(&[f64]) -> Mat<f64>,
{
    /// Wrap objective, gradient, residual and Jacobian.
    pub fn new(f: F, g: G, r: R, j: J) -> Self {
        Self { f, g, r, j }
    }
}

impl<F, G, R, J> Objective for FnLeastSquares<F, G, R, J>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
{
    fn value(&self, x: &[f64]) -> f64 {
        (self.f)(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        (self.g)(x)
    }
}

impl<F, G, R, J> LeastSquares for FnLeastSquares<F, G, R, J>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
    R: Fn(&[f64]) -> Vec<f64>,
    J: Fn(&[f64]) -> Mat<f64>,
{
    fn residual(&self, x: &[f64]) -> Vec<f64> {
        (self.r)(x)
    }

    fn jacobian(&self, x: &[f64]) -> Mat<f64> {
        (self.j)(x)
    }
}

/// A [`TwiceDifferentiable`] problem made of three closures.
pub struct FnTwiceDifferentiable<F, G, H> {
    /// Objective.
    pub f: F,
    /// Gradient.
    pub g: G,
    /// Hessian.
    pub h: H,
}

impl<F, G, H> FnTwiceDifferentiable<F, G, H>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
    H: Fn(&[f64]) -> Mat<f64>,
{
    /// Wrap objective, gradient and Hessian.
    pub fn new(f: F, g: G, h: H) -> Self {
        Self { f, g, h }
    }
}

impl<F, G, H> Objective for FnTwiceDifferentiable<F, G, H>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
{
    fn value(&self, x: &[f64]) -> f64 {
        (self.f)(x)
    }

    fn gradient(&self, x: &[f64]) -> Vec<f64> {
        (self.g)(x)
    }
}

impl<F, G, H> TwiceDifferentiable for FnTwiceDifferentiable<F, G, H>
where
    F: Fn(&[f64]) -> f64,
    G: Fn(&[f64]) -> Vec<f64>,
    H: Fn(&[f64]) -> Mat<f64>,
{
    fn hessian(&self, x: &[f64]) -> Mat<f64> {
        (self.h)(x)
    }
}
