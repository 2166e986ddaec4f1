//! Evaluation of bivariate scalar fields
//!
//! The [`Function`] trait is the single contract that tracers, the snapper and
//! the seed finder evaluate against.  It is implemented by [`ScalarField`]
//! (an expression tree with cached symbolic derivatives), by
//! [`Poly`](crate::poly::Poly) (Horner evaluation of a coefficient grid) and
//! by a bare [`Tree`].
use crate::context::Tree;

mod field;
mod grad;

pub use field::{Derivatives, ScalarField};
pub use grad::{Grad, Hessian};

/// Values with a magnitude at or below this are treated as zero
pub const STANDARD_PRECISION: f64 = 1e-8;

/// Default tolerance for point-on-path queries
pub const MIN_PRECISION: f64 = 1e-5;

/// Checks whether a value is zero to within [`STANDARD_PRECISION`]
#[inline]
pub fn is_zero(v: f64) -> bool {
    v.abs() <= STANDARD_PRECISION
}

/// A function f(x, y) which can be traced
///
/// Evaluation never fails: out-of-domain points return NaN or infinity, which
/// callers treat as "no information" at that point.
pub trait Function {
    /// Evaluates the function at a point
    fn eval(&self, x: f64, y: f64) -> f64;

    /// Returns the value and first partial derivatives, if available
    fn grad(&self, _x: f64, _y: f64) -> Option<Grad> {
        None
    }

    /// Returns the second partial derivatives, if available
    fn hessian(&self, _x: f64, _y: f64) -> Option<Hessian> {
        None
    }
}

impl Function for Tree {
    fn eval(&self, x: f64, y: f64) -> f64 {
        Tree::eval(self, x, y)
    }
}

impl<F: Function + ?Sized> Function for &F {
    fn eval(&self, x: f64, y: f64) -> f64 {
        (**self).eval(x, y)
    }
    fn grad(&self, x: f64, y: f64) -> Option<Grad> {
        (**self).grad(x, y)
    }
    fn hessian(&self, x: f64, y: f64) -> Option<Hessian> {
        (**self).hessian(x, y)
    }
}
