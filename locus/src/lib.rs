//! Locus is a library for tracing and transforming implicit plane curves.
//!
//! An **implicit curve** is the zero set of a function `f(x, y)`.  By
//! convention, points with `f(x, y) < 0` and `f(x, y) > 0` lie on opposite
//! sides of the curve; points where the function is zero lie on it.
//!
//! # Building functions
//! Functions are built as expression [`Tree`](context::Tree)s, using operator
//! overloading:
//! ```
//! use locus::context::Tree;
//!
//! let (x, y) = Tree::axes();
//! let circle = x.square() + y.square() - 1.0;
//! assert_eq!(circle.eval(0.0, 1.0), 0.0);
//! ```
//!
//! As an alternative, the [`rhai`] module builds trees from strings:
//! ```
//! let circle = locus::rhai::eval("x^2 + y^2 - 1")?;
//! assert_eq!(circle.eval(1.0, 0.0), 0.0);
//! # Ok::<(), locus::Error>(())
//! ```
//!
//! Polynomial curves may also be given by their coefficients, as a
//! [`Poly`](poly::Poly), or fitted through a set of points with
//! [`poly::fit`].
//!
//! # Tracing
//! The [`trace`] module turns a function into a [`Locus`](trace::Locus) of
//! line segments within a [`Viewport`](trace::Viewport).  Three tracers are
//! provided, selected with a [`TracerKind`](trace::TracerKind); the
//! default floods outwards from a coarse search grid.
//!
//! # Curves
//! Most users will want an [`ImplicitCurve`], which ties the pieces
//! together: it keeps a function and (for polynomial curves) its exact
//! coefficients in sync through affine transforms and circle inversion,
//! re-traces itself, and snaps points onto the curve.
//!
//! ```
//! use locus::{ImplicitCurve, trace::Viewport};
//! use nalgebra::Point2;
//!
//! let points = [
//!     Point2::new(1.0, 0.0),
//!     Point2::new(0.0, 1.0),
//!     Point2::new(-1.0, 0.0),
//!     Point2::new(0.0, -1.0),
//!     Point2::new(0.6, 0.8),
//! ];
//! let mut curve = ImplicitCurve::through_points(&points)?;
//! assert_eq!(curve.degree(), Some(2));
//!
//! let view = Viewport::from_bounds([-2.0, 2.0, -2.0, 2.0, 50.0, 50.0]);
//! curve.update_path(&view);
//! assert!(curve.is_on_screen());
//! # Ok::<(), locus::Error>(())
//! ```
//!
//! # Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]

pub mod context;
pub mod eval;
pub mod poly;
pub mod seed;
pub mod snap;
pub mod trace;

mod curve;
pub use curve::ImplicitCurve;

mod error;
pub use error::Error;

#[cfg(feature = "rhai")]
pub mod rhai;
