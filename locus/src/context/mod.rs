//! Expression trees describing f(x, y)
//!
//! A [`Tree`] is an immutable, reference-counted math expression over the two
//! inputs [`Var::X`] and [`Var::Y`].  Trees are built with operator overloads
//! and the methods on [`Tree`]; they can be evaluated, differentiated
//! symbolically, and have their inputs substituted.
//!
//! ```
//! use locus::context::{Tree, Var};
//!
//! let (x, y) = Tree::axes();
//! let circle = x.square() + y.square() - 1.0;
//! assert_eq!(circle.eval(1.0, 0.0), 0.0);
//!
//! let dx = circle.deriv(Var::X)?;
//! assert_eq!(dx.eval(0.5, 0.0), 1.0);
//! # Ok::<(), locus::Error>(())
//! ```
mod op;
mod tree;

pub use op::{BinaryOpcode, UnaryOpcode};
pub use tree::{Tree, TreeOp};

/// Input variable of a bivariate function
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[allow(missing_docs)]
pub enum Var {
    X,
    Y,
}

impl std::fmt::Display for Var {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Var::X => write!(f, "x"),
            Var::Y => write!(f, "y"),
        }
    }
}
