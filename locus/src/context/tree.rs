//! Context-free math trees over `x` and `y`
use super::{
    Var,
    op::{BinaryOpcode, UnaryOpcode},
};
use crate::Error;
use std::sync::Arc;

/// Opcode type for trees
#[derive(Debug)]
#[allow(missing_docs)]
pub enum TreeOp {
    Input(Var),
    Const(f64),
    Binary(BinaryOpcode, Tree, Tree),
    Unary(UnaryOpcode, Tree),
}

impl From<f64> for Tree {
    fn from(v: f64) -> Tree {
        Tree::constant(v)
    }
}

impl From<f32> for Tree {
    fn from(v: f32) -> Tree {
        Tree::constant(v as f64)
    }
}

impl From<i32> for Tree {
    fn from(v: i32) -> Tree {
        Tree::constant(v as f64)
    }
}

impl From<Var> for Tree {
    fn from(v: Var) -> Tree {
        Tree(Arc::new(TreeOp::Input(v)))
    }
}

/// Owned handle for a standalone math tree
///
/// Trees are immutable; every operation builds a new node which shares its
/// children with the inputs.
#[derive(Clone, Debug)]
pub struct Tree(Arc<TreeOp>);

impl std::ops::Deref for Tree {
    type Target = TreeOp;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Tree {
    /// Shallow (pointer) comparison
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.as_ptr(), other.as_ptr())
    }
}
impl Eq for Tree {}

#[allow(missing_docs)]
impl Tree {
    pub fn x() -> Self {
        Var::X.into()
    }
    pub fn y() -> Self {
        Var::Y.into()
    }
    /// Returns an `(x, y)` tuple
    pub fn axes() -> (Self, Self) {
        (Self::x(), Self::y())
    }
    pub fn constant(f: f64) -> Self {
        Tree(Arc::new(TreeOp::Const(f)))
    }
    fn op_unary(a: Tree, op: UnaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Unary(op, a)))
    }
    fn op_binary(a: Tree, b: Tree, op: BinaryOpcode) -> Self {
        Tree(Arc::new(TreeOp::Binary(op, a, b)))
    }
    pub fn square(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Square)
    }
    pub fn sqrt(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sqrt)
    }
    pub fn abs(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Abs)
    }
    pub fn recip(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Recip)
    }
    pub fn max<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Max)
    }
    pub fn min<T: Into<Tree>>(&self, other: T) -> Self {
        Self::op_binary(self.clone(), other.into(), BinaryOpcode::Min)
    }
    pub fn neg(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Neg)
    }
    pub fn sin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sin)
    }
    pub fn cos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Cos)
    }
    pub fn tan(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Tan)
    }
    pub fn asin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Asin)
    }
    pub fn acos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Acos)
    }
    pub fn atan(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Atan)
    }
    pub fn exp(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Exp)
    }
    pub fn ln(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Ln)
    }

    /// Raises the tree to an integer power by repeated squaring
    ///
    /// Negative exponents produce the reciprocal; `pow(0)` is the constant 1.
    pub fn pow(&self, n: i64) -> Self {
        let out = self.pow_unsigned(n.unsigned_abs());
        if n < 0 { out.recip() } else { out }
    }

    fn pow_unsigned(&self, mut n: u64) -> Self {
        let mut base = self.clone();
        let mut out: Option<Tree> = None;
        while n > 0 {
            if n & 1 == 1 {
                out = Some(match out {
                    Some(t) => t * base.clone(),
                    None => base.clone(),
                });
            }
            n >>= 1;
            if n > 0 {
                base = base.square();
            }
        }
        out.unwrap_or_else(|| Tree::constant(1.0))
    }

    /// Returns a pointer to the inner [`TreeOp`]
    ///
    /// This can be used as a strong (but not unique) identity.
    pub fn as_ptr(&self) -> *const TreeOp {
        Arc::as_ptr(&self.0)
    }

    /// Returns the value of a constant node, or `None`
    pub fn const_value(&self) -> Option<f64> {
        match &*self.0 {
            TreeOp::Const(c) => Some(*c),
            _ => None,
        }
    }

    /// Evaluates the tree at a point
    ///
    /// NaN and infinities propagate through the arithmetic.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        match &*self.0 {
            TreeOp::Input(Var::X) => x,
            TreeOp::Input(Var::Y) => y,
            TreeOp::Const(c) => *c,
            TreeOp::Unary(op, a) => op.apply(a.eval(x, y)),
            TreeOp::Binary(op, a, b) => op.apply(a.eval(x, y), b.eval(x, y)),
        }
    }

    /// Substitutes `x` and `y` with the given trees
    ///
    /// The substitution is performed eagerly, so the result can be evaluated
    /// directly.
    pub fn remap_xy(&self, x: &Tree, y: &Tree) -> Tree {
        match &*self.0 {
            TreeOp::Input(Var::X) => x.clone(),
            TreeOp::Input(Var::Y) => y.clone(),
            TreeOp::Const(..) => self.clone(),
            TreeOp::Unary(op, a) => Self::op_unary(a.remap_xy(x, y), *op),
            TreeOp::Binary(op, a, b) => {
                Self::op_binary(a.remap_xy(x, y), b.remap_xy(x, y), *op)
            }
        }
    }

    /// Computes the partial derivative with respect to `v`
    ///
    /// Constant subexpressions are folded as the derivative is built, so
    /// differentiating a polynomial twice does not explode in size.
    pub fn deriv(&self, v: Var) -> Result<Tree, Error> {
        let out = match &*self.0 {
            TreeOp::Input(u) => Tree::constant(if *u == v { 1.0 } else { 0.0 }),
            TreeOp::Const(..) => Tree::constant(0.0),
            TreeOp::Unary(op, a) => {
                let da = a.deriv(v)?;
                if da.is_const(0.0) {
                    return Ok(da);
                }
                let outer = match op {
                    UnaryOpcode::Neg => return Ok(fold_neg(da)),
                    UnaryOpcode::Abs => fold_div(a.clone(), a.abs()),
                    UnaryOpcode::Recip => a.square().recip().neg(),
                    UnaryOpcode::Sqrt => fold_div(0.5.into(), a.sqrt()),
                    UnaryOpcode::Square => fold_mul(2.0.into(), a.clone()),
                    UnaryOpcode::Sin => a.cos(),
                    UnaryOpcode::Cos => a.sin().neg(),
                    UnaryOpcode::Tan => a.cos().square().recip(),
                    UnaryOpcode::Asin => {
                        fold_sub(1.0.into(), a.square()).sqrt().recip()
                    }
                    UnaryOpcode::Acos => {
                        fold_sub(1.0.into(), a.square()).sqrt().recip().neg()
                    }
                    UnaryOpcode::Atan => {
                        fold_add(1.0.into(), a.square()).recip()
                    }
                    UnaryOpcode::Exp => a.exp(),
                    UnaryOpcode::Ln => a.recip(),
                };
                fold_mul(outer, da)
            }
            TreeOp::Binary(op, a, b) => match op {
                BinaryOpcode::Add => fold_add(a.deriv(v)?, b.deriv(v)?),
                BinaryOpcode::Sub => fold_sub(a.deriv(v)?, b.deriv(v)?),
                BinaryOpcode::Mul => fold_add(
                    fold_mul(a.deriv(v)?, b.clone()),
                    fold_mul(a.clone(), b.deriv(v)?),
                ),
                BinaryOpcode::Div => {
                    let num = fold_sub(
                        fold_mul(a.deriv(v)?, b.clone()),
                        fold_mul(a.clone(), b.deriv(v)?),
                    );
                    fold_div(num, b.square())
                }
                BinaryOpcode::Min | BinaryOpcode::Max => {
                    return Err(Error::NotDifferentiable);
                }
            },
        };
        Ok(out)
    }

    fn is_const(&self, v: f64) -> bool {
        self.const_value() == Some(v)
    }
}

fn fold_neg(a: Tree) -> Tree {
    match a.const_value() {
        Some(c) => Tree::constant(-c),
        None => a.neg(),
    }
}

fn fold_add(a: Tree, b: Tree) -> Tree {
    match (a.const_value(), b.const_value()) {
        (Some(p), Some(q)) => Tree::constant(p + q),
        (Some(p), _) if p == 0.0 => b,
        (_, Some(q)) if q == 0.0 => a,
        _ => a + b,
    }
}

fn fold_sub(a: Tree, b: Tree) -> Tree {
    match (a.const_value(), b.const_value()) {
        (Some(p), Some(q)) => Tree::constant(p - q),
        (Some(p), _) if p == 0.0 => fold_neg(b),
        (_, Some(q)) if q == 0.0 => a,
        _ => a - b,
    }
}

fn fold_mul(a: Tree, b: Tree) -> Tree {
    match (a.const_value(), b.const_value()) {
        (Some(p), Some(q)) => Tree::constant(p * q),
        (Some(p), _) if p == 0.0 => a,
        (_, Some(q)) if q == 0.0 => b,
        (Some(p), _) if p == 1.0 => b,
        (_, Some(q)) if q == 1.0 => a,
        _ => a * b,
    }
}

fn fold_div(a: Tree, b: Tree) -> Tree {
    match (a.const_value(), b.const_value()) {
        (Some(p), Some(q)) => Tree::constant(p / q),
        (_, Some(q)) if q == 1.0 => a,
        _ => a / b,
    }
}

impl std::fmt::Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.0 {
            TreeOp::Input(v) => write!(f, "{v}"),
            TreeOp::Const(c) if *c < 0.0 => write!(f, "({c:?})"),
            TreeOp::Const(c) => write!(f, "{c:?}"),
            TreeOp::Unary(UnaryOpcode::Neg, a) => write!(f, "(-{a})"),
            TreeOp::Unary(op, a) => write!(f, "{}({a})", op.name()),
            TreeOp::Binary(op, a, b) => match op.symbol() {
                Some(s) => write!(f, "({a} {s} {b})"),
                None => write!(f, "{}({a}, {b})", op.name()),
            },
        }
    }
}

impl std::ops::Neg for Tree {
    type Output = Tree;
    fn neg(self) -> Tree {
        Tree::op_unary(self, UnaryOpcode::Neg)
    }
}

macro_rules! impl_binary {
    ($op:ident, $op_assign:ident, $base_fn:ident, $assign_fn:ident) => {
        impl<A: Into<Tree>> std::ops::$op<A> for Tree {
            type Output = Self;

            fn $base_fn(self, other: A) -> Self {
                Self::op_binary(self, other.into(), BinaryOpcode::$op)
            }
        }
        impl<A: Into<Tree>> std::ops::$op_assign<A> for Tree {
            fn $assign_fn(&mut self, other: A) {
                use std::ops::$op;
                self.0 = self.clone().$base_fn(other.into()).0
            }
        }
        impl std::ops::$op<Tree> for f64 {
            type Output = Tree;
            fn $base_fn(self, other: Tree) -> Tree {
                Tree::op_binary(self.into(), other, BinaryOpcode::$op)
            }
        }
    };
}

impl_binary!(Add, AddAssign, add, add_assign);
impl_binary!(Sub, SubAssign, sub, sub_assign);
impl_binary!(Mul, MulAssign, mul, mul_assign);
impl_binary!(Div, DivAssign, div, div_assign);

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn tree_x() {
        let x1 = Tree::x();
        let x2 = Tree::x();
        assert_ne!(x1, x2);
        let x3 = x1.clone();
        assert_eq!(x1, x3);
    }

    #[test]
    fn tree_eval() {
        let (x, y) = Tree::axes();
        let t = x.square() + y.square() - 1.0;
        assert_eq!(t.eval(1.0, 0.0), 0.0);
        assert_eq!(t.eval(2.0, 1.0), 4.0);

        let t = (Tree::x() * 2.0).min(Tree::y()) / 4.0;
        assert_eq!(t.eval(1.0, 3.0), 0.5);
        assert_eq!(t.eval(1.0, -4.0), -1.0);
    }

    #[test]
    fn tree_eval_nan() {
        let t = Tree::x().sqrt() + Tree::y().ln();
        assert!(t.eval(-1.0, 1.0).is_nan());
        assert_eq!(t.eval(0.0, 0.0), f64::NEG_INFINITY);
        let t = 1.0 / Tree::x();
        assert_eq!(t.eval(0.0, 0.0), f64::INFINITY);
    }

    #[test]
    fn tree_pow() {
        let x = Tree::x();
        for n in 0..9 {
            let t = x.pow(n);
            assert_eq!(t.eval(1.5, 0.0), 1.5f64.powi(n as i32), "n = {n}");
        }
        assert_eq!(x.pow(-2).eval(2.0, 0.0), 0.25);
        assert_eq!(x.pow(0).const_value(), Some(1.0));
    }

    #[test]
    fn tree_deriv_poly() {
        let (x, y) = Tree::axes();
        let t = x.pow(3) * y.clone() - 2.0 * y.square() + 5.0;
        let dx = t.deriv(Var::X).unwrap();
        let dy = t.deriv(Var::Y).unwrap();
        assert_eq!(dx.eval(2.0, 3.0), 3.0 * 4.0 * 3.0);
        assert_eq!(dy.eval(2.0, 3.0), 8.0 - 12.0);

        let dxx = dx.deriv(Var::X).unwrap();
        let dxy = dx.deriv(Var::Y).unwrap();
        assert_eq!(dxx.eval(2.0, 3.0), 6.0 * 2.0 * 3.0);
        assert_eq!(dxy.eval(2.0, 3.0), 12.0);
    }

    #[test]
    fn tree_deriv_transcendental() {
        let x = Tree::x();
        let cases = [
            (x.sin(), 0.3f64.cos()),
            (x.cos(), -0.3f64.sin()),
            (x.exp(), 0.3f64.exp()),
            (x.ln(), 1.0 / 0.3),
            (x.sqrt(), 0.5 / 0.3f64.sqrt()),
            (x.atan(), 1.0 / (1.0 + 0.09)),
            (x.asin(), 1.0 / (1.0 - 0.09f64).sqrt()),
            (x.recip(), -1.0 / 0.09),
            (x.tan(), 1.0 / 0.3f64.cos().powi(2)),
            (x.abs(), 1.0),
            ((x.clone() / (x.clone() + 1.0)), 1.0 / 1.69),
        ];
        for (t, expected) in cases {
            let d = t.deriv(Var::X).unwrap();
            assert_relative_eq!(d.eval(0.3, 0.0), expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn tree_deriv_folding() {
        let t = Tree::y().sin() * 3.0;
        let d = t.deriv(Var::X).unwrap();
        assert_eq!(d.const_value(), Some(0.0));

        let t = Tree::x() * 3.0 + 1.0;
        let d = t.deriv(Var::X).unwrap();
        assert_eq!(d.const_value(), Some(3.0));
    }

    #[test]
    fn tree_deriv_min_max() {
        let t = Tree::x().min(Tree::y());
        assert!(matches!(t.deriv(Var::X), Err(Error::NotDifferentiable)));
        let t = Tree::x().max(1.0).sin();
        assert!(matches!(t.deriv(Var::Y), Err(Error::NotDifferentiable)));
    }

    #[test]
    fn tree_remap() {
        let (x, y) = Tree::axes();
        let t = x.square() + y.clone();
        let r = t.remap_xy(&(Tree::x() - 1.0), &(Tree::y() * 2.0));
        assert_eq!(r.eval(3.0, 5.0), 4.0 + 10.0);
    }

    #[test]
    fn tree_display() {
        let (x, y) = Tree::axes();
        let t = x.square() + y * -2.0;
        assert_eq!(t.to_string(), "(square(x) + (y * (-2.0)))");
        let t = Tree::x().neg().max(1.0);
        assert_eq!(t.to_string(), "max((-x), 1.0)");
    }
}
