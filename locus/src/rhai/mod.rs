//! Rhai bindings for building expression trees from strings
//!
//! The simplest option is to call [`eval`], which evaluates a single
//! expression with pre-defined variables `x` and `y`:
//!
//! ```
//! let tree = locus::rhai::eval("x^2 + y^2 - 1")?;
//! assert_eq!(tree.eval(0.0, 1.0), 0.0);
//! # Ok::<(), locus::Error>(())
//! ```
//!
//! Equations of the form `lhs = rhs` are handled by [`eval_equation`], which
//! returns the tree for `lhs - rhs`.
//!
//! Trees support `+ - * /`, unary `-`, integer powers with either `**` or
//! `^` (which is read as `**`, not XOR), and the functions `sqrt`, `abs`,
//! `square`, `sin`, `cos`, `tan`, `asin`, `acos`, `atan`, `exp`, `ln`, `min`
//! and `max`.  Expressions which only involve numbers evaluate to a constant
//! tree.
use crate::{Error, context::Tree};

/// Engine for evaluating expressions with tree bindings
pub struct Engine {
    engine: rhai::Engine,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! register_binary {
    ($engine:ident, $rop:expr, $base_fn:ident $(, $op:ident)?) => {
        $engine.register_fn($rop, |a: Tree, b: Tree| -> Tree {
            $( use std::ops::$op; )?
            a.$base_fn(b)
        });
        $engine.register_fn($rop, |a: Tree, b: f64| -> Tree {
            $( use std::ops::$op; )?
            a.$base_fn(Tree::constant(b))
        });
        $engine.register_fn($rop, |a: Tree, b: i64| -> Tree {
            $( use std::ops::$op; )?
            a.$base_fn(Tree::constant(b as f64))
        });
        $engine.register_fn($rop, |a: f64, b: Tree| -> Tree {
            $( use std::ops::$op; )?
            Tree::constant(a).$base_fn(b)
        });
        $engine.register_fn($rop, |a: i64, b: Tree| -> Tree {
            $( use std::ops::$op; )?
            Tree::constant(a as f64).$base_fn(b)
        });
    };
    ($engine:ident, $base_fn:ident) => {
        register_binary!($engine, stringify!($base_fn), $base_fn)
    };
}

macro_rules! register_unary {
    ($engine:ident, $($base_fn:ident),*) => {
        $(
        $engine.register_fn(stringify!($base_fn), |a: Tree| -> Tree {
            a.$base_fn()
        });
        )*
    };
}

/// Raises a tree to a number which must be an integer
fn pow_f64(a: Tree, n: f64) -> Result<Tree, Box<rhai::EvalAltResult>> {
    if n.fract() == 0.0 && n.abs() <= i64::MAX as f64 {
        Ok(a.pow(n as i64))
    } else {
        Err(format!("exponent must be an integer, not {n}").into())
    }
}

impl Engine {
    /// Constructs an engine with tree bindings
    pub fn new() -> Self {
        let mut engine = rhai::Engine::new();
        engine.register_type_with_name::<Tree>("Tree");
        engine.register_fn("to_string", |t: &mut Tree| t.to_string());

        register_binary!(engine, "+", add, Add);
        register_binary!(engine, "-", sub, Sub);
        register_binary!(engine, "*", mul, Mul);
        register_binary!(engine, "/", div, Div);
        register_binary!(engine, min);
        register_binary!(engine, max);
        register_unary!(
            engine, sqrt, abs, square, sin, cos, tan, asin, acos, atan, exp, ln
        );
        engine.register_fn("-", |a: Tree| -> Tree { -a });

        engine.register_fn("**", |a: Tree, n: i64| a.pow(n));
        engine.register_fn("**", pow_f64);

        engine.set_fast_operators(false);
        engine.set_max_expr_depths(64, 32);
        Self { engine }
    }

    /// Evaluates a single expression in terms of `x` and `y`
    ///
    /// `^` is rewritten to `**` first, so it binds tighter than `*` and
    /// associates to the right.
    pub fn eval(&self, expr: &str) -> Result<Tree, Error> {
        let mut scope = rhai::Scope::new();
        scope.push("x", Tree::x());
        scope.push("y", Tree::y());
        let expr = expr.replace('^', "**");
        let ast = self.engine.compile_expression_with_scope(&scope, &expr)?;
        let out = self
            .engine
            .eval_ast_with_scope::<rhai::Dynamic>(&mut scope, &ast)?;

        if out.is::<Tree>() {
            Ok(out.cast::<Tree>())
        } else if let Some(v) = out.clone().try_cast::<f64>() {
            Ok(Tree::constant(v))
        } else if let Some(v) = out.clone().try_cast::<i64>() {
            Ok(Tree::constant(v as f64))
        } else {
            Err(Error::BadExpressionType(out.type_name().to_owned()))
        }
    }

    /// Evaluates `lhs = rhs` as the tree `lhs - rhs`
    ///
    /// A string without `=` is evaluated as a single expression.
    pub fn eval_equation(&self, s: &str) -> Result<Tree, Error> {
        match s.split_once('=') {
            Some((lhs, rhs)) => Ok(self.eval(lhs)? - self.eval(rhs)?),
            None => self.eval(s),
        }
    }
}

/// One-shot evaluation of a single expression, in terms of `x` and `y`
pub fn eval(expr: &str) -> Result<Tree, Error> {
    Engine::new().eval(expr)
}

/// One-shot evaluation of an equation `lhs = rhs`, returning `lhs - rhs`
pub fn eval_equation(s: &str) -> Result<Tree, Error> {
    Engine::new().eval_equation(s)
}
