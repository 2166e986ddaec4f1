//! Exact polynomial representation of a curve
//!
//! A [`Poly`] stores a dense, possibly jagged grid of coefficients where
//! `coeff[i][j]` multiplies `x^i · y^j`.  Grids are never mutated in place:
//! every algebraic operation returns a new grid, so the owning curve can
//! swap its tree and coefficient views together.
//!
//! ```
//! use locus::poly::Poly;
//!
//! // x^2 + y^2 - 1
//! let p = Poly::new(vec![vec![-1.0, 0.0, 1.0], vec![0.0], vec![1.0]])?;
//! assert_eq!(p.degree(), 2);
//! assert_eq!(p.eval(0.0, 1.0), 0.0);
//! assert_eq!(p.to_string(), "[[-1.0,0.0,1.0],[0.0],[1.0]]");
//! # Ok::<(), locus::Error>(())
//! ```
use crate::{
    Error,
    context::{BinaryOpcode, Tree, TreeOp, UnaryOpcode, Var},
    eval::{Function, Grad, Hessian},
};
use serde::{Deserialize, Serialize};

pub mod fit;
mod rational;

pub use rational::{AffineInverse, RationalMap};

/// Coefficients at most this fraction of the largest one count as zero
const RELATIVE_ZERO: f64 = 1e-13;

/// Largest power of `x` or `y` that [`Poly::from_tree`] will expand
pub const MAX_EXPANDED_DEGREE: usize = 64;

/// Bivariate polynomial stored as a jagged coefficient grid
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<f64>>", into = "Vec<Vec<f64>>")]
pub struct Poly {
    coeff: Vec<Vec<f64>>,
    deg_y: usize,
    is_constant: bool,
}

impl Poly {
    /// Builds a polynomial from a coefficient grid
    ///
    /// Rows may have different lengths; missing entries are zero.  Returns an
    /// error if the grid is empty or holds a non-finite coefficient.
    pub fn new(coeff: Vec<Vec<f64>>) -> Result<Self, Error> {
        if coeff.iter().all(|row| row.is_empty()) {
            return Err(Error::EmptyCoefficients);
        }
        for (i, row) in coeff.iter().enumerate() {
            if let Some(j) = row.iter().position(|c| !c.is_finite()) {
                return Err(Error::NonFiniteCoefficient(i, j));
            }
        }
        Ok(Self::from_grid(coeff))
    }

    /// Builds a constant polynomial
    pub fn constant(c: f64) -> Result<Self, Error> {
        Self::new(vec![vec![c]])
    }

    fn from_grid(mut coeff: Vec<Vec<f64>>) -> Self {
        for row in coeff.iter_mut() {
            if row.is_empty() {
                row.push(0.0);
            }
        }
        let deg_y = coeff.iter().map(|r| r.len()).max().unwrap_or(1) - 1;
        let is_constant = coeff.iter().enumerate().all(|(i, row)| {
            row.iter()
                .enumerate()
                .all(|(j, c)| (i == 0 && j == 0) || *c == 0.0)
        });
        Self {
            coeff,
            deg_y,
            is_constant,
        }
    }

    /// Borrows the coefficient grid
    pub fn coeff(&self) -> &[Vec<f64>] {
        &self.coeff
    }

    /// Unwraps the coefficient grid
    pub fn into_coeff(self) -> Vec<Vec<f64>> {
        self.coeff
    }

    /// Looks up the coefficient of `x^i · y^j`, returning 0 if out of range
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.coeff
            .get(i)
            .and_then(|row| row.get(j))
            .copied()
            .unwrap_or(0.0)
    }

    /// Highest stored power of `x`
    pub fn deg_x(&self) -> usize {
        self.coeff.len() - 1
    }

    /// Highest stored power of `y`
    pub fn deg_y(&self) -> usize {
        self.deg_y
    }

    /// Checks whether every coefficient other than `c00` is exactly zero
    pub fn is_constant(&self) -> bool {
        self.is_constant
    }

    /// Total degree, ignoring coefficients which are negligible next to the
    /// largest one
    pub fn degree(&self) -> usize {
        let eps = zero_threshold(&self.coeff);
        let mut out = 0;
        for (i, row) in self.coeff.iter().enumerate() {
            for (j, c) in row.iter().enumerate() {
                if c.abs() > eps {
                    out = out.max(i + j);
                }
            }
        }
        out
    }

    /// Evaluates the polynomial with Horner's scheme
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        horner(x, y, &self.coeff)
    }

    /// Evaluates ∂f/∂x without building the derivative grid
    pub fn eval_diff_x(&self, x: f64, y: f64) -> f64 {
        self.eval_partial(x, y, 1, 0)
    }

    /// Evaluates ∂f/∂y without building the derivative grid
    pub fn eval_diff_y(&self, x: f64, y: f64) -> f64 {
        self.eval_partial(x, y, 0, 1)
    }

    /// Evaluates the mixed partial `∂^(a+b) f / ∂x^a ∂y^b`
    fn eval_partial(&self, x: f64, y: f64, a: usize, b: usize) -> f64 {
        let mut sum = 0.0;
        for i in (a..self.coeff.len()).rev() {
            let row = &self.coeff[i];
            let mut zs = 0.0;
            for j in (b..row.len()).rev() {
                zs = y * zs + falling(j, b) * row[j];
            }
            sum = sum * x + falling(i, a) * zs;
        }
        sum
    }

    /// Returns ∂f/∂x as a new polynomial
    pub fn diff_x(&self) -> Poly {
        if self.coeff.len() <= 1 {
            return Self::from_grid(vec![vec![0.0]]);
        }
        let out = self.coeff[1..]
            .iter()
            .enumerate()
            .map(|(i, row)| row.iter().map(|c| c * (i + 1) as f64).collect())
            .collect();
        Self::from_grid(min_deg(out))
    }

    /// Returns ∂f/∂y as a new polynomial
    pub fn diff_y(&self) -> Poly {
        let out = self
            .coeff
            .iter()
            .map(|row| {
                row.iter()
                    .enumerate()
                    .skip(1)
                    .map(|(j, c)| c * j as f64)
                    .collect()
            })
            .collect();
        Self::from_grid(min_deg(out))
    }

    /// Multiplies two polynomials
    pub fn mul(&self, other: &Poly) -> Poly {
        Self::from_grid(min_deg(mul(&self.coeff, &other.coeff)))
    }

    /// Expands a tree into a polynomial
    ///
    /// Returns [`Error::NotAPolynomial`] if the tree uses a transcendental
    /// function of `x` or `y`, or divides by a non-constant, and
    /// [`Error::DegreeTooHigh`] if a power of `x` or `y` would exceed
    /// [`MAX_EXPANDED_DEGREE`].
    pub fn from_tree(t: &Tree) -> Result<Poly, Error> {
        Poly::new(min_deg(expand(t)?))
    }

    /// Builds a tree which evaluates in the same order as [`Poly::eval`]
    pub fn to_tree(&self) -> Tree {
        let (x, y) = Tree::axes();
        let mut sum: Option<Tree> = None;
        for row in self.coeff.iter().rev() {
            let mut zs: Option<Tree> = None;
            for &c in row.iter().rev() {
                zs = horner_step(zs, &y, c);
            }
            let zs = zs.unwrap_or_else(|| Tree::constant(0.0));
            sum = Some(match sum {
                Some(s) => s * x.clone() + zs,
                None => zs,
            });
        }
        sum.unwrap_or_else(|| Tree::constant(0.0))
    }
}

fn horner_step(acc: Option<Tree>, v: &Tree, c: f64) -> Option<Tree> {
    match acc {
        None if c == 0.0 => None,
        None => Some(Tree::constant(c)),
        Some(t) if c == 0.0 => Some(t * v.clone()),
        Some(t) => Some(t * v.clone() + c),
    }
}

/// Falling factorial `n · (n-1) · ... · (n-k+1)`
fn falling(n: usize, k: usize) -> f64 {
    (0..k).map(|i| (n - i) as f64).product()
}

/// Evaluates a coefficient grid with Horner's scheme
///
/// Rows (powers of `x`) are the outer loop and columns (powers of `y`) the
/// inner one, both from the highest power down.
pub fn horner(x: f64, y: f64, coeff: &[Vec<f64>]) -> f64 {
    let mut sum = 0.0;
    for row in coeff.iter().rev() {
        let mut zs = 0.0;
        for c in row.iter().rev() {
            zs = y * zs + c;
        }
        sum = sum * x + zs;
    }
    sum
}

/// Multiplies two coefficient grids by dense convolution
pub fn mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    if a.is_empty() || b.is_empty() {
        return vec![vec![0.0]];
    }
    let cols = |g: &[Vec<f64>]| g.iter().map(|r| r.len()).max().unwrap_or(1);
    let ny = (cols(a) + cols(b)).saturating_sub(1).max(1);
    let mut out = vec![vec![0.0; ny]; a.len() + b.len() - 1];
    for (i1, r1) in a.iter().enumerate() {
        for (j1, c1) in r1.iter().enumerate() {
            if *c1 == 0.0 {
                continue;
            }
            for (i2, r2) in b.iter().enumerate() {
                for (j2, c2) in r2.iter().enumerate() {
                    out[i1 + i2][j1 + j2] += c1 * c2;
                }
            }
        }
    }
    out
}

/// Largest magnitude at which a coefficient of this grid is negligible
///
/// This scales with the grid, so uniformly small coefficients survive.  A
/// grid holding a non-finite value only treats exact zeros as negligible.
fn zero_threshold(coeff: &[Vec<f64>]) -> f64 {
    let largest = coeff.iter().flatten().fold(0.0f64, |m, c| m.max(c.abs()));
    if largest.is_finite() {
        largest * RELATIVE_ZERO
    } else {
        0.0
    }
}

/// Strips trailing negligible coefficients from each row and trailing empty
/// rows, never shrinking below `[[c00]]`
pub fn min_deg(mut coeff: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    let eps = zero_threshold(&coeff);
    let negligible = |c: &f64| c.abs() <= eps;
    for row in coeff.iter_mut() {
        while row.len() > 1 && row.last().is_some_and(negligible) {
            row.pop();
        }
    }
    while coeff.len() > 1
        && coeff.last().is_some_and(|row| row.iter().all(negligible))
    {
        coeff.pop();
    }
    if coeff.is_empty() {
        coeff.push(vec![0.0]);
    }
    for row in coeff.iter_mut() {
        if row.is_empty() {
            row.push(0.0);
        }
    }
    coeff
}

fn add_grids(a: &[Vec<f64>], b: &[Vec<f64>], sign: f64) -> Vec<Vec<f64>> {
    let rows = a.len().max(b.len());
    (0..rows)
        .map(|i| {
            let ra = a.get(i).map(|r| r.as_slice()).unwrap_or(&[]);
            let rb = b.get(i).map(|r| r.as_slice()).unwrap_or(&[]);
            (0..ra.len().max(rb.len()))
                .map(|j| {
                    ra.get(j).copied().unwrap_or(0.0)
                        + sign * rb.get(j).copied().unwrap_or(0.0)
                })
                .collect()
        })
        .collect()
}

fn scale_grid(a: Vec<Vec<f64>>, k: f64) -> Vec<Vec<f64>> {
    a.into_iter()
        .map(|row| row.into_iter().map(|c| c * k).collect())
        .collect()
}

/// Returns the constant value of a grid with no `x` or `y` terms
fn grid_const(a: &[Vec<f64>]) -> Option<f64> {
    let mut out = None;
    for (i, row) in a.iter().enumerate() {
        for (j, c) in row.iter().enumerate() {
            if i == 0 && j == 0 {
                out = Some(*c);
            } else if *c != 0.0 {
                return None;
            }
        }
    }
    out
}

fn expand(t: &Tree) -> Result<Vec<Vec<f64>>, Error> {
    let out = match &**t {
        TreeOp::Input(Var::X) => vec![vec![0.0], vec![1.0]],
        TreeOp::Input(Var::Y) => vec![vec![0.0, 1.0]],
        TreeOp::Const(c) => vec![vec![*c]],
        TreeOp::Unary(op, a) => {
            let a = expand(a)?;
            match op {
                UnaryOpcode::Neg => scale_grid(a, -1.0),
                UnaryOpcode::Square => mul(&a, &a),
                _ => match grid_const(&a) {
                    Some(c) => vec![vec![op.apply(c)]],
                    None => return Err(Error::NotAPolynomial),
                },
            }
        }
        TreeOp::Binary(op, a, b) => {
            let (a, b) = (expand(a)?, expand(b)?);
            match op {
                BinaryOpcode::Add => add_grids(&a, &b, 1.0),
                BinaryOpcode::Sub => add_grids(&a, &b, -1.0),
                BinaryOpcode::Mul => mul(&a, &b),
                BinaryOpcode::Div => match grid_const(&b) {
                    Some(c) => scale_grid(a, 1.0 / c),
                    None => return Err(Error::NotAPolynomial),
                },
                BinaryOpcode::Min | BinaryOpcode::Max => {
                    match (grid_const(&a), grid_const(&b)) {
                        (Some(p), Some(q)) => vec![vec![op.apply(p, q)]],
                        _ => return Err(Error::NotAPolynomial),
                    }
                }
            }
        }
    };
    let cols = out.iter().map(|r| r.len()).max().unwrap_or(1);
    let deg = cols.max(out.len()).saturating_sub(1);
    if deg > MAX_EXPANDED_DEGREE {
        return Err(Error::DegreeTooHigh(deg));
    }
    Ok(out)
}

impl Function for Poly {
    fn eval(&self, x: f64, y: f64) -> f64 {
        Poly::eval(self, x, y)
    }
    fn grad(&self, x: f64, y: f64) -> Option<Grad> {
        Some(Grad::new(
            self.eval(x, y),
            self.eval_diff_x(x, y),
            self.eval_diff_y(x, y),
        ))
    }
    fn hessian(&self, x: f64, y: f64) -> Option<Hessian> {
        Some(Hessian::new(
            self.eval_partial(x, y, 2, 0),
            self.eval_partial(x, y, 1, 1),
            self.eval_partial(x, y, 0, 2),
        ))
    }
}

impl TryFrom<Vec<Vec<f64>>> for Poly {
    type Error = Error;
    fn try_from(coeff: Vec<Vec<f64>>) -> Result<Self, Error> {
        Poly::new(coeff)
    }
}

impl From<Poly> for Vec<Vec<f64>> {
    fn from(p: Poly) -> Self {
        p.coeff
    }
}

impl std::fmt::Display for Poly {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(&self.coeff)
            .map_err(|_| std::fmt::Error)?;
        f.write_str(&s)
    }
}

impl std::str::FromStr for Poly {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        let coeff: Vec<Vec<f64>> = serde_json::from_str(s)?;
        Poly::new(coeff)
    }
}
