use super::{Poly, add_grids, min_deg, mul, scale_grid};
use crate::{Error, context::Tree, eval::STANDARD_PRECISION};
use nalgebra::{Matrix2, Point2, Vector2};

/// Rational substitution `x → px / qx`, `y → py / qy`
///
/// A missing denominator is treated as 1.
#[derive(Clone, Debug, PartialEq)]
pub struct RationalMap {
    /// Numerator substituted for `x`
    pub px: Poly,
    /// Numerator substituted for `y`
    pub py: Poly,
    /// Denominator for `x`
    pub qx: Option<Poly>,
    /// Denominator for `y`
    pub qy: Option<Poly>,
}

/// Closed-form inverse of an affine [`RationalMap`]
///
/// A point on the original curve is mapped to the matching point on the
/// substituted curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct AffineInverse {
    /// Linear part
    pub matrix: Matrix2<f64>,
    /// Translation part
    pub offset: Vector2<f64>,
}

impl AffineInverse {
    /// Applies the inverse map to a point
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        Point2::from(self.matrix * p.coords + self.offset)
    }
}

impl RationalMap {
    /// Builds a map with polynomial (denominator-free) substitutions
    pub fn polynomial(px: Poly, py: Poly) -> Self {
        Self {
            px,
            py,
            qx: None,
            qy: None,
        }
    }

    /// Builds the affine substitution `(x, y) → m · (x, y) + t`
    pub fn affine(m: Matrix2<f64>, t: Vector2<f64>) -> Result<Self, Error> {
        let px = Poly::new(vec![vec![t.x, m[(0, 1)]], vec![m[(0, 0)]]])?;
        let py = Poly::new(vec![vec![t.y, m[(1, 1)]], vec![m[(1, 0)]]])?;
        Ok(Self::polynomial(px, py))
    }

    /// Builds the inversion through a circle
    ///
    /// Both coordinates share the denominator `(x - cx)² + (y - cy)²`.
    pub fn circle_inversion(
        center: Point2<f64>,
        radius: f64,
    ) -> Result<Self, Error> {
        let (cx, cy) = (center.x, center.y);
        let r2 = radius * radius;
        let q = Poly::new(vec![
            vec![cx * cx + cy * cy, -2.0 * cy, 1.0],
            vec![-2.0 * cx],
            vec![1.0],
        ])?;
        // c·q + r²·(p - c)
        let shift = |c: f64, lin: Vec<Vec<f64>>| {
            let base = scale_grid(q.coeff.clone(), c);
            Poly::new(min_deg(add_grids(&base, &lin, r2)))
        };
        let px = shift(cx, vec![vec![-cx], vec![1.0]])?;
        let py = shift(cy, vec![vec![-cy, 1.0]])?;
        Ok(Self {
            px,
            py,
            qx: Some(q.clone()),
            qy: Some(q),
        })
    }

    /// Returns the substituted trees for `x` and `y`
    pub fn to_trees(&self) -> (Tree, Tree) {
        let ratio = |p: &Poly, q: &Option<Poly>| match q {
            Some(q) => p.to_tree() / q.to_tree(),
            None => p.to_tree(),
        };
        (ratio(&self.px, &self.qx), ratio(&self.py, &self.qy))
    }

    /// Returns the closed-form inverse, if this map is an invertible affine
    /// map without an `xy` term or denominators
    ///
    /// The map counts as singular when its determinant vanishes relative to
    /// the products it is built from, so uniformly scaled maps stay
    /// invertible.
    pub fn affine_inverse(&self) -> Option<AffineInverse> {
        if self.qx.is_some() || self.qy.is_some() {
            return None;
        }
        if self.px.degree() > 1 || self.py.degree() > 1 {
            return None;
        }
        let (px, py) = (&self.px, &self.py);
        let (a, ax, ay) = (px.get(0, 0), px.get(1, 0), px.get(0, 1));
        let (b, bx, by) = (py.get(0, 0), py.get(1, 0), py.get(0, 1));
        let det = ax * by - bx * ay;
        let scale = (ax * by).abs().max((bx * ay).abs());
        if !det.is_finite() || det.abs() <= STANDARD_PRECISION * scale {
            return None;
        }
        Some(AffineInverse {
            matrix: Matrix2::new(by, -ay, -bx, ax) / det,
            offset: Vector2::new(
                (b * ay - a * by) / det,
                -(b * ax - a * bx) / det,
            ),
        })
    }
}

/// Returns `[p^0, p^1, ..., p^n]`
fn powers(p: &Poly, n: usize) -> Vec<Vec<Vec<f64>>> {
    let mut out = Vec::with_capacity(n + 1);
    out.push(vec![vec![1.0]]);
    for k in 1..=n {
        let next = mul(&out[k - 1], &p.coeff);
        out.push(next);
    }
    out
}

impl Poly {
    /// Substitutes `x → px/qx` and `y → py/qy`, clearing denominators
    ///
    /// In general the result is
    /// `Σ c_ij · px^i · qx^(degX - i) · py^j · qy^(degY - j)`; when both
    /// denominators are equal, they are cleared with a single power of the
    /// total degree instead.  Returns an error if the result overflows.
    pub fn substitute_rational(
        &self,
        map: &RationalMap,
    ) -> Result<Poly, Error> {
        let out = match (&map.qx, &map.qy) {
            (Some(qx), Some(qy)) if qx == qy => self.substitute_shared(map, qx),
            _ => self.substitute_general(map),
        };
        Poly::new(min_deg(out))
    }

    fn substitute_general(&self, map: &RationalMap) -> Vec<Vec<f64>> {
        let (deg_x, deg_y) = (self.deg_x(), self.deg_y());
        let px = powers(&map.px, deg_x);
        let py = powers(&map.py, deg_y);
        let qx = map.qx.as_ref().map(|q| powers(q, deg_x));
        let qy = map.qy.as_ref().map(|q| powers(q, deg_y));

        let y_terms: Vec<_> = (0..=deg_y)
            .map(|j| match &qy {
                Some(q) => mul(&py[j], &q[deg_y - j]),
                None => py[j].clone(),
            })
            .collect();

        let mut sum = vec![vec![0.0]];
        for i in (0..=deg_x).rev() {
            let mut row_sum = vec![vec![0.0]];
            for (j, c) in self.coeff[i].iter().enumerate().rev() {
                if *c != 0.0 {
                    row_sum = add_grids(&row_sum, &y_terms[j], *c);
                }
            }
            let x_term = match &qx {
                Some(q) => mul(&px[i], &q[deg_x - i]),
                None => px[i].clone(),
            };
            sum = add_grids(&sum, &mul(&x_term, &row_sum), 1.0);
        }
        sum
    }

    fn substitute_shared(&self, map: &RationalMap, q: &Poly) -> Vec<Vec<f64>> {
        // Every stored term counts here, however small
        let d = self
            .coeff
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, c)| **c != 0.0)
                    .map(move |(j, _)| i + j)
            })
            .max()
            .unwrap_or(0);
        let px = powers(&map.px, d);
        let py = powers(&map.py, d);
        let qd = powers(q, d);

        let mut sum = vec![vec![0.0]];
        for (i, row) in self.coeff.iter().enumerate().rev() {
            for (j, c) in row.iter().enumerate().rev() {
                if *c == 0.0 {
                    continue;
                }
                let term = mul(&mul(&px[i], &py[j]), &qd[d - i - j]);
                sum = add_grids(&sum, &term, *c);
            }
        }
        sum
    }
}
