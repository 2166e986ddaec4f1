//! Fitting implicit polynomials through points
//!
//! A curve of degree `d` has `(d + 1)(d + 2) / 2` monomial coefficients,
//! defined up to scale, so `n` points determine it exactly when `n + 1` is a
//! triangular number.  When `n` itself is triangular the system is square and
//! the fit falls back to the least-squares null vector.
use super::{Poly, min_deg};
use crate::{
    Error,
    eval::{STANDARD_PRECISION, is_zero},
};
use nalgebra::{DMatrix, DVector, Point2, Point3};
use ordered_float::OrderedFloat;

/// Minimum pivot magnitude for an LU solve to be trusted
const PIVOT_EPSILON: f64 = 1e-11;

/// Maximum |f(p)| allowed at an input point after fitting
const VERIFY_TOLERANCE: f64 = 1.0;

/// Fits a polynomial curve through a set of points
///
/// See the module documentation for which point counts are accepted.
pub fn through_points(points: &[Point2<f64>]) -> Result<Poly, Error> {
    let n = points.len();
    let coeff = if let Some(d) = exact_degree(n) {
        exact_fit(points, d)?
    } else if let Some(d) = triangular_degree(n) {
        log::debug!("least-squares fit of degree {d} through {n} points");
        least_squares_fit(points, d)?
    } else {
        log::warn!("cannot fit a curve through {n} points");
        return Err(Error::BadPointCount(n));
    };

    let poly = Poly::new(min_deg(coeff))?;
    for (i, p) in points.iter().enumerate() {
        let v = poly.eval(p.x, p.y);
        if !(v.abs() < VERIFY_TOLERANCE) {
            log::warn!("fitted curve misses point {i} ({v})");
            return Err(Error::FitVerification(i));
        }
    }
    Ok(poly)
}

/// Fits a polynomial curve through points in homogeneous coordinates
///
/// Each point is divided through by its `z` coordinate; points at infinity
/// are rejected.
pub fn through_homogeneous_points(
    points: &[Point3<f64>],
) -> Result<Poly, Error> {
    let affine = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            if is_zero(p.z) {
                Err(Error::PointAtInfinity(i))
            } else {
                Ok(Point2::new(p.x / p.z, p.y / p.z))
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    through_points(&affine)
}

/// Returns `k` if `n = k (k + 1) / 2`
fn triangular_root(n: usize) -> Option<usize> {
    let disc = 1 + 8 * n;
    let s = (disc as f64).sqrt().round() as usize;
    (s * s == disc).then(|| (s - 1) / 2)
}

/// Degree of the curve determined exactly by `n` points, if any
fn exact_degree(n: usize) -> Option<usize> {
    // n + 1 monomials must be triangular, i.e. 9 + 8n a perfect square
    let k = triangular_root(n + 1)?;
    (k >= 2).then(|| k - 1)
}

/// Degree whose monomial count equals `n`, if any
fn triangular_degree(n: usize) -> Option<usize> {
    let k = triangular_root(n)?;
    (k >= 2).then(|| k - 1)
}

/// Builds the monomial matrix, `x^j · y^k` with `j` outer and `k` inner
fn monomials(points: &[Point2<f64>], d: usize) -> DMatrix<f64> {
    let m = (d + 1) * (d + 2) / 2;
    DMatrix::from_fn(points.len(), m, |row, col| {
        let p = points[row];
        let (j, k) = monomial_index(d, col);
        p.x.powi(j as i32) * p.y.powi(k as i32)
    })
}

/// Maps a flat column index to its `(x, y)` exponents
fn monomial_index(d: usize, mut col: usize) -> (usize, usize) {
    for j in 0..=d {
        let len = d - j + 1;
        if col < len {
            return (j, col);
        }
        col -= len;
    }
    (d, 0)
}

/// Unpacks a flat solution vector into a jagged coefficient grid
fn to_grid(d: usize, sol: &DVector<f64>) -> Vec<Vec<f64>> {
    let mut out: Vec<Vec<f64>> =
        (0..=d).map(|j| vec![0.0; d - j + 1]).collect();
    for (col, v) in sol.iter().enumerate() {
        let (j, k) = monomial_index(d, col);
        out[j][k] = if v.abs() <= STANDARD_PRECISION { 0.0 } else { *v };
    }
    out
}

fn exact_fit(points: &[Point2<f64>], d: usize) -> Result<Vec<Vec<f64>>, Error> {
    let (mut n, mut d) = (points.len(), d);
    loop {
        let pts = &points[..n];
        let a = monomials(pts, d);
        let m = a.ncols();
        for fixed in 0..m {
            let rest = a.clone().remove_column(fixed);
            let rhs = -a.column(fixed).into_owned();
            let lu = rest.lu();
            let min_pivot = lu
                .u()
                .diagonal()
                .iter()
                .fold(f64::INFINITY, |acc, v| acc.min(v.abs()));
            if !(min_pivot > PIVOT_EPSILON) {
                continue;
            }
            let Some(x) = lu.solve(&rhs) else {
                continue;
            };
            log::debug!(
                "fit degree {d} through {n} points, fixing column {fixed}"
            );
            let mut sol = DVector::zeros(m);
            for (i, v) in x.iter().enumerate() {
                sol[if i < fixed { i } else { i + 1 }] = *v;
            }
            sol[fixed] = 1.0;
            return Ok(to_grid(d, &sol));
        }

        // Every column was singular, so retry with one degree less
        if d == 0 || n < d + 1 + 2 {
            log::warn!("fit exhausted at degree {d} with {n} points");
            return Err(Error::FitExhausted);
        }
        n -= d + 1;
        d -= 1;
        log::debug!("reducing fit to degree {d} through {n} points");
    }
}

fn least_squares_fit(
    points: &[Point2<f64>],
    d: usize,
) -> Result<Vec<Vec<f64>>, Error> {
    let a = monomials(points, d);
    let svd = a.svd(false, true);

    // nalgebra doesn't promise sorted singular values, so find the smallest
    let (idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by_key(|(_, s)| OrderedFloat(**s))
        .ok_or(Error::FitExhausted)?;
    let v_t = svd.v_t.ok_or(Error::FitExhausted)?;
    let mut sol: DVector<f64> = v_t.row(idx).transpose();

    let scale = sol.amax();
    if !(scale > 0.0) {
        return Err(Error::FitExhausted);
    }
    sol /= scale;
    Ok(to_grid(d, &sol))
}
