//! Moving a point onto the curve
//!
//! The snapper marches outwards from the point along both axes until it finds
//! a sign change, then refines the bracket with a few steps of regula falsi.
use crate::{
    eval::{Function, is_zero},
    trace::Viewport,
};
use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of marching steps in each direction
const MAX_STEPS: usize = 1 << 16;

/// Settings for [`snap`]
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapSettings {
    /// Region within which the search takes place
    pub bounds: Viewport,
    /// Marching step along each axis
    pub step: Vector2<f64>,
    /// Number of refinement steps once a sign change is found
    pub depth: usize,
}

impl SnapSettings {
    /// Builds settings with the default refinement depth of 8
    pub fn new(bounds: Viewport, step: Vector2<f64>) -> Self {
        Self {
            bounds,
            step,
            depth: 8,
        }
    }
}

/// Moves `p` onto the zero set of `f`
///
/// Points outside the bounds (or with non-finite coordinates) start from the
/// center of the bounds instead.  Samples where `f` is not finite are
/// skipped.  Returns `None` if no sign change is found within the bounds.
pub fn snap(
    f: &dyn Function,
    p: Point2<f64>,
    settings: &SnapSettings,
) -> Option<Point2<f64>> {
    let bounds = &settings.bounds;
    let p = if p.coords.iter().all(|v| v.is_finite()) && bounds.contains(p) {
        p
    } else {
        bounds.center()
    };
    let v = f.eval(p.x, p.y);
    if is_zero(v) {
        return Some(p);
    }
    let (sx, sy) = (settings.step.x, settings.step.y);
    if !(sx > 0.0 && sy > 0.0 && sx.is_finite() && sy.is_finite()) {
        return None;
    }

    let dirs = [
        Vector2::new(sx, 0.0),
        Vector2::new(-sx, 0.0),
        Vector2::new(0.0, sy),
        Vector2::new(0.0, -sy),
    ];
    let mut prev = [(p, v); 4];
    let mut live = [true; 4];
    for k in 1..=MAX_STEPS {
        for (d, dir) in dirs.iter().enumerate() {
            if !live[d] {
                continue;
            }
            let q = p + dir * k as f64;
            if !bounds.contains(q) {
                live[d] = false;
                continue;
            }
            let fq = f.eval(q.x, q.y);
            // Undefined samples keep the last defined one as the bracket end
            if !fq.is_finite() {
                continue;
            }
            if is_zero(fq) {
                return Some(q);
            }
            let (a, fa) = prev[d];
            if fa * fq < 0.0 {
                log::debug!("snap bracket found after {k} steps");
                return refine(f, (a, fa), (q, fq), settings.depth);
            }
            prev[d] = (q, fq);
        }
        if !live.iter().any(|b| *b) {
            break;
        }
    }
    None
}

/// Regula falsi within a bracket `[a, b]` whose values differ in sign
fn refine(
    f: &dyn Function,
    (a, fa): (Point2<f64>, f64),
    (b, fb): (Point2<f64>, f64),
    depth: usize,
) -> Option<Point2<f64>> {
    if is_zero(fa) {
        return Some(a);
    } else if is_zero(fb) {
        return Some(b);
    }
    let c = a + (b - a) * (fa / (fa - fb));
    let fc = f.eval(c.x, c.y);
    if depth == 0 || is_zero(fc) {
        return Some(c);
    }
    if fa * fc < 0.0 {
        refine(f, (a, fa), (c, fc), depth - 1)
    } else if fc * fb < 0.0 {
        refine(f, (c, fc), (b, fb), depth - 1)
    } else {
        None
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;
    use approx::assert_relative_eq;

    fn circle() -> Tree {
        Tree::x().square() + Tree::y().square() - 1.0
    }

    fn settings(step: f64) -> SnapSettings {
        SnapSettings::new(Viewport::default(), Vector2::new(step, step))
    }

    #[test]
    fn onto_circle() {
        let p = snap(&circle(), Point2::new(0.1, 0.05), &settings(0.2))
            .expect("no bracket");
        // The +x direction wins the tie with -x and +y
        assert!(p.x > 0.0);
        assert_relative_eq!(p.y, 0.05);
        assert!((p.coords.norm() - 1.0).abs() < 1e-6, "{p}");
    }

    #[test]
    fn nearest_direction_wins() {
        let p = snap(&circle(), Point2::new(0.0, -0.7), &settings(0.1))
            .expect("no bracket");
        assert_relative_eq!(p.x, 0.0);
        assert!((p.y + 1.0).abs() < 1e-6, "{p}");
    }

    #[test]
    fn already_on_curve() {
        let p = Point2::new(0.6, 0.8);
        assert_eq!(snap(&circle(), p, &settings(0.2)), Some(p));
    }

    #[test]
    fn outside_starts_from_center() {
        let p = snap(&circle(), Point2::new(100.0, f64::NAN), &settings(0.25))
            .expect("no bracket");
        assert!((p.coords.norm() - 1.0).abs() < 1e-6, "{p}");
    }

    #[test]
    fn march_past_undefined_sample() {
        // Root at x = 0.875, with a NaN sample at x = 0.75 just before it
        let x = Tree::x();
        let f = x.clone() - 0.875
            + Tree::constant(0.0) * (x.clone() - 0.75).square().ln();
        assert!(f.eval(0.75, 0.0).is_nan());

        let p = snap(&f, Point2::new(0.25, 0.0), &settings(0.25))
            .expect("no bracket");
        assert_relative_eq!(p.x, 0.875);
        assert_relative_eq!(p.y, 0.0);

        // An undefined start point never pairs with a sample
        let g = Tree::x().sqrt() - 2.0;
        let p = snap(&g, Point2::new(-1.0, 0.0), &settings(1.0))
            .expect("no bracket");
        assert_relative_eq!(p.x, 4.0);
    }

    #[test]
    fn no_bracket() {
        let f = Tree::x().square() + Tree::y().square() + 1.0;
        assert_eq!(snap(&f, Point2::new(1.0, 1.0), &settings(0.5)), None);
        let p = Point2::new(0.1, 0.0);
        assert_eq!(snap(&circle(), p, &settings(0.0)), None);
    }
}
