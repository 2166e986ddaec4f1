//! Candidate starting points for intersecting two curves
use crate::eval::Function;
use nalgebra::Point2;

/// Returns at most `n` points near which both zero sets may cross
///
/// The rectangle from `min` to `max` is sampled on a regular lattice with
/// `floor(sqrt(n)) + 1` interior lines along each axis.  Lattice edges on
/// which both functions change sign produce candidates: the edge midpoint
/// along the first row, and the center of the cell above the edge elsewhere.
///
/// If fewer than two candidates turn up, the center and the four quarter
/// points of the rectangle are appended, so that callers always have
/// something to start from.
pub fn probable_initial_points(
    f1: &dyn Function,
    f2: &dyn Function,
    min: Point2<f64>,
    max: Point2<f64>,
    n: usize,
) -> Vec<Point2<f64>> {
    let mut out = vec![];
    if !(min.x < max.x && min.y < max.y) || n == 0 {
        return out;
    }
    let root = (n as f64).sqrt() as usize + 1;
    let dx = (max.x - min.x) / (root + 1) as f64;
    let dy = (max.y - min.y) / (root + 1) as f64;
    let crosses =
        |a: (f64, f64), b: (f64, f64)| a.0 * b.0 <= 0.0 && a.1 * b.1 <= 0.0;
    let sample = |x: f64, y: f64| (f1.eval(x, y), f2.eval(x, y));

    // Values along the previous lattice row
    let mut row: Vec<(f64, f64)> =
        (0..=root).map(|j| sample(min.x + j as f64 * dx, min.y)).collect();
    let mut present = vec![false; root + 1];
    for j in 1..=root {
        if crosses(row[j - 1], row[j]) && out.len() < n {
            present[j] = true;
            out.push(Point2::new(min.x + (j as f64 - 0.5) * dx, min.y));
        }
    }

    'rows: for i in 1..=root {
        let y = min.y + i as f64 * dy;
        for j in 1..=root {
            let x = min.x + j as f64 * dx;
            let cur = sample(x, y);
            if crosses(row[j], cur) && !present[j] {
                present[j] = true;
                out.push(Point2::new(x - 0.5 * dx, y - 0.5 * dy));
                if out.len() >= n {
                    break 'rows;
                }
            } else {
                present[j] = false;
            }
            row[j] = cur;
        }
    }

    if out.len() < 2 {
        log::debug!("falling back to fixed seed points");
        let size = max - min;
        let at = |u: f64, v: f64| {
            Point2::new(min.x + u * size.x, min.y + v * size.y)
        };
        out.extend([
            at(0.5, 0.5),
            at(0.25, 0.25),
            at(0.75, 0.25),
            at(0.25, 0.75),
            at(0.75, 0.75),
        ]);
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;

    fn rect() -> (Point2<f64>, Point2<f64>) {
        (Point2::new(-4.0, -4.0), Point2::new(4.0, 4.0))
    }

    #[test]
    fn fallback() {
        let (min, max) = rect();
        let a = Tree::constant(1.0);
        let b = Tree::x();
        let pts = probable_initial_points(&a, &b, min, max, 16);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], Point2::origin());
        assert_eq!(pts[1], Point2::new(-2.0, -2.0));
        assert_eq!(pts[4], Point2::new(2.0, 2.0));
    }

    #[test]
    fn empty_rect() {
        let (min, max) = rect();
        let f = Tree::x();
        assert!(probable_initial_points(&f, &f, max, min, 16).is_empty());
        assert!(probable_initial_points(&f, &f, min, min, 16).is_empty());
    }

    #[test]
    fn line_and_circle() {
        let (min, max) = rect();
        let a = Tree::y() - 0.3;
        let b = Tree::x().square() + Tree::y().square() - 1.0;
        let pts = probable_initial_points(&a, &b, min, max, 64);
        assert_eq!(pts.len(), 2, "{pts:?}");

        // Each seed lies within a lattice cell (0.8 wide) of a crossing
        let x = (1.0f64 - 0.09).sqrt();
        for p in &pts {
            let d = [Point2::new(-x, 0.3), Point2::new(x, 0.3)]
                .iter()
                .map(|q| (p - q).norm())
                .fold(f64::INFINITY, f64::min);
            assert!(d < 0.8, "{p}");
        }
    }

    #[test]
    fn limit() {
        let (min, max) = rect();
        // Both functions oscillate quickly along y
        let a = (Tree::y() * 20.0).sin();
        let b = (Tree::y() * 20.0).cos();
        let pts = probable_initial_points(&a, &b, min, max, 4);
        assert!((2..=4).contains(&pts.len()), "{pts:?}");
    }
}
