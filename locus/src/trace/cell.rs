//! Classification of grid cells by the signs at their corners
//!
//! Cells are axis-aligned squares with `x1 < x2` and `y1 < y2`.  The corners
//! on the `y1` row are called "top", and those on the `y2` row "bottom".
use crate::eval::Function;
use nalgebra::Point2;
use strum::EnumIter;

/// An axis-aligned cell
#[derive(Copy, Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Cell {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Cell {
    /// Builds a new cell
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Returns the center of the cell
    pub fn center(&self) -> Point2<f64> {
        Point2::new((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }
}

/// Function values at the four corners of a cell
#[derive(Copy, Clone, Debug, PartialEq)]
#[allow(missing_docs)]
pub struct Corners {
    pub tl: f64,
    pub tr: f64,
    pub br: f64,
    pub bl: f64,
}

impl Corners {
    /// Builds a new set of corner values
    pub fn new(tl: f64, tr: f64, br: f64, bl: f64) -> Self {
        Self { tl, tr, br, bl }
    }

    /// Evaluates `f` at each corner of `cell`
    pub fn sample(f: &dyn Function, cell: &Cell) -> Self {
        Self {
            tl: f.eval(cell.x1, cell.y1),
            tr: f.eval(cell.x2, cell.y1),
            br: f.eval(cell.x2, cell.y2),
            bl: f.eval(cell.x1, cell.y2),
        }
    }
}

/// Sign configuration of a cell, up to complement
///
/// Each name describes the corner(s) on the odd side of the curve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, EnumIter)]
pub enum Config {
    /// All corners have the same sign
    Empty,
    /// Only the bottom-left corner differs
    BottomLeft,
    /// Only the bottom-right corner differs
    BottomRight,
    /// The bottom pair differs from the top pair
    Horizontal,
    /// Only the top-right corner differs
    TopRight,
    /// Opposite corners share a sign; ambiguous, so never emitted
    Saddle,
    /// The right pair differs from the left pair
    Vertical,
    /// Only the top-left corner differs
    TopLeft,
    /// At least one corner is NaN or infinite
    Invalid,
}

impl Config {
    fn from_packed(c: u8) -> Self {
        match c {
            0 => Config::Empty,
            1 => Config::BottomLeft,
            2 => Config::BottomRight,
            3 => Config::Horizontal,
            4 => Config::TopRight,
            5 => Config::Saddle,
            6 => Config::Vertical,
            7 => Config::TopLeft,
            _ => Config::Invalid,
        }
    }

    /// Checks whether a segment can be emitted for this configuration
    pub fn emits(self) -> bool {
        !matches!(self, Config::Empty | Config::Saddle | Config::Invalid)
    }
}

/// Returns `Some(1)` for positive values, `Some(0)` for zero or negative
/// values, and `None` for NaN or infinity
#[inline]
pub fn sign(v: f64) -> Option<u8> {
    if !v.is_finite() {
        None
    } else if v > 0.0 {
        Some(1)
    } else {
        Some(0)
    }
}

/// Classifies a cell from its corner values
pub fn classify(c: &Corners) -> Config {
    let (Some(tl), Some(tr), Some(br), Some(bl)) =
        (sign(c.tl), sign(c.tr), sign(c.br), sign(c.bl))
    else {
        return Config::Invalid;
    };
    let mut packed = (tl << 3) | (tr << 2) | (br << 1) | bl;
    if packed >= 8 {
        packed = !packed & 0xf;
    }
    Config::from_packed(packed)
}

/// Linear interpolation of the zero crossing between two samples
///
/// `fa` is sampled at `p1` and `fb` at `p2`.  If the crossing ratio falls
/// outside `[0, 1]` (or is not finite), the midpoint is returned instead.
#[inline]
pub fn interpolate(fa: f64, fb: f64, p1: f64, p2: f64) -> f64 {
    let r = -fb / (fa - fb);
    if (0.0..=1.0).contains(&r) {
        r * (p1 - p2) + p2
    } else {
        (p1 + p2) * 0.5
    }
}

/// Builds the segment crossing a cell, if any
///
/// Each endpoint is checked against the function: its value must not exceed
/// the smaller corner magnitude on its edge, which rejects sign changes
/// caused by poles and other discontinuities.
pub fn segment_for(
    f: &dyn Function,
    cell: &Cell,
    c: &Corners,
) -> Option<[Point2<f64>; 2]> {
    let Cell { x1, y1, x2, y2 } = *cell;
    let Corners { tl, tr, br, bl } = *c;
    let m = |a: f64, b: f64| a.abs().min(b.abs());
    let (p, q, lim_p, lim_q) = match classify(c) {
        Config::BottomLeft => (
            Point2::new(x1, interpolate(bl, tl, y2, y1)),
            Point2::new(interpolate(bl, br, x1, x2), y2),
            m(bl, tl),
            m(bl, br),
        ),
        Config::BottomRight => (
            Point2::new(x2, interpolate(br, tr, y2, y1)),
            Point2::new(interpolate(br, bl, x2, x1), y2),
            m(br, tr),
            m(br, bl),
        ),
        Config::TopRight => (
            Point2::new(x2, interpolate(tr, br, y1, y2)),
            Point2::new(interpolate(tr, tl, x2, x1), y1),
            m(tr, br),
            m(tr, tl),
        ),
        Config::TopLeft => (
            Point2::new(x1, interpolate(tl, bl, y1, y2)),
            Point2::new(interpolate(tl, tr, x1, x2), y1),
            m(bl, tl),
            m(tl, tr),
        ),
        Config::Horizontal => (
            Point2::new(x1, interpolate(tl, bl, y1, y2)),
            Point2::new(x2, interpolate(tr, br, y1, y2)),
            m(tl, bl),
            m(tr, br),
        ),
        Config::Vertical => (
            Point2::new(interpolate(tl, tr, x1, x2), y1),
            Point2::new(interpolate(bl, br, x1, x2), y2),
            m(tl, tr),
            m(bl, br),
        ),
        Config::Empty | Config::Saddle | Config::Invalid => return None,
    };
    let ok = f.eval(p.x, p.y).abs() <= lim_p && f.eval(q.x, q.y).abs() <= lim_q;
    ok.then_some([p, q])
}

/// Quick test for whether the curve may cross a cell
///
/// The diagonal corners are compared first; the remaining two are only
/// evaluated if the diagonal agrees.
pub fn has_segment(f: &dyn Function, cell: &Cell) -> bool {
    let tl = f.eval(cell.x1, cell.y1);
    let br = f.eval(cell.x2, cell.y2);
    let s = sign(tl);
    if s == sign(br)
        && tl + br != 0.0
        && sign(f.eval(cell.x2, cell.y1)) == s
    {
        return s != sign(f.eval(cell.x1, cell.y2));
    }
    true
}

/// Returns 1 if an edge with endpoint values `a` and `b` is crossed
#[inline]
pub fn intersect(a: f64, b: f64) -> u8 {
    u8::from(a * b <= 0.0)
}

/// Returns a 4-bit mask of crossed edges, or 0 if none (or all) are crossed
///
/// Bits are left, top, right, bottom from most to least significant.
pub fn edge_config(c: &Corners) -> u8 {
    let out = (intersect(c.bl, c.tl) << 3)
        | (intersect(c.tl, c.tr) << 2)
        | (intersect(c.tr, c.br) << 1)
        | intersect(c.br, c.bl);
    if out == 15 { 0 } else { out }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;
    use strum::IntoEnumIterator;

    fn corners_from_bits(bits: u8) -> Corners {
        let v = |b: u8| if bits & b != 0 { 1.0 } else { -1.0 };
        Corners::new(v(8), v(4), v(2), v(1))
    }

    #[test]
    fn complement_invariance() {
        for bits in 0..16 {
            let c = corners_from_bits(bits);
            let n = Corners::new(-c.tl, -c.tr, -c.br, -c.bl);
            assert_eq!(classify(&c), classify(&n), "{bits:04b}");
        }
    }

    #[test]
    fn every_config_reachable() {
        let seen: Vec<_> =
            (0..16).map(|b| classify(&corners_from_bits(b))).collect();
        for cfg in Config::iter() {
            if cfg != Config::Invalid {
                assert!(seen.contains(&cfg), "{cfg:?}");
            }
        }
        assert_eq!(classify(&corners_from_bits(0b0001)), Config::BottomLeft);
        assert_eq!(classify(&corners_from_bits(0b0110)), Config::Vertical);
        assert_eq!(classify(&corners_from_bits(0b1100)), Config::Horizontal);
        assert_eq!(classify(&corners_from_bits(0b1010)), Config::Saddle);
    }

    #[test]
    fn invalid_corners() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let c = Corners::new(1.0, -1.0, bad, 1.0);
            assert_eq!(classify(&c), Config::Invalid);
            assert!(!classify(&c).emits());
        }
        // Zero counts as non-positive
        assert_eq!(
            classify(&Corners::new(0.0, -1.0, -2.0, -3.0)),
            Config::Empty
        );
    }

    #[test]
    fn interpolation() {
        assert_eq!(interpolate(-1.0, 1.0, 0.0, 2.0), 1.0);
        assert_eq!(interpolate(-1.0, 3.0, 0.0, 4.0), 1.0);
        assert_eq!(interpolate(0.0, 3.0, 5.0, 4.0), 5.0);
        for (fa, fb) in [(1.0, 2.0), (1.0, 1.0), (f64::NAN, 1.0)] {
            assert_eq!(interpolate(fa, fb, 0.0, 2.0), 1.0, "{fa} {fb}");
        }
        for k in 0..100 {
            let fa = -1.0 - k as f64;
            let v = interpolate(fa, 0.5, 3.0, 7.0);
            assert!((3.0..=7.0).contains(&v));
        }
    }

    #[test]
    fn vertical_line_segment() {
        let f = Tree::x() - 0.5;
        let cell = Cell::new(0.0, 0.0, 1.0, 1.0);
        let c = Corners::sample(&f, &cell);
        assert_eq!(classify(&c), Config::Vertical);
        let [p, q] = segment_for(&f, &cell, &c).unwrap();
        assert_eq!(p, Point2::new(0.5, 0.0));
        assert_eq!(q, Point2::new(0.5, 1.0));
    }

    #[test]
    fn corner_segment() {
        // x + y = 0.25 cuts off the top-left corner
        let f = Tree::x() + Tree::y() - 0.25;
        let cell = Cell::new(0.0, 0.0, 1.0, 1.0);
        let c = Corners::sample(&f, &cell);
        assert_eq!(classify(&c), Config::TopLeft);
        let [p, q] = segment_for(&f, &cell, &c).unwrap();
        assert!((p - Point2::new(0.0, 0.25)).norm() < 1e-12);
        assert!((q - Point2::new(0.25, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn pole_rejected() {
        let f = 1.0 / (Tree::x() - 0.5);
        let cell = Cell::new(0.0, 0.0, 1.0, 1.0);
        let c = Corners::sample(&f, &cell);
        assert_eq!(classify(&c), Config::Vertical);
        assert!(segment_for(&f, &cell, &c).is_none());
    }

    #[test]
    fn saddle_never_emits() {
        let f = Tree::x() * Tree::y();
        let cell = Cell::new(-1.0, -1.0, 1.0, 1.0);
        let c = Corners::sample(&f, &cell);
        assert_eq!(classify(&c), Config::Saddle);
        assert!(segment_for(&f, &cell, &c).is_none());
    }

    #[test]
    fn edges() {
        assert_eq!(edge_config(&Corners::new(1.0, 2.0, 3.0, 4.0)), 0);
        assert_eq!(edge_config(&Corners::new(0.0, 0.0, 0.0, 0.0)), 0);
        // Only the right column is positive: top and bottom edges cross
        assert_eq!(edge_config(&Corners::new(-1.0, 1.0, 1.0, -1.0)), 0b0101);

        let f = Tree::x().square() + Tree::y().square() - 1.0;
        assert!(has_segment(&f, &Cell::new(0.5, 0.5, 1.5, 1.5)));
        assert!(!has_segment(&f, &Cell::new(2.0, 2.0, 3.0, 3.0)));
        assert!(!has_segment(&f, &Cell::new(-0.1, -0.1, 0.1, 0.1)));
    }
}
