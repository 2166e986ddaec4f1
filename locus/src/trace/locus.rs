use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A single point of a traced locus
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocusPoint {
    /// Position in world coordinates
    pub pos: Point2<f64>,
    /// Whether this point starts a new segment (a "move to" rather than a
    /// "line to")
    pub segment_start: bool,
}

/// Piecewise-linear approximation of a curve
///
/// Points are stored in pairs, each pair being one segment whose first point
/// has `segment_start` set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Locus {
    points: Vec<LocusPoint>,
}

impl Locus {
    /// Builds an empty locus
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every point, in emission order
    pub fn points(&self) -> &[LocusPoint] {
        &self.points
    }

    /// Iterates over segments as `[start, end]` pairs
    pub fn segments(&self) -> impl Iterator<Item = [Point2<f64>; 2]> + '_ {
        self.points.chunks_exact(2).map(|s| [s[0].pos, s[1].pos])
    }

    /// Number of points (twice the number of segments)
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Checks whether the locus has no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Removes every point
    pub fn clear(&mut self) {
        self.points.clear()
    }

    /// Appends a segment
    pub fn push_segment(&mut self, [a, b]: [Point2<f64>; 2]) {
        self.points.push(LocusPoint {
            pos: a,
            segment_start: true,
        });
        self.points.push(LocusPoint {
            pos: b,
            segment_start: false,
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn segments() {
        let mut locus = Locus::new();
        assert!(locus.is_empty());
        locus.push_segment([Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)]);
        locus.push_segment([Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]);
        assert_eq!(locus.len(), 4);
        let starts: Vec<_> =
            locus.points().iter().map(|p| p.segment_start).collect();
        assert_eq!(starts, [true, false, true, false]);
        let segs: Vec<_> = locus.segments().collect();
        assert_eq!(segs[1], [Point2::new(1.0, 0.0), Point2::new(1.0, 1.0)]);
        locus.clear();
        assert_eq!(locus.segments().count(), 0);
    }
}
