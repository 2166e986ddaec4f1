//! Tracing the zero set of a function into line segments
//!
//! Every tracer works on the square region of side
//! `max(width, height)` anchored at the viewport origin, subdivides it as a
//! quadtree whose depths are derived from the viewport's pixel size, and
//! emits one segment per crossing leaf cell through [`cell::segment_for`].
//!
//! ```
//! use locus::{
//!     context::Tree,
//!     trace::{Locus, Scratch, Tracer, TracerKind, Viewport},
//! };
//!
//! let circle = Tree::x().square() + Tree::y().square() - 4.0;
//! let view = Viewport::from_bounds([-5.0, 5.0, -5.0, 5.0, 40.0, 40.0]);
//! let mut scratch = Scratch::default();
//! let mut locus = Locus::new();
//! let tracer = TracerKind::default();
//! let stats = tracer.trace(&circle, &view, &mut scratch, &mut locus);
//! assert!(!locus.is_empty());
//! assert_eq!(stats.segments * 2, locus.len());
//! ```
use crate::eval::Function;
use serde::{Deserialize, Serialize};

pub mod cell;
mod curvature;
mod flood;
mod locus;
mod scratch;
mod uniform;
mod view;

pub use curvature::CurvatureTracer;
pub use flood::FloodTracer;
pub use locus::{Locus, LocusPoint};
pub use scratch::Scratch;
pub use uniform::UniformTracer;
pub use view::{DEFAULT_BOUNDS, Viewport};

use cell::{Cell, Corners};

/// Pixel counts are clamped to this, which bounds every quadtree depth
const MAX_PIXELS: f64 = (1 << 14) as f64;

/// Statistics returned from a single trace
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TraceStats {
    /// Number of leaf cells per side of the traced square
    pub plot_depth: usize,
    /// Number of coarse cells per side of the traced square
    pub search_depth: usize,
    /// Number of cells whose corners were classified
    pub cells: usize,
    /// Number of segments emitted
    pub segments: usize,
    /// Side length of a leaf cell, in world units
    pub step: f64,
}

/// Something which can trace a function into a [`Locus`]
pub trait Tracer {
    /// Traces `f` over `view`, replacing the contents of `out`
    ///
    /// `scratch` is working memory which is reset before use.
    fn trace(
        &self,
        f: &dyn Function,
        view: &Viewport,
        scratch: &mut Scratch,
        out: &mut Locus,
    ) -> TraceStats;
}

/// Selection of one of the built-in tracers
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TracerKind {
    /// Search, flood and plot (the default)
    Flood(FloodTracer),
    /// Uniform-depth quadtree
    Uniform(UniformTracer),
    /// Quadtree which stops early where curvature is low
    Curvature(CurvatureTracer),
}

impl Default for TracerKind {
    fn default() -> Self {
        TracerKind::Flood(FloodTracer::default())
    }
}

impl Tracer for TracerKind {
    fn trace(
        &self,
        f: &dyn Function,
        view: &Viewport,
        scratch: &mut Scratch,
        out: &mut Locus,
    ) -> TraceStats {
        let stats = match self {
            TracerKind::Flood(t) => t.trace(f, view, scratch, out),
            TracerKind::Uniform(t) => t.trace(f, view, scratch, out),
            TracerKind::Curvature(t) => t.trace(f, view, scratch, out),
        };
        log::debug!("traced {stats:?}");
        stats
    }
}

/// Settings for tracing a curve
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Which tracer to run
    pub tracer: TracerKind,
}

/// Converts a pixel count to a power-of-two grid size
///
/// Returns `None` if the viewport is empty or not finite.
fn grid_bits(view: &Viewport, factor: f64) -> Option<usize> {
    let px = view.pixels() * factor;
    if !view.is_valid() || !(px >= 0.0) {
        return None;
    }
    let pxls = (px.min(MAX_PIXELS) + 1.0) as usize;
    Some(pxls.next_power_of_two())
}

/// Integer cell coordinates for the recursive quadtree tracers
///
/// Cells are addressed on a `plot × plot` integer grid; a cell at `depth`
/// spans `plot / depth` grid units.
struct Grid {
    x: f64,
    y: f64,
    step: f64,
    plot: usize,
}

impl Grid {
    fn cell(&self, sx: usize, sy: usize, depth: usize) -> Cell {
        let frac = self.plot / depth;
        Cell::new(
            self.x + sx as f64 * self.step,
            self.y + sy as f64 * self.step,
            self.x + (sx + frac) as f64 * self.step,
            self.y + (sy + frac) as f64 * self.step,
        )
    }
}

/// Emits the segment for a leaf cell, if there is one
fn emit(
    f: &dyn Function,
    cell: &Cell,
    corners: &Corners,
    out: &mut Locus,
    stats: &mut TraceStats,
) {
    if let Some(seg) = cell::segment_for(f, cell, corners) {
        out.push_segment(seg);
        stats.segments += 1;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;
    use nalgebra::{Point2, Vector2};

    fn circle(r: f64) -> Tree {
        Tree::x().square() + Tree::y().square() - r * r
    }

    fn all_tracers() -> [TracerKind; 3] {
        [
            TracerKind::Flood(FloodTracer::default()),
            TracerKind::Uniform(UniformTracer::default()),
            TracerKind::Curvature(CurvatureTracer::default()),
        ]
    }

    #[test]
    fn grid_bits_rounding() {
        let v = |px: f64| Viewport {
            origin: Point2::origin(),
            width: 1.0,
            height: 1.0,
            scale: Vector2::new(px, px),
        };
        assert_eq!(grid_bits(&v(0.5), 1.0), Some(1));
        assert_eq!(grid_bits(&v(7.0), 1.0), Some(8));
        assert_eq!(grid_bits(&v(8.0), 1.0), Some(16));
        assert_eq!(grid_bits(&v(100.0), 0.125), Some(16));
        assert_eq!(grid_bits(&v(1e300), 1.0), Some(1 << 15));

        let mut bad = v(10.0);
        bad.width = f64::NAN;
        assert_eq!(grid_bits(&bad, 1.0), None);
        bad.width = 0.0;
        bad.height = 0.0;
        assert_eq!(grid_bits(&bad, 1.0), None);

        let mut bad = v(10.0);
        bad.height = f64::INFINITY;
        assert_eq!(grid_bits(&bad, 1.0), None);
        let mut bad = v(10.0);
        bad.scale.y = f64::NAN;
        assert_eq!(grid_bits(&bad, 1.0), None);
        assert_eq!(grid_bits(&v(0.0), 1.0), None);
        assert_eq!(grid_bits(&v(-3.0), 1.0), None);
    }

    #[test]
    fn invalid_viewport_is_not_traced() {
        let f = circle(1.0);
        let mut view =
            Viewport::from_bounds([-2.0, 2.0, -2.0, 2.0, 32.0, 32.0]);
        view.width = f64::NAN;
        let mut scratch = Scratch::default();
        for t in all_tracers() {
            let mut locus = Locus::new();
            let stats = t.trace(&f, &view, &mut scratch, &mut locus);
            assert_eq!(stats.segments, 0, "{t:?}");
            assert!(locus.is_empty(), "{t:?}");
        }
    }

    #[test]
    fn circle_points_are_close() {
        let f = circle(2.0);
        let view = Viewport::from_bounds([-5.0, 5.0, -5.0, 5.0, 50.0, 50.0]);
        let mut scratch = Scratch::default();
        for t in all_tracers() {
            let mut locus = Locus::new();
            let stats = t.trace(&f, &view, &mut scratch, &mut locus);
            assert!(stats.segments > 16, "{t:?}: {stats:?}");
            assert_eq!(stats.segments * 2, locus.len());
            for p in locus.points() {
                let r = p.pos.coords.norm();
                assert!((r - 2.0).abs() < stats.step, "{t:?}: {r}");
            }
        }
    }

    #[test]
    fn constant_is_empty() {
        let view = Viewport::default();
        let mut scratch = Scratch::default();
        for f in [Tree::constant(1.0), Tree::constant(-3.0)] {
            for t in all_tracers() {
                let mut locus = Locus::new();
                locus.push_segment([Point2::origin(), Point2::new(1.0, 1.0)]);
                t.trace(&f, &view, &mut scratch, &mut locus);
                assert!(locus.is_empty(), "{t:?}");
            }
        }
    }

    #[test]
    fn nan_is_empty() {
        let f = Tree::constant(-1.0).sqrt() + Tree::x();
        let view = Viewport::default();
        let mut scratch = Scratch::default();
        for t in all_tracers() {
            let mut locus = Locus::new();
            t.trace(&f, &view, &mut scratch, &mut locus);
            assert!(locus.is_empty(), "{t:?}");
        }
    }

    #[test]
    fn tiny_viewport() {
        let f = circle(0.5);
        let view = Viewport::from_bounds([-1.0, 1.0, -1.0, 1.0, 0.5, 0.5]);
        let mut scratch = Scratch::default();
        for t in all_tracers() {
            let mut locus = Locus::new();
            let stats = t.trace(&f, &view, &mut scratch, &mut locus);
            assert!(stats.plot_depth >= 1, "{t:?}");
        }
    }

    #[test]
    fn scratch_is_reused() {
        let view = Viewport::from_bounds([-5.0, 5.0, -5.0, 5.0, 50.0, 50.0]);
        let mut scratch = Scratch::default();
        let t = TracerKind::default();

        let mut first = Locus::new();
        t.trace(&circle(2.0), &view, &mut scratch, &mut first);
        let mut other = Locus::new();
        t.trace(&circle(3.0), &view, &mut scratch, &mut other);
        let mut second = Locus::new();
        t.trace(&circle(2.0), &view, &mut scratch, &mut second);
        assert_eq!(first, second);
    }
}
