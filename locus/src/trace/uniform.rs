use super::{
    Grid, Locus, Scratch, TraceStats, Tracer, Viewport,
    cell::{self, Corners},
    emit, grid_bits,
};
use crate::eval::Function;
use serde::{Deserialize, Serialize};

/// Quadtree tracer which plots every crossing cell at the same depth
///
/// The region is subdivided without checks down to the search depth, then
/// cells which may contain the curve are subdivided down to the plot depth.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UniformTracer {
    /// Upper bound on the plot depth
    pub max_plot: usize,
    /// Upper bound on the search depth
    pub max_search: usize,
}

impl Default for UniformTracer {
    fn default() -> Self {
        Self {
            max_plot: 256,
            max_search: 64,
        }
    }
}

/// Leaf cells are at least this many pixels on a side
const MIN_GRID_PIXELS: f64 = 8.0;

impl Tracer for UniformTracer {
    fn trace(
        &self,
        f: &dyn Function,
        view: &Viewport,
        _scratch: &mut Scratch,
        out: &mut Locus,
    ) -> TraceStats {
        out.clear();
        let Some(hbits) = grid_bits(view, 1.0 / MIN_GRID_PIXELS) else {
            return TraceStats::default();
        };
        let plot = hbits.min(self.max_plot).max(1);
        let search = (hbits >> 2).min(self.max_search);
        let grid = Grid {
            x: view.origin.x,
            y: view.origin.y,
            step: view.side() / plot as f64,
            plot,
        };
        let mut worker = Worker {
            f,
            grid: &grid,
            search,
            out,
            stats: TraceStats {
                plot_depth: plot,
                search_depth: search,
                step: grid.step,
                ..TraceStats::default()
            },
        };
        worker.create_tree(0, 0, 1);
        worker.stats
    }
}

struct Worker<'a> {
    f: &'a dyn Function,
    grid: &'a Grid,
    search: usize,
    out: &'a mut Locus,
    stats: TraceStats,
}

impl Worker<'_> {
    fn subdivide(&mut self, sx: usize, sy: usize, depth: usize) {
        let frac = self.grid.plot / depth;
        self.create_tree(sx, sy, depth);
        self.create_tree(sx | frac, sy, depth);
        self.create_tree(sx | frac, sy | frac, depth);
        self.create_tree(sx, sy | frac, depth);
    }

    fn create_tree(&mut self, sx: usize, sy: usize, depth: usize) {
        if depth < self.search {
            self.subdivide(sx, sy, depth << 1);
            return;
        }
        let cell = self.grid.cell(sx, sy, depth);
        self.stats.cells += 1;
        if !cell::has_segment(self.f, &cell) {
            return;
        }
        if depth < self.grid.plot {
            self.subdivide(sx, sy, depth << 1);
        } else {
            let corners = Corners::sample(self.f, &cell);
            emit(self.f, &cell, &corners, self.out, &mut self.stats);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;

    #[test]
    fn depths() {
        let view = Viewport::from_bounds([0.0, 10.0, 0.0, 5.0, 100.0, 100.0]);
        let mut locus = Locus::new();
        let stats = UniformTracer::default().trace(
            &Tree::x(),
            &view,
            &mut Scratch::default(),
            &mut locus,
        );
        // 1000 px / 8 + 1 rounds up to 128
        assert_eq!(stats.plot_depth, 128);
        assert_eq!(stats.search_depth, 32);
        assert_eq!(stats.step, 10.0 / 128.0);
    }

    #[test]
    fn line_is_continuous() {
        // Diagonal line through the square; every leaf column has a segment
        let f = Tree::y() - Tree::x() - 0.01;
        let view = Viewport::from_bounds([0.0, 8.0, 0.0, 8.0, 8.0, 8.0]);
        let mut locus = Locus::new();
        let stats = UniformTracer::default().trace(
            &f,
            &view,
            &mut Scratch::default(),
            &mut locus,
        );
        assert_eq!(stats.plot_depth, 16);
        assert!(stats.segments >= 16);
        for [a, b] in locus.segments() {
            assert!((a.y - a.x - 0.01).abs() < 1e-9);
            assert!((b.y - b.x - 0.01).abs() < 1e-9);
        }
    }
}
