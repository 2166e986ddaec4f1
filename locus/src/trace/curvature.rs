use super::{
    Grid, Locus, Scratch, TraceStats, Tracer, Viewport,
    cell::{self, Cell, Corners},
    emit, grid_bits,
};
use crate::eval::Function;
use serde::{Deserialize, Serialize};

/// Quadtree tracer which stops subdividing where the curve is nearly straight
///
/// A crossing cell is plotted once its depth reaches the minimum plot depth
/// and the radius of curvature at its center exceeds `factor` half-cells.
/// Functions without derivatives always subdivide to the full plot depth.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvatureTracer {
    /// Upper bound on the search depth
    pub max_search: usize,
    /// Leaf cells are at least this many pixels on a side
    pub min_grid: usize,
    /// Coarse cells are at most this many pixels on a side
    pub max_grid: usize,
    /// Radius of curvature, in half-cells, above which a cell is plotted
    pub factor: f64,
}

impl Default for CurvatureTracer {
    fn default() -> Self {
        Self {
            max_search: 32,
            min_grid: 4,
            max_grid: 64,
            factor: 8.0,
        }
    }
}

impl Tracer for CurvatureTracer {
    fn trace(
        &self,
        f: &dyn Function,
        view: &Viewport,
        _scratch: &mut Scratch,
        out: &mut Locus,
    ) -> TraceStats {
        out.clear();
        let Some(hbits) = grid_bits(view, 1.0) else {
            return TraceStats::default();
        };
        let plot = (hbits / self.min_grid.max(1)).max(1);
        let search = (hbits / self.max_grid.max(1)).min(self.max_search);
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
            min_plot: (search << 2).min(plot),
            factor: self.factor,
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
    min_plot: usize,
    factor: f64,
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
        if (depth >= self.min_plot && self.can_plot(&cell))
            || depth >= self.grid.plot
        {
            let corners = Corners::sample(self.f, &cell);
            emit(self.f, &cell, &corners, self.out, &mut self.stats);
        } else {
            self.subdivide(sx, sy, depth << 1);
        }
    }

    /// Checks whether the curve is flat enough to plot this cell
    fn can_plot(&self, cell: &Cell) -> bool {
        let c = cell.center();
        let half = (cell.x2 - cell.x1) * 0.5;
        let (Some(g), Some(h)) =
            (self.f.grad(c.x, c.y), self.f.hessian(c.x, c.y))
        else {
            return false;
        };
        // NaN radii fail the comparison
        h.radius(&g).abs() > self.factor * half
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        context::Tree,
        eval::ScalarField,
        trace::{TracerKind, UniformTracer},
    };

    fn trace(t: impl Tracer, f: &dyn Function) -> (TraceStats, Locus) {
        let view = Viewport::from_bounds([-8.0, 8.0, -8.0, 8.0, 64.0, 64.0]);
        let mut locus = Locus::new();
        let stats = t.trace(f, &view, &mut Scratch::default(), &mut locus);
        (stats, locus)
    }

    #[test]
    fn depths() {
        let (stats, _) = trace(CurvatureTracer::default(), &Tree::x());
        // 1024 px rounds up to 2048
        assert_eq!(stats.plot_depth, 512);
        assert_eq!(stats.search_depth, 32);
    }

    #[test]
    fn straight_lines_use_fewer_cells() {
        let f = ScalarField::new(Tree::x() + Tree::y() * 0.5 - 1.0);
        let (coarse, locus) = trace(CurvatureTracer::default(), &f);
        assert!(!locus.is_empty());

        // Without derivatives, every crossing cell goes to full depth
        let (fine, _) = trace(CurvatureTracer::default(), f.tree());
        assert!(coarse.segments < fine.segments);
        assert!(coarse.cells < fine.cells);
    }

    #[test]
    fn circle_agrees_with_uniform() {
        let f = ScalarField::new(Tree::x().square() + Tree::y().square() - 9.0);
        let (_, curv) = trace(TracerKind::Curvature(Default::default()), &f);
        let (_, unif) = trace(UniformTracer::default(), &f);
        for locus in [curv, unif] {
            assert!(!locus.is_empty());
            for p in locus.points() {
                assert!((p.pos.coords.norm() - 3.0).abs() < 0.05);
            }
        }
    }
}
