//! Search, flood and plot tracer
//!
//! Tracing happens in three steps:
//!
//! - **Search**: a coarse lattice is sampled and every coarse cell with a
//!   crossed edge is flagged.
//! - **Plot**: each flagged cell is sampled on a finer grid, and sub-cells
//!   with crossings are subdivided down to the plot depth, caching function
//!   values as they are needed.
//! - **Flood**: whenever an emitted leaf crosses the boundary of its coarse
//!   cell, the neighbour on the other side is flagged too.  This finds parts
//!   of the curve which the coarse lattice stepped over.
//!
//! Cells found by flooding are plotted in a second pass whose resolution
//! depends on how many of them there are.
use super::{
    Locus, Scratch, TraceStats, Tracer, Viewport,
    cell::{Cell, Corners, edge_config, intersect},
    emit, grid_bits,
};
use crate::eval::Function;
use serde::{Deserialize, Serialize};

/// Tracer which floods outwards from coarse cells known to hold the curve
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloodTracer {
    /// Upper bound on the number of coarse cells per side
    pub max_search: usize,
    /// Leaf cells are at least this many pixels on a side
    pub min_grid: usize,
    /// Coarse cells are at most this many pixels on a side
    pub max_grid: usize,
}

impl Default for FloodTracer {
    fn default() -> Self {
        Self {
            max_search: 32,
            min_grid: 8,
            max_grid: 64,
        }
    }
}

/// Cell counts at or below this get the finest resolution
const SPARSE: usize = 96;
/// Cell counts at or below this get an intermediate resolution
const MODERATE: usize = 192;
/// Upper bound on the sampling resolution of a crowded second pass
const MAX_CHECK: usize = 128;

static_assertions::const_assert!(SPARSE < MODERATE);
static_assertions::const_assert!(MAX_CHECK.is_power_of_two());

/// Rounds down to a power of two, with a minimum of 1
fn floor_pow2(n: usize) -> usize {
    if n <= 1 {
        1
    } else {
        1 << (usize::BITS - 1 - n.leading_zeros())
    }
}

impl Tracer for FloodTracer {
    fn trace(
        &self,
        f: &dyn Function,
        view: &Viewport,
        scratch: &mut Scratch,
        out: &mut Locus,
    ) -> TraceStats {
        out.clear();
        let Some(hbits) = grid_bits(view, 1.0) else {
            return TraceStats::default();
        };
        let search = floor_pow2(
            (hbits / self.max_grid.max(1)).clamp(1, self.max_search.max(1)),
        );
        let mut plot = floor_pow2(hbits / self.min_grid.max(1)).max(search);

        let mut w = Worker {
            f,
            scratch,
            out,
            side: view.side(),
            search,
            plot,
            check: 1,
            ci: 0,
            cj: 0,
            stats: TraceStats {
                search_depth: search,
                ..TraceStats::default()
            },
        };

        let count = w.search(view.origin.x, view.origin.y);
        if count <= SPARSE {
            plot <<= 2;
        } else if count <= MODERATE {
            plot <<= 1;
        }
        w.set_depth(plot, (search << 2).min(plot));
        w.flood(false);

        let found = w.scratch.found.len();
        if found > 0 {
            log::debug!("flood found {found} more cells");
            if found <= SPARSE {
                w.set_depth(search << 4, search << 4);
            } else if found <= MODERATE {
                w.set_depth(search << 4, search << 3);
            } else {
                w.set_depth(plot, MAX_CHECK.min(plot).max(search));
            }
            std::mem::swap(&mut w.scratch.stack, &mut w.scratch.found);
            w.flood(true);
        }
        w.stats
    }
}

struct Worker<'a> {
    f: &'a dyn Function,
    scratch: &'a mut Scratch,
    out: &'a mut Locus,

    /// Side of the traced square
    side: f64,
    /// Coarse cells per side
    search: usize,
    /// Leaf cells per side
    plot: usize,
    /// Sub-cells per side sampled before subdividing
    check: usize,

    /// Row and column of the coarse cell being plotted
    ci: usize,
    cj: usize,

    stats: TraceStats,
}

impl Worker<'_> {
    fn set_depth(&mut self, plot: usize, check: usize) {
        self.plot = plot;
        self.check = check;
        self.stats.plot_depth = plot;
        self.stats.step = self.side / plot as f64;
    }

    /// Samples the coarse lattice, queueing every cell with a crossed edge
    ///
    /// Returns the number of queued cells.
    fn search(&mut self, x: f64, y: f64) -> usize {
        let n = self.search;
        let s = &mut *self.scratch;
        s.reset_coarse(n);
        let frac = self.side / n as f64;
        for i in 0..=n {
            s.lattice_x.push(x + i as f64 * frac);
            s.lattice_y.push(y + i as f64 * frac);
        }
        let f = self.f;
        s.row.extend(s.lattice_x.iter().map(|&lx| f.eval(lx, y)));

        for i in 1..=n {
            let mut prev = f.eval(s.lattice_x[0], s.lattice_y[i]);
            for j in 1..=n {
                let cur = f.eval(s.lattice_x[j], s.lattice_y[i]);
                let c = Corners::new(s.row[j - 1], s.row[j], cur, prev);
                let idx = s.cell_index(i, j);
                s.grid[idx] = edge_config(&c);
                s.mark[idx] = 0;
                if s.grid[idx] != 0 {
                    s.mark[idx] = 1;
                    s.stack.push((i, j));
                }
                s.row[j - 1] = prev;
                prev = cur;
            }
            s.row[n] = prev;
        }
        self.stats.cells += n * n;
        s.stack.len()
    }

    /// Plots queued cells until the stack is empty
    ///
    /// Newly flagged neighbours go back on the stack during the second pass,
    /// and are set aside for it during the first.
    fn flood(&mut self, second: bool) {
        while let Some((i, j)) = self.scratch.stack.pop() {
            let idx = self.scratch.cell_index(i, j);
            self.scratch.mark[idx] = 2;
            self.plot_cell(i, j);
            for (ni, nj) in [(i - 1, j), (i + 1, j), (i, j - 1), (i, j + 1)] {
                let n = self.scratch.cell_index(ni, nj);
                if self.scratch.mark[n] == 0 && self.scratch.grid[n] != 0 {
                    self.scratch.mark[n] = 1;
                    if second {
                        self.scratch.stack.push((ni, nj));
                    } else {
                        self.scratch.found.push((ni, nj));
                    }
                }
            }
        }
    }

    /// Plots a single coarse cell
    fn plot_cell(&mut self, i: usize, j: usize) {
        let size = self.plot / self.search;
        let inc = self.plot / self.check;
        self.ci = i;
        self.cj = j;

        let s = &mut *self.scratch;
        s.reset_fine(size);
        let (x1, y1) = (s.lattice_x[j - 1], s.lattice_y[i - 1]);
        let fr = (s.lattice_x[j] - x1) / size as f64;
        for k in 0..size {
            s.coord_x[k] = x1 + k as f64 * fr;
            s.coord_y[k] = y1 + k as f64 * fr;
        }
        // Share exact coordinates with the neighbouring cells
        s.coord_x[size] = s.lattice_x[j];
        s.coord_y[size] = s.lattice_y[i];

        for k in (0..=size).step_by(inc) {
            self.sample(k, 0);
        }
        let mut pi = 0;
        for ii in (inc..=size).step_by(inc) {
            self.sample(0, ii);
            let mut pj = 0;
            for jj in (inc..=size).step_by(inc) {
                let c = Corners::new(
                    self.sample(pj, pi),
                    self.sample(jj, pi),
                    self.sample(jj, ii),
                    self.sample(pj, ii),
                );
                self.stats.cells += 1;
                if edge_config(&c) != 0 {
                    self.plot_sub(pj, pi, self.check);
                }
                pj = jj;
            }
            pi = ii;
        }
    }

    /// Returns the (cached) function value at a fine grid position
    fn sample(&mut self, x: usize, y: usize) -> f64 {
        let s = &mut *self.scratch;
        let idx = s.fine_index(y, x);
        if !s.status[idx] {
            s.status[idx] = true;
            s.rect[idx] = self.f.eval(s.coord_x[x], s.coord_y[y]);
        }
        s.rect[idx]
    }

    /// Recursively plots a sub-cell of the current coarse cell
    fn plot_sub(&mut self, sx: usize, sy: usize, depth: usize) {
        let frac = self.plot / depth;
        let (ex, ey) = (sx + frac, sy + frac);
        let c = Corners::new(
            self.sample(sx, sy),
            self.sample(ex, sy),
            self.sample(ex, ey),
            self.sample(sx, ey),
        );
        self.stats.cells += 1;
        if edge_config(&c) == 0 {
            return;
        }
        if depth < self.plot {
            let half = frac / 2;
            let d = depth << 1;
            self.plot_sub(sx, sy, d);
            self.plot_sub(sx | half, sy, d);
            self.plot_sub(sx | half, sy | half, d);
            self.plot_sub(sx, sy | half, d);
            return;
        }

        let s = &*self.scratch;
        let (x, y) = (&s.coord_x, &s.coord_y);
        let cell = Cell::new(x[sx], y[sy], x[ex], y[ey]);
        emit(self.f, &cell, &c, self.out, &mut self.stats);

        // Flag neighbouring coarse cells across crossed boundary edges
        let size = self.plot / self.search;
        let (i, j) = (self.ci, self.cj);
        let s = &mut *self.scratch;
        let mut flag = |ni: usize, nj: usize, v: u8| {
            let idx = s.cell_index(ni, nj);
            s.grid[idx] |= v;
        };
        if sx == 0 {
            flag(i, j - 1, intersect(c.tl, c.bl));
        }
        if ex == size {
            flag(i, j + 1, intersect(c.tr, c.br));
        }
        if sy == 0 {
            flag(i - 1, j, intersect(c.tl, c.tr));
        }
        if ey == size {
            flag(i + 1, j, intersect(c.bl, c.br));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::context::Tree;
    use nalgebra::Point2;

    fn view() -> Viewport {
        Viewport::from_bounds([-8.0, 8.0, -8.0, 8.0, 64.0, 64.0])
    }

    #[test]
    fn powers() {
        assert_eq!(floor_pow2(0), 1);
        assert_eq!(floor_pow2(1), 1);
        assert_eq!(floor_pow2(5), 4);
        assert_eq!(floor_pow2(64), 64);
    }

    #[test]
    fn sparse_curve_depths() {
        let f = Tree::x() - 0.3;
        let mut locus = Locus::new();
        let stats = FloodTracer::default().trace(
            &f,
            &view(),
            &mut Scratch::default(),
            &mut locus,
        );
        // 1024 px rounds up to 2048; few coarse cells, so 4x the plot depth
        assert_eq!(stats.search_depth, 32);
        assert_eq!(stats.plot_depth, 1024);
        assert_eq!(stats.step, 16.0 / 1024.0);
    }

    #[test]
    fn closed_curve_is_connected() {
        let f = Tree::x().square() + Tree::y().square() - 9.0;
        let mut locus = Locus::new();
        FloodTracer::default().trace(
            &f,
            &view(),
            &mut Scratch::default(),
            &mut locus,
        );
        let pts: Vec<Point2<f64>> =
            locus.points().iter().map(|p| p.pos).collect();
        assert!(pts.len() > 100);
        let matched = pts
            .iter()
            .enumerate()
            .filter(|(i, p)| {
                pts.iter()
                    .enumerate()
                    .any(|(j, q)| *i != j && (*p - q).norm() < 1e-9)
            })
            .count();
        assert!(matched * 10 >= pts.len() * 9, "{matched} / {}", pts.len());
    }

    #[test]
    fn flood_finds_missed_bump() {
        // A bump which pokes through the lattice edge from (0, 0) to (0.5, 0)
        // without changing sign at either lattice point
        let x = Tree::x() - 0.25;
        let f = Tree::y() - 0.1 + x.square() * 8.0;
        assert!(f.eval(0.0, 0.0) > 0.0 && f.eval(0.5, 0.0) > 0.0);
        assert!(f.eval(0.0, 0.5) > 0.0 && f.eval(0.5, 0.5) > 0.0);

        let mut locus = Locus::new();
        FloodTracer::default().trace(
            &f,
            &view(),
            &mut Scratch::default(),
            &mut locus,
        );
        let above = locus
            .points()
            .iter()
            .filter(|p| p.pos.y > 0.01 && (0.0..=0.5).contains(&p.pos.x))
            .count();
        assert!(above > 0);
    }

    #[test]
    fn crowded_curve() {
        // Many parallel lines mark most coarse cells
        let f = (Tree::x() * 6.0).sin();
        let mut locus = Locus::new();
        let stats = FloodTracer::default().trace(
            &f,
            &view(),
            &mut Scratch::default(),
            &mut locus,
        );
        assert_eq!(stats.plot_depth, 256);
        assert!(stats.segments > 1000);
    }
}
