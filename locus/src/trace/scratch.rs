/// Reusable working memory for tracers
///
/// The arena is owned by the caller and handed to each trace, which resizes
/// and resets whatever it needs before reading it; nothing carries over from
/// one trace to the next.
#[derive(Clone, Debug, Default)]
pub struct Scratch {
    /// Edge configuration of each coarse cell, with a one-cell border
    pub(super) grid: Vec<u8>,
    /// Coarse cell state: 0 = untouched, 1 = queued, 2 = done or border
    pub(super) mark: Vec<u8>,
    /// Side of the bordered coarse grid
    pub(super) grid_side: usize,

    /// Coarse cells waiting to be plotted
    pub(super) stack: Vec<(usize, usize)>,
    /// Coarse cells discovered while flooding
    pub(super) found: Vec<(usize, usize)>,

    /// Coarse lattice coordinates
    pub(super) lattice_x: Vec<f64>,
    pub(super) lattice_y: Vec<f64>,
    /// One row of lattice samples
    pub(super) row: Vec<f64>,

    /// Cached function values on the fine grid within one coarse cell
    pub(super) rect: Vec<f64>,
    /// Whether each entry of `rect` has been filled
    pub(super) status: Vec<bool>,
    /// Side of the fine grid, in samples
    pub(super) rect_side: usize,
    /// Fine grid coordinates within one coarse cell
    pub(super) coord_x: Vec<f64>,
    pub(super) coord_y: Vec<f64>,
}

impl Scratch {
    /// Resets the coarse grid for `search × search` cells
    pub(super) fn reset_coarse(&mut self, search: usize) {
        let m = search + 2;
        self.grid_side = m;
        self.grid.clear();
        self.grid.resize(m * m, 0);
        self.mark.clear();
        self.mark.resize(m * m, 2);
        self.stack.clear();
        self.found.clear();
        self.lattice_x.clear();
        self.lattice_y.clear();
        self.row.clear();
    }

    /// Resets the fine grid for `size × size` cells (`size + 1` samples)
    pub(super) fn reset_fine(&mut self, size: usize) {
        let n = size + 1;
        self.rect_side = n;
        self.rect.clear();
        self.rect.resize(n * n, 0.0);
        self.status.clear();
        self.status.resize(n * n, false);
        self.coord_x.clear();
        self.coord_x.resize(n, 0.0);
        self.coord_y.clear();
        self.coord_y.resize(n, 0.0);
    }

    /// Index into the coarse grid (row `i`, column `j`)
    #[inline]
    pub(super) fn cell_index(&self, i: usize, j: usize) -> usize {
        i * self.grid_side + j
    }

    /// Index into the fine grid (row `i`, column `j`)
    #[inline]
    pub(super) fn fine_index(&self, i: usize, j: usize) -> usize {
        i * self.rect_side + j
    }
}
