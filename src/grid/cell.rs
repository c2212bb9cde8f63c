use std::fmt;

use tracing::warn;

/// A single address in the square lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub x: usize,
    pub y: usize,
}

impl Cell {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Boolean existence map over a `size x size` lattice.
///
/// Existence decides connectivity; occupancy only guards component
/// placement at load time. Both maps are stored row-major.
#[derive(Debug, Clone)]
pub struct CellGrid {
    size: usize,
    exists: Vec<bool>,
    occupied: Vec<bool>,
}

impl CellGrid {
    /// Creates a grid where no cell exists yet.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "grid size must be > 0");
        Self {
            size,
            exists: vec![false; size * size],
            occupied: vec![false; size * size],
        }
    }

    /// Side length of the lattice.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Converts signed coordinates into a cell when they lie inside the grid.
    pub fn cell(&self, x: i64, y: i64) -> Option<Cell> {
        let size = self.size as i64;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            Some(Cell::new(x as usize, y as usize))
        } else {
            None
        }
    }

    /// Returns `true` when `cell` lies inside the grid.
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x < self.size && cell.y < self.size
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.contains(cell).then(|| cell.y * self.size + cell.x)
    }

    /// Returns `true` when the cell is inside the grid and switched on.
    pub fn exists(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.exists[i])
    }

    /// Sets existence of an in-bounds cell. Out-of-bounds cells are ignored.
    pub fn set_exists(&mut self, cell: Cell, exists: bool) {
        if let Some(i) = self.index(cell) {
            self.exists[i] = exists;
        }
    }

    /// Flips existence of an in-bounds cell and returns the new state.
    pub fn toggle(&mut self, cell: Cell) -> Option<bool> {
        let i = self.index(cell)?;
        self.exists[i] = !self.exists[i];
        Some(self.exists[i])
    }

    pub fn is_occupied(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.occupied[i])
    }

    pub(crate) fn mark_occupied(&mut self, cell: Cell) {
        if let Some(i) = self.index(cell) {
            self.occupied[i] = true;
        }
    }

    /// Marks every cell of the inclusive rectangle spanned by two corners
    /// as existing.
    ///
    /// Only the part of the rectangle overlapping the grid is visited, so
    /// far-off corners cost nothing extra. A region that overflows the grid
    /// logs one warning and the overlap is still applied. Returns the number
    /// of skipped cells, saturating at `usize::MAX`.
    pub fn mark_region(&mut self, a: (i64, i64), b: (i64, i64)) -> usize {
        let (x0, x1) = (a.0.min(b.0), a.0.max(b.0));
        let (y0, y1) = (a.1.min(b.1), a.1.max(b.1));
        let total = span(x0, x1).saturating_mul(span(y0, y1));

        let last = self.size as i64 - 1;
        let (cx0, cx1) = (x0.max(0), x1.min(last));
        let (cy0, cy1) = (y0.max(0), y1.min(last));
        let mut inside = 0;
        if cx0 <= cx1 && cy0 <= cy1 {
            for y in cy0..=cy1 {
                for x in cx0..=cx1 {
                    self.set_exists(Cell::new(x as usize, y as usize), true);
                }
            }
            inside = span(cx0, cx1) * span(cy0, cy1);
        }

        let skipped = usize::try_from(total - inside).unwrap_or(usize::MAX);
        if skipped > 0 {
            warn!(
                x0,
                y0,
                x1,
                y1,
                size = self.size,
                skipped,
                "region overflows the grid, outside cells skipped"
            );
        }
        skipped
    }

    /// Iterates all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.size).flat_map(move |y| (0..self.size).map(move |x| Cell::new(x, y)))
    }

    /// Iterates existing cells in row-major order.
    pub fn existing_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells().filter(|c| self.exists(*c))
    }
}

/// Number of integers in `lo..=hi`.
fn span(lo: i64, hi: i64) -> u128 {
    (i128::from(hi) - i128::from(lo) + 1) as u128
}
