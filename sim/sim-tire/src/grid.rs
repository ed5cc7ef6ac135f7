//! Fixed-size toroidal × poloidal probe storage.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Dense grid of per-probe state, indexed `toroidal * poloidal_density + poloidal`.
///
/// The toroidal axis is periodic (the tire is a ring), the poloidal axis is
/// not (it runs from one tread edge to the other). Neighbor lookups wrap and
/// clamp accordingly.
///
/// # Example
///
/// ```
/// use sim_tire::ProbeGrid;
///
/// let mut grid: ProbeGrid<u32> = ProbeGrid::new(4, 3);
/// *grid.get_mut(1, 2).unwrap() = 7;
///
/// assert_eq!(grid.index(1, 2), 5);
/// assert_eq!(*grid.wrapped(5, 2), 7); // toroidal 5 wraps to 1
/// assert_eq!(*grid.wrapped(1, 9), 7); // poloidal 9 clamps to 2
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProbeGrid<T> {
    toroidal: usize,
    poloidal: usize,
    cells: Vec<T>,
}

impl<T: Default> ProbeGrid<T> {
    /// Allocate a grid filled with default cells.
    ///
    /// Zero dimensions are raised to one so every accessor stays in range.
    #[must_use]
    pub fn new(toroidal: usize, poloidal: usize) -> Self {
        let toroidal = toroidal.max(1);
        let poloidal = poloidal.max(1);
        let mut cells = Vec::with_capacity(toroidal * poloidal);
        cells.resize_with(toroidal * poloidal, T::default);
        Self {
            toroidal,
            poloidal,
            cells,
        }
    }

    /// Reset every cell to its default.
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = T::default());
    }
}

impl<T> ProbeGrid<T> {
    /// Number of toroidal rings.
    #[inline]
    #[must_use]
    pub fn toroidal_density(&self) -> usize {
        self.toroidal
    }

    /// Number of probes per ring.
    #[inline]
    #[must_use]
    pub fn poloidal_density(&self) -> usize {
        self.poloidal
    }

    /// Total number of probes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; grids hold at least one probe.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index of `(toroidal, poloidal)`.
    #[inline]
    #[must_use]
    pub fn index(&self, toroidal: usize, poloidal: usize) -> usize {
        toroidal * self.poloidal + poloidal
    }

    /// Cell at `(toroidal, poloidal)`, `None` when out of range.
    #[must_use]
    pub fn get(&self, toroidal: usize, poloidal: usize) -> Option<&T> {
        if toroidal < self.toroidal && poloidal < self.poloidal {
            self.cells.get(self.index(toroidal, poloidal))
        } else {
            None
        }
    }

    /// Mutable cell at `(toroidal, poloidal)`, `None` when out of range.
    pub fn get_mut(&mut self, toroidal: usize, poloidal: usize) -> Option<&mut T> {
        if toroidal < self.toroidal && poloidal < self.poloidal {
            let index = self.index(toroidal, poloidal);
            self.cells.get_mut(index)
        } else {
            None
        }
    }

    /// Cell with the toroidal index wrapped and the poloidal index clamped.
    #[must_use]
    pub fn wrapped(&self, toroidal: isize, poloidal: isize) -> &T {
        let (t, p) = self.wrap(toroidal, poloidal);
        &self.cells[self.index(t, p)]
    }

    /// Wrap a toroidal index and clamp a poloidal one into range.
    #[must_use]
    pub fn wrap(&self, toroidal: isize, poloidal: isize) -> (usize, usize) {
        // Dimensions are at least 1 and far below isize::MAX
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let t = toroidal.rem_euclid(self.toroidal as isize) as usize;
        #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
        let p = poloidal.clamp(0, self.poloidal as isize - 1) as usize;
        (t, p)
    }

    /// Iterate over cells in index order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }

    /// Iterate mutably over cells in index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.cells.iter_mut()
    }

    /// Iterate over `(toroidal, poloidal, cell)`.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (usize, usize, &T)> {
        let poloidal = self.poloidal;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (i / poloidal, i % poloidal, cell))
    }

    /// Cells of one toroidal ring, mutably.
    pub fn ring_mut(&mut self, toroidal: usize) -> &mut [T] {
        let start = (toroidal % self.toroidal) * self.poloidal;
        &mut self.cells[start..start + self.poloidal]
    }

    /// All cells in index order.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }
}
