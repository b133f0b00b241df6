//! Coordinate arithmetic on an `N x N` torus.
//!
//! Both axes wrap independently, so the last row is adjacent to the first and the last column
//! to the first column. Everything here is a pure function of the grid size; the grid owns no
//! agents.
//!
//! Sets of positions are returned as [`IndexSet`]s: membership tests are cheap and iteration
//! order is the order cells were generated in, which keeps seeded runs reproducible when a
//! cell is later drawn at random from the set.

use std::fmt::{self, Display};

use indexmap::IndexSet;

use crate::error::SimulationError;

/// The Chebyshev radius scanned for agents that could interact with a mover within one step.
/// A move shifts an agent by at most one cell per axis and the exclusion zone of a distancing
/// agent reaches one further cell, so anything farther than three cells cannot matter.
pub const SEARCH_RADIUS: usize = 3;

/// A cell on the grid. Both coordinates lie in `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    #[must_use]
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Position { x, y }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Adds `delta` to `coordinate` and folds the result back into `[0, size)`.
///
/// Negative intermediate results wrap around from the top, results `>= size` wrap around from
/// the bottom, and deltas larger than the grid are handled too.
#[must_use]
pub fn wrap(coordinate: usize, delta: isize, size: usize) -> usize {
    debug_assert!(size > 0, "cannot wrap on an empty grid");
    let size = size as isize;
    (coordinate as isize + delta).rem_euclid(size) as usize
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    size: usize,
}

impl Grid {
    /// Creates an `size x size` torus.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if `size` is zero or the number of cells
    /// does not fit in a `usize`.
    pub fn new(size: usize) -> Result<Self, SimulationError> {
        if size == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "grid size must be at least 1".to_string(),
            ));
        }
        if size.checked_mul(size).is_none() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "a {size} x {size} grid has too many cells"
            )));
        }
        Ok(Grid { size })
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of cells on the grid. Cannot overflow, [`Grid::new`] rejects such sizes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.size * self.size
    }

    /// Checks that `population` agents fit on the grid, one per cell.
    ///
    /// # Errors
    ///
    /// Returns `SimulationError::InvalidConfiguration` if the grid has fewer cells than agents.
    pub fn ensure_capacity(&self, population: usize) -> Result<(), SimulationError> {
        if population > self.capacity() {
            return Err(SimulationError::InvalidConfiguration(format!(
                "{n} x {n} grid cannot hold {population} agents",
                n = self.size
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, position: Position) -> bool {
        position.x < self.size && position.y < self.size
    }

    /// Moves `position` by `(dx, dy)`, wrapping each axis.
    #[must_use]
    pub fn offset(&self, position: Position, dx: isize, dy: isize) -> Position {
        Position {
            x: wrap(position.x, dx, self.size),
            y: wrap(position.y, dy, self.size),
        }
    }

    /// All cells, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.size).flat_map(move |x| (0..self.size).map(move |y| Position { x, y }))
    }

    /// The (at most) eight cells touching `position` orthogonally or diagonally.
    ///
    /// On grids smaller than 3x3 several offsets land on the same cell and the set shrinks; on
    /// a 1x1 grid it is empty.
    #[must_use]
    pub fn adjacent(&self, position: Position) -> IndexSet<Position> {
        self.search_space(position, 1)
    }

    /// Every cell within Chebyshev distance `radius` of `position`, excluding `position`
    /// itself.
    #[must_use]
    pub fn search_space(&self, position: Position, radius: usize) -> IndexSet<Position> {
        let radius = radius as isize;
        let mut cells = IndexSet::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                if dx == 0 && dy == 0 {
                    continue;
                }
                cells.insert(self.offset(position, dx, dy));
            }
        }
        // Large radii on small grids wrap back onto the center.
        cells.shift_remove(&position);
        cells
    }

    /// Distance along one axis, taking the shorter way around.
    fn axis_distance(&self, a: usize, b: usize) -> usize {
        let d = a.abs_diff(b);
        d.min(self.size - d)
    }

    /// Chebyshev distance on the torus.
    #[must_use]
    pub fn distance(&self, a: Position, b: Position) -> usize {
        self.axis_distance(a.x, b.x).max(self.axis_distance(a.y, b.y))
    }

    /// True when `b` is one of the eight neighbors of `a`.
    #[must_use]
    pub fn is_adjacent(&self, a: Position, b: Position) -> bool {
        self.distance(a, b) == 1
    }
}
