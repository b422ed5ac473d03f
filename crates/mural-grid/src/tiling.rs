//! The tile grid state machine.
//!
//! Cells are stored in a row-major [`VecDeque`]: index `i` sits at row
//! `i / C`, column `i % C`. Coordinates are never stored, so evicting the
//! front `C` entries renumbers every surviving cell (row - 1, same column)
//! in the same step, and the grid can never contain holes.
//!
//! ```text
//! C = 3, R = 2, full:        insert G:
//!   row 1:  D E F              row 1:  G
//!   row 0:  A B C   (oldest)   row 0:  D E F     evicted: A B C
//! ```

use std::collections::VecDeque;

use mural_types::{CellCoord, ImageId, ImageRecord, TilingParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::GridError;

/// Validated grid dimensions: `C` columns by at most `R` rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    num_columns: u32,
    max_num_rows: u32,
    columns: usize,
    capacity: usize,
}

impl GridDimensions {
    /// Validate dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::InvalidDimensions`] if either dimension is zero
    /// or `C * R` overflows.
    pub fn new(num_columns: u32, max_num_rows: u32) -> Result<Self, GridError> {
        let invalid = GridError::InvalidDimensions {
            num_columns,
            max_num_rows,
        };
        if num_columns == 0 || max_num_rows == 0 {
            return Err(invalid);
        }
        // Capacity must also fit in u32 so occupancy can be reported on the wire.
        let capacity = num_columns
            .checked_mul(max_num_rows)
            .and_then(|c| usize::try_from(c).ok());
        let columns = usize::try_from(num_columns).ok();
        match (capacity, columns) {
            (Some(capacity), Some(columns)) => Ok(Self {
                num_columns,
                max_num_rows,
                columns,
                capacity,
            }),
            _ => Err(invalid),
        }
    }

    /// Column count `C`.
    pub const fn num_columns(&self) -> u32 {
        self.num_columns
    }

    /// Maximum row count `R`.
    pub const fn max_num_rows(&self) -> u32 {
        self.max_num_rows
    }

    /// Maximum number of occupied cells, `C * R`.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Coordinate of the cell at row-major `index`.
    fn coord_of(self, index: usize) -> CellCoord {
        let row = index.checked_div(self.columns).unwrap_or(0);
        let column = index.checked_rem(self.columns).unwrap_or(0);
        CellCoord::new(to_u32(row), to_u32(column))
    }

    /// Row-major index of `coord`, `None` if it lies outside the grid.
    fn index_of(self, coord: CellCoord) -> Option<usize> {
        if coord.column >= self.num_columns || coord.row >= self.max_num_rows {
            return None;
        }
        let row = usize::try_from(coord.row).ok()?;
        let column = usize::try_from(coord.column).ok()?;
        row.checked_mul(self.columns)?.checked_add(column)
    }
}

/// Lifecycle phase of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridPhase {
    /// No cells occupied.
    Empty,
    /// Some, but fewer than `C * R`, cells occupied.
    Filling,
    /// Every cell occupied; the next insert evicts the oldest row.
    Full,
}

/// The oldest row, removed to make room for a new image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictedRow {
    /// Evicted records with the coordinates they held before eviction.
    pub cells: Vec<(CellCoord, ImageRecord)>,
}

impl EvictedRow {
    /// Former coordinates of the evicted cells.
    pub fn coords(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.cells.iter().map(|(coord, _)| *coord)
    }

    /// Number of evicted cells (always `C`).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether nothing was evicted.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Result of [`TileGrid::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Insertion {
    /// Coordinate of the new cell, after any eviction.
    pub cell: CellCoord,
    /// The evicted row, if the grid was full.
    pub evicted: Option<EvictedRow>,
}

/// Bounded row-scrolling grid of image records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    dims: GridDimensions,
    cells: VecDeque<ImageRecord>,
}

impl TileGrid {
    /// Create an empty grid.
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            dims,
            cells: VecDeque::with_capacity(dims.capacity()),
        }
    }

    /// Place `records` (oldest first) row-major into a fresh grid.
    ///
    /// At most `C * R` records are kept; if more are supplied the oldest
    /// overflow is dropped so the newest images survive.
    pub fn bootstrap(dims: GridDimensions, records: impl IntoIterator<Item = ImageRecord>) -> Self {
        let mut cells: VecDeque<ImageRecord> = records.into_iter().collect();
        let overflow = cells.len().saturating_sub(dims.capacity());
        if overflow > 0 {
            debug!(overflow, capacity = dims.capacity(), "Dropping oldest bootstrap records");
            cells.drain(..overflow);
        }
        Self { dims, cells }
    }

    /// Append `record` at the next row-major position.
    ///
    /// When the grid is full, the whole of row 0 is evicted first and every
    /// remaining cell moves up one row. Exactly one full row is evicted even
    /// though only one cell is needed.
    ///
    /// Ids are not unique. Resubmitting an id overwrites its files on disk
    /// and takes a new cell; any earlier cell with that id stays where it
    /// is, showing the new files, until its row is evicted.
    pub fn insert(&mut self, record: ImageRecord) -> Insertion {
        let evicted = if self.cells.len() >= self.dims.capacity() {
            Some(self.evict_oldest_row())
        } else {
            None
        };
        let index = self.cells.len();
        debug!(image_id = %record.id, index, evicted = evicted.is_some(), "Inserting grid cell");
        self.cells.push_back(record);
        Insertion {
            cell: self.dims.coord_of(index),
            evicted,
        }
    }

    fn evict_oldest_row(&mut self) -> EvictedRow {
        let dims = self.dims;
        let count = dims.columns.min(self.cells.len());
        let cells = self
            .cells
            .drain(..count)
            .enumerate()
            .map(|(index, record)| (dims.coord_of(index), record))
            .collect();
        EvictedRow { cells }
    }

    /// The record at (`row`, `column`), `None` if the cell is empty or
    /// outside the grid.
    pub fn get_cell(&self, row: u32, column: u32) -> Option<&ImageRecord> {
        let index = self.dims.index_of(CellCoord::new(row, column))?;
        self.cells.get(index)
    }

    /// Current coordinate of the image with `id`, if it is in the grid.
    ///
    /// When `id` occupies several cells this is the most recent one.
    pub fn position_of(&self, id: &ImageId) -> Option<CellCoord> {
        self.cells
            .iter()
            .rposition(|record| &record.id == id)
            .map(|index| self.dims.coord_of(index))
    }

    /// Occupied cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (CellCoord, &ImageRecord)> + '_ {
        let dims = self.dims;
        self.cells
            .iter()
            .enumerate()
            .map(move |(index, record)| (dims.coord_of(index), record))
    }

    /// File names of the occupied cells in row-major order.
    pub fn image_files(&self) -> Vec<String> {
        self.cells.iter().map(|r| r.file_name.clone()).collect()
    }

    /// Dimensions and occupancy.
    pub fn tiling_params(&self) -> TilingParams {
        let num_rows = self.cells.len().div_ceil(self.dims.columns);
        TilingParams {
            num_columns: self.dims.num_columns(),
            max_num_rows: self.dims.max_num_rows(),
            num_rows: to_u32(num_rows),
            num_images: to_u32(self.cells.len()),
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> GridPhase {
        if self.cells.is_empty() {
            GridPhase::Empty
        } else if self.cells.len() >= self.dims.capacity() {
            GridPhase::Full
        } else {
            GridPhase::Filling
        }
    }

    /// Grid dimensions.
    pub const fn dimensions(&self) -> GridDimensions {
        self.dims
    }

    /// Maximum number of occupied cells.
    pub const fn capacity(&self) -> usize {
        self.dims.capacity()
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether no cell is occupied.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Occupancy and coordinates are bounded by `C * R`, which fits in `u32`.
fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
