//! Error types for the `mural-grid` crate.
//!
//! Grid transitions are total; only construction can fail.

/// Errors that can occur when configuring a grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    /// Zero columns or rows, or a capacity that does not fit in memory.
    #[error("invalid grid dimensions: {num_columns} columns x {max_num_rows} rows")]
    InvalidDimensions {
        /// Requested column count.
        num_columns: u32,
        /// Requested maximum row count.
        max_num_rows: u32,
    },
}
