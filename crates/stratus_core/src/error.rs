//! # Core Error Types
//!
//! Errors raised by the grid and worker machinery.

use thiserror::Error;

/// Errors that can occur in the core machinery.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Grid dimension is not evenly divisible by the requested region factors.
    ///
    /// Rejected at configuration time, before any worker spawns.
    #[error("invalid region partition: {cells} cells cannot be split into {regions} regions along the {axis} axis")]
    InvalidRegionPartition {
        /// Number of cells along the offending axis.
        cells: usize,
        /// Requested region count along that axis.
        regions: usize,
        /// Axis name, `"row"` or `"col"`.
        axis: &'static str,
    },

    /// A grid dimension or partition factor was zero.
    #[error("grid dimensions and region factors must be non-zero")]
    EmptyGrid,
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
