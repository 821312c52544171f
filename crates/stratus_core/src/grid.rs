//! # Grid Addressing
//!
//! Pure mapping between cell coordinates, flat indices, concurrency regions,
//! and world positions. There is no grid *data* here; the layout only answers
//! addressing questions for the automaton engines and the placement code.
//!
//! Regions are a fixed rectangular partition of the grid used purely to bound
//! concurrent work. They are non-overlapping and their union is the full
//! grid, which is why the region factors must evenly divide the dimensions —
//! anything else is rejected at construction, before a single worker runs.

use std::ops::Range;

use crate::error::{CoreError, CoreResult};

/// A (row, col) cell coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Coordinate {
    /// Row, increasing away from the world's +Z edge.
    pub row: usize,
    /// Column, increasing along +X.
    pub col: usize,
}

impl Coordinate {
    /// Creates a coordinate.
    #[inline]
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Fixed grid layout: cell counts, region partition, and cell size.
///
/// The world origin sits at the center of the grid; `world_center` and
/// `world_to_index` convert between cell space and that centered frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridLayout {
    rows: usize,
    cols: usize,
    region_rows: usize,
    region_cols: usize,
    cell_size: f32,
}

impl GridLayout {
    /// Creates a layout, validating the region partition.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::EmptyGrid`] if any dimension or factor is zero,
    /// and [`CoreError::InvalidRegionPartition`] if the region factors do not
    /// evenly divide the cell counts.
    pub fn new(
        rows: usize,
        cols: usize,
        region_rows: usize,
        region_cols: usize,
        cell_size: f32,
    ) -> CoreResult<Self> {
        if rows == 0 || cols == 0 || region_rows == 0 || region_cols == 0 {
            return Err(CoreError::EmptyGrid);
        }
        if rows % region_rows != 0 {
            return Err(CoreError::InvalidRegionPartition {
                cells: rows,
                regions: region_rows,
                axis: "row",
            });
        }
        if cols % region_cols != 0 {
            return Err(CoreError::InvalidRegionPartition {
                cells: cols,
                regions: region_cols,
                axis: "col",
            });
        }

        Ok(Self {
            rows,
            cols,
            region_rows,
            region_cols,
            cell_size,
        })
    }

    /// Number of cell rows.
    #[inline]
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cell columns.
    #[inline]
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Whether the grid has no cells. Layout construction forbids this; the
    /// method exists for API completeness.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of regions in the partition.
    #[inline]
    #[must_use]
    pub const fn region_count(&self) -> usize {
        self.region_rows * self.region_cols
    }

    /// Edge length of one cell in world units.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid width in world units.
    #[inline]
    #[must_use]
    pub fn world_width(&self) -> f32 {
        self.cols as f32 * self.cell_size
    }

    /// Grid height in world units.
    #[inline]
    #[must_use]
    pub fn world_height(&self) -> f32 {
        self.rows as f32 * self.cell_size
    }

    /// Converts a flat index to a coordinate.
    #[inline]
    #[must_use]
    pub const fn coordinate(&self, index: usize) -> Coordinate {
        Coordinate {
            row: index / self.cols,
            col: index % self.cols,
        }
    }

    /// Converts a coordinate to a flat index.
    #[inline]
    #[must_use]
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Whether the coordinate lies inside the grid.
    #[inline]
    #[must_use]
    pub const fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Region index owning the given cell, or `None` when out of range.
    #[must_use]
    pub fn region_of(&self, row: usize, col: usize) -> Option<usize> {
        if !self.contains(row, col) {
            return None;
        }

        let region_row = row / (self.rows / self.region_rows);
        let region_col = col / (self.cols / self.region_cols);
        Some(region_row * self.region_cols + region_col)
    }

    /// The row and column ranges covered by a region.
    ///
    /// # Panics
    ///
    /// Panics if `region >= self.region_count()`.
    #[must_use]
    pub fn region_bounds(&self, region: usize) -> (Range<usize>, Range<usize>) {
        assert!(region < self.region_count(), "region {region} out of range");

        let cells_per_row = self.rows / self.region_rows;
        let cells_per_col = self.cols / self.region_cols;
        let region_row = region / self.region_cols;
        let region_col = region % self.region_cols;
        let row_start = region_row * cells_per_row;
        let col_start = region_col * cells_per_col;

        (
            row_start..row_start + cells_per_row,
            col_start..col_start + cells_per_col,
        )
    }

    /// Centered world position (x, z) of a cell's midpoint.
    #[must_use]
    pub fn world_center(&self, row: usize, col: usize) -> (f32, f32) {
        let half = self.cell_size / 2.0;
        let x = col as f32 * self.cell_size + half - self.world_width() / 2.0;
        let z = -(row as f32 * self.cell_size + half - self.world_height() / 2.0);
        (x, z)
    }

    /// Flat index of the cell containing a world position, or `None` when the
    /// position falls outside the grid.
    #[must_use]
    pub fn world_to_index(&self, x: f32, z: f32) -> Option<usize> {
        let grid_x = x + self.world_width() / 2.0;
        let grid_z = (z - self.world_height() / 2.0).abs();

        if grid_x < 0.0 || grid_z < 0.0 {
            return None;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (row, col) = (
            (grid_z / self.cell_size) as usize,
            (grid_x / self.cell_size) as usize,
        );

        self.contains(row, col).then(|| self.index(row, col))
    }

    /// Visits the 8 neighbors of a cell, skipping coordinates outside the
    /// grid. Boundary cells simply have fewer neighbors; nothing wraps.
    pub fn for_each_neighbor(&self, row: usize, col: usize, mut visit: impl FnMut(usize)) {
        const DIR_ROW: [isize; 8] = [-1, -1, -1, 0, 0, 1, 1, 1];
        const DIR_COL: [isize; 8] = [-1, 0, 1, -1, 1, -1, 0, 1];

        for i in 0..8 {
            let new_row = row as isize + DIR_ROW[i];
            let new_col = col as isize + DIR_COL[i];
            if new_row < 0 || new_col < 0 {
                continue;
            }
            #[allow(clippy::cast_sign_loss)]
            let (new_row, new_col) = (new_row as usize, new_col as usize);
            if self.contains(new_row, new_col) {
                visit(self.index(new_row, new_col));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        GridLayout::new(150, 150, 3, 3, 1.0).unwrap()
    }

    #[test]
    fn test_rejects_uneven_partition() {
        let err = GridLayout::new(150, 150, 4, 3, 1.0).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidRegionPartition {
                cells: 150,
                regions: 4,
                axis: "row"
            }
        );

        assert!(matches!(
            GridLayout::new(150, 150, 3, 7, 1.0),
            Err(CoreError::InvalidRegionPartition { axis: "col", .. })
        ));
    }

    #[test]
    fn test_rejects_zero_dimensions() {
        assert_eq!(GridLayout::new(0, 150, 3, 3, 1.0), Err(CoreError::EmptyGrid));
        assert_eq!(GridLayout::new(150, 150, 0, 3, 1.0), Err(CoreError::EmptyGrid));
    }

    #[test]
    fn test_index_coordinate_roundtrip() {
        let grid = layout();
        for index in [0, 1, 149, 150, 11_250, 22_499] {
            let c = grid.coordinate(index);
            assert_eq!(grid.index(c.row, c.col), index);
        }
    }

    #[test]
    fn test_regions_tile_the_grid() {
        let grid = layout();
        let mut owner = vec![None; grid.len()];

        for region in 0..grid.region_count() {
            let (rows, cols) = grid.region_bounds(region);
            for row in rows {
                for col in cols.clone() {
                    let index = grid.index(row, col);
                    assert!(owner[index].is_none(), "regions overlap at {index}");
                    owner[index] = Some(region);
                    assert_eq!(grid.region_of(row, col), Some(region));
                }
            }
        }

        assert!(owner.iter().all(Option::is_some), "regions must cover the grid");
    }

    #[test]
    fn test_region_of_out_of_range() {
        let grid = layout();
        assert_eq!(grid.region_of(150, 0), None);
        assert_eq!(grid.region_of(0, 150), None);
    }

    #[test]
    fn test_world_roundtrip() {
        let grid = GridLayout::new(10, 10, 2, 2, 4.0).unwrap();
        for row in 0..10 {
            for col in 0..10 {
                let (x, z) = grid.world_center(row, col);
                assert_eq!(grid.world_to_index(x, z), Some(grid.index(row, col)));
            }
        }

        assert_eq!(grid.world_to_index(1e6, 0.0), None);
    }

    #[test]
    fn test_corner_has_three_neighbors() {
        let grid = layout();
        let mut count = 0;
        grid.for_each_neighbor(0, 0, |_| count += 1);
        assert_eq!(count, 3);

        count = 0;
        grid.for_each_neighbor(75, 75, |_| count += 1);
        assert_eq!(count, 8);

        count = 0;
        grid.for_each_neighbor(149, 0, |_| count += 1);
        assert_eq!(count, 3);
    }
}
