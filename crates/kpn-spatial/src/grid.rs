//! Uniform-cell spatial grid.
//!
//! # Architecture
//!
//! Items are bucketed by `floor(x / cell_size), floor(y / cell_size)`. The
//! grid has no removal or move operation: callers [`clear`](SpatialGrid::clear)
//! and re-insert everything once per tick.
//!
//! A query returns every item in the 3x3 block of cells around the query
//! point. Any item within `cell_size` of the query point on both axes is
//! therefore returned, so interaction radii up to the cell size never miss a
//! neighbour. Results may contain items that are further away; callers filter
//! by exact distance.

use std::collections::HashMap;

use glam::Vec2;

/// Integer cell coordinate.
pub type CellKey = (i32, i32);

/// Spatial hash over a uniform grid of square cells.
#[derive(Debug, Clone)]
pub struct SpatialGrid<T> {
    cell_size: f32,
    cells: HashMap<CellKey, Vec<T>>,
    len: usize,
}

impl<T: Copy> SpatialGrid<T> {
    /// Creates an empty grid.
    ///
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell size must be positive and finite"
        );
        Self {
            cell_size,
            cells: HashMap::new(),
            len: 0,
        }
    }

    /// Returns the edge length of a cell.
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Returns the cell containing `pos`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Buckets `item` into the cell containing `pos`.
    pub fn insert(&mut self, pos: Vec2, item: T) {
        let key = self.cell_of(pos);
        self.cells.entry(key).or_default().push(item);
        self.len += 1;
    }

    /// Returns every item in the 3x3 block of cells around `pos`.
    #[must_use]
    pub fn query(&self, pos: Vec2) -> Vec<T> {
        let mut out = Vec::new();
        self.query_into(pos, &mut out);
        out
    }

    /// Appends every item in the 3x3 block of cells around `pos` to `out`.
    pub fn query_into(&self, pos: Vec2, out: &mut Vec<T>) {
        let (cx, cy) = self.cell_of(pos);
        for x in cx - 1..=cx + 1 {
            for y in cy - 1..=cy + 1 {
                if let Some(bucket) = self.cells.get(&(x, y)) {
                    out.extend_from_slice(bucket);
                }
            }
        }
    }

    /// Discards every bucket.
    pub fn clear(&mut self) {
        self.cells.clear();
        self.len = 0;
    }

    /// Returns the number of inserted items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if nothing has been inserted since the last clear.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of non-empty cells.
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}
