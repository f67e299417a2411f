//! Dirty tile tracking for incremental uploads

use tracing::debug;

use super::{AccumulationBuffer, TileCoord};

impl AccumulationBuffer {
    /// Mark a rectangular pixel region as dirty
    pub fn mark_region_dirty(&mut self, x: u32, y: u32, w: u32, h: u32) {
        if w == 0 || h == 0 || x >= self.resolution() || y >= self.resolution() {
            return;
        }

        let x_end = x.saturating_add(w).min(self.resolution());
        let y_end = y.saturating_add(h).min(self.resolution());

        let tile_x_start = x / self.tile_size;
        let tile_y_start = y / self.tile_size;
        let tile_x_end = (x_end - 1) / self.tile_size;
        let tile_y_end = (y_end - 1) / self.tile_size;

        let tiles_before = self.dirty_tiles.len();

        for ty in tile_y_start..=tile_y_end {
            for tx in tile_x_start..=tile_x_end {
                self.dirty_tiles.insert(TileCoord { x: tx, y: ty });
            }
        }

        debug!(
            "mark_region_dirty: ({}, {}) {}x{} -> {} new tiles (total {})",
            x,
            y,
            w,
            h,
            self.dirty_tiles.len() - tiles_before,
            self.dirty_tiles.len()
        );
    }

    /// Mark every tile dirty (after clears and window scrolls)
    pub fn mark_all_dirty(&mut self) {
        let resolution = self.resolution();
        self.mark_region_dirty(0, 0, resolution, resolution);
    }

    /// Get all dirty tiles and clear the dirty set
    pub fn take_dirty_tiles(&mut self) -> Vec<TileCoord> {
        self.dirty_tiles.drain().collect()
    }

    #[inline]
    pub fn has_dirty_tiles(&self) -> bool {
        !self.dirty_tiles.is_empty()
    }

    #[inline]
    pub fn dirty_tile_count(&self) -> usize {
        self.dirty_tiles.len()
    }
}
