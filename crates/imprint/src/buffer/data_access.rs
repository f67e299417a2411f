//! Tile and region reads for the renderer

use super::{AccumulationBuffer, TileCoord};

impl AccumulationBuffer {
    /// Tile bounds (x, y, width, height) in pixel coordinates
    pub fn get_tile_bounds(&self, coord: TileCoord) -> (u32, u32, u32, u32) {
        let start_x = coord.x * self.tile_size;
        let start_y = coord.y * self.tile_size;
        let width = self.tile_size.min(self.resolution().saturating_sub(start_x));
        let height = self.tile_size.min(self.resolution().saturating_sub(start_y));
        (start_x, start_y, width, height)
    }

    /// Values of one tile in row-major order (smaller at the buffer edge)
    pub fn get_tile_data(&self, coord: TileCoord) -> Vec<f32> {
        let (x, y, width, height) = self.get_tile_bounds(coord);
        self.get_region_data(x, y, width, height)
    }

    /// Values of a rectangular region in row-major order, clamped to bounds
    pub fn get_region_data(&self, x: u32, y: u32, width: u32, height: u32) -> Vec<f32> {
        let x_end = x.saturating_add(width).min(self.resolution());
        let y_end = y.saturating_add(height).min(self.resolution());
        if x >= x_end || y >= y_end {
            return Vec::new();
        }

        let row_len = self.resolution() as usize;
        let mut data = Vec::with_capacity(((x_end - x) * (y_end - y)) as usize);
        for row in y..y_end {
            let start = row as usize * row_len;
            data.extend_from_slice(&self.values()[start + x as usize..start + x_end as usize]);
        }
        data
    }
}
