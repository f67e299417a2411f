//! Accumulation buffer storage with dirty tracking
//!
//! An [`AccumulationBuffer`] is a square grid of scalar displacement values
//! addressed by normalized coordinates in [0,1]². Row 0 is `v = 0`. Values
//! start at zero and only ever grow through [`AccumulationBuffer::accumulate`];
//! the renderer reads them back through the data access helpers.

mod data_access;
mod dirty_tracking;

use std::collections::HashSet;

use glam::Vec2;
use imprint_config::BlendMode;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_TILE_SIZE;

/// Tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
}

/// R×R grid of cumulative displacement
#[derive(Debug)]
pub struct AccumulationBuffer {
    resolution: u32,
    /// Displacement values in row-major order
    values: Vec<f32>,
    pub(crate) tile_size: u32,
    tiles_per_side: u32,
    pub(crate) dirty_tiles: HashSet<TileCoord>,
}

impl AccumulationBuffer {
    /// Create a zeroed buffer with the default tile size
    pub fn new(resolution: u32) -> Self {
        Self::with_tile_size(resolution, DEFAULT_TILE_SIZE)
    }

    /// Create a zeroed buffer with the given tile size for dirty tracking
    pub fn with_tile_size(resolution: u32, tile_size: u32) -> Self {
        let tile_size = tile_size.max(1);
        let value_count = (resolution as usize) * (resolution as usize);
        Self {
            resolution,
            values: vec![0.0; value_count],
            tile_size,
            tiles_per_side: resolution.div_ceil(tile_size),
            dirty_tiles: HashSet::new(),
        }
    }

    /// Pixels per side
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Size of one pixel in normalized coordinates
    #[inline]
    pub fn pixel_size(&self) -> f32 {
        1.0 / self.resolution as f32
    }

    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Number of tiles along each side
    #[inline]
    pub fn tiles_per_side(&self) -> u32 {
        self.tiles_per_side
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.resolution as usize) + (x as usize)
    }

    /// Get a value. Returns None if out of bounds.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        Some(self.values[self.index(x, y)])
    }

    /// Overwrite a value. Does nothing if out of bounds.
    ///
    /// Only used for buffer-to-buffer copies; stamps go through
    /// [`accumulate`](Self::accumulate).
    #[inline]
    pub(crate) fn set(&mut self, x: u32, y: u32, value: f32) {
        if x >= self.resolution || y >= self.resolution {
            return;
        }
        let index = self.index(x, y);
        self.values[index] = value;
    }

    /// Combine a stamp value into a pixel. The result is never lower than
    /// the previous value.
    #[inline]
    pub fn accumulate(&mut self, x: u32, y: u32, value: f32, blend_mode: BlendMode) {
        if x >= self.resolution || y >= self.resolution {
            return;
        }
        let value = value.clamp(0.0, 1.0);
        let index = self.index(x, y);
        let dst = self.values[index];
        self.values[index] = match blend_mode {
            BlendMode::Max => dst.max(value),
            BlendMode::Additive => (dst + value).min(1.0).max(dst),
        };
    }

    /// Pixel containing a normalized coordinate, or None outside [0,1)
    pub fn pixel_at(&self, uv: Vec2) -> Option<(u32, u32)> {
        if !(0.0..1.0).contains(&uv.x) || !(0.0..1.0).contains(&uv.y) {
            return None;
        }
        let res = self.resolution as f32;
        let x = ((uv.x * res) as u32).min(self.resolution - 1);
        let y = ((uv.y * res) as u32).min(self.resolution - 1);
        Some((x, y))
    }

    /// Nearest-pixel sample at a normalized coordinate
    pub fn sample(&self, uv: Vec2) -> Option<f32> {
        let (x, y) = self.pixel_at(uv)?;
        self.get(x, y)
    }

    /// Reset every value to zero and mark the whole buffer dirty
    pub fn clear(&mut self) {
        self.values.fill(0.0);
        self.mark_all_dirty();
    }

    /// Raw values as bytes for GPU upload (R32Float)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.values)
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Largest value in the buffer
    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_is_zeroed() {
        let buffer = AccumulationBuffer::new(64);
        assert_eq!(buffer.resolution(), 64);
        assert_eq!(buffer.values().len(), 64 * 64);
        assert!(buffer.values().iter().all(|&v| v == 0.0));
        assert!(!buffer.has_dirty_tiles());
    }

    #[test]
    fn test_accumulate_max_is_monotone() {
        let mut buffer = AccumulationBuffer::new(8);
        buffer.accumulate(3, 3, 0.6, BlendMode::Max);
        buffer.accumulate(3, 3, 0.2, BlendMode::Max);
        assert_eq!(buffer.get(3, 3), Some(0.6));
        buffer.accumulate(3, 3, 0.9, BlendMode::Max);
        assert_eq!(buffer.get(3, 3), Some(0.9));
    }

    #[test]
    fn test_accumulate_additive_clamps() {
        let mut buffer = AccumulationBuffer::new(8);
        buffer.accumulate(1, 1, 0.4, BlendMode::Additive);
        buffer.accumulate(1, 1, 0.4, BlendMode::Additive);
        assert!((buffer.get(1, 1).unwrap() - 0.8).abs() < 1e-6);
        buffer.accumulate(1, 1, 0.4, BlendMode::Additive);
        assert_eq!(buffer.get(1, 1), Some(1.0));
    }

    #[test]
    fn test_accumulate_ignores_negative_values() {
        let mut buffer = AccumulationBuffer::new(8);
        buffer.accumulate(0, 0, 0.5, BlendMode::Additive);
        buffer.accumulate(0, 0, -1.0, BlendMode::Additive);
        assert_eq!(buffer.get(0, 0), Some(0.5));
    }

    #[test]
    fn test_sample_and_bounds() {
        let mut buffer = AccumulationBuffer::new(4);
        buffer.accumulate(2, 1, 1.0, BlendMode::Max);
        assert_eq!(buffer.sample(Vec2::new(0.6, 0.3)), Some(1.0));
        assert_eq!(buffer.sample(Vec2::new(0.1, 0.1)), Some(0.0));
        assert_eq!(buffer.sample(Vec2::new(1.0, 0.5)), None);
        assert_eq!(buffer.sample(Vec2::new(-0.1, 0.5)), None);
        assert_eq!(buffer.get(4, 0), None);
    }

    #[test]
    fn test_clear() {
        let mut buffer = AccumulationBuffer::with_tile_size(16, 8);
        buffer.accumulate(5, 5, 1.0, BlendMode::Max);
        buffer.clear();
        assert_eq!(buffer.max_value(), 0.0);
        assert_eq!(buffer.dirty_tile_count(), 4);
    }

    #[test]
    fn test_as_bytes() {
        let buffer = AccumulationBuffer::new(2);
        // 4 values * 4 bytes per f32
        assert_eq!(buffer.as_bytes().len(), 16);
    }
}
