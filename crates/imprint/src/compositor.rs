//! Stamp compositing onto accumulation buffers
//!
//! The [`Compositor`] trait is the seam to whatever actually rasterizes
//! stamps (a GPU render pass in a game engine). [`CpuCompositor`] is the
//! reference implementation used by tests and headless tools.

use std::sync::Arc;

use glam::{IVec2, Vec2};
use imprint_config::BlendMode;
use tracing::{debug, warn};

use crate::buffer::AccumulationBuffer;
use crate::error::{ImprintError, MissingResource};
use crate::shape::Shape;

/// Draws shapes into buffers and moves buffer content around.
pub trait Compositor {
    /// Bind the shape used by subsequent [`draw_shape`](Self::draw_shape) calls
    fn bind_shape(&mut self, shape: Arc<Shape>);

    /// Draw the bound shape centred at `position` (normalized buffer
    /// coordinates) with a footprint of `scale` (normalized units) rotated by
    /// `rotation` radians. Accumulates into existing content.
    ///
    /// Returns the bounding box of affected pixels (x, y, width, height), or
    /// None if the footprint missed the buffer.
    fn draw_shape(
        &mut self,
        buffer: &mut AccumulationBuffer,
        position: Vec2,
        scale: Vec2,
        rotation: f32,
    ) -> Result<Option<(u32, u32, u32, u32)>, ImprintError>;

    /// Copy `src` into `dst` so that src pixel `p` lands on `p + offset`.
    /// Pixels of `dst` with no source counterpart are left untouched.
    fn copy_buffer(&mut self, src: &AccumulationBuffer, dst: &mut AccumulationBuffer, offset: IVec2);

    /// Reset a buffer to zero
    fn clear_buffer(&mut self, buffer: &mut AccumulationBuffer);
}

/// CPU rasterizer for stamps
#[derive(Debug, Default)]
pub struct CpuCompositor {
    shape: Option<Arc<Shape>>,
    blend_mode: BlendMode,
    shape_binds: usize,
}

impl CpuCompositor {
    pub fn new(blend_mode: BlendMode) -> Self {
        Self {
            shape: None,
            blend_mode,
            shape_binds: 0,
        }
    }

    #[inline]
    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    /// Number of times a shape has been bound
    #[inline]
    pub fn shape_binds(&self) -> usize {
        self.shape_binds
    }
}

impl Compositor for CpuCompositor {
    fn bind_shape(&mut self, shape: Arc<Shape>) {
        self.shape = Some(shape);
        self.shape_binds += 1;
    }

    fn draw_shape(
        &mut self,
        buffer: &mut AccumulationBuffer,
        position: Vec2,
        scale: Vec2,
        rotation: f32,
    ) -> Result<Option<(u32, u32, u32, u32)>, ImprintError> {
        let Some(shape) = self.shape.as_ref() else {
            warn!("CpuCompositor::draw_shape: no shape bound, draw skipped");
            return Err(ImprintError::MissingResource(MissingResource::BoundShape));
        };

        debug!(
            "CpuCompositor::draw_shape: position=({:.4}, {:.4}), scale=({:.4}, {:.4}), rotation={:.2}rad, mode={:?}",
            position.x, position.y, scale.x, scale.y, rotation, self.blend_mode
        );

        if !scale.is_finite() || scale.x <= 0.0 || scale.y <= 0.0 || !position.is_finite() {
            debug!("  -> skipped: invalid scale or position");
            return Ok(None);
        }

        // Footprint in pixel units
        let resolution = buffer.resolution() as f32;
        let center = position * resolution;
        let width = scale.x * resolution;
        let height = scale.y * resolution;

        // Half extents of the rotated footprint's axis-aligned bounding box
        let cos_r = rotation.cos();
        let sin_r = rotation.sin();
        let half_w = (width / 2.0 * cos_r).abs() + (height / 2.0 * sin_r).abs();
        let half_h = (width / 2.0 * sin_r).abs() + (height / 2.0 * cos_r).abs();

        let x_min = ((center.x - half_w).floor().max(0.0) as u32).min(buffer.resolution());
        let y_min = ((center.y - half_h).floor().max(0.0) as u32).min(buffer.resolution());
        let x_max = ((center.x + half_w).ceil().max(0.0) as u32).min(buffer.resolution());
        let y_max = ((center.y + half_h).ceil().max(0.0) as u32).min(buffer.resolution());

        if x_min >= x_max || y_min >= y_max {
            return Ok(None);
        }

        // Sample the shape at each pixel centre inside the bounding box
        for py in y_min..y_max {
            for px in x_min..x_max {
                let dx = (px as f32 + 0.5) - center.x;
                let dy = (py as f32 + 0.5) - center.y;

                // Rotate by -rotation into shape space
                let local_x = dx * cos_r + dy * sin_r;
                let local_y = -dx * sin_r + dy * cos_r;

                // Normalize to shape space [0,1]², centre at 0.5
                let value = shape.sample(local_x / width + 0.5, local_y / height + 0.5);
                if value > 0.0 {
                    buffer.accumulate(px, py, value, self.blend_mode);
                }
            }
        }

        let region = (x_min, y_min, x_max - x_min, y_max - y_min);
        buffer.mark_region_dirty(region.0, region.1, region.2, region.3);
        Ok(Some(region))
    }

    fn copy_buffer(&mut self, src: &AccumulationBuffer, dst: &mut AccumulationBuffer, offset: IVec2) {
        if src.resolution() != dst.resolution() {
            warn!(
                "CpuCompositor::copy_buffer: resolution mismatch ({} vs {}), copy skipped",
                src.resolution(),
                dst.resolution()
            );
            return;
        }

        // Widen so extreme offsets cannot overflow
        let resolution = i64::from(dst.resolution());
        let (offset_x, offset_y) = (i64::from(offset.x), i64::from(offset.y));

        // Destination range that has a source counterpart (empty if |offset| >= R)
        let (x_start, x_end) = (offset_x.max(0), (resolution + offset_x).min(resolution));
        let (y_start, y_end) = (offset_y.max(0), (resolution + offset_y).min(resolution));

        for y in y_start..y_end {
            for x in x_start..x_end {
                if let Some(value) = src.get((x - offset_x) as u32, (y - offset_y) as u32) {
                    dst.set(x as u32, y as u32, value);
                }
            }
        }

        dst.mark_all_dirty();
        debug!("CpuCompositor::copy_buffer: offset=({}, {})", offset.x, offset.y);
    }

    fn clear_buffer(&mut self, buffer: &mut AccumulationBuffer) {
        buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compositor_with_square() -> CpuCompositor {
        let mut compositor = CpuCompositor::new(BlendMode::Max);
        compositor.bind_shape(Arc::new(Shape::new(1, 1, vec![1.0]).unwrap()));
        compositor
    }

    #[test]
    fn test_draw_without_shape_is_error() {
        let mut compositor = CpuCompositor::default();
        let mut buffer = AccumulationBuffer::new(32);
        let result = compositor.draw_shape(&mut buffer, Vec2::splat(0.5), Vec2::splat(0.25), 0.0);
        assert_eq!(
            result,
            Err(ImprintError::MissingResource(MissingResource::BoundShape))
        );
        assert_eq!(buffer.max_value(), 0.0);
    }

    #[test]
    fn test_draw_square_footprint() {
        let mut compositor = compositor_with_square();
        let mut buffer = AccumulationBuffer::new(32);

        let region = compositor
            .draw_shape(&mut buffer, Vec2::splat(0.5), Vec2::splat(0.25), 0.0)
            .unwrap();

        // 0.25 * 32 = 8 pixels centred on pixel corner 16
        assert_eq!(region, Some((12, 12, 8, 8)));
        assert_eq!(buffer.get(12, 12), Some(1.0));
        assert_eq!(buffer.get(19, 19), Some(1.0));
        assert_eq!(buffer.get(11, 16), Some(0.0));
        assert_eq!(buffer.get(20, 16), Some(0.0));
        assert!(buffer.has_dirty_tiles());
    }

    #[test]
    fn test_draw_anisotropic_scale() {
        let mut compositor = compositor_with_square();
        let mut buffer = AccumulationBuffer::new(32);

        compositor
            .draw_shape(&mut buffer, Vec2::splat(0.5), Vec2::new(0.5, 0.125), 0.0)
            .unwrap();

        // 16 px wide, 4 px tall
        assert_eq!(buffer.get(8, 16), Some(1.0));
        assert_eq!(buffer.get(23, 16), Some(1.0));
        assert_eq!(buffer.get(16, 13), Some(0.0));
        assert_eq!(buffer.get(16, 14), Some(1.0));
    }

    #[test]
    fn test_draw_rotated_swaps_axes() {
        let mut compositor = compositor_with_square();
        let mut buffer = AccumulationBuffer::new(32);

        compositor
            .draw_shape(
                &mut buffer,
                Vec2::splat(0.5),
                Vec2::new(0.5, 0.125),
                std::f32::consts::FRAC_PI_2,
            )
            .unwrap();

        // Rotated a quarter turn: tall and narrow
        assert_eq!(buffer.get(16, 8), Some(1.0));
        assert_eq!(buffer.get(16, 23), Some(1.0));
        assert_eq!(buffer.get(8, 16), Some(0.0));
    }

    #[test]
    fn test_draw_outside_buffer() {
        let mut compositor = compositor_with_square();
        let mut buffer = AccumulationBuffer::new(32);
        let region = compositor
            .draw_shape(&mut buffer, Vec2::new(3.0, 3.0), Vec2::splat(0.1), 0.0)
            .unwrap();
        assert_eq!(region, None);
        assert_eq!(buffer.max_value(), 0.0);
    }

    #[test]
    fn test_repeated_draws_accumulate_monotonically() {
        let mut compositor = CpuCompositor::new(BlendMode::Additive);
        compositor.bind_shape(Arc::new(Shape::disc(16, 0.0)));
        let mut buffer = AccumulationBuffer::new(64);

        let mut previous = 0.0;
        for _ in 0..6 {
            compositor
                .draw_shape(&mut buffer, Vec2::splat(0.5), Vec2::splat(0.2), 0.0)
                .unwrap();
            let value = buffer.get(32, 32).unwrap();
            assert!(value >= previous);
            previous = value;
        }
        assert!(previous > 0.0);
    }

    #[test]
    fn test_copy_with_offset_keeps_uncovered_pixels() {
        let mut compositor = CpuCompositor::default();
        let mut src = AccumulationBuffer::new(8);
        let mut dst = AccumulationBuffer::new(8);
        src.accumulate(4, 4, 1.0, BlendMode::Max);
        src.accumulate(0, 2, 0.5, BlendMode::Max);
        dst.accumulate(7, 2, 0.25, BlendMode::Max);

        compositor.copy_buffer(&src, &mut dst, IVec2::new(-2, 0));

        assert_eq!(dst.get(2, 4), Some(1.0));
        assert_eq!(dst.get(4, 4), Some(0.0));
        // (0, 2) scrolled out of the window
        assert_eq!(dst.get(6, 2), Some(0.0));
        // Revealed column keeps its previous content
        assert_eq!(dst.get(7, 2), Some(0.25));
    }

    #[test]
    fn test_copy_with_extreme_offset() {
        let mut compositor = CpuCompositor::default();
        let mut src = AccumulationBuffer::new(8);
        let mut dst = AccumulationBuffer::new(8);
        src.accumulate(3, 3, 1.0, BlendMode::Max);
        dst.accumulate(1, 1, 0.5, BlendMode::Max);

        for offset in [IVec2::MIN, IVec2::MAX, IVec2::new(i32::MIN, 0), IVec2::new(8, -8)] {
            compositor.copy_buffer(&src, &mut dst, offset);
        }

        // No overlap: destination untouched
        assert_eq!(dst.get(1, 1), Some(0.5));
        assert_eq!(dst.get(3, 3), Some(0.0));
    }

    #[test]
    fn test_copy_resolution_mismatch_is_skipped() {
        let mut compositor = CpuCompositor::default();
        let mut src = AccumulationBuffer::new(8);
        src.accumulate(1, 1, 1.0, BlendMode::Max);
        let mut dst = AccumulationBuffer::new(4);
        compositor.copy_buffer(&src, &mut dst, IVec2::ZERO);
        assert_eq!(dst.max_value(), 0.0);
    }
}
