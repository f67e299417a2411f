//! Surface UV to buffer coordinate mapping.
//!
//! Bounded surfaces map UV space straight onto the buffer. Unbounded surfaces
//! only keep a window around the anchor actor in the buffer, so hits are
//! expressed relative to the anchor's last quantized window position.

use glam::Vec2;

use crate::constants::WINDOW_CENTER;
use crate::error::{ImprintError, MissingResource};
use crate::scroll::ScrollState;

/// Snap a coordinate to the buffer pixel grid
#[inline]
pub fn quantize(value: f32, pixel_size: f32) -> f32 {
    (value / pixel_size + 0.5).floor() * pixel_size
}

/// Snap both axes of a coordinate to the buffer pixel grid
#[inline]
pub fn quantize_uv(uv: Vec2, pixel_size: f32) -> Vec2 {
    Vec2::new(quantize(uv.x, pixel_size), quantize(uv.y, pixel_size))
}

/// Where a hit lands in the buffer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedStamp {
    /// Normalized buffer coordinates
    pub buffer_uv: Vec2,
    /// Multiplier from surface-UV sizes to buffer sizes
    pub texture_scale: f32,
}

/// Coordinate mapper for one binding
#[derive(Debug, Clone, Copy)]
pub enum Mapping<'a> {
    Bounded,
    Unbounded(&'a ScrollState),
}

impl Mapping<'_> {
    /// Map a raw surface UV into buffer coordinates.
    ///
    /// Unbounded mappings fail with `DegenerateSurface` when the window scale
    /// is unusable, and non-anchor hits fail with `MissingResource` until the
    /// anchor has positioned the window once.
    pub fn map(&self, raw_uv: Vec2, is_anchor: bool) -> Result<MappedStamp, ImprintError> {
        match self {
            Mapping::Bounded => Ok(MappedStamp {
                buffer_uv: raw_uv,
                texture_scale: 1.0,
            }),
            Mapping::Unbounded(scroll) => {
                let window_scale = scroll.checked_window_scale()?;
                let texture_scale = 1.0 / window_scale;

                if is_anchor {
                    return Ok(MappedStamp {
                        buffer_uv: WINDOW_CENTER,
                        texture_scale,
                    });
                }

                let anchor_uv = scroll
                    .window_center_uv()
                    .ok_or(ImprintError::MissingResource(MissingResource::AnchorPosition))?;
                let buffer_uv = WINDOW_CENTER + (raw_uv - anchor_uv) * texture_scale;

                Ok(MappedStamp {
                    buffer_uv: quantize_uv(buffer_uv, scroll.pixel_size()),
                    texture_scale,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_idempotent() {
        for resolution in [64u32, 1000, 1024] {
            let pixel_size = 1.0 / resolution as f32;
            for i in 0..2000 {
                let x = i as f32 * 0.000_731 - 0.3;
                let q = quantize(x, pixel_size);
                assert_eq!(quantize(q, pixel_size), q, "x={x} resolution={resolution}");
            }
        }
    }

    #[test]
    fn test_quantize_rounds_to_nearest() {
        let pixel_size = 1.0 / 1024.0;
        assert_eq!(quantize(0.51, pixel_size), 522.0 / 1024.0);
        assert_eq!(quantize(0.5 + 0.4 * pixel_size, pixel_size), 0.5);
        assert_eq!(quantize(0.5 + 0.6 * pixel_size, pixel_size), 0.5 + pixel_size);
    }

    #[test]
    fn test_bounded_is_identity() {
        for uv in [Vec2::ZERO, Vec2::new(0.123, 0.987), Vec2::new(0.5, 0.25)] {
            for is_anchor in [false, true] {
                let mapped = Mapping::Bounded.map(uv, is_anchor).unwrap();
                assert_eq!(mapped.buffer_uv, uv);
                assert_eq!(mapped.texture_scale, 1.0);
            }
        }
    }

    #[test]
    fn test_unbounded_anchor_is_centred() {
        let scroll = ScrollState::new(0.25, 1024);
        for uv in [Vec2::ZERO, Vec2::new(0.9, 0.1), Vec2::new(0.51, 0.5)] {
            let mapped = Mapping::Unbounded(&scroll).map(uv, true).unwrap();
            assert_eq!(mapped.buffer_uv, WINDOW_CENTER);
            assert_eq!(mapped.texture_scale, 4.0);
        }
    }

    #[test]
    fn test_unbounded_relative_to_anchor() {
        let mut scroll = ScrollState::new(0.5, 1024);
        scroll.set_last_window_center_uv(Vec2::new(0.5, 0.5));

        let mapped = Mapping::Unbounded(&scroll)
            .map(Vec2::new(0.5625, 0.4375), false)
            .unwrap();

        assert_eq!(mapped.buffer_uv, Vec2::new(0.625, 0.375));
        assert_eq!(mapped.texture_scale, 2.0);
    }

    #[test]
    fn test_unbounded_non_anchor_is_quantized() {
        let mut scroll = ScrollState::new(0.5, 1024);
        scroll.set_last_window_center_uv(Vec2::new(0.5, 0.5));

        let mapped = Mapping::Unbounded(&scroll)
            .map(Vec2::new(0.500_13, 0.5), false)
            .unwrap();

        let pixels = mapped.buffer_uv.x * 1024.0;
        assert_eq!(pixels, pixels.round());
    }

    #[test]
    fn test_unbounded_without_anchor_position() {
        let scroll = ScrollState::new(0.5, 1024);
        let err = Mapping::Unbounded(&scroll)
            .map(Vec2::splat(0.3), false)
            .unwrap_err();
        assert_eq!(
            err,
            ImprintError::MissingResource(MissingResource::AnchorPosition)
        );
    }

    #[test]
    fn test_unbounded_degenerate_window() {
        let scroll = ScrollState::new(0.0, 1024);
        let err = Mapping::Unbounded(&scroll).map(Vec2::splat(0.3), true).unwrap_err();
        assert!(matches!(err, ImprintError::DegenerateSurface(_)));
    }
}
