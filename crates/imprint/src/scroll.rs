//! Scrolling window for unbounded surfaces.
//!
//! The buffer only covers a window of `window_scale` UV units around the
//! anchor actor. Every anchor update quantizes the anchor UV to the buffer
//! pixel grid; when the quantized position changes, the previous buffer is
//! copied into the current one shifted opposite to the anchor's motion so the
//! anchor stays at the window centre. Quantizing first means two nearly equal
//! positions give either no shift or whole-pixel shifts, never sub-pixel
//! resampling.
//!
//! Buffer content can only move by whole pixels. The fractional part of each
//! shift is carried into the next one, and the window centre used for mapping
//! is offset by that remainder, so marks stay fixed to the surface however
//! many times the window moves.
//!
//! Content that scrolls out of the window is dropped. Pixels revealed by a
//! shift keep whatever the current buffer held there before the shift, so
//! content outside the current window is stale and should not be relied on.

use glam::{IVec2, Vec2};
use tracing::debug;

use crate::buffer::AccumulationBuffer;
use crate::compositor::Compositor;
use crate::error::ImprintError;
use crate::mapping::quantize_uv;

/// Window history for one unbounded binding
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollState {
    window_scale: f32,
    resolution: u32,
    pixel_size: f32,
    last_window_center_uv: Option<Vec2>,
    /// Shift owed to the buffer but not applied yet, in buffer pixels
    remainder: Vec2,
}

/// Outcome of feeding an anchor position to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollUpdate {
    /// First anchor sample: the window is positioned, nothing to copy
    Positioned,
    /// Quantized anchor position unchanged
    Idle,
    /// The window moved by `delta` buffer pixels
    Recentre { delta: IVec2 },
}

/// Window scale for a render extent over a surface of the given size.
///
/// Returns 0.0 (degenerate) when either extent is not positive and finite.
pub fn compute_window_scale(max_render_extent: f32, largest_axis_extent: f32) -> f32 {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !valid(max_render_extent) || !valid(largest_axis_extent) {
        return 0.0;
    }
    (max_render_extent / largest_axis_extent).min(1.0)
}

impl ScrollState {
    pub fn new(window_scale: f32, resolution: u32) -> Self {
        let resolution = resolution.max(1);
        Self {
            window_scale,
            resolution,
            pixel_size: 1.0 / resolution as f32,
            last_window_center_uv: None,
            remainder: Vec2::ZERO,
        }
    }

    /// Build from the configured render extent and the surface's size
    pub fn from_extent(max_render_extent: f32, largest_axis_extent: f32, resolution: u32) -> Self {
        Self::new(
            compute_window_scale(max_render_extent, largest_axis_extent),
            resolution,
        )
    }

    #[inline]
    pub fn window_scale(&self) -> f32 {
        self.window_scale
    }

    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }

    /// Quantized anchor UV the window is centred on
    #[inline]
    pub fn last_window_center_uv(&self) -> Option<Vec2> {
        self.last_window_center_uv
    }

    /// Surface UV the buffer centre currently shows.
    ///
    /// Differs from [`last_window_center_uv`](Self::last_window_center_uv) by
    /// the sub-pixel shift not yet applied to the buffer.
    pub fn window_center_uv(&self) -> Option<Vec2> {
        let center = self.last_window_center_uv?;
        Some(center - self.remainder * self.pixel_size * self.window_scale)
    }

    /// Pending sub-pixel shift, in buffer pixels
    #[inline]
    pub fn remainder(&self) -> Vec2 {
        self.remainder
    }

    pub(crate) fn set_last_window_center_uv(&mut self, uv: Vec2) {
        self.last_window_center_uv = Some(uv);
    }

    /// Replace the window scale after the surface extent changed
    pub fn set_window_scale(&mut self, window_scale: f32) {
        self.window_scale = window_scale;
        self.remainder = Vec2::ZERO;
    }

    /// Window scale, or `DegenerateSurface` if it cannot be used
    pub fn checked_window_scale(&self) -> Result<f32, ImprintError> {
        if self.window_scale.is_finite() && self.window_scale > 0.0 {
            Ok(self.window_scale)
        } else {
            Err(ImprintError::DegenerateSurface("window scale is zero"))
        }
    }

    /// Feed the anchor's raw UV and work out how far the window moves
    pub fn advance(&mut self, anchor_uv: Vec2) -> Result<ScrollUpdate, ImprintError> {
        let window_scale = self.checked_window_scale()?;
        let quantized = quantize_uv(anchor_uv, self.pixel_size);
        if !quantized.is_finite() {
            return Err(ImprintError::DegenerateSurface("anchor UV is not finite"));
        }

        let Some(previous) = self.last_window_center_uv else {
            self.last_window_center_uv = Some(quantized);
            return Ok(ScrollUpdate::Positioned);
        };

        if previous == quantized {
            return Ok(ScrollUpdate::Idle);
        }

        self.last_window_center_uv = Some(quantized);

        // Exact shift in buffer pixels, plus what earlier shifts still owe
        let exact = (quantized - previous) / window_scale / self.pixel_size + self.remainder;

        // A shift of a whole window or more discards everything
        let limit = self.resolution as f32;
        let delta = if exact.abs().max_element() >= limit {
            self.remainder = Vec2::ZERO;
            exact.clamp(Vec2::splat(-limit), Vec2::splat(limit)).round()
        } else {
            let delta = exact.round();
            self.remainder = exact - delta;
            delta
        };
        let delta = delta.as_ivec2();

        debug!(
            "ScrollState::advance: ({:.5}, {:.5}) -> ({:.5}, {:.5}), delta=({}, {})px, remainder=({:.3}, {:.3})",
            previous.x,
            previous.y,
            quantized.x,
            quantized.y,
            delta.x,
            delta.y,
            self.remainder.x,
            self.remainder.y
        );

        if delta == IVec2::ZERO {
            Ok(ScrollUpdate::Idle)
        } else {
            Ok(ScrollUpdate::Recentre { delta })
        }
    }
}

/// Shift window content by `delta` pixels.
///
/// `previous` receives a snapshot of the window before the shift, then the
/// snapshot is copied back into `current` offset by `-delta`. Pixels with no
/// source keep the value `current` held before the shift.
pub fn recentre<C: Compositor + ?Sized>(
    compositor: &mut C,
    current: &mut AccumulationBuffer,
    previous: &mut AccumulationBuffer,
    delta: IVec2,
) {
    compositor.copy_buffer(current, previous, IVec2::ZERO);
    compositor.copy_buffer(previous, current, IVec2::ZERO.saturating_sub(delta));
}
