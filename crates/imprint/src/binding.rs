//! Surface binding
//!
//! A [`SurfaceBinding`] ties one deformable surface to its accumulation
//! buffer(s). It owns:
//! - The buffer the renderer reads (plus the previous frame when scrolling)
//! - The scroll state for unbounded surfaces
//! - The shape library and the compositor that draws into the buffer
//!
//! Each stamp runs to completion: move the window (anchor only), resolve the
//! shape, estimate distortion, map coordinates, composite. The window follows
//! the anchor even when the anchor's own mark cannot be drawn. Apart from that
//! every check happens before the buffer is touched, so a failed stamp leaves
//! the buffer as it was.

use std::sync::Arc;

use glam::{Vec2, Vec3};
use imprint_config::{BindingConfig, CoordinateMode};
use tracing::{debug, info, warn};

use crate::buffer::{AccumulationBuffer, TileCoord};
use crate::collision::SurfaceGeometry;
use crate::compositor::{Compositor, CpuCompositor};
use crate::distortion::DistortionEstimator;
use crate::error::{ImprintError, MissingResource};
use crate::mapping::Mapping;
use crate::scroll::{ScrollState, ScrollUpdate, compute_window_scale, recentre};
use crate::shape::{Shape, ShapeId, ShapeLibrary};
use crate::types::{StampReport, StampRequest, SurfaceHit};

/// Buffers owned by a live binding
#[derive(Debug)]
struct WindowBuffers {
    current: AccumulationBuffer,
    /// Only allocated for unbounded bindings
    previous: Option<AccumulationBuffer>,
}

/// One surface bound to its accumulation buffer
pub struct SurfaceBinding<G, C = CpuCompositor> {
    surface: G,
    config: BindingConfig,
    compositor: C,
    shapes: ShapeLibrary,
    estimator: DistortionEstimator,
    /// None once released
    buffers: Option<WindowBuffers>,
    /// Some for unbounded bindings
    scroll: Option<ScrollState>,
    /// Shape currently bound on the compositor
    bound_shape: Option<ShapeId>,
}

impl<G: SurfaceGeometry> SurfaceBinding<G, CpuCompositor> {
    /// Bind with the CPU compositor, using the config's blend mode
    pub fn bind_cpu(surface: G, config: BindingConfig) -> Result<Self, ImprintError> {
        let compositor = CpuCompositor::new(config.blend_mode);
        Self::bind(surface, config, compositor)
    }
}

impl<G: SurfaceGeometry, C: Compositor> SurfaceBinding<G, C> {
    /// Bind a surface: validate the config, allocate zeroed buffers and, for
    /// unbounded surfaces, compute the window scale from the surface extent.
    ///
    /// A degenerate extent is not a bind error. The binding is created and
    /// every unbounded stamp fails with `DegenerateSurface` until
    /// [`refresh_extent`](Self::refresh_extent) finds a usable size.
    pub fn bind(surface: G, config: BindingConfig, compositor: C) -> Result<Self, ImprintError> {
        config.validate()?;

        let resolution = config.resolution;
        let scroll = match config.mode {
            CoordinateMode::Bounded => None,
            CoordinateMode::Unbounded { max_render_extent } => {
                let scroll = ScrollState::from_extent(
                    max_render_extent,
                    surface.largest_extent(),
                    resolution,
                );
                if scroll.checked_window_scale().is_err() {
                    warn!(
                        "SurfaceBinding::bind: surface extent {:.3} is degenerate, stamps will be skipped",
                        surface.largest_extent()
                    );
                }
                Some(scroll)
            }
        };

        let buffers = WindowBuffers {
            current: AccumulationBuffer::new(resolution),
            previous: scroll.as_ref().map(|_| AccumulationBuffer::new(resolution)),
        };

        info!(
            "SurfaceBinding::bind: {}x{} buffer, mode={:?}, channel={}, window_scale={:?}",
            resolution,
            resolution,
            config.mode,
            config.uv_channel,
            scroll.as_ref().map(ScrollState::window_scale)
        );

        Ok(Self {
            estimator: DistortionEstimator::new(config.probe_distance, config.uv_channel),
            surface,
            config,
            compositor,
            shapes: ShapeLibrary::new(),
            buffers: Some(buffers),
            scroll,
            bound_shape: None,
        })
    }

    /// Leave a mark for one surface hit.
    ///
    /// Failures are logged and returned. Only an anchor stamp can change the
    /// binding before failing, by moving the window to the anchor.
    pub fn stamp(&mut self, request: &StampRequest) -> Result<StampReport, ImprintError> {
        let result = self.try_stamp(request);
        if let Err(err) = &result {
            warn!("SurfaceBinding::stamp: skipped: {}", err);
        }
        result
    }

    fn try_stamp(&mut self, request: &StampRequest) -> Result<StampReport, ImprintError> {
        let buffers = self
            .buffers
            .as_mut()
            .ok_or(ImprintError::MissingResource(MissingResource::Buffer))?;

        let mut scrolled_by = None;
        if request.is_anchor
            && let Some(scroll) = self.scroll.as_mut()
        {
            let previous = buffers
                .previous
                .as_mut()
                .ok_or(ImprintError::MissingResource(MissingResource::Buffer))?;

            if let ScrollUpdate::Recentre { delta } = scroll.advance(request.uv())? {
                recentre(&mut self.compositor, &mut buffers.current, previous, delta);
                scrolled_by = Some(delta);
            }
        }

        let shape = self
            .shapes
            .get(request.shape)
            .cloned()
            .ok_or(ImprintError::MissingResource(MissingResource::Shape(request.shape)))?;

        let estimate = self
            .estimator
            .estimate(&self.surface, &request.hit, request.world_size)?;

        let mapping = match self.scroll.as_ref() {
            Some(scroll) => Mapping::Unbounded(scroll),
            None => Mapping::Bounded,
        };
        let mapped = mapping.map(request.uv(), request.is_anchor)?;

        let scale = estimate.scale * mapped.texture_scale;
        let rotation = if self.config.rotation_supported {
            request.rotation
        } else {
            0.0
        };

        if self.bound_shape != Some(request.shape) {
            self.compositor.bind_shape(shape);
            self.bound_shape = Some(request.shape);
        }

        let region =
            self.compositor
                .draw_shape(&mut buffers.current, mapped.buffer_uv, scale, rotation)?;

        debug!(
            "SurfaceBinding::stamp: uv=({:.4}, {:.4}) -> buffer=({:.4}, {:.4}), scale=({:.4}, {:.4}), anchor={}",
            request.hit.uv.x,
            request.hit.uv.y,
            mapped.buffer_uv.x,
            mapped.buffer_uv.y,
            scale.x,
            scale.y,
            request.is_anchor
        );

        Ok(StampReport {
            buffer_uv: mapped.buffer_uv,
            scale,
            rotation,
            scrolled_by,
            region,
        })
    }

    /// Cast a ray against the surface on the binding's UV channel
    pub fn trace(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
    ) -> Result<SurfaceHit, ImprintError> {
        self.surface
            .raycast(origin, direction, max_distance, self.config.uv_channel)
            .ok_or(ImprintError::NoHit)
    }

    /// UV channel hit queries against this surface must report
    #[inline]
    pub fn coordinate_channel(&self) -> u32 {
        self.config.uv_channel
    }

    /// Buffer the renderer samples, or None once released
    pub fn buffer(&self) -> Option<&AccumulationBuffer> {
        self.buffers.as_ref().map(|b| &b.current)
    }

    /// Sample the current buffer at a normalized coordinate
    pub fn sample(&self, buffer_uv: Vec2) -> Option<f32> {
        self.buffer()?.sample(buffer_uv)
    }

    /// Drain tiles changed since the last call
    pub fn take_dirty_tiles(&mut self) -> Vec<TileCoord> {
        match self.buffers.as_mut() {
            Some(buffers) => buffers.current.take_dirty_tiles(),
            None => Vec::new(),
        }
    }

    /// Window scale for unbounded bindings
    pub fn window_scale(&self) -> Option<f32> {
        self.scroll.as_ref().map(ScrollState::window_scale)
    }

    pub fn scroll_state(&self) -> Option<&ScrollState> {
        self.scroll.as_ref()
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn surface(&self) -> &G {
        &self.surface
    }

    pub fn compositor(&self) -> &C {
        &self.compositor
    }

    pub fn shapes(&self) -> &ShapeLibrary {
        &self.shapes
    }

    /// Whether the binding still owns its buffers
    pub fn is_active(&self) -> bool {
        self.buffers.is_some()
    }

    /// Recompute the window scale after the surface changed size
    pub fn refresh_extent(&mut self) {
        let CoordinateMode::Unbounded { max_render_extent } = self.config.mode else {
            return;
        };
        let Some(scroll) = self.scroll.as_mut() else {
            return;
        };

        let window_scale =
            compute_window_scale(max_render_extent, self.surface.largest_extent());
        if window_scale != scroll.window_scale() {
            info!(
                "SurfaceBinding::refresh_extent: window_scale {:.4} -> {:.4}",
                scroll.window_scale(),
                window_scale
            );
            scroll.set_window_scale(window_scale);
        }
    }

    /// Reset all accumulated displacement to zero
    pub fn clear(&mut self) {
        let Some(buffers) = self.buffers.as_mut() else {
            return;
        };
        self.compositor.clear_buffer(&mut buffers.current);
        if let Some(previous) = buffers.previous.as_mut() {
            self.compositor.clear_buffer(previous);
        }
        debug!("SurfaceBinding::clear");
    }

    /// Drop the buffers (the surface is going away). Later stamps fail with
    /// `MissingResource`.
    pub fn release(&mut self) {
        if self.buffers.take().is_some() {
            info!("SurfaceBinding::release: buffers dropped");
        }
        self.bound_shape = None;
    }

    /// Register or replace a shape under an explicit id
    pub fn register_shape(&mut self, id: ShapeId, shape: Shape) {
        self.shapes.insert(id, shape);
        self.invalidate_shape(id);
    }

    /// Register a shape under a fresh id
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = self.shapes.add(shape);
        self.invalidate_shape(id);
        id
    }

    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Arc<Shape>> {
        self.invalidate_shape(id);
        self.shapes.remove(id)
    }

    fn invalidate_shape(&mut self, id: ShapeId) {
        if self.bound_shape == Some(id) {
            self.bound_shape = None;
        }
    }
}
