//! Actor-side driver that leaves marks while moving over a surface.

use glam::{Vec2, Vec3};
use imprint_config::InteractorConfig;
use tracing::debug;

use crate::binding::SurfaceBinding;
use crate::collision::SurfaceGeometry;
use crate::compositor::Compositor;
use crate::error::ImprintError;
use crate::shape::ShapeId;
use crate::types::{StampReport, StampRequest};

/// What one [`Interactor::tick`] did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Tick interval not reached yet
    Waiting,
    /// Actor has not moved since its last stamp
    Unmoved,
    /// Nothing under the actor
    Missed,
    Stamped(StampReport),
}

/// Traces below an actor at a fixed rate and stamps a hole where it lands
#[derive(Debug, Clone)]
pub struct Interactor {
    config: InteractorConfig,
    trace_direction: Vec3,
    shape: ShapeId,
    rotation: f32,
    elapsed: f32,
    last_location: Option<Vec3>,
}

impl Interactor {
    pub fn new(config: InteractorConfig, shape: ShapeId) -> Result<Self, ImprintError> {
        config.validate()?;
        let trace_direction = Vec3::from_array(config.trace_direction).normalize();
        Ok(Self {
            // First tick acts immediately
            elapsed: config.tick_interval,
            config,
            trace_direction,
            shape,
            rotation: 0.0,
            last_location: None,
        })
    }

    pub fn config(&self) -> &InteractorConfig {
        &self.config
    }

    pub fn set_shape(&mut self, shape: ShapeId) {
        self.shape = shape;
    }

    /// Hole rotation in radians, used when the binding supports rotation
    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
    }

    /// Location of the last successful stamp
    pub fn last_location(&self) -> Option<Vec3> {
        self.last_location
    }

    /// Advance by `dt` seconds with the actor at `location`.
    ///
    /// A miss is reported as [`TickOutcome::Missed`], not as an error. Stamp
    /// failures propagate after the binding has logged them.
    pub fn tick<G: SurfaceGeometry, C: Compositor>(
        &mut self,
        dt: f32,
        location: Vec3,
        binding: &mut SurfaceBinding<G, C>,
    ) -> Result<TickOutcome, ImprintError> {
        self.elapsed += dt.max(0.0);
        if self.elapsed < self.config.tick_interval {
            return Ok(TickOutcome::Waiting);
        }
        self.elapsed = 0.0;

        if self.last_location == Some(location) {
            return Ok(TickOutcome::Unmoved);
        }

        let hit = match binding.trace(location, self.trace_direction, self.config.max_distance) {
            Ok(hit) => hit,
            Err(err) if err.is_no_hit() => {
                debug!(
                    "Interactor::tick: no surface below ({:.1}, {:.1}, {:.1})",
                    location.x, location.y, location.z
                );
                return Ok(TickOutcome::Missed);
            }
            Err(err) => return Err(err),
        };

        let mut request =
            StampRequest::new(hit, self.shape, Vec2::from_array(self.config.hole_size))
                .with_rotation(self.rotation);
        request.is_anchor = self.config.is_anchor;

        let report = binding.stamp(&request)?;
        self.last_location = Some(location);
        Ok(TickOutcome::Stamped(report))
    }
}
