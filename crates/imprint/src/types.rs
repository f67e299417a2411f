use glam::{IVec2, Vec2, Vec3};

use crate::shape::ShapeId;

/// Result of a collision query against a surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// World-space hit location
    pub location: Vec3,
    /// Surface normal at the hit (normalized)
    pub normal: Vec3,
    /// UV coordinates on the queried channel
    pub uv: Vec2,
}

/// A request to leave a mark at a surface hit
#[derive(Debug, Clone, Copy)]
pub struct StampRequest {
    /// Where the actor touched the surface
    pub hit: SurfaceHit,
    /// Shape to stamp
    pub shape: ShapeId,
    /// Requested footprint size in world units (x, y)
    pub world_size: Vec2,
    /// Rotation in radians (ignored unless the binding supports rotation)
    pub rotation: f32,
    /// Whether the requester centres the scrolling window
    pub is_anchor: bool,
}

impl StampRequest {
    /// Create an unrotated, non-anchor request
    pub fn new(hit: SurfaceHit, shape: ShapeId, world_size: Vec2) -> Self {
        Self {
            hit,
            shape,
            world_size,
            rotation: 0.0,
            is_anchor: false,
        }
    }

    /// Mark this request as coming from the anchor actor
    pub fn anchor(mut self) -> Self {
        self.is_anchor = true;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Raw UV of the hit
    #[inline]
    pub fn uv(&self) -> Vec2 {
        self.hit.uv
    }
}

/// What a successful stamp did to the binding
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampReport {
    /// Normalized buffer position the shape was drawn at
    pub buffer_uv: Vec2,
    /// Footprint size in normalized buffer units
    pub scale: Vec2,
    /// Rotation actually applied
    pub rotation: f32,
    /// Pixel offset applied to the window before drawing, if it scrolled
    pub scrolled_by: Option<IVec2>,
    /// Bounding box of affected pixels (x, y, width, height), or None if the
    /// footprint fell outside the buffer
    pub region: Option<(u32, u32, u32, u32)>,
}
