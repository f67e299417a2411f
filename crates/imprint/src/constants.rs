/// Default tile size for dirty tracking on accumulation buffers.
pub const DEFAULT_TILE_SIZE: u32 = 128;

/// Buffer-space position the anchor is always drawn at.
pub const WINDOW_CENTER: glam::Vec2 = glam::Vec2::new(0.5, 0.5);

/// Epsilon for floating point comparisons in geometry code.
pub const GEOMETRY_EPSILON: f32 = 1e-6;

/// Height above a probe point that UV re-queries start from, as a fraction of
/// the probe distance.
pub const PROBE_LIFT: f32 = 0.5;
