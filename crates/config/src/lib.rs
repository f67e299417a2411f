//! Shared configuration for Imprint
//!
//! This crate provides the single source of truth for accumulation buffer
//! resolution, coordinate mode, distortion probing and interactor timing.
//! Configs can be built in code from their defaults or parsed from TOML.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default accumulation buffer resolution (pixels per side)
pub const DEFAULT_RESOLUTION: u32 = 1024;

/// Default UV channel used for hit queries
pub const DEFAULT_UV_CHANNEL: u32 = 0;

/// Default world-space probe distance for distortion estimation
pub const DEFAULT_PROBE_DISTANCE: f32 = 1.0;

/// Default interval between interactor traces, in seconds
pub const DEFAULT_TICK_INTERVAL: f32 = 0.05;

/// Default maximum trace distance below the interactor pivot
pub const DEFAULT_MAX_DISTANCE: f32 = 70.0;

/// Default hole size in world units
pub const DEFAULT_HOLE_SIZE: f32 = 30.0;

/// Largest buffer resolution accepted by [`BindingConfig::validate`]
pub const MAX_RESOLUTION: u32 = 8192;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid buffer resolution: {0} (expected 1..={max})", max = MAX_RESOLUTION)]
    InvalidResolution(u32),
    #[error("Invalid max render extent: {0}")]
    InvalidRenderExtent(f32),
    #[error("Invalid probe distance: {0}")]
    InvalidProbeDistance(f32),
    #[error("Invalid tick interval: {0}")]
    InvalidTickInterval(f32),
    #[error("Invalid trace direction: {0:?}")]
    InvalidTraceDirection([f32; 3]),
}

/// How overlapping stamps combine in the accumulation buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Keep the deeper of the existing value and the stamp
    #[default]
    Max,
    /// Add the stamp onto the existing value, clamped to 1.0
    Additive,
}

/// Relationship between surface UV space and buffer space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoordinateMode {
    /// The whole 0-1 UV range maps onto the buffer
    #[default]
    Bounded,
    /// The buffer is a window following the anchor actor.
    /// `max_render_extent` is the real-world size the window covers.
    Unbounded { max_render_extent: f32 },
}

impl CoordinateMode {
    /// Whether this mode scrolls with an anchor
    pub fn is_unbounded(&self) -> bool {
        matches!(self, CoordinateMode::Unbounded { .. })
    }
}

/// Configuration for one surface binding
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct BindingConfig {
    /// Buffer resolution in pixels per side
    pub resolution: u32,
    /// Coordinate mode
    pub mode: CoordinateMode,
    /// UV channel hit queries should report
    pub uv_channel: u32,
    /// Whether stamp rotation is honoured (otherwise stamps are axis aligned)
    pub rotation_supported: bool,
    /// Accumulation blend
    pub blend_mode: BlendMode,
    /// World-space distance used when probing UV distortion
    pub probe_distance: f32,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            mode: CoordinateMode::Bounded,
            uv_channel: DEFAULT_UV_CHANNEL,
            rotation_supported: false,
            blend_mode: BlendMode::Max,
            probe_distance: DEFAULT_PROBE_DISTANCE,
        }
    }
}

impl BindingConfig {
    /// Create a bounded config with the given resolution
    pub fn bounded(resolution: u32) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    /// Create an unbounded (scrolling) config
    pub fn unbounded(resolution: u32, max_render_extent: f32) -> Self {
        Self {
            resolution,
            mode: CoordinateMode::Unbounded { max_render_extent },
            ..Default::default()
        }
    }

    /// Size of one buffer pixel in normalized coordinates
    pub fn pixel_size(&self) -> f32 {
        1.0 / self.resolution as f32
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.resolution == 0 || self.resolution > MAX_RESOLUTION {
            return Err(ConfigError::InvalidResolution(self.resolution));
        }
        if let CoordinateMode::Unbounded { max_render_extent } = self.mode
            && (!max_render_extent.is_finite() || max_render_extent <= 0.0)
        {
            return Err(ConfigError::InvalidRenderExtent(max_render_extent));
        }
        if !self.probe_distance.is_finite() || self.probe_distance <= 0.0 {
            return Err(ConfigError::InvalidProbeDistance(self.probe_distance));
        }
        Ok(())
    }
}

/// Configuration for an actor that leaves marks on surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct InteractorConfig {
    /// Seconds between traces
    pub tick_interval: f32,
    /// Max distance to trace from the actor pivot
    pub max_distance: f32,
    /// Hole size in world units (x, y)
    pub hole_size: [f32; 2],
    /// Trace direction in world space
    pub trace_direction: [f32; 3],
    /// Whether this actor centres the scrolling window
    pub is_anchor: bool,
}

impl Default for InteractorConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            max_distance: DEFAULT_MAX_DISTANCE,
            hole_size: [DEFAULT_HOLE_SIZE, DEFAULT_HOLE_SIZE],
            trace_direction: [0.0, 0.0, -1.0],
            is_anchor: false,
        }
    }
}

impl InteractorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_interval.is_finite() || self.tick_interval < 0.0 {
            return Err(ConfigError::InvalidTickInterval(self.tick_interval));
        }
        let [x, y, z] = self.trace_direction;
        if !(x * x + y * y + z * z).is_normal() {
            return Err(ConfigError::InvalidTraceDirection(self.trace_direction));
        }
        Ok(())
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct ImprintConfig {
    pub binding: BindingConfig,
    pub interactor: InteractorConfig,
}

impl ImprintConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.binding.validate()?;
        config.interactor.validate()?;
        Ok(config)
    }
}
