//! Imprint - texture-space displacement accumulation for deformable surfaces
//!
//! Actors touching a surface (feet in snow, wheels in mud) leave marks that
//! are composited into a per-surface accumulation buffer:
//! - [`binding::SurfaceBinding`] - One surface bound to its buffer; runs stamps
//! - [`mapping`] - Surface UV to buffer coordinates (bounded or scrolling window)
//! - [`distortion`] - Sizes stamps in world units on non-uniform UV layouts
//! - [`scroll`] - Window recentring around the anchor actor
//! - [`compositor`] - Draws shapes into buffers ([`compositor::CpuCompositor`])
//! - [`collision`] - Surface queries ([`collision::MeshCollider`])
//! - [`buffer`] - Accumulation storage with dirty tile tracking
//! - [`shape`] - Stamp masks and the shape library
//! - [`interactor`] - Rate-limited trace-and-stamp driver for actors

pub mod binding;
pub mod buffer;
pub mod collision;
pub mod compositor;
pub mod constants;
pub mod distortion;
pub mod error;
pub mod interactor;
pub mod mapping;
pub mod scroll;
pub mod shape;
pub mod types;

pub use binding::*;
pub use buffer::*;
pub use collision::*;
pub use compositor::*;
pub use constants::*;
pub use distortion::*;
pub use error::*;
pub use interactor::*;
pub use mapping::*;
pub use scroll::*;
pub use shape::*;
pub use types::*;

pub use imprint_config::{
    BindingConfig, BlendMode, ConfigError, CoordinateMode, ImprintConfig, InteractorConfig,
};
