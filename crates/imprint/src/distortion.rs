//! UV distortion estimation for world-sized stamps.
//!
//! UV density is rarely uniform across a mesh. To draw a stamp that is `S`
//! world units wide in every direction, the estimator probes the surface at
//! two orthogonal tangent offsets around the hit, measures how far the UVs
//! move along each axis, and derives a per-axis footprint in UV units.
//!
//! The correction always scales the stretched axis up, never the other one
//! down, so a mark never covers less than its requested size.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::collision::CollisionQuery;
use crate::constants::{GEOMETRY_EPSILON, PROBE_LIFT};
use crate::error::ImprintError;
use crate::types::SurfaceHit;

/// Footprint estimate for one stamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionEstimate {
    /// Footprint size in surface UV units (x = U, y = V)
    pub scale: Vec2,
    /// Ratio of U density to V density (1.0 = isotropic)
    pub u_scale: f32,
    /// Isotropic magnitude before the per-axis correction
    pub base_magnitude: Vec2,
}

/// Build two unit tangents at a surface point.
///
/// `A = normalize(seed × normal)` and `B = normalize(A × normal)`, where the
/// seed is the world axis least aligned with the normal. A and B are
/// orthogonal to each other and to the normal.
pub fn tangent_probes(normal: Vec3) -> Result<(Vec3, Vec3), ImprintError> {
    let n = normal
        .try_normalize()
        .ok_or(ImprintError::DegenerateSurface("zero-length surface normal"))?;

    let seed = if n.x.abs() < n.y.abs() {
        if n.x.abs() < n.z.abs() { Vec3::X } else { Vec3::Z }
    } else if n.y.abs() < n.z.abs() {
        Vec3::Y
    } else {
        Vec3::Z
    };

    let a = seed
        .cross(n)
        .try_normalize()
        .ok_or(ImprintError::DegenerateSurface("probe tangent collapsed"))?;
    let b = a
        .cross(n)
        .try_normalize()
        .ok_or(ImprintError::DegenerateSurface("probe bitangent collapsed"))?;

    Ok((a, b))
}

/// Turn two probe UV deltas into a per-axis footprint.
///
/// `uv_diff_a` and `uv_diff_b` are the UV offsets observed `probe_distance`
/// world units along the two tangents. Probe A is normally the one that
/// follows U. When the UV layout is turned so that B follows U instead, the
/// roles swap.
pub fn correct_footprint(
    uv_diff_a: Vec2,
    uv_diff_b: Vec2,
    world_size: Vec2,
    probe_distance: f32,
) -> Result<DistortionEstimate, ImprintError> {
    // Pair each probe with the UV axis it moves the most
    let straight = (uv_diff_a.x * uv_diff_b.y).abs();
    let swapped = (uv_diff_b.x * uv_diff_a.y).abs();
    let (u_probe, v_probe, area) = if straight >= swapped {
        (uv_diff_a, uv_diff_b, straight)
    } else {
        (uv_diff_b, uv_diff_a, swapped)
    };

    // Both probes landing on one UV line means the mapping collapsed here
    if area <= GEOMETRY_EPSILON * uv_diff_a.length() * uv_diff_b.length() {
        return Err(ImprintError::DegenerateSurface("tangent UVs are collinear"));
    }

    let u_scale = (u_probe.x / v_probe.y).abs();
    if !u_scale.is_finite() {
        return Err(ImprintError::DegenerateSurface("UV distortion is not finite"));
    }

    let mut corrected = u_probe;
    let axis_scale = if u_scale > 1.0 {
        corrected.x /= u_scale;
        Vec2::new(u_scale, 1.0)
    } else {
        corrected.y *= u_scale;
        Vec2::new(1.0, 1.0 / u_scale)
    };

    let base_magnitude = world_size / probe_distance * corrected.length();

    Ok(DistortionEstimate {
        scale: axis_scale * base_magnitude,
        u_scale,
        base_magnitude,
    })
}

/// Probes a surface to size stamps in UV space
#[derive(Debug, Clone, Copy)]
pub struct DistortionEstimator {
    probe_distance: f32,
    channel: u32,
}

impl DistortionEstimator {
    pub fn new(probe_distance: f32, channel: u32) -> Self {
        Self {
            probe_distance,
            channel,
        }
    }

    #[inline]
    pub fn probe_distance(&self) -> f32 {
        self.probe_distance
    }

    /// Estimate the UV footprint of a `world_size` stamp at `hit`
    pub fn estimate<Q: CollisionQuery + ?Sized>(
        &self,
        query: &Q,
        hit: &SurfaceHit,
        world_size: Vec2,
    ) -> Result<DistortionEstimate, ImprintError> {
        if self.probe_distance.is_nan() || self.probe_distance <= 0.0 {
            return Err(ImprintError::DegenerateSurface("probe distance must be positive"));
        }

        let (a, b) = tangent_probes(hit.normal)?;
        let normal = hit.normal.normalize();
        let lift = self.probe_distance * PROBE_LIFT;

        let probe = |direction: Vec3| {
            query.uv_at(
                hit.location + direction * self.probe_distance,
                normal,
                lift,
                self.channel,
            )
        };
        let uv_a = probe(a).ok_or(ImprintError::DegenerateSurface("probe A missed the surface"))?;
        let uv_b = probe(b).ok_or(ImprintError::DegenerateSurface("probe B missed the surface"))?;

        let estimate =
            correct_footprint(uv_a - hit.uv, uv_b - hit.uv, world_size, self.probe_distance)?;

        debug!(
            "DistortionEstimator::estimate: uv=({:.4}, {:.4}) u_scale={:.3} scale=({:.5}, {:.5})",
            hit.uv.x, hit.uv.y, estimate.u_scale, estimate.scale.x, estimate.scale.y
        );

        Ok(estimate)
    }
}
