//! Collision queries against surfaces.
//!
//! [`CollisionQuery`] is what the distortion estimator and the interactor need
//! from a physics system: a ray cast that reports UVs on a chosen channel.
//! [`MeshCollider`] answers it for indexed triangle meshes with the
//! Moller-Trumbore algorithm, interpolating normals and UVs at the hit.

use glam::{Vec2, Vec3};

use crate::constants::GEOMETRY_EPSILON;
use crate::error::ImprintError;
use crate::types::SurfaceHit;

/// Ray queries against a surface
pub trait CollisionQuery {
    /// Cast a ray and return the closest hit within `max_distance`, with UVs
    /// taken from `channel`.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        channel: u32,
    ) -> Option<SurfaceHit>;

    /// UV of the surface near an arbitrary point, found by casting back along
    /// `normal` from `lift` above the point.
    fn uv_at(&self, point: Vec3, normal: Vec3, lift: f32, channel: u32) -> Option<Vec2> {
        let origin = point + normal * lift;
        self.raycast(origin, -normal, lift * 2.0, channel)
            .map(|hit| hit.uv)
    }
}

/// A surface whose size is known at bind time
pub trait SurfaceGeometry: CollisionQuery {
    /// Size of the surface's world-space bounding box
    fn extent(&self) -> Vec3;

    /// Size of the bounding box along its longest axis
    fn largest_extent(&self) -> f32 {
        self.extent().max_element()
    }
}

/// Result of a ray-triangle intersection test
#[derive(Debug, Clone, Copy)]
pub struct TriangleHit {
    /// Distance along the ray to the intersection point
    pub t: f32,
    /// Barycentric coordinate u (weight for vertex 1)
    pub u: f32,
    /// Barycentric coordinate v (weight for vertex 2)
    pub v: f32,
}

/// Moller-Trumbore ray-triangle intersection algorithm.
///
/// Returns the hit distance and barycentric coordinates if the ray intersects
/// the triangle. `ray_dir` should be normalized for `t` to be a distance.
pub fn ray_triangle_intersection(
    ray_origin: Vec3,
    ray_dir: Vec3,
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
) -> Option<TriangleHit> {
    // Edges sharing v0
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;

    // Determinant of [-dir, edge1, edge2]
    let pvec = ray_dir.cross(edge2);
    let det = edge1.dot(pvec);

    // Ray parallel to the triangle plane
    if det.abs() < GEOMETRY_EPSILON {
        return None;
    }

    let inv_det = 1.0 / det;
    let tvec = ray_origin - v0;

    // First barycentric coordinate (Cramer's rule)
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    // Second barycentric coordinate, must stay inside the triangle with u
    let qvec = tvec.cross(edge1);
    let v = ray_dir.dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    // Distance along the ray; hits behind the origin are rejected
    let t = edge2.dot(qvec) * inv_det;
    if t < GEOMETRY_EPSILON {
        return None;
    }

    Some(TriangleHit { t, u, v })
}

/// Interpolate a Vec3 attribute using barycentric coordinates.
#[inline]
pub fn interpolate_vec3(v0: Vec3, v1: Vec3, v2: Vec3, u: f32, v: f32) -> Vec3 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Interpolate a Vec2 attribute (like UVs) using barycentric coordinates.
#[inline]
pub fn interpolate_vec2(v0: Vec2, v1: Vec2, v2: Vec2, u: f32, v: f32) -> Vec2 {
    let w = 1.0 - u - v;
    v0 * w + v1 * u + v2 * v
}

/// Static triangle mesh in world space, with any number of UV channels
#[derive(Debug, Clone)]
pub struct MeshCollider {
    positions: Vec<Vec3>,
    /// Triangle indices (3 per triangle)
    indices: Vec<u32>,
    /// Vertex normals (same length as positions, or empty for face normals)
    normals: Vec<Vec3>,
    /// One UV set per channel, each the same length as positions
    uv_channels: Vec<Vec<Vec2>>,
    min: Vec3,
    max: Vec3,
}

impl MeshCollider {
    /// Build a collider, checking that every attribute matches the vertex count
    pub fn new(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Vec<Vec3>,
        uv_channels: Vec<Vec<Vec2>>,
    ) -> Result<Self, ImprintError> {
        if positions.is_empty() || indices.is_empty() || indices.len() % 3 != 0 {
            return Err(ImprintError::DegenerateSurface("mesh has no complete triangles"));
        }
        if indices.iter().any(|&i| i as usize >= positions.len()) {
            return Err(ImprintError::DegenerateSurface("mesh index out of range"));
        }
        if !normals.is_empty() && normals.len() != positions.len() {
            return Err(ImprintError::DegenerateSurface("normal count does not match vertices"));
        }
        if uv_channels.iter().any(|uvs| uvs.len() != positions.len()) {
            return Err(ImprintError::DegenerateSurface("UV count does not match vertices"));
        }

        let (min, max) = positions.iter().fold(
            (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
            |(min, max), &p| (min.min(p), max.max(p)),
        );

        Ok(Self {
            positions,
            indices,
            normals,
            uv_channels,
            min,
            max,
        })
    }

    /// Flat rectangle in the XY plane (normal +Z) centred on `center`, with
    /// UV channel 0 spanning 0-1 over the whole rectangle and `subdivisions`
    /// quads per side.
    pub fn plane(center: Vec3, size: Vec2, subdivisions: u32) -> Self {
        let cells = subdivisions.max(1);
        let verts_per_side = cells + 1;
        let mut positions = Vec::with_capacity((verts_per_side * verts_per_side) as usize);
        let mut uvs = Vec::with_capacity(positions.capacity());

        for j in 0..verts_per_side {
            for i in 0..verts_per_side {
                let uv = Vec2::new(i as f32 / cells as f32, j as f32 / cells as f32);
                let offset = (uv - Vec2::splat(0.5)) * size;
                positions.push(center + Vec3::new(offset.x, offset.y, 0.0));
                uvs.push(uv);
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for j in 0..cells {
            for i in 0..cells {
                let a = j * verts_per_side + i;
                let b = a + 1;
                let c = a + verts_per_side;
                let d = c + 1;
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }

        let normals = vec![Vec3::Z; positions.len()];
        let (min, max) = (center - size.extend(0.0) / 2.0, center + size.extend(0.0) / 2.0);

        Self {
            positions,
            indices,
            normals,
            uv_channels: vec![uvs],
            min,
            max,
        }
    }

    /// Get the number of triangles in the mesh
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of UV channels
    #[inline]
    pub fn uv_channel_count(&self) -> usize {
        self.uv_channels.len()
    }

    /// Append a UV channel. Returns its index, or None if the length does not
    /// match the vertex count.
    pub fn push_uv_channel(&mut self, uvs: Vec<Vec2>) -> Option<u32> {
        if uvs.len() != self.positions.len() {
            return None;
        }
        self.uv_channels.push(uvs);
        Some(self.uv_channels.len() as u32 - 1)
    }

    /// Vertex positions, for building extra UV channels
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    fn triangle_indices(&self, tri_index: usize) -> (usize, usize, usize) {
        let base = tri_index * 3;
        (
            self.indices[base] as usize,
            self.indices[base + 1] as usize,
            self.indices[base + 2] as usize,
        )
    }
}

impl CollisionQuery for MeshCollider {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        channel: u32,
    ) -> Option<SurfaceHit> {
        let uvs = self.uv_channels.get(channel as usize)?;
        let direction = direction.try_normalize()?;

        let mut closest: Option<(TriangleHit, usize)> = None;

        // Brute force over all triangles (consider a BVH for large meshes)
        for tri in 0..self.triangle_count() {
            let (i0, i1, i2) = self.triangle_indices(tri);
            let Some(hit) = ray_triangle_intersection(
                origin,
                direction,
                self.positions[i0],
                self.positions[i1],
                self.positions[i2],
            ) else {
                continue;
            };
            if hit.t > max_distance {
                continue;
            }
            if closest.as_ref().is_none_or(|(prev, _)| hit.t < prev.t) {
                closest = Some((hit, tri));
            }
        }

        let (hit, tri) = closest?;
        let (i0, i1, i2) = self.triangle_indices(tri);

        let normal = if self.normals.is_empty() {
            let (p0, p1, p2) = (self.positions[i0], self.positions[i1], self.positions[i2]);
            (p1 - p0).cross(p2 - p0).normalize_or_zero()
        } else {
            interpolate_vec3(self.normals[i0], self.normals[i1], self.normals[i2], hit.u, hit.v)
                .normalize_or_zero()
        };

        Some(SurfaceHit {
            location: origin + direction * hit.t,
            normal,
            uv: interpolate_vec2(uvs[i0], uvs[i1], uvs[i2], hit.u, hit.v),
        })
    }
}

impl SurfaceGeometry for MeshCollider {
    fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}
