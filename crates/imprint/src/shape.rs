//! Hole shapes and the shape library
//!
//! A [`Shape`] is a grayscale mask in [0,1] describing the depth profile of a
//! single mark. Shapes are shared (`Arc`) so compositors can keep one bound
//! without copying pixel data.

use std::collections::HashMap;
use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identifier of a registered shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub u32);

/// Grayscale stamp mask
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    width: u32,
    height: u32,
    /// Mask values in row-major order, 0.0 = untouched, 1.0 = full depth
    values: Vec<f32>,
}

impl Shape {
    /// Create a shape from raw values. Returns None if the value count does
    /// not match the dimensions or a dimension is zero.
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 || values.len() != (width as usize) * (height as usize) {
            return None;
        }
        let values = values.into_iter().map(|v| v.clamp(0.0, 1.0)).collect();
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Circular shape with a hardness falloff (0.0 = soft cone, 1.0 = flat disc)
    pub fn disc(size: u32, hardness: f32) -> Self {
        let size = size.max(1);
        let radius = size as f32 / 2.0;
        let mut values = Vec::with_capacity((size * size) as usize);
        for y in 0..size {
            for x in 0..size {
                let dx = (x as f32 + 0.5 - radius) / radius;
                let dy = (y as f32 + 0.5 - radius) / radius;
                let distance = (dx * dx + dy * dy).sqrt();
                let value = if distance > 1.0 {
                    0.0
                } else {
                    calculate_hardness_falloff(distance, hardness)
                };
                values.push(value);
            }
        }
        Self {
            width: size,
            height: size,
            values,
        }
    }

    /// Build a shape from a decoded 8-bit grayscale image
    pub fn from_luma(image: &GrayImage) -> Option<Self> {
        let values = image.pixels().map(|p| p.0[0] as f32 / 255.0).collect();
        Self::new(image.width(), image.height(), values)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    fn texel(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0.0;
        }
        self.values[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Bilinear sample at normalized shape coordinates. Zero outside [0,1]².
    pub fn sample(&self, u: f32, v: f32) -> f32 {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 0.0;
        }
        let fx = u * self.width as f32 - 0.5;
        let fy = v * self.height as f32 - 0.5;
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        // Clamp-to-edge so the mask does not fade at its own border
        let clamp_x = |x: i64| x.clamp(0, self.width as i64 - 1);
        let clamp_y = |y: i64| y.clamp(0, self.height as i64 - 1);

        let a = self.texel(clamp_x(x0), clamp_y(y0));
        let b = self.texel(clamp_x(x0 + 1), clamp_y(y0));
        let c = self.texel(clamp_x(x0), clamp_y(y0 + 1));
        let d = self.texel(clamp_x(x0 + 1), clamp_y(y0 + 1));

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * ty
    }
}

/// Calculate falloff based on hardness
/// distance_normalized is 0 at center, 1 at edge
/// hardness is 0.0 (soft) to 1.0 (hard)
#[inline]
pub fn calculate_hardness_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if hardness >= 1.0 {
        if distance_normalized <= 1.0 { 1.0 } else { 0.0 }
    } else {
        let t = distance_normalized.clamp(0.0, 1.0);
        let soft = 1.0 - t;
        let hardness = hardness.max(0.0);
        soft * (1.0 - hardness) + hardness
    }
}

/// Resolves shape ids to shared shapes
#[derive(Debug, Default, Clone)]
pub struct ShapeLibrary {
    shapes: HashMap<ShapeId, Arc<Shape>>,
    next_id: u32,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shape under a fresh id
    pub fn add(&mut self, shape: Shape) -> ShapeId {
        while self.shapes.contains_key(&ShapeId(self.next_id)) {
            self.next_id += 1;
        }
        let id = ShapeId(self.next_id);
        self.next_id += 1;
        self.insert(id, shape);
        id
    }

    /// Register (or replace) a shape under an explicit id
    pub fn insert(&mut self, id: ShapeId, shape: Shape) {
        debug!(
            "ShapeLibrary::insert: id={} size={}x{}",
            id.0,
            shape.width(),
            shape.height()
        );
        self.shapes.insert(id, Arc::new(shape));
    }

    pub fn get(&self, id: ShapeId) -> Option<&Arc<Shape>> {
        self.shapes.get(&id)
    }

    pub fn remove(&mut self, id: ShapeId) -> Option<Arc<Shape>> {
        self.shapes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}
