// src/field.rs
// Scalar field and disk geometry inputs shared by the surface and shell builders
// Exists to decouple the renderers from whatever processing pipeline produced the data
// RELEVANT FILES: src/surface/mod.rs, src/shell/texture.rs, src/shell/geometry.rs

use crate::error::{RenderError, RenderResult};

/// A rectangular grid of f32 samples with physical axis positions.
///
/// Samples are stored row-major: index `z * x_count + x`. Axis positions may
/// be non-uniformly spaced; only their endpoints matter to aspect-ratio
/// handling. Immutable once constructed, borrowed by builders for the
/// duration of a build call.
#[derive(Debug, Clone)]
pub struct ScalarField2D {
    values: Vec<f32>,
    x_count: usize,
    z_count: usize,
    x_positions: Vec<f32>,
    z_positions: Vec<f32>,
    min: f32,
    max: f32,
}

impl ScalarField2D {
    /// Create a field with implicit unit-spaced axes.
    pub fn new(values: Vec<f32>, x_count: usize, z_count: usize) -> RenderResult<Self> {
        let x_positions = (0..x_count).map(|i| i as f32).collect();
        let z_positions = (0..z_count).map(|i| i as f32).collect();
        Self::with_axes(values, x_count, z_count, x_positions, z_positions)
    }

    /// Create a field with explicit axis positions.
    pub fn with_axes(
        values: Vec<f32>,
        x_count: usize,
        z_count: usize,
        x_positions: Vec<f32>,
        z_positions: Vec<f32>,
    ) -> RenderResult<Self> {
        if x_count == 0 || z_count == 0 {
            return Err(RenderError::field("field dimensions must be non-zero"));
        }
        if values.len() != x_count * z_count {
            return Err(RenderError::field(format!(
                "expected {} samples for a {}x{} field, got {}",
                x_count * z_count,
                x_count,
                z_count,
                values.len()
            )));
        }
        if x_positions.len() != x_count || z_positions.len() != z_count {
            return Err(RenderError::field("axis position arrays must match grid counts"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::field("field contains non-finite samples"));
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in &values {
            min = min.min(v);
            max = max.max(v);
        }

        Ok(Self {
            values,
            x_count,
            z_count,
            x_positions,
            z_positions,
            min,
            max,
        })
    }

    pub fn x_count(&self) -> usize {
        self.x_count
    }

    pub fn z_count(&self) -> usize {
        self.z_count
    }

    pub fn x_positions(&self) -> &[f32] {
        &self.x_positions
    }

    pub fn z_positions(&self) -> &[f32] {
        &self.z_positions
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// Raw sample at (x, z).
    #[inline]
    pub fn value(&self, x: usize, z: usize) -> f32 {
        debug_assert!(x < self.x_count && z < self.z_count);
        self.values[z * self.x_count + x]
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Sample normalized against the whole-field min/max, clamped to [0, 1].
    /// A degenerate range maps everything to 0.5.
    #[inline]
    pub fn normalized_intensity(&self, x: usize, z: usize) -> f32 {
        let range = self.max - self.min;
        if range <= f32::EPSILON {
            return 0.5;
        }
        ((self.value(x, z) - self.min) / range).clamp(0.0, 1.0)
    }

    /// Physical extent of each axis, `(x_range, z_range)`.
    pub fn axis_ranges(&self) -> (f32, f32) {
        let xr = self.x_positions[self.x_count - 1] - self.x_positions[0];
        let zr = self.z_positions[self.z_count - 1] - self.z_positions[0];
        (xr, zr)
    }
}

/// Fitted solar disk ellipse in source-image pixel space.
///
/// Output of an external disk-fitting step; read-only here. Used to map a
/// hemisphere's normalized surface coordinates back into pixel-fraction
/// texture space so the disk wraps correctly regardless of where it sits in
/// the source frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskEllipse {
    pub center_x: f32,
    pub center_y: f32,
    pub semi_axis_x: f32,
    pub semi_axis_y: f32,
}

impl DiskEllipse {
    pub fn new(center_x: f32, center_y: f32, semi_axis_x: f32, semi_axis_y: f32) -> Self {
        Self {
            center_x,
            center_y,
            semi_axis_x,
            semi_axis_y,
        }
    }

    /// The disk UV frame for an image of the given size:
    /// `(center_u, center_v, radius_u, radius_v)` in pixel fractions.
    pub fn uv_frame(&self, image_width: u32, image_height: u32) -> (f32, f32, f32, f32) {
        (
            self.center_x / image_width as f32,
            self.center_y / image_height as f32,
            self.semi_axis_x / image_width as f32,
            self.semi_axis_y / image_height as f32,
        )
    }

    /// Whether an image pixel lies inside the ellipse.
    #[inline]
    pub fn contains(&self, x: f32, y: f32) -> bool {
        let dx = (x - self.center_x) / self.semi_axis_x;
        let dy = (y - self.center_y) / self.semi_axis_y;
        dx * dx + dy * dy <= 1.0
    }

    /// Fallback frame covering the whole image, used when no fit is available.
    pub fn covering(image_width: u32, image_height: u32) -> Self {
        Self {
            center_x: image_width as f32 / 2.0,
            center_y: image_height as f32 / 2.0,
            semi_axis_x: image_width as f32 / 2.0,
            semi_axis_y: image_height as f32 / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_sample_count_mismatch() {
        let r = ScalarField2D::new(vec![0.0; 5], 2, 3);
        assert!(r.is_err());
    }

    #[test]
    fn rejects_non_finite() {
        let r = ScalarField2D::new(vec![0.0, f32::NAN, 0.0, 0.0], 2, 2);
        assert!(r.is_err());
    }

    #[test]
    fn normalizes_over_full_range() {
        let f = ScalarField2D::new(vec![1.0, 2.0, 3.0, 5.0], 2, 2).unwrap();
        assert_eq!(f.normalized_intensity(0, 0), 0.0);
        assert_eq!(f.normalized_intensity(1, 1), 1.0);
        assert!((f.normalized_intensity(1, 0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn constant_field_maps_to_half() {
        let f = ScalarField2D::new(vec![3.0; 4], 2, 2).unwrap();
        assert_eq!(f.normalized_intensity(0, 1), 0.5);
    }

    #[test]
    fn ellipse_uv_frame() {
        let e = DiskEllipse::new(100.0, 50.0, 40.0, 30.0);
        let (cu, cv, ru, rv) = e.uv_frame(200, 100);
        assert_eq!((cu, cv, ru, rv), (0.5, 0.5, 0.2, 0.3));
        assert!(e.contains(100.0, 50.0));
        assert!(!e.contains(150.0, 50.0));
    }
}
