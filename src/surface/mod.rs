// src/surface/mod.rs
// Closed-solid surface mesh builder for spectral line intensity fields
// Extrudes a 2D field into a top surface plus side walls and a flat bottom so
// the slab reads as a solid from every angle, with topology-preserving
// in-place updates for interactive scale changes.
// RELEVANT FILES: src/field.rs, src/intensity.rs, src/render/surface_pass.rs

use crate::field::ScalarField2D;
use crate::intensity::IntensityScale;

/// Footprint of the surface in 3D units. The height scale is half of it.
pub const SURFACE_SIZE: f32 = 400.0;

/// Build parameters for one surface rebuild.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceParams {
    /// Mesh resolution along X. Values below 2 are clamped to 2.
    pub mesh_x_count: usize,
    /// Mesh resolution along Z. Values below 2 are clamped to 2.
    pub mesh_z_count: usize,
    pub scale: IntensityScale,
    /// Shrink the smaller-range axis so the footprint matches the data's
    /// physical aspect ratio. Degenerate ranges fall back to the square
    /// footprint.
    pub preserve_aspect_ratio: bool,
}

impl Default for SurfaceParams {
    fn default() -> Self {
        Self {
            mesh_x_count: 64,
            mesh_z_count: 64,
            scale: IntensityScale::Linear,
            preserve_aspect_ratio: false,
        }
    }
}

/// Owned geometry buffers for one surface solid.
///
/// `texcoords` is parallel to `positions` (one UV per vertex); `indices` is a
/// triangle list. Texture U carries the scaled intensity so a 1D color ramp
/// serves as the material; V is constant.
#[derive(Debug, Default)]
pub struct SurfaceMesh {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
}

impl SurfaceMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Incremental builder that reuses topology across rebuilds.
///
/// As long as the requested mesh resolution is unchanged, rebuilds rewrite
/// vertex positions and texcoords in place and never touch the index buffer;
/// a resolution change or an explicit `invalidate` discards everything. This
/// keeps interactive scale/slider changes allocation-free.
pub struct SurfaceMeshBuilder {
    mesh: Option<SurfaceMesh>,
    last_x_count: usize,
    last_z_count: usize,
    footprint: (f32, f32),
    reused_topology: bool,
}

impl Default for SurfaceMeshBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceMeshBuilder {
    pub fn new() -> Self {
        Self {
            mesh: None,
            last_x_count: 0,
            last_z_count: 0,
            footprint: (SURFACE_SIZE, SURFACE_SIZE),
            reused_topology: false,
        }
    }

    /// Footprint of the last build, `(x_size, z_size)` in 3D units.
    pub fn footprint(&self) -> (f32, f32) {
        self.footprint
    }

    /// Whether the last `build` kept the previous index buffer.
    pub fn reused_topology(&self) -> bool {
        self.reused_topology
    }

    pub fn mesh(&self) -> Option<&SurfaceMesh> {
        self.mesh.as_ref()
    }

    /// Drop the cached mesh, forcing a full rebuild on the next `build`.
    pub fn invalidate(&mut self) {
        self.mesh = None;
        self.last_x_count = 0;
        self.last_z_count = 0;
    }

    /// Build or update the surface solid from `field`.
    pub fn build(&mut self, field: &ScalarField2D, params: &SurfaceParams) -> &SurfaceMesh {
        let mesh_x = params.mesh_x_count.max(2);
        let mesh_z = params.mesh_z_count.max(2);

        self.footprint = compute_footprint(field, params.preserve_aspect_ratio);

        let reuse = self.mesh.is_some() && self.last_x_count == mesh_x && self.last_z_count == mesh_z;
        self.reused_topology = reuse;

        if reuse {
            let mesh = self.mesh.as_mut().unwrap();
            write_vertices(mesh, field, mesh_x, mesh_z, self.footprint, params.scale);
        } else {
            let mut mesh = SurfaceMesh::default();
            write_vertices(&mut mesh, field, mesh_x, mesh_z, self.footprint, params.scale);
            mesh.indices = build_faces(mesh_x, mesh_z);
            self.mesh = Some(mesh);
            self.last_x_count = mesh_x;
            self.last_z_count = mesh_z;
        }

        self.mesh.as_ref().unwrap()
    }
}

fn compute_footprint(field: &ScalarField2D, preserve_aspect_ratio: bool) -> (f32, f32) {
    let mut x_size = SURFACE_SIZE;
    let mut z_size = SURFACE_SIZE;

    if preserve_aspect_ratio {
        let (x_range, z_range) = field.axis_ranges();
        let aspect = if x_range != 0.0 && z_range != 0.0 {
            x_range / z_range
        } else {
            1.0
        };
        if aspect > 1.0 {
            z_size = SURFACE_SIZE / aspect;
        } else {
            x_size = SURFACE_SIZE * aspect;
        }
    }

    (x_size, z_size)
}

/// Map a mesh index to its source sample index (integer-ratio subsampling).
#[inline]
fn src_index(i: usize, mesh_count: usize, full_count: usize) -> usize {
    if mesh_count == full_count {
        i
    } else {
        i * (full_count - 1) / (mesh_count - 1)
    }
}

fn scaled_intensity(
    field: &ScalarField2D,
    scale: IntensityScale,
    src_x: usize,
    src_z: usize,
) -> f32 {
    scale.apply(field.normalized_intensity(src_x, src_z))
}

/// Rewrite positions and texcoords for the full solid. Vertex order is
/// surface rows, then front/back wall pairs per X sample, then left/right
/// wall pairs per Z sample, then the four bottom corners; `build_faces`
/// depends on this order.
fn write_vertices(
    mesh: &mut SurfaceMesh,
    field: &ScalarField2D,
    mesh_x: usize,
    mesh_z: usize,
    footprint: (f32, f32),
    scale: IntensityScale,
) {
    let full_x = field.x_count();
    let full_z = field.z_count();
    let (x_size, z_size) = footprint;

    let x_scale = x_size / (mesh_x - 1) as f32;
    let z_scale = z_size / (mesh_z - 1) as f32;
    let y_scale = SURFACE_SIZE * 0.5;

    let total = mesh_x * mesh_z + mesh_x * 4 + mesh_z * 4 + 4;
    mesh.positions.clear();
    mesh.positions.reserve(total);
    mesh.texcoords.clear();
    mesh.texcoords.reserve(total);

    // Top surface grid.
    for z in 0..mesh_z {
        let src_z = src_index(z, mesh_z, full_z);
        let z_pos = z as f32 * z_scale;
        for x in 0..mesh_x {
            let src_x = src_index(x, mesh_x, full_x);
            let scaled = scaled_intensity(field, scale, src_x, src_z);
            mesh.positions.push([x as f32 * x_scale, scaled * y_scale, z_pos]);
            mesh.texcoords.push([scaled, 0.5]);
        }
    }

    let src_z_back = src_index(mesh_z - 1, mesh_z, full_z);
    let src_x_right = src_index(mesh_x - 1, mesh_x, full_x);

    // Front/back walls: top vertex duplicates the rim sample, bottom vertex
    // pins to the base plane with texcoord 0.
    for x in 0..mesh_x {
        let src_x = src_index(x, mesh_x, full_x);
        let x_pos = x as f32 * x_scale;

        let front = scaled_intensity(field, scale, src_x, 0);
        mesh.positions.push([x_pos, front * y_scale, 0.0]);
        mesh.texcoords.push([front, 0.5]);
        mesh.positions.push([x_pos, 0.0, 0.0]);
        mesh.texcoords.push([0.0, 0.5]);

        let back = scaled_intensity(field, scale, src_x, src_z_back);
        mesh.positions.push([x_pos, back * y_scale, z_size]);
        mesh.texcoords.push([back, 0.5]);
        mesh.positions.push([x_pos, 0.0, z_size]);
        mesh.texcoords.push([0.0, 0.5]);
    }

    // Left/right walls.
    for z in 0..mesh_z {
        let src_z = src_index(z, mesh_z, full_z);
        let z_pos = z as f32 * z_scale;

        let left = scaled_intensity(field, scale, 0, src_z);
        mesh.positions.push([0.0, left * y_scale, z_pos]);
        mesh.texcoords.push([left, 0.5]);
        mesh.positions.push([0.0, 0.0, z_pos]);
        mesh.texcoords.push([0.0, 0.5]);

        let right = scaled_intensity(field, scale, src_x_right, src_z);
        mesh.positions.push([x_size, right * y_scale, z_pos]);
        mesh.texcoords.push([right, 0.5]);
        mesh.positions.push([x_size, 0.0, z_pos]);
        mesh.texcoords.push([0.0, 0.5]);
    }

    // Bottom corners.
    mesh.positions.push([0.0, 0.0, 0.0]);
    mesh.texcoords.push([0.0, 0.5]);
    mesh.positions.push([x_size, 0.0, 0.0]);
    mesh.texcoords.push([0.0, 0.5]);
    mesh.positions.push([x_size, 0.0, z_size]);
    mesh.texcoords.push([0.0, 0.5]);
    mesh.positions.push([0.0, 0.0, z_size]);
    mesh.texcoords.push([0.0, 0.5]);
}

fn build_faces(mesh_x: usize, mesh_z: usize) -> Vec<u32> {
    let surface_faces = (mesh_x - 1) * (mesh_z - 1) * 2;
    let wall_faces = ((mesh_x - 1) * 2 + (mesh_z - 1) * 2) * 2;
    let mut indices = Vec::with_capacity((surface_faces + wall_faces + 2) * 3);

    // Top surface: two triangles per quad.
    for z in 0..mesh_z - 1 {
        let row = (z * mesh_x) as u32;
        let next_row = ((z + 1) * mesh_x) as u32;
        for x in 0..mesh_x - 1 {
            let p00 = row + x as u32;
            let p10 = p00 + 1;
            let p01 = next_row + x as u32;
            let p11 = p01 + 1;
            indices.extend_from_slice(&[p00, p10, p11, p00, p11, p01]);
        }
    }

    let wall_base = (mesh_x * mesh_z) as u32;

    // Front wall.
    for x in 0..mesh_x as u32 - 1 {
        let top_left = wall_base + x * 4;
        let bottom_left = top_left + 1;
        let top_right = wall_base + (x + 1) * 4;
        let bottom_right = top_right + 1;
        indices.extend_from_slice(&[
            top_left,
            bottom_left,
            bottom_right,
            top_left,
            bottom_right,
            top_right,
        ]);
    }

    // Back wall (reversed winding so it faces outward).
    let back_base = wall_base + 2;
    for x in 0..mesh_x as u32 - 1 {
        let top_left = back_base + x * 4;
        let bottom_left = top_left + 1;
        let top_right = back_base + (x + 1) * 4;
        let bottom_right = top_right + 1;
        indices.extend_from_slice(&[
            top_left,
            top_right,
            bottom_right,
            top_left,
            bottom_right,
            bottom_left,
        ]);
    }

    // Left wall.
    let side_base = wall_base + mesh_x as u32 * 4;
    for z in 0..mesh_z as u32 - 1 {
        let top_left = side_base + z * 4;
        let bottom_left = top_left + 1;
        let top_right = side_base + (z + 1) * 4;
        let bottom_right = top_right + 1;
        indices.extend_from_slice(&[
            top_left,
            top_right,
            bottom_right,
            top_left,
            bottom_right,
            bottom_left,
        ]);
    }

    // Right wall.
    let right_base = side_base + 2;
    for z in 0..mesh_z as u32 - 1 {
        let top_left = right_base + z * 4;
        let bottom_left = top_left + 1;
        let top_right = right_base + (z + 1) * 4;
        let bottom_right = top_right + 1;
        indices.extend_from_slice(&[
            top_left,
            bottom_left,
            bottom_right,
            top_left,
            bottom_right,
            top_right,
        ]);
    }

    // Bottom cap.
    let bottom_base = wall_base + (mesh_x * 4 + mesh_z * 4) as u32;
    indices.extend_from_slice(&[
        bottom_base,
        bottom_base + 1,
        bottom_base + 2,
        bottom_base,
        bottom_base + 2,
        bottom_base + 3,
    ]);

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_field(value: f32, x: usize, z: usize) -> ScalarField2D {
        ScalarField2D::new(vec![value; x * z], x, z).unwrap()
    }

    #[test]
    fn vertex_and_face_counts() {
        // Uniform fields normalize to 0.5 regardless of value.
        let field = uniform_field(1.0, 8, 6);
        let mut builder = SurfaceMeshBuilder::new();
        let mesh = builder.build(
            &field,
            &SurfaceParams {
                mesh_x_count: 8,
                mesh_z_count: 6,
                ..Default::default()
            },
        );
        let expected_vertices = 8 * 6 + 8 * 4 + 6 * 4 + 4;
        assert_eq!(mesh.vertex_count(), expected_vertices);
        assert_eq!(mesh.texcoords.len(), mesh.positions.len());
        let expected_faces = 7 * 5 * 2 + (7 * 2 + 5 * 2) * 2 + 2;
        assert_eq!(mesh.triangle_count(), expected_faces);
        let max = mesh.indices.iter().copied().max().unwrap() as usize;
        assert!(max < mesh.vertex_count());
    }

    #[test]
    fn mesh_count_one_is_clamped() {
        let field = uniform_field(1.0, 4, 4);
        let mut builder = SurfaceMeshBuilder::new();
        let mesh = builder.build(
            &field,
            &SurfaceParams {
                mesh_x_count: 1,
                mesh_z_count: 1,
                ..Default::default()
            },
        );
        assert_eq!(mesh.vertex_count(), 2 * 2 + 2 * 4 + 2 * 4 + 4);
    }

    #[test]
    fn degenerate_range_keeps_square_footprint() {
        let field = ScalarField2D::with_axes(
            vec![0.0, 1.0, 0.0, 1.0],
            2,
            2,
            vec![5.0, 5.0], // zero x range
            vec![0.0, 1.0],
        )
        .unwrap();
        let mut builder = SurfaceMeshBuilder::new();
        builder.build(
            &field,
            &SurfaceParams {
                mesh_x_count: 2,
                mesh_z_count: 2,
                preserve_aspect_ratio: true,
                ..Default::default()
            },
        );
        assert_eq!(builder.footprint(), (SURFACE_SIZE, SURFACE_SIZE));
    }

    #[test]
    fn aspect_ratio_shrinks_smaller_axis() {
        let field = ScalarField2D::with_axes(
            vec![0.0, 1.0, 0.0, 1.0],
            2,
            2,
            vec![0.0, 200.0],
            vec![0.0, 100.0],
        )
        .unwrap();
        let mut builder = SurfaceMeshBuilder::new();
        builder.build(
            &field,
            &SurfaceParams {
                mesh_x_count: 2,
                mesh_z_count: 2,
                preserve_aspect_ratio: true,
                ..Default::default()
            },
        );
        let (x_size, z_size) = builder.footprint();
        assert_eq!(x_size, SURFACE_SIZE);
        assert_eq!(z_size, SURFACE_SIZE / 2.0);
    }
}
