// src/shell/geometry.rs
// Hemisphere and prominence-band geometry for tomography shells
// Rasterizes the unit disk on a fixed grid and projects it onto the front
// hemisphere, producing retained vertex/index buffers rather than per-frame
// immediate geometry.
// RELEVANT FILES: src/shell/texture.rs, src/render/sphere_pass.rs

use bytemuck::{Pod, Zeroable};

/// Grid divisions used to rasterize the unit disk.
pub const SPHERE_DIVISIONS: u32 = 256;
/// Radius of the base (innermost) shell in scene units.
pub const BASE_RADIUS: f32 = 0.8;
/// The prominence band samples the image annulus out to this multiple of
/// the disk radius.
pub const PROMINENCE_MAX_EXTENT: f32 = 1.25;
/// Angular and radial tessellation of the prominence band.
pub const PROMINENCE_ANGULAR_DIVISIONS: u32 = SPHERE_DIVISIONS * 2;
pub const PROMINENCE_RADIAL_STEPS: u32 = 8;

/// Scene-space radius of a shell after radial exaggeration.
///
/// Exaggeration spreads the shells apart around the base radius so thin
/// spectral steps stay distinguishable.
#[inline]
pub fn shell_radius(normalized_radius: f32, radial_exaggeration: f32) -> f32 {
    BASE_RADIUS * (1.0 + (normalized_radius - 1.0) * radial_exaggeration)
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct TexturedVertex {
    pub position: [f32; 3],
    pub uv: [f32; 2],
}

/// Retained triangle-list buffers for one shell or band.
#[derive(Debug, Default)]
pub struct ShellGeometry {
    pub vertices: Vec<TexturedVertex>,
    pub indices: Vec<u32>,
}

impl ShellGeometry {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn push_quad(&mut self, corners: [TexturedVertex; 4]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&corners);
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Build the front hemisphere for one shell.
///
/// The unit square [-1,1]^2 is walked on a `divisions` grid; cells entirely
/// outside the unit disk are skipped, vertices outside are clamped radially
/// onto the circle at z = 0, and inside vertices lift to z = sqrt(1-x^2-y^2).
/// UVs map the *unclamped* grid coordinates through the disk frame so the
/// texture edge lands exactly on the limb.
pub fn build_hemisphere(
    radius: f32,
    uv_frame: (f32, f32, f32, f32),
    divisions: u32,
) -> ShellGeometry {
    let (center_u, center_v, radius_u, radius_v) = uv_frame;
    let mut geometry = ShellGeometry::default();
    let step = 2.0 / divisions as f32;

    for i in 0..divisions {
        for j in 0..divisions {
            let nx1 = -1.0 + i as f32 * step;
            let ny1 = -1.0 + j as f32 * step;
            let nx2 = -1.0 + (i + 1) as f32 * step;
            let ny2 = -1.0 + (j + 1) as f32 * step;

            let corners = [(nx1, ny1), (nx2, ny1), (nx2, ny2), (nx1, ny2)];
            if corners.iter().all(|&(x, y)| x * x + y * y > 1.0) {
                continue;
            }

            let quad = corners.map(|(nx, ny)| {
                let r_sq = nx * nx + ny * ny;
                let (px, py, z) = if r_sq >= 1.0 {
                    let clamp = 1.0 / r_sq.sqrt();
                    (nx * clamp, ny * clamp, 0.0)
                } else {
                    (nx, ny, (1.0 - r_sq).sqrt())
                };
                TexturedVertex {
                    position: [px * radius, py * radius, z * radius],
                    uv: [center_u + nx * radius_u, center_v - ny * radius_v],
                }
            });

            geometry.push_quad(quad);
        }
    }

    geometry
}

/// Build the flat prominence ring just in front of the limb plane.
///
/// Samples the source image annulus from the disk edge out to
/// `PROMINENCE_MAX_EXTENT`; quads whose UVs leave the texture are skipped,
/// so a disk near the frame border simply loses the out-of-frame arc.
pub fn build_prominence_band(radius: f32, uv_frame: (f32, f32, f32, f32)) -> ShellGeometry {
    let (center_u, center_v, radius_u, radius_v) = uv_frame;
    let mut geometry = ShellGeometry::default();

    let z_offset = 0.01 * radius;

    for i in 0..PROMINENCE_ANGULAR_DIVISIONS {
        let angle1 = std::f32::consts::TAU * i as f32 / PROMINENCE_ANGULAR_DIVISIONS as f32;
        let angle2 = std::f32::consts::TAU * (i + 1) as f32 / PROMINENCE_ANGULAR_DIVISIONS as f32;
        let (sin1, cos1) = angle1.sin_cos();
        let (sin2, cos2) = angle2.sin_cos();

        for j in 0..PROMINENCE_RADIAL_STEPS {
            let t1 = j as f32 / PROMINENCE_RADIAL_STEPS as f32;
            let t2 = (j + 1) as f32 / PROMINENCE_RADIAL_STEPS as f32;

            let img_r1 = 1.0 + t1 * (PROMINENCE_MAX_EXTENT - 1.0);
            let img_r2 = 1.0 + t2 * (PROMINENCE_MAX_EXTENT - 1.0);

            let uvs = [
                (cos1, sin1, img_r1),
                (cos2, sin2, img_r1),
                (cos2, sin2, img_r2),
                (cos1, sin1, img_r2),
            ]
            .map(|(cos_a, sin_a, img_r)| {
                [
                    center_u + cos_a * img_r * radius_u,
                    center_v - sin_a * img_r * radius_v,
                ]
            });

            if uvs
                .iter()
                .any(|uv| uv[0] < 0.0 || uv[0] > 1.0 || uv[1] < 0.0 || uv[1] > 1.0)
            {
                continue;
            }

            let positions = [
                (cos1, sin1, img_r1),
                (cos2, sin2, img_r1),
                (cos2, sin2, img_r2),
                (cos1, sin1, img_r2),
            ]
            .map(|(cos_a, sin_a, img_r)| {
                let r = radius * img_r;
                [cos_a * r, sin_a * r, z_offset]
            });

            geometry.push_quad([
                TexturedVertex {
                    position: positions[0],
                    uv: uvs[0],
                },
                TexturedVertex {
                    position: positions[1],
                    uv: uvs[1],
                },
                TexturedVertex {
                    position: positions[2],
                    uv: uvs[2],
                },
                TexturedVertex {
                    position: positions[3],
                    uv: uvs[3],
                },
            ]);
        }
    }

    geometry
}
