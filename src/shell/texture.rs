// src/shell/texture.rs
// CPU-side texture synthesis for tomography shells
// Per-layer normalization, the absorption-driven alpha policy, HSL
// colorization by radial position, bilinear downsampling against device
// texture limits, and the grayscale prominence texture.
// RELEVANT FILES: src/shell/mod.rs, src/shell/geometry.rs, src/render/sphere_pass.rs

use log::debug;

use crate::error::{RenderError, RenderResult};
use crate::field::{DiskEllipse, ScalarField2D};
use crate::shell::{ShellColorMap, ShellDescriptor};

/// Radii closer than this are treated as the same shell layer.
const RADIUS_EPSILON: f32 = 1e-4;
/// Intensity ranges below this degenerate to a constant mid-gray.
const RANGE_EPSILON: f32 = 1e-3;

/// One shell's RGBA8 texture plus the metadata the geometry and compositor
/// stages need.
#[derive(Debug, Clone)]
pub struct ShellTexture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub normalized_radius: f32,
    pub pixel_shift: f32,
    /// Radial position in [0, 1]: 0 = innermost layer, 1 = outermost.
    pub color_position: f32,
    /// Average RGB inside the fitted disk, for legend swatches.
    pub average_color: [f32; 3],
    /// Disk frame in pixel fractions: (center_u, center_v, radius_u, radius_v).
    pub uv_frame: (f32, f32, f32, f32),
    pub is_base: bool,
}

/// Grayscale texture sampled by the prominence band, built from the
/// outermost shell only.
#[derive(Debug, Clone)]
pub struct ProminenceTexture {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// All textures for one render session, shells sorted ascending by radius.
#[derive(Debug)]
pub struct ShellTextureSet {
    pub shells: Vec<ShellTexture>,
    pub prominence: Option<ProminenceTexture>,
}

pub(crate) struct TextureBuildParams {
    pub color_map: ShellColorMap,
    pub use_enhanced: bool,
    pub max_texture_size: Option<u32>,
}

pub(crate) fn build_textures(
    shells: &[ShellDescriptor],
    params: &TextureBuildParams,
) -> RenderResult<ShellTextureSet> {
    if shells.is_empty() {
        return Err(RenderError::field("shell set is empty"));
    }

    let first = shell_field(&shells[0], params.use_enhanced);
    let source_width = first.x_count();
    let source_height = first.z_count();
    for shell in shells {
        let field = shell_field(shell, params.use_enhanced);
        if field.x_count() != source_width || field.z_count() != source_height {
            return Err(RenderError::field(format!(
                "shell at pixel shift {} is {}x{}, expected {}x{}",
                shell.pixel_shift,
                field.x_count(),
                field.z_count(),
                source_width,
                source_height
            )));
        }
    }

    // Uniform downsampling keeps every shell addressable by the same UVs.
    let (width, height) =
        target_texture_size(source_width as u32, source_height as u32, params.max_texture_size);
    if (width, height) != (source_width as u32, source_height as u32) {
        debug!(
            "downscaling shell textures from {}x{} to {}x{} (device limit {:?})",
            source_width, source_height, width, height, params.max_texture_size
        );
    }

    let mut layers: Vec<Vec<f32>> = Vec::with_capacity(shells.len());
    for shell in shells {
        let field = shell_field(shell, params.use_enhanced);
        layers.push(resample(field, width, height));
    }

    let mut min_radius = f32::INFINITY;
    let mut max_radius = f32::NEG_INFINITY;
    let mut outermost = 0;
    for (i, shell) in shells.iter().enumerate() {
        min_radius = min_radius.min(shell.normalized_radius);
        if shell.normalized_radius > max_radius {
            max_radius = shell.normalized_radius;
            outermost = i;
        }
    }
    let mut radius_range = max_radius - min_radius;
    if radius_range < RADIUS_EPSILON {
        radius_range = 1.0;
    }

    let mut built = Vec::with_capacity(shells.len());
    let mut prominence = None;

    for (i, shell) in shells.iter().enumerate() {
        let samples = &layers[i];
        let (layer_min, layer_range) = layer_min_range(samples);
        let is_base = (shell.normalized_radius - min_radius).abs() < RADIUS_EPSILON;
        let color_position = (shell.normalized_radius - min_radius) / radius_range;

        let ellipse = shell
            .ellipse
            .unwrap_or_else(|| DiskEllipse::covering(source_width as u32, source_height as u32));
        let uv_frame = ellipse.uv_frame(source_width as u32, source_height as u32);

        let (pixels, average_color) = shell_pixels(
            samples,
            width,
            height,
            is_base,
            color_position,
            layer_min,
            layer_range,
            uv_frame,
            params.color_map,
        );

        if i == outermost {
            prominence = Some(ProminenceTexture {
                pixels: prominence_pixels(samples, layer_min, layer_range),
                width,
                height,
            });
        }

        built.push(ShellTexture {
            pixels,
            width,
            height,
            normalized_radius: shell.normalized_radius,
            pixel_shift: shell.pixel_shift,
            color_position,
            average_color,
            uv_frame,
            is_base,
        });
    }

    built.sort_by(|a, b| a.normalized_radius.total_cmp(&b.normalized_radius));

    Ok(ShellTextureSet {
        shells: built,
        prominence,
    })
}

fn shell_field<'a>(shell: &'a ShellDescriptor, use_enhanced: bool) -> &'a ScalarField2D {
    if use_enhanced {
        if let Some(enhanced) = &shell.enhanced {
            return enhanced;
        }
    }
    &shell.field
}

fn target_texture_size(width: u32, height: u32, max_size: Option<u32>) -> (u32, u32) {
    match max_size {
        Some(max) if max > 0 && (width > max || height > max) => {
            let scale = (max as f32 / width as f32).min(max as f32 / height as f32);
            ((width as f32 * scale) as u32, (height as f32 * scale) as u32)
        }
        _ => (width, height),
    }
}

/// Field samples at the target resolution, bilinear when shrinking.
fn resample(field: &ScalarField2D, width: u32, height: u32) -> Vec<f32> {
    if width as usize == field.x_count() && height as usize == field.z_count() {
        return field.values().to_vec();
    }
    downsample_bilinear(
        field.values(),
        field.x_count(),
        field.z_count(),
        width as usize,
        height as usize,
    )
}

fn downsample_bilinear(
    source: &[f32],
    source_width: usize,
    source_height: usize,
    target_width: usize,
    target_height: usize,
) -> Vec<f32> {
    let mut result = vec![0.0f32; target_width * target_height];
    let scale_x = source_width as f32 / target_width as f32;
    let scale_y = source_height as f32 / target_height as f32;

    for y in 0..target_height {
        for x in 0..target_width {
            let src_x = x as f32 * scale_x;
            let src_y = y as f32 * scale_y;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(source_width - 1);
            let y1 = (y0 + 1).min(source_height - 1);

            let fx = src_x - x0 as f32;
            let fy = src_y - y0 as f32;

            let v00 = source[y0 * source_width + x0];
            let v10 = source[y0 * source_width + x1];
            let v01 = source[y1 * source_width + x0];
            let v11 = source[y1 * source_width + x1];

            result[y * target_width + x] = (1.0 - fx) * (1.0 - fy) * v00
                + fx * (1.0 - fy) * v10
                + (1.0 - fx) * fy * v01
                + fx * fy * v11;
        }
    }

    result
}

fn layer_min_range(samples: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in samples {
        min = min.min(v);
        max = max.max(v);
    }
    (min, max - min)
}

#[inline]
fn layer_normalized(raw: f32, layer_min: f32, layer_range: f32) -> f32 {
    if layer_range > RANGE_EPSILON {
        ((raw - layer_min) / layer_range).clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// RGBA8 pixels plus the average in-disk color.
#[allow(clippy::too_many_arguments)]
fn shell_pixels(
    samples: &[f32],
    width: u32,
    height: u32,
    is_base: bool,
    color_position: f32,
    layer_min: f32,
    layer_range: f32,
    uv_frame: (f32, f32, f32, f32),
    color_map: ShellColorMap,
) -> (Vec<u8>, [f32; 3]) {
    let (center_u, center_v, radius_u, radius_v) = uv_frame;
    let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);

    let mut avg = [0.0f64; 3];
    let mut disk_pixels = 0u64;

    for y in 0..height {
        for x in 0..width {
            let raw = samples[(y * width + x) as usize];
            let normalized = layer_normalized(raw, layer_min, layer_range);

            let (r, g, b, alpha) = match color_map {
                ShellColorMap::Mono => {
                    let alpha = if is_base {
                        255
                    } else {
                        // Dark absorption features stay opaque, bright quiet
                        // regions fade out.
                        255 - (normalized * 255.0) as u8
                    };
                    (normalized, normalized, normalized, alpha)
                }
                ShellColorMap::RedToBlue | ShellColorMap::BlueToRed => {
                    let [r, g, b] = colorize(normalized, color_position, color_map);
                    let alpha = if is_base {
                        255
                    } else {
                        // Position-dependent threshold: mid layers stay more
                        // visible than the extremes.
                        let middleness = 1.0 - 2.0 * (color_position - 0.5).abs();
                        let threshold = 0.5 + middleness * 0.2;
                        if normalized < threshold {
                            let darkness = (threshold - normalized) / threshold;
                            (darkness * 255.0) as u8
                        } else {
                            0
                        }
                    };
                    (r, g, b, alpha)
                }
            };

            let du = (x as f32 / width as f32 - center_u) / radius_u;
            let dv = (y as f32 / height as f32 - center_v) / radius_v;
            if du * du + dv * dv <= 1.0 {
                avg[0] += r as f64;
                avg[1] += g as f64;
                avg[2] += b as f64;
                disk_pixels += 1;
            }

            pixels.push((r * 255.0) as u8);
            pixels.push((g * 255.0) as u8);
            pixels.push((b * 255.0) as u8);
            pixels.push(alpha);
        }
    }

    let average_color = if disk_pixels > 0 {
        [
            (avg[0] / disk_pixels as f64) as f32,
            (avg[1] / disk_pixels as f64) as f32,
            (avg[2] / disk_pixels as f64) as f32,
        ]
    } else {
        [0.5, 0.5, 0.5]
    };

    (pixels, average_color)
}

fn prominence_pixels(samples: &[f32], layer_min: f32, layer_range: f32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(samples.len() * 4);
    for &raw in samples {
        let gray = (layer_normalized(raw, layer_min, layer_range) * 255.0) as u8;
        pixels.extend_from_slice(&[gray, gray, gray, 255]);
    }
    pixels
}

/// Intensity and radial position to RGB through HSL.
///
/// Hue spans 240 degrees across the layer stack; lightness stays mid-range
/// so saturation survives.
fn colorize(intensity: f32, layer_position: f32, color_map: ShellColorMap) -> [f32; 3] {
    let position = if color_map == ShellColorMap::BlueToRed {
        1.0 - layer_position
    } else {
        layer_position
    };
    let hue = position * 240.0 / 360.0;
    let saturation = 0.9;
    let lightness = 0.3 + intensity * 0.4;
    hsl_to_rgb(hue, saturation, lightness)
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [f32; 3] {
    if s == 0.0 {
        return [l, l, l];
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    [
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
    ]
}

fn hue_to_rgb(p: f32, q: f32, mut t: f32) -> f32 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        return p + (q - p) * 6.0 * t;
    }
    if t < 1.0 / 2.0 {
        return q;
    }
    if t < 2.0 / 3.0 {
        return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
    }
    p
}
