//! PNG encoding for snapshot export.
//!
//! Readback buffers arrive tightly packed; everything row-padded must be
//! unpadded before reaching these functions.

use anyhow::{ensure, Context, Result};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write an RGBA8 snapshot (8-bit, alpha preserved).
pub fn write_png_rgba8(path: &Path, data: &[u8], width: u32, height: u32) -> Result<()> {
    write_png(path, data, width, height, ExtendedColorType::Rgba8, 4)
}

/// Write an RGB8 snapshot (8-bit, no alpha), the video-frame flavor.
pub fn write_png_rgb8(path: &Path, data: &[u8], width: u32, height: u32) -> Result<()> {
    write_png(path, data, width, height, ExtendedColorType::Rgb8, 3)
}

fn write_png(
    path: &Path,
    data: &[u8],
    width: u32,
    height: u32,
    color: ExtendedColorType,
    channels: usize,
) -> Result<()> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(channels))
        .context("image dimensions overflow when computing buffer size")?;

    ensure!(
        data.len() == expected,
        "PNG writer requires a tight {}x{} buffer with {} channels: expected {} bytes, got {}",
        width,
        height,
        channels,
        expected,
        data.len()
    );

    let file = File::create(path)
        .with_context(|| format!("failed to create output PNG at {}", path.display()))?;

    let encoder = PngEncoder::new_with_quality(
        BufWriter::new(file),
        CompressionType::Fast,
        FilterType::NoFilter,
    );
    encoder
        .write_image(data, width, height, color)
        .context("failed to encode PNG")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_buffers() {
        let path = std::env::temp_dir().join("helioviz_bad_snapshot.png");
        let result = write_png_rgba8(&path, &[0u8; 8], 2, 2);
        assert!(result.is_err());
    }

    #[test]
    fn writes_tight_rgb_buffer() {
        let path = std::env::temp_dir().join("helioviz_rgb_snapshot.png");
        let data = vec![200u8; 2 * 2 * 3];
        write_png_rgb8(&path, &data, 2, 2).unwrap();
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
