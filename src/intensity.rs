// src/intensity.rs
// Intensity scale transforms and the shared heat-map gradient
// The same gradient feeds the legend ramp and the surface material LUT,
// so both must go through intensity_to_color / color_ramp_rgba8 only.
// RELEVANT FILES: src/surface/mod.rs, src/render/upload.rs, src/config.rs

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Resolution of the 1D color ramp texture.
pub const RAMP_WIDTH: usize = 256;

/// Available intensity scale modes for surface height and color mapping.
///
/// Every mode maps 0 to 0 and 1 to 1 and is monotonic in between; the log
/// modes compress highlights to lift faint features, log10 more strongly
/// than log2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityScale {
    Linear,
    Square,
    Log2,
    Log10,
}

impl IntensityScale {
    /// Transform a normalized intensity.
    ///
    /// The input must already be clamped to [0, 1]; values outside that
    /// range are a caller bug, not data-dependent, and panic.
    pub fn apply(self, normalized: f32) -> f32 {
        assert!(
            (0.0..=1.0).contains(&normalized),
            "normalized intensity must be in [0, 1], got {normalized}"
        );
        match self {
            IntensityScale::Linear => normalized,
            IntensityScale::Square => normalized * normalized,
            // log2(1 + x): endpoints land exactly on 0 and 1
            IntensityScale::Log2 => normalized.ln_1p() / std::f32::consts::LN_2,
            // log10(1 + 9x): stronger compression than log2
            IntensityScale::Log10 => (1.0 + 9.0 * normalized).log10(),
        }
    }
}

impl FromStr for IntensityScale {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "linear" => Self::Linear,
            "square" => Self::Square,
            "log2" => Self::Log2,
            "log10" => Self::Log10,
            _ => return Err("unknown intensity scale"),
        })
    }
}

/// Map a transformed intensity in [0, 1] to the heat-map gradient.
///
/// Four linear segments with breakpoints at 0.25/0.5/0.75:
/// deep blue through green and red to magenta. Continuous at every
/// breakpoint.
pub fn intensity_to_color(t: f32) -> [f32; 3] {
    let t = t.clamp(0.0, 1.0);
    if t < 0.25 {
        let r = t / 0.25;
        [0.0, r, 1.0 - r * 0.5]
    } else if t < 0.5 {
        let r = (t - 0.25) / 0.25;
        [r, 1.0, 0.5 - r * 0.5]
    } else if t < 0.75 {
        let r = (t - 0.5) / 0.25;
        [1.0, 1.0 - r, 0.0]
    } else {
        let r = (t - 0.75) / 0.25;
        [1.0, 0.0, r * 0.5]
    }
}

/// Gradient sample quantized to RGBA8, alpha opaque.
pub fn intensity_to_rgba8(t: f32) -> [u8; 4] {
    let [r, g, b] = intensity_to_color(t);
    [
        (r * 255.0 + 0.5) as u8,
        (g * 255.0 + 0.5) as u8,
        (b * 255.0 + 0.5) as u8,
        255,
    ]
}

/// Build the 256x1 RGBA8 ramp used as the surface material and the legend
/// color bar. One builder for both keeps them bit-for-bit identical.
pub fn color_ramp_rgba8() -> Vec<u8> {
    let mut data = Vec::with_capacity(RAMP_WIDTH * 4);
    for i in 0..RAMP_WIDTH {
        let t = i as f32 / (RAMP_WIDTH - 1) as f32;
        data.extend_from_slice(&intensity_to_rgba8(t));
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact_for_every_mode() {
        for mode in [
            IntensityScale::Linear,
            IntensityScale::Square,
            IntensityScale::Log2,
            IntensityScale::Log10,
        ] {
            assert_eq!(mode.apply(0.0), 0.0, "{mode:?} at 0");
            assert_eq!(mode.apply(1.0), 1.0, "{mode:?} at 1");
        }
    }

    #[test]
    fn linear_is_identity() {
        for i in 0..=100 {
            let t = i as f32 / 100.0;
            assert_eq!(IntensityScale::Linear.apply(t), t);
        }
    }

    #[test]
    fn modes_are_monotonic() {
        for mode in [
            IntensityScale::Square,
            IntensityScale::Log2,
            IntensityScale::Log10,
        ] {
            let mut prev = mode.apply(0.0);
            for i in 1..=100 {
                let next = mode.apply(i as f32 / 100.0);
                assert!(next > prev, "{mode:?} not monotonic at step {i}");
                prev = next;
            }
        }
    }

    #[test]
    #[should_panic(expected = "normalized intensity")]
    fn out_of_range_input_panics() {
        IntensityScale::Linear.apply(1.5);
    }

    #[test]
    fn gradient_is_continuous_at_breakpoints() {
        for bp in [0.25f32, 0.5, 0.75] {
            let before = intensity_to_color(bp - 1e-5);
            let at = intensity_to_color(bp);
            for c in 0..3 {
                assert!(
                    (before[c] - at[c]).abs() < 1e-3,
                    "discontinuity at {bp} channel {c}: {} vs {}",
                    before[c],
                    at[c]
                );
            }
        }
    }

    #[test]
    fn gradient_endpoints() {
        assert_eq!(intensity_to_color(0.0), [0.0, 0.0, 1.0]);
        assert_eq!(intensity_to_color(1.0), [1.0, 0.0, 0.5]);
    }

    #[test]
    fn ramp_matches_gradient() {
        let ramp = color_ramp_rgba8();
        assert_eq!(ramp.len(), RAMP_WIDTH * 4);
        assert_eq!(&ramp[0..4], &intensity_to_rgba8(0.0));
        let last = &ramp[(RAMP_WIDTH - 1) * 4..];
        assert_eq!(last, &intensity_to_rgba8(1.0));
    }

    #[test]
    fn parses_scale_names() {
        assert_eq!("log10".parse::<IntensityScale>(), Ok(IntensityScale::Log10));
        assert!("cube".parse::<IntensityScale>().is_err());
    }
}
