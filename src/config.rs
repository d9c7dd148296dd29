// src/config.rs
// Serializable session configuration for viewers and export
// Hosts parse this from CLI flags or a JSON blob; defaults carry the
// constants the viewers were tuned with.
// RELEVANT FILES: src/camera.rs, src/capture.rs, src/render/mod.rs

use serde::{Deserialize, Serialize};

use crate::intensity::IntensityScale;
use crate::shell::ShellColorMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
    pub render_width: u32,
    pub render_height: u32,
    pub video_fps: u32,
    /// Encoder quality knob, 0-100.
    pub video_quality: u32,
    pub live_cycle_seconds: f32,
    pub video_cycle_seconds: f32,
    /// Export renders at this multiple of the view size.
    pub export_size_factor: f32,
    pub color_map: ShellColorMap,
    pub intensity_scale: IntensityScale,
    pub radial_exaggeration: f32,
    pub show_prominences: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_width: 800,
            render_height: 600,
            video_fps: 30,
            video_quality: 50,
            live_cycle_seconds: 20.0,
            video_cycle_seconds: 10.0,
            export_size_factor: 1.5,
            color_map: ShellColorMap::Mono,
            intensity_scale: IntensityScale::Linear,
            radial_exaggeration: 0.2,
            show_prominences: false,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Number of frames for one export cycle.
    pub fn video_frame_count(&self) -> usize {
        (self.video_fps as f32 * self.video_cycle_seconds) as usize
    }

    /// Export resolution: view size scaled by the export factor, rounded
    /// down to even dimensions (encoder requirement).
    pub fn export_size(&self) -> (u32, u32) {
        let scale = |v: u32| {
            let scaled = (v as f32 * self.export_size_factor) as u32;
            scaled - scaled % 2
        };
        (scale(self.render_width), scale(self.render_height))
    }
}
