// src/shell/mod.rs
// Spherical tomography shell model: descriptors, session state machine,
// visibility and per-frame view state
// The scene owns parsed descriptors and built textures; parameter changes
// mark textures stale without touching the descriptors, and visibility is a
// per-view overlay that never mutates the underlying collection.
// RELEVANT FILES: src/shell/texture.rs, src/shell/geometry.rs, src/render/sphere_pass.rs

mod geometry;
mod texture;

pub use geometry::{
    build_hemisphere, build_prominence_band, shell_radius, ShellGeometry, TexturedVertex,
    BASE_RADIUS, PROMINENCE_MAX_EXTENT, SPHERE_DIVISIONS,
};
pub use texture::{ProminenceTexture, ShellTexture, ShellTextureSet};

use std::collections::HashSet;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::camera::CameraState;
use crate::error::{RenderError, RenderResult};
use crate::field::{DiskEllipse, ScalarField2D};

/// One tomography layer: a disk image at a given spectral depth.
#[derive(Debug, Clone)]
pub struct ShellDescriptor {
    pub field: ScalarField2D,
    /// Contrast-enhanced variant of `field`, same dimensions.
    pub enhanced: Option<ScalarField2D>,
    /// Disk fit in source pixel space; `None` falls back to a disk covering
    /// the whole frame.
    pub ellipse: Option<DiskEllipse>,
    /// Ordering key: innermost shell has the smallest radius.
    pub normalized_radius: f32,
    /// Identity key used for show/hide toggling.
    pub pixel_shift: f32,
}

/// Color mapping modes for shell textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShellColorMap {
    Mono,
    /// Red innermost, blue outermost.
    RedToBlue,
    /// Blue innermost, red outermost.
    BlueToRed,
}

impl FromStr for ShellColorMap {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_ascii_lowercase().as_str() {
            "mono" => Self::Mono,
            "red-to-blue" | "red_to_blue" => Self::RedToBlue,
            "blue-to-red" | "blue_to_red" => Self::BlueToRed,
            _ => return Err("unknown shell color map"),
        })
    }
}

/// Pixel-shift-keyed show/hide set.
///
/// Keys are the exact bit patterns of the descriptor shift values, so only
/// shifts that round-trip through the same descriptors match.
#[derive(Debug, Clone, Default)]
pub struct ShellVisibility {
    hidden: HashSet<u32>,
}

impl ShellVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_visible(&mut self, pixel_shift: f32, visible: bool) {
        if visible {
            self.hidden.remove(&pixel_shift.to_bits());
        } else {
            self.hidden.insert(pixel_shift.to_bits());
        }
    }

    pub fn is_visible(&self, pixel_shift: f32) -> bool {
        !self.hidden.contains(&pixel_shift.to_bits())
    }

    pub fn show_all(&mut self) {
        self.hidden.clear();
    }
}

/// Per-frame view state, bundled so several viewers can share one scene.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub camera: CameraState,
    pub visibility: ShellVisibility,
    pub radial_exaggeration: f32,
    pub show_prominences: bool,
}

impl ViewState {
    pub fn new(camera: CameraState) -> Self {
        Self {
            camera,
            visibility: ShellVisibility::new(),
            radial_exaggeration: 0.2,
            show_prominences: false,
        }
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(CameraState::tomography())
    }
}

/// Texture lifecycle of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneState {
    Unloaded,
    TexturesLoaded,
}

/// A render session over an ordered stack of shells.
///
/// Lifecycle: `Unloaded -> TexturesLoaded`; changing the color map or the
/// contrast toggle marks the textures stale, and the next
/// `reload_if_needed` rebuilds them from the retained descriptors.
pub struct ShellScene {
    shells: Vec<ShellDescriptor>,
    color_map: ShellColorMap,
    contrast_enhanced: bool,
    textures: Option<ShellTextureSet>,
    needs_reload: bool,
}

impl ShellScene {
    pub fn new(mut shells: Vec<ShellDescriptor>) -> RenderResult<Self> {
        if shells.is_empty() {
            return Err(RenderError::field("a shell scene needs at least one shell"));
        }
        shells.sort_by(|a, b| a.normalized_radius.total_cmp(&b.normalized_radius));
        Ok(Self {
            shells,
            color_map: ShellColorMap::Mono,
            contrast_enhanced: false,
            textures: None,
            needs_reload: false,
        })
    }

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    /// Descriptors in ascending radius order.
    pub fn shells(&self) -> &[ShellDescriptor] {
        &self.shells
    }

    pub fn state(&self) -> SceneState {
        if self.textures.is_some() {
            SceneState::TexturesLoaded
        } else {
            SceneState::Unloaded
        }
    }

    pub fn has_contrast_enhancement(&self) -> bool {
        self.shells.iter().all(|s| s.enhanced.is_some())
    }

    pub fn color_map(&self) -> ShellColorMap {
        self.color_map
    }

    pub fn set_color_map(&mut self, color_map: ShellColorMap) {
        if self.color_map != color_map {
            self.color_map = color_map;
            self.needs_reload = true;
        }
    }

    pub fn is_contrast_enhanced(&self) -> bool {
        self.contrast_enhanced
    }

    pub fn set_contrast_enhanced(&mut self, enhanced: bool) {
        if self.contrast_enhanced != enhanced {
            debug!(
                "contrast enhancement {} -> {} (enhanced data available: {})",
                self.contrast_enhanced,
                enhanced,
                self.has_contrast_enhancement()
            );
            self.contrast_enhanced = enhanced;
            self.needs_reload = true;
        }
    }

    pub fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    /// Build textures if the scene is unloaded; no-op otherwise.
    pub fn load_textures(&mut self, max_texture_size: Option<u32>) -> RenderResult<&ShellTextureSet> {
        if self.textures.is_none() {
            let params = texture::TextureBuildParams {
                color_map: self.color_map,
                use_enhanced: self.contrast_enhanced && self.has_contrast_enhancement(),
                max_texture_size,
            };
            self.textures = Some(texture::build_textures(&self.shells, &params)?);
        }
        Ok(self.textures.as_ref().unwrap())
    }

    /// Rebuild stale textures, keeping descriptors. Returns whether a
    /// rebuild happened.
    pub fn reload_if_needed(&mut self, max_texture_size: Option<u32>) -> RenderResult<bool> {
        if !self.needs_reload {
            return Ok(false);
        }
        debug!("reloading shell textures (color map {:?})", self.color_map);
        self.textures = None;
        self.load_textures(max_texture_size)?;
        self.needs_reload = false;
        Ok(true)
    }

    pub fn textures(&self) -> Option<&ShellTextureSet> {
        self.textures.as_ref()
    }

    /// Drop built textures, returning to `Unloaded`. Descriptors survive.
    pub fn unload(&mut self) {
        self.textures = None;
    }

    /// Built textures that are currently visible, ascending by radius.
    /// Empty when the scene is unloaded.
    pub fn visible_shells<'a>(&'a self, visibility: &ShellVisibility) -> Vec<&'a ShellTexture> {
        match &self.textures {
            Some(set) => set
                .shells
                .iter()
                .filter(|s| visibility.is_visible(s.pixel_shift))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(radius: f32, shift: f32) -> ShellDescriptor {
        ShellDescriptor {
            field: ScalarField2D::new(vec![0.0, 1.0, 0.5, 0.25], 2, 2).unwrap(),
            enhanced: None,
            ellipse: None,
            normalized_radius: radius,
            pixel_shift: shift,
        }
    }

    #[test]
    fn scene_sorts_shells_by_radius() {
        let scene = ShellScene::new(vec![shell(0.8, 1.0), shell(0.2, -1.0)]).unwrap();
        assert_eq!(scene.shells()[0].normalized_radius, 0.2);
        assert_eq!(scene.shells()[1].normalized_radius, 0.8);
    }

    #[test]
    fn empty_scene_is_rejected() {
        assert!(ShellScene::new(Vec::new()).is_err());
    }

    #[test]
    fn parameter_change_marks_stale_without_dropping_textures() {
        let mut scene = ShellScene::new(vec![shell(0.2, 0.0), shell(0.8, 1.5)]).unwrap();
        scene.load_textures(None).unwrap();
        assert_eq!(scene.state(), SceneState::TexturesLoaded);

        scene.set_color_map(ShellColorMap::RedToBlue);
        assert!(scene.needs_reload());
        assert_eq!(scene.state(), SceneState::TexturesLoaded);

        assert!(scene.reload_if_needed(None).unwrap());
        assert!(!scene.needs_reload());
        assert_eq!(scene.shell_count(), 2);
    }

    #[test]
    fn same_parameter_is_not_a_reload() {
        let mut scene = ShellScene::new(vec![shell(0.2, 0.0)]).unwrap();
        scene.set_color_map(ShellColorMap::Mono);
        assert!(!scene.needs_reload());
        assert!(!scene.reload_if_needed(None).unwrap());
    }

    #[test]
    fn visibility_filters_without_mutating_scene() {
        let mut scene = ShellScene::new(vec![shell(0.2, 0.0), shell(0.8, 1.5)]).unwrap();
        scene.load_textures(None).unwrap();

        let mut visibility = ShellVisibility::new();
        assert_eq!(scene.visible_shells(&visibility).len(), 2);

        visibility.set_visible(1.5, false);
        let visible = scene.visible_shells(&visibility);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].pixel_shift, 0.0);
        assert_eq!(scene.shell_count(), 2);

        visibility.set_visible(1.5, true);
        assert_eq!(scene.visible_shells(&visibility).len(), 2);
    }

    #[test]
    fn visible_shells_are_sorted_ascending() {
        let mut scene =
            ShellScene::new(vec![shell(0.9, 2.0), shell(0.1, 0.0), shell(0.5, 1.0)]).unwrap();
        scene.load_textures(None).unwrap();
        let visible = scene.visible_shells(&ShellVisibility::new());
        let radii: Vec<f32> = visible.iter().map(|s| s.normalized_radius).collect();
        assert_eq!(radii, vec![0.1, 0.5, 0.9]);
        assert!(visible[0].is_base);
        assert!(!visible[2].is_base);
    }
}
