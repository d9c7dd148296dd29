// src/camera.rs
// Explicit camera state for the 3D viewers plus the idle-sweep autopilot
// Direct-manipulation mapping only: drag deltas become rotation, scroll
// becomes clamped distance, no inertia.
// RELEVANT FILES: src/shell/mod.rs, src/render/sphere_pass.rs, src/capture.rs

use glam::{Mat4, Vec3};

/// Degrees of rotation per pixel of mouse drag.
const DRAG_DEGREES_PER_PIXEL: f32 = 0.5;
/// Camera distance units per scroll tick.
const SCROLL_UNITS_PER_TICK: f32 = 2.0;

/// Camera pose for one viewer, passed explicitly to render calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub distance: f32,
    /// Rotation around the X axis, degrees.
    pub rotation_x: f32,
    /// Rotation around the Y axis, degrees.
    pub rotation_y: f32,
    min_distance: f32,
    max_distance: f32,
    near: f32,
    far: f32,
    home: (f32, f32, f32),
}

impl CameraState {
    pub fn new(
        distance: f32,
        rotation_x: f32,
        rotation_y: f32,
        min_distance: f32,
        max_distance: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            distance: distance.clamp(min_distance, max_distance),
            rotation_x,
            rotation_y,
            min_distance,
            max_distance,
            near,
            far,
            home: (distance, rotation_x, rotation_y),
        }
    }

    /// Preset for the spectral surface viewer.
    pub fn surface_viewer() -> Self {
        Self::new(800.0, -30.0, 30.0, 200.0, 2000.0, 1.0, 5000.0)
    }

    /// Preset for the spherical tomography viewer.
    pub fn tomography() -> Self {
        Self::new(3.0, 0.0, 0.0, 1.5, 10.0, 0.1, 100.0)
    }

    /// Apply a mouse drag in pixels: horizontal drag spins around Y,
    /// vertical drag tilts around X.
    pub fn drag(&mut self, dx: f32, dy: f32) {
        self.rotation_y += dx * DRAG_DEGREES_PER_PIXEL;
        self.rotation_x -= dy * DRAG_DEGREES_PER_PIXEL;
    }

    /// Apply a scroll-wheel delta; positive ticks zoom in.
    pub fn scroll(&mut self, delta: f32) {
        self.set_distance(self.distance - delta * SCROLL_UNITS_PER_TICK);
    }

    pub fn set_distance(&mut self, distance: f32) {
        self.distance = distance.clamp(self.min_distance, self.max_distance);
    }

    pub fn set_rotation(&mut self, rotation_x: f32, rotation_y: f32) {
        self.rotation_x = rotation_x;
        self.rotation_y = rotation_y;
    }

    /// Restore the preset's home pose.
    pub fn reset(&mut self) {
        let (distance, rx, ry) = self.home;
        self.distance = distance;
        self.rotation_x = rx;
        self.rotation_y = ry;
    }

    /// Model-view matrix: pull back along Z, then rotate X, then Y.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.rotation_x.to_radians())
            * Mat4::from_rotation_y(self.rotation_y.to_radians())
    }

    /// 45 degree perspective projection for the given aspect ratio.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(45f32.to_radians(), aspect, self.near, self.far)
    }

    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }
}

/// Idle-animation sweep driving rotation on a fixed cycle.
///
/// Y oscillates at twice the X frequency, tracing a gentle figure sweep;
/// video export samples the same path so the exported motion matches the
/// live view.
#[derive(Debug, Clone, Copy)]
pub struct CameraSweep {
    pub cycle_seconds: f32,
    pub amplitude_x: f32,
    pub amplitude_y: f32,
}

impl CameraSweep {
    /// Live idle animation: 20 second cycle.
    pub fn live() -> Self {
        Self {
            cycle_seconds: 20.0,
            amplitude_x: 12.0,
            amplitude_y: 15.0,
        }
    }

    /// Video export: one full sweep in 10 seconds.
    pub fn video() -> Self {
        Self {
            cycle_seconds: 10.0,
            ..Self::live()
        }
    }

    /// Rotation `(x, y)` in degrees at elapsed time `t` seconds.
    pub fn rotation_at(&self, t: f32) -> (f32, f32) {
        let freq_x = std::f32::consts::TAU / self.cycle_seconds;
        let freq_y = 2.0 * std::f32::consts::TAU / self.cycle_seconds;
        (
            self.amplitude_x * (freq_x * t).sin(),
            self.amplitude_y * (freq_y * t).sin(),
        )
    }

    /// Rotation for frame `index` of `frame_count` spanning one cycle.
    pub fn rotation_for_frame(&self, index: usize, frame_count: usize) -> (f32, f32) {
        let t = self.cycle_seconds * index as f32 / frame_count.max(1) as f32;
        self.rotation_at(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_clamps_to_limits() {
        let mut camera = CameraState::tomography();
        camera.scroll(100.0);
        assert_eq!(camera.distance, 1.5);
        camera.scroll(-100.0);
        assert_eq!(camera.distance, 10.0);
    }

    #[test]
    fn drag_maps_half_degree_per_pixel() {
        let mut camera = CameraState::tomography();
        camera.drag(10.0, -4.0);
        assert_eq!(camera.rotation_y, 5.0);
        assert_eq!(camera.rotation_x, 2.0);
    }

    #[test]
    fn reset_restores_home_pose() {
        let mut camera = CameraState::surface_viewer();
        camera.drag(50.0, 50.0);
        camera.scroll(10.0);
        camera.reset();
        assert_eq!(camera.distance, 800.0);
        assert_eq!(camera.rotation_x, -30.0);
        assert_eq!(camera.rotation_y, 30.0);
    }

    #[test]
    fn sweep_is_periodic_and_bounded() {
        let sweep = CameraSweep::live();
        let (x0, y0) = sweep.rotation_at(0.0);
        assert_eq!((x0, y0), (0.0, 0.0));
        for i in 0..200 {
            let (x, y) = sweep.rotation_at(i as f32 * 0.37);
            assert!(x.abs() <= sweep.amplitude_x + 1e-3);
            assert!(y.abs() <= sweep.amplitude_y + 1e-3);
        }
        let (xa, ya) = sweep.rotation_at(3.0);
        let (xb, yb) = sweep.rotation_at(3.0 + sweep.cycle_seconds);
        assert!((xa - xb).abs() < 1e-3);
        assert!((ya - yb).abs() < 1e-3);
    }

    #[test]
    fn export_path_matches_live_path() {
        let sweep = CameraSweep::video();
        let frames = 300;
        for &index in &[0usize, 75, 150, 299] {
            let t = sweep.cycle_seconds * index as f32 / frames as f32;
            assert_eq!(sweep.rotation_for_frame(index, frames), sweep.rotation_at(t));
        }
    }
}
