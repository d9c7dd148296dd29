// src/render/mod.rs
// wgpu adapters for the CPU-side builders
// Retained vertex/index buffers uploaded once per rebuild, per-frame draw
// calls only, offscreen color+depth target with readback for export.
// RELEVANT FILES: src/render/target.rs, src/render/surface_pass.rs, src/render/sphere_pass.rs

mod sphere_pass;
mod surface_pass;
mod target;
mod upload;

pub use sphere_pass::SphereRenderer;
pub use surface_pass::SurfaceRenderer;
pub use target::{OffscreenTarget, COLOR_FORMAT, DEPTH_FORMAT};
pub use upload::{color_ramp_texture, Texture2d};
