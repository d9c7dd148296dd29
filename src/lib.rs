//! 3D visualization core for solar spectroheliograph imagery.
//!
//! Two rendering families share this crate:
//! - spectral line *surface* meshes: a 2D intensity field (position x
//!   wavelength) extruded into a closed solid, colored through a 1D heat-map
//!   LUT (`surface`, `intensity`);
//! - spherical tomography *shells*: a stack of disk images wrapped onto
//!   hemispheres and composited back-to-front with an absorption-driven
//!   alpha policy, plus a prominence band past the limb (`shell`).
//!
//! CPU-side geometry/texture builders are free of any graphics API; the
//! `render` module adapts their buffers to wgpu with retained vertex/index
//! buffers and offscreen readback for PNG/video export.

pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod field;
pub mod gpu;
pub mod intensity;
pub mod render;
pub mod shell;
pub mod surface;
pub mod util;

pub use camera::{CameraState, CameraSweep};
pub use capture::{CancelToken, Frame, VideoEncoder};
pub use config::SessionConfig;
pub use error::{RenderError, RenderResult};
pub use field::{DiskEllipse, ScalarField2D};
pub use intensity::IntensityScale;
pub use shell::{ShellColorMap, ShellDescriptor, ShellScene, ViewState};
pub use surface::{SurfaceMesh, SurfaceMeshBuilder, SurfaceParams};
