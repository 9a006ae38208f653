//! Render stages and the render map that drives them.
//!
//! A [`RenderMap`] owns a backend device, a presentation target and an
//! ordered list of [`RenderStage`]s. Each frame it prepares, updates and binds
//! every stage in order inside a single pass, then presents.
//!
//! # Invariants
//! - A stage state is rebuilt iff [`RenderStage::is_valid`] reports false,
//!   which for mesh-drawing stages means the mesh handle identity changed.
//! - Pipelines returned by [`RenderStage::bind`] live for exactly one frame.
//! - Every stage state is released exactly once, in reverse registration
//!   order, whether the map is closed, dropped or abandoned after an error.

mod backend;
pub mod camera;
mod clear;
mod error;
pub mod headless;
mod map;
pub mod shader;
mod stage;
pub mod uniforms;

pub use backend::{Backend, MeshHandle, same_mesh};
pub use camera::OrbitCamera;
pub use clear::ClearStage;
pub use error::{RenderError, ShaderError};
pub use map::{FrameOutcome, RenderMap, StageId};
pub use shader::{ShaderCode, load_shader};
pub use stage::{FrameInfo, RenderStage};

pub fn crate_info() -> &'static str {
    "fieldwarning-render v0.1.0"
}
