//! wgpu render backend for the Field Warning renderer.
//!
//! Provides the window surface target, GPU mesh upload and the quad, mesh and
//! PBR stages. The PBR stage generates its BRDF lookup table on the GPU when
//! its state is built.
//!
//! # Invariants
//! - A lost or outdated surface reconfigures itself and skips the frame.
//! - Stage states own every GPU object they create; pipelines are built per
//!   frame and dropped by the render map after submission.
//! - The device always has `PUSH_CONSTANTS` enabled.

mod backend;
mod brdf;
mod context;
mod mesh;
mod mesh_stage;
mod pbr;
mod pipeline;
mod quad;
mod shaders;
mod target;

pub use backend::WgpuBackend;
pub use brdf::{BRDF_LUT_FORMAT, BRDF_LUT_SIZE, generate_brdf_lut};
pub use context::{DEPTH_FORMAT, GpuContext, PUSH_CONSTANT_BYTES};
pub use mesh::{GpuMesh, vertex_format};
pub use mesh_stage::MeshStage;
pub use pbr::{PbrShaders, PbrStage};
pub use quad::QuadStage;
pub use target::{GpuFrame, SurfaceTarget};

pub fn crate_info() -> &'static str {
    "fieldwarning-render-wgpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render-wgpu"));
    }
}
