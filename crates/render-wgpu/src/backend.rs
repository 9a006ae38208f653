use crate::context::GpuContext;
use crate::mesh::GpuMesh;
use crate::target::{GpuFrame, SurfaceTarget};
use fieldwarning_assets::MeshData;
use fieldwarning_common::{Colour, Extent};
use fieldwarning_render::{Backend, RenderError};

/// The wgpu implementation of [`Backend`].
#[derive(Debug, Clone, Copy)]
pub struct WgpuBackend;

impl Backend for WgpuBackend {
    type Device = GpuContext;
    type Target = SurfaceTarget;
    type Frame = GpuFrame;
    type Pass<'p> = wgpu::RenderPass<'p>;
    type Pipeline = wgpu::RenderPipeline;
    type Mesh = GpuMesh;

    fn create_mesh(device: &GpuContext, mesh: &MeshData) -> Result<GpuMesh, RenderError> {
        GpuMesh::upload(&device.device, mesh)
    }

    fn target_extent(target: &SurfaceTarget) -> Extent {
        target.extent()
    }

    fn resize(device: &GpuContext, target: &mut SurfaceTarget, extent: Extent) {
        target.resize(device, extent);
    }

    fn acquire_frame(
        device: &GpuContext,
        target: &mut SurfaceTarget,
    ) -> Result<Option<GpuFrame>, RenderError> {
        target.acquire(device)
    }

    fn encode_pass<R>(
        _device: &GpuContext,
        frame: &mut GpuFrame,
        clear: Colour,
        record: impl FnOnce(&mut Self::Pass<'_>) -> R,
    ) -> R {
        let mut pass = frame.pass(clear);
        record(&mut pass)
    }

    fn present(device: &GpuContext, _target: &mut SurfaceTarget, frame: GpuFrame) {
        frame.submit(device);
    }
}
