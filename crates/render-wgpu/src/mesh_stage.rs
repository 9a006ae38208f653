use crate::backend::WgpuBackend;
use crate::context::GpuContext;
use crate::pipeline::{ShaderStage, colour_target, depth_state, set_viewport};
use crate::shaders;
use fieldwarning_assets::Semantic;
use fieldwarning_common::Extent;
use fieldwarning_render::{MeshHandle, RenderError, RenderStage, same_mesh};

/// Draws an external mesh in clip space, coloured by its normals.
#[derive(Debug, Default)]
pub struct MeshStage {
    mesh: Option<MeshHandle<WgpuBackend>>,
}

impl MeshStage {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MeshState {
    mesh: Option<MeshHandle<WgpuBackend>>,
    shader: ShaderStage,
    layout: wgpu::PipelineLayout,
}

impl RenderStage<WgpuBackend> for MeshStage {
    type State = MeshState;

    fn name(&self) -> &str {
        "mesh"
    }

    fn initialise(&self, context: &GpuContext) -> Result<MeshState, RenderError> {
        if let Some(mesh) = &self.mesh {
            mesh.require(Semantic::Position, 0)?;
            mesh.require(Semantic::Normal, 1)?;
        }
        let shader = ShaderStage::wgsl(context, "mesh_shader", shaders::MESH_SHADER, "vs_main")?;
        let layout = context
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("mesh_pipeline_layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });
        Ok(MeshState {
            mesh: self.mesh.clone(),
            shader,
            layout,
        })
    }

    fn is_valid(&self, state: &MeshState) -> bool {
        same_mesh(self.mesh.as_ref(), state.mesh.as_ref())
    }

    fn bind(
        &self,
        state: &MeshState,
        context: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        extent: Extent,
    ) -> Result<Option<wgpu::RenderPipeline>, RenderError> {
        let Some(mesh) = &state.mesh else {
            return Ok(None);
        };
        let pipeline = context
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mesh_pipeline"),
                layout: Some(&state.layout),
                vertex: wgpu::VertexState {
                    module: &state.shader.module,
                    entry_point: Some(state.shader.entry),
                    compilation_options: Default::default(),
                    buffers: &[mesh.buffer_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &state.shader.module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &colour_target(context),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state(context, true, wgpu::CompareFunction::Less)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        set_viewport(pass, extent);
        pass.set_pipeline(&pipeline);
        mesh.draw(pass);
        Ok(Some(pipeline))
    }

    fn set_mesh(&mut self, mesh: Option<MeshHandle<WgpuBackend>>) -> bool {
        self.mesh = mesh;
        true
    }
}
