use crate::backend::WgpuBackend;
use crate::context::GpuContext;
use crate::mesh::GpuMesh;
use crate::pipeline::{ShaderStage, colour_target, depth_state, set_viewport};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use fieldwarning_assets::{AccessorType, AssetError, IndexData, MeshData, Semantic, VertexFormat, VertexLayout};
use fieldwarning_common::Extent;
use fieldwarning_render::{RenderError, RenderStage};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 2],
    colour: [f32; 3],
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { position: [1.0, 1.0], colour: [0.0, 0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], colour: [0.0, 1.0, 0.0] },
    QuadVertex { position: [-1.0, -1.0], colour: [1.0, 0.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], colour: [1.0, 1.0, 1.0] },
];

const QUAD_INDICES: [u16; 6] = [0, 1, 2, 2, 3, 0];

fn quad_mesh() -> Result<MeshData, AssetError> {
    let layout = VertexLayout::packed(&[
        (Semantic::Position, VertexFormat::float(AccessorType::Vec2)),
        (Semantic::Colour(0), VertexFormat::float(AccessorType::Vec3)),
    ]);
    let mut mesh = MeshData::from_vertices(&QUAD_VERTICES, layout, IndexData::U16(QUAD_INDICES.to_vec()))?;
    mesh.name = Some("quad".into());
    Ok(mesh)
}

/// Full-screen quad with per-corner colours. Owns its mesh, so it never
/// needs rebuilding.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuadStage;

pub struct QuadState {
    mesh: GpuMesh,
    shader: ShaderStage,
    layout: wgpu::PipelineLayout,
}

impl RenderStage<WgpuBackend> for QuadStage {
    type State = QuadState;

    fn name(&self) -> &str {
        "quad"
    }

    fn initialise(&self, context: &GpuContext) -> Result<QuadState, RenderError> {
        let mesh = GpuMesh::upload(&context.device, &quad_mesh()?)?;
        let shader = ShaderStage::wgsl(context, "quad_shader", shaders::QUAD_SHADER, "vs_main")?;
        let layout = context
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("quad_pipeline_layout"),
                bind_group_layouts: &[],
                push_constant_ranges: &[],
            });
        Ok(QuadState { mesh, shader, layout })
    }

    fn bind(
        &self,
        state: &QuadState,
        context: &GpuContext,
        pass: &mut wgpu::RenderPass<'_>,
        extent: Extent,
    ) -> Result<Option<wgpu::RenderPipeline>, RenderError> {
        let pipeline = context
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("quad_pipeline"),
                layout: Some(&state.layout),
                vertex: wgpu::VertexState {
                    module: &state.shader.module,
                    entry_point: Some(state.shader.entry),
                    compilation_options: Default::default(),
                    buffers: &[state.mesh.buffer_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &state.shader.module,
                    entry_point: Some("fs_main"),
                    compilation_options: Default::default(),
                    targets: &colour_target(context),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(depth_state(context, false, wgpu::CompareFunction::Always)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        set_viewport(pass, extent);
        pass.set_pipeline(&pipeline);
        state.mesh.draw(pass);
        Ok(Some(pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_mesh_layout() {
        let mesh = quad_mesh().unwrap();
        assert_eq!(mesh.layout.stride, 20);
        assert_eq!(mesh.vertex_count, 4);
        assert_eq!(mesh.index_count(), 6);
        assert_eq!(mesh.vertices.len(), 80);
    }
}
