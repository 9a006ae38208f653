use crate::backend::WgpuBackend;
use crate::brdf::generate_brdf_lut;
use crate::context::GpuContext;
use crate::pipeline::{ShaderStage, colour_target, depth_state, set_viewport};
use fieldwarning_assets::Semantic;
use fieldwarning_common::{Extent, Transform};
use fieldwarning_render::uniforms::{LightParams, MaterialBlock, SceneMatrices};
use fieldwarning_render::{FrameInfo, MeshHandle, OrbitCamera, RenderError, RenderStage, load_shader, same_mesh};
use std::path::{Path, PathBuf};
use wgpu::util::DeviceExt;

/// Vertex and fragment shader files of the PBR stage. Both may name the
/// same WGSL file, which then provides `vs_main` and `fs_main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PbrShaders {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl PbrShaders {
    /// `pbr.wgsl` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join("pbr.wgsl");
        Self {
            vertex: path.clone(),
            fragment: path,
        }
    }
}

impl Default for PbrShaders {
    fn default() -> Self {
        Self::in_dir("data/shaders")
    }
}

/// Texel of each 1x1 material texture bound when the model supplies none:
/// base colour, metallic-roughness, normal, occlusion, emissive.
const DEFAULT_TEXELS: [(&str, [u8; 4]); 5] = [
    ("base_colour", [255, 255, 255, 255]),
    ("metallic_roughness", [0, 255, 0, 255]),
    ("normal", [128, 128, 255, 255]),
    ("occlusion", [255, 255, 255, 255]),
    ("emissive", [0, 0, 0, 255]),
];

/// Physically-based shading of an external mesh lit by one directional
/// light, viewed from a camera orbiting the origin.
pub struct PbrStage {
    shaders: PbrShaders,
    mesh: Option<MeshHandle<WgpuBackend>>,
    pub camera: OrbitCamera,
    pub model: Transform,
    pub lighting: LightParams,
    pub material: MaterialBlock,
}

impl PbrStage {
    pub fn new(shaders: PbrShaders) -> Self {
        Self {
            shaders,
            mesh: None,
            camera: OrbitCamera::default(),
            model: Transform::default(),
            lighting: LightParams::default(),
            material: MaterialBlock::default(),
        }
    }

    pub fn with_camera(mut self, camera: OrbitCamera) -> Self {
        self.camera = camera;
        self
    }

    pub fn with_model(mut self, model: Transform) -> Self {
        self.model = model;
        self
    }
}

pub struct PbrState {
    mesh: Option<MeshHandle<WgpuBackend>>,
    vertex: ShaderStage,
    fragment: ShaderStage,
    layout: wgpu::PipelineLayout,
    matrices: wgpu::Buffer,
    params: wgpu::Buffer,
    scene_group: wgpu::BindGroup,
    material_group: wgpu::BindGroup,
    _brdf_lut: wgpu::Texture,
    _textures: Vec<wgpu::Texture>,
}

impl RenderStage<WgpuBackend> for PbrStage {
    type State = PbrState;

    fn name(&self) -> &str {
        "pbr"
    }

    fn initialise(&self, context: &GpuContext) -> Result<PbrState, RenderError> {
        if let Some(mesh) = &self.mesh {
            mesh.require(Semantic::Position, 0)?;
            mesh.require(Semantic::Normal, 1)?;
            mesh.require(Semantic::TexCoord(0), 2)?;
        }
        let vertex = ShaderStage::new(context, "pbr_vertex", &load_shader(&self.shaders.vertex)?, "vs_main")?;
        let fragment = ShaderStage::new(
            context,
            "pbr_fragment",
            &load_shader(&self.shaders.fragment)?,
            "fs_main",
        )?;

        let device = &context.device;
        let brdf_lut = generate_brdf_lut(context)?;
        let lut_view = brdf_lut.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("pbr_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let matrices = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pbr_matrices"),
            size: std::mem::size_of::<SceneMatrices>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pbr_params"),
            contents: bytemuck::bytes_of(&self.lighting),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr_scene_layout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_entry(1, wgpu::ShaderStages::FRAGMENT),
                texture_entry(2),
                sampler_entry(3),
            ],
        });
        let scene_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pbr_scene_group"),
            layout: &scene_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: matrices.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: params.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&lut_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let textures: Vec<wgpu::Texture> = DEFAULT_TEXELS
            .iter()
            .map(|(label, texel)| solid_texture(context, label, *texel))
            .collect();
        let views: Vec<wgpu::TextureView> = textures
            .iter()
            .map(|t| t.create_view(&wgpu::TextureViewDescriptor::default()))
            .collect();

        let mut material_entries: Vec<wgpu::BindGroupLayoutEntry> =
            (0..views.len() as u32).map(texture_entry).collect();
        material_entries.push(sampler_entry(views.len() as u32));
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pbr_material_layout"),
            entries: &material_entries,
        });

        let mut material_bindings: Vec<wgpu::BindGroupEntry<'_>> = views
            .iter()
            .enumerate()
            .map(|(i, view)| wgpu::BindGroupEntry {
                binding: i as u32,
                resource: wgpu::BindingResource::TextureView(view),
            })
            .collect();
        material_bindings.push(wgpu::BindGroupEntry {
            binding: views.len() as u32,
            resource: wgpu::BindingResource::Sampler(&sampler),
        });
        let material_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pbr_material_group"),
            layout: &material_layout,
            entries: &material_bindings,
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pbr_pipeline_layout"),
            bind_group_layouts: &[&scene_layout, &material_layout],
            push_constant_ranges: &[wgpu::PushConstantRange {
                stages: wgpu::ShaderStages::FRAGMENT,
                range: 0..std::mem::size_of::<MaterialBlock>() as u32,
            }],
        });

        Ok(PbrState {
            mesh: self.mesh.clone(),
            vertex,
            fragment,
            layout,
            matrices,
            params,
            scene_group,
            material_group,
            _brdf_lut: brdf_lut,
            _textures: textures,
        })
    }

    fn is_valid(&self, state: &PbrState) -> bool {
        same_mesh(self.mesh.as_ref(), state.mesh.as_ref())
    }

    fn update(&mut self, state: &mut PbrState, context: &GpuContext, frame: &FrameInfo) {
        self.camera.advance(frame.time.delta_seconds());
        let matrices = SceneMatrices::new(&self.camera, self.model.matrix(), frame.extent.aspect());
        context
            .queue
            .write_buffer(&state.matrices, 0, bytemuck::bytes_of(&matrices));
        context
            .queue
            .write_buffer(&state.params, 0, bytemuck::bytes_of(&self.lighting));
    }

    fn bind(
        &self,
        state: &PbrState,
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
                label: Some("pbr_pipeline"),
                layout: Some(&state.layout),
                vertex: wgpu::VertexState {
                    module: &state.vertex.module,
                    entry_point: Some(state.vertex.entry),
                    compilation_options: Default::default(),
                    buffers: &[mesh.buffer_layout()],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &state.fragment.module,
                    entry_point: Some(state.fragment.entry),
                    compilation_options: Default::default(),
                    targets: &colour_target(context),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode: Some(wgpu::Face::Back),
                    ..Default::default()
                },
                depth_stencil: Some(depth_state(context, true, wgpu::CompareFunction::Less)),
                multisample: Default::default(),
                multiview: None,
                cache: None,
            });

        set_viewport(pass, extent);
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, &state.scene_group, &[]);
        pass.set_bind_group(1, &state.material_group, &[]);
        pass.set_push_constants(wgpu::ShaderStages::FRAGMENT, 0, bytemuck::bytes_of(&self.material));
        mesh.draw(pass);
        Ok(Some(pipeline))
    }

    fn set_mesh(&mut self, mesh: Option<MeshHandle<WgpuBackend>>) -> bool {
        self.mesh = mesh;
        true
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn solid_texture(context: &GpuContext, label: &str, texel: [u8; 4]) -> wgpu::Texture {
    context.device.create_texture_with_data(
        &context.queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        &texel,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_shader_paths() {
        let shaders = PbrShaders::default();
        assert_eq!(shaders.vertex, Path::new("data/shaders/pbr.wgsl"));
        assert_eq!(shaders.vertex, shaders.fragment);
    }

    #[test]
    fn material_block_fits_push_constants() {
        assert!(std::mem::size_of::<MaterialBlock>() as u32 <= crate::PUSH_CONSTANT_BYTES);
    }

    #[test]
    fn default_textures_cover_every_material_slot() {
        let labels: Vec<&str> = DEFAULT_TEXELS.iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec!["base_colour", "metallic_roughness", "normal", "occlusion", "emissive"]
        );
    }
}
