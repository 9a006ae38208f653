use crate::context::GpuContext;
use crate::pipeline::ShaderStage;
use crate::shaders;
use fieldwarning_render::RenderError;
use std::time::Instant;

pub const BRDF_LUT_SIZE: u32 = 512;
pub const BRDF_LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg16Float;

/// Render the split-sum BRDF lookup table and wait for the GPU to finish it.
pub fn generate_brdf_lut(context: &GpuContext) -> Result<wgpu::Texture, RenderError> {
    let started = Instant::now();
    let device = &context.device;

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("brdf_lut"),
        size: wgpu::Extent3d {
            width: BRDF_LUT_SIZE,
            height: BRDF_LUT_SIZE,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: BRDF_LUT_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    let shader = ShaderStage::wgsl(context, "brdf_shader", shaders::BRDF_SHADER, "vs_main")?;
    let pipeline = context.validated("brdf pipeline", |device| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("brdf_pipeline"),
            layout: None,
            vertex: wgpu::VertexState {
                module: &shader.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: BRDF_LUT_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        })
    })?;

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("brdf_encoder"),
    });
    {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("brdf_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            ..Default::default()
        });
        pass.set_pipeline(&pipeline);
        pass.draw(0..3, 0..1);
    }
    context.queue.submit(std::iter::once(encoder.finish()));
    let _ = device.poll(wgpu::Maintain::Wait);

    tracing::debug!(
        size = BRDF_LUT_SIZE,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "generated BRDF lookup table"
    );
    Ok(texture)
}
