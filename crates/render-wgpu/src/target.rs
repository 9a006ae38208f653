use crate::context::GpuContext;
use fieldwarning_common::{Colour, Extent};
use fieldwarning_render::RenderError;

/// Window surface plus the depth buffer that matches it.
pub struct SurfaceTarget {
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    depth: wgpu::Texture,
    extent: Extent,
}

impl SurfaceTarget {
    pub(crate) fn new(
        context: &GpuContext,
        surface: wgpu::Surface<'static>,
        alpha_mode: wgpu::CompositeAlphaMode,
        extent: Extent,
    ) -> Self {
        let size = extent.at_least_one();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: context.surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&context.device, &config);
        let depth = create_depth_texture(context, size);
        Self {
            surface,
            config,
            depth,
            extent,
        }
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    pub(crate) fn resize(&mut self, context: &GpuContext, extent: Extent) {
        self.extent = extent;
        if extent.is_empty() {
            return;
        }
        self.config.width = extent.width;
        self.config.height = extent.height;
        self.surface.configure(&context.device, &self.config);
        self.depth = create_depth_texture(context, extent);
    }

    pub(crate) fn acquire(&mut self, context: &GpuContext) -> Result<Option<GpuFrame>, RenderError> {
        if self.extent.is_empty() {
            return Ok(None);
        }
        let texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                tracing::debug!("surface lost or outdated, reconfiguring");
                self.surface.configure(&context.device, &self.config);
                return Ok(None);
            }
            Err(wgpu::SurfaceError::Timeout) => {
                tracing::warn!("timed out acquiring surface texture");
                return Ok(None);
            }
            Err(e) => return Err(RenderError::Device(format!("acquire surface texture: {e}"))),
        };
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let depth = self.depth.create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        Ok(Some(GpuFrame {
            texture,
            view,
            depth,
            encoder,
        }))
    }
}

/// An acquired swapchain image and the encoder recording into it.
pub struct GpuFrame {
    texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    depth: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

impl GpuFrame {
    pub(crate) fn pass(&mut self, clear: Colour) -> wgpu::RenderPass<'_> {
        self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("main_pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour(clear)),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }

    pub(crate) fn submit(self, context: &GpuContext) {
        context.queue.submit(std::iter::once(self.encoder.finish()));
        self.texture.present();
    }
}

pub(crate) fn clear_colour(colour: Colour) -> wgpu::Color {
    wgpu::Color {
        r: colour.r as f64,
        g: colour.g as f64,
        b: colour.b as f64,
        a: colour.a as f64,
    }
}

fn create_depth_texture(context: &GpuContext, extent: Extent) -> wgpu::Texture {
    context.device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: extent.width.max(1),
            height: extent.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: context.depth_format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    })
}
