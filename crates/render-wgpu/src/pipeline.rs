use crate::context::GpuContext;
use fieldwarning_common::Extent;
use fieldwarning_render::{RenderError, ShaderCode};
use std::borrow::Cow;

/// A shader module and the entry point to call in it.
pub(crate) struct ShaderStage {
    pub module: wgpu::ShaderModule,
    pub entry: &'static str,
}

impl ShaderStage {
    /// Compile `code`. SPIR-V modules enter at `main`, WGSL at `wgsl_entry`.
    pub fn new(
        context: &GpuContext,
        label: &str,
        code: &ShaderCode,
        wgsl_entry: &'static str,
    ) -> Result<Self, RenderError> {
        let (source, entry) = match code {
            ShaderCode::SpirV(words) => (wgpu::ShaderSource::SpirV(Cow::Borrowed(words)), "main"),
            ShaderCode::Wgsl(text) => (wgpu::ShaderSource::Wgsl(Cow::Borrowed(text)), wgsl_entry),
        };
        let module = context.validated(label, |device| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source,
            })
        })?;
        Ok(Self { module, entry })
    }

    pub fn wgsl(context: &GpuContext, label: &str, source: &'static str, entry: &'static str) -> Result<Self, RenderError> {
        Self::new(context, label, &ShaderCode::Wgsl(source.to_string()), entry)
    }
}

pub(crate) fn colour_target(context: &GpuContext) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format: context.surface_format,
        blend: Some(wgpu::BlendState::REPLACE),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

pub(crate) fn depth_state(
    context: &GpuContext,
    write: bool,
    compare: wgpu::CompareFunction,
) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: context.depth_format,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: Default::default(),
        bias: Default::default(),
    }
}

/// Viewport and scissor covering the whole target.
pub(crate) fn set_viewport(pass: &mut wgpu::RenderPass<'_>, extent: Extent) {
    pass.set_viewport(0.0, 0.0, extent.width as f32, extent.height as f32, 0.0, 1.0);
    pass.set_scissor_rect(0, 0, extent.width, extent.height);
}
