use crate::target::SurfaceTarget;
use fieldwarning_common::Extent;
use fieldwarning_render::RenderError;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Push-constant space requested from the device.
pub const PUSH_CONSTANT_BYTES: u32 = 128;

/// Device, queue and the formats every pipeline renders into.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub surface_format: wgpu::TextureFormat,
    pub depth_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Create a device able to present to `window` and the surface target for it.
    pub fn with_surface(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        extent: Extent,
    ) -> Result<(Self, SurfaceTarget), RenderError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|e| RenderError::Device(format!("create surface: {e}")))?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| RenderError::Device("no compatible GPU adapter".into()))?;

        let info = adapter.get_info();
        if !adapter.features().contains(wgpu::Features::PUSH_CONSTANTS) {
            return Err(RenderError::Device(format!(
                "adapter '{}' does not support push constants",
                info.name
            )));
        }

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("fieldwarning_device"),
                required_features: wgpu::Features::PUSH_CONSTANTS,
                required_limits: wgpu::Limits {
                    max_push_constant_size: PUSH_CONSTANT_BYTES,
                    ..wgpu::Limits::default()
                },
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| RenderError::Device(format!("request device: {e}")))?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
            .ok_or_else(|| RenderError::Device("surface reports no formats".into()))?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        tracing::info!(
            adapter = %info.name,
            backend = info.backend.to_str(),
            format = ?surface_format,
            "GPU initialised"
        );

        let context = Self {
            device,
            queue,
            surface_format,
            depth_format: DEPTH_FORMAT,
        };
        let target = SurfaceTarget::new(&context, surface, alpha_mode, extent);
        Ok((context, target))
    }

    /// Run `create` inside a validation error scope, turning a validation
    /// failure into an error instead of an uncaptured device error.
    pub fn validated<T>(&self, what: &str, create: impl FnOnce(&wgpu::Device) -> T) -> Result<T, RenderError> {
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = create(&self.device);
        match pollster::block_on(self.device.pop_error_scope()) {
            None => Ok(value),
            Some(e) => Err(RenderError::Device(format!("{what}: {e}"))),
        }
    }
}
