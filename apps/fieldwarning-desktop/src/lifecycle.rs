use crate::config::{AppConfig, StageKind};
use fieldwarning_assets::{LoadOptions, Model};
use fieldwarning_common::{Extent, FrameTime};
use fieldwarning_kernel::{GameService, KernelError, LoopControl, Updatable};
use fieldwarning_render::{Backend, ClearStage, FrameOutcome, OrbitCamera, RenderError, RenderMap};
use fieldwarning_render_wgpu::{GpuContext, MeshStage, PbrShaders, PbrStage, QuadStage, SurfaceTarget, WgpuBackend};
use std::cell::Cell;
use std::rc::Rc;

/// Requests raised by the window and consumed by the lifecycle service.
#[derive(Debug, Default)]
pub struct WindowSignals {
    close: Cell<bool>,
    resize: Cell<Option<Extent>>,
}

impl WindowSignals {
    pub fn request_close(&self) {
        self.close.set(true);
    }

    pub fn close_requested(&self) -> bool {
        self.close.get()
    }

    /// Only the latest size matters.
    pub fn request_resize(&self, extent: Extent) {
        self.resize.set(Some(extent));
    }

    fn take_resize(&self) -> Option<Extent> {
        self.resize.take()
    }
}

/// Run one frame of `map` under the window's requests. A close request
/// releases the map and stops the loop; a pending resize applies first.
fn advance<B: Backend>(
    map: &mut Option<RenderMap<B>>,
    signals: &WindowSignals,
    time: &FrameTime,
) -> Result<LoopControl, RenderError> {
    if signals.close_requested() {
        if let Some(map) = map.take() {
            map.close();
        }
        return Ok(LoopControl::Stop);
    }
    let Some(map) = map.as_mut() else {
        return Ok(LoopControl::Stop);
    };
    if let Some(extent) = signals.take_resize() {
        map.resize(extent);
    }
    match map.render_frame(time)? {
        FrameOutcome::Presented { draws } => tracing::trace!(frame = time.index, draws, "presented"),
        FrameOutcome::Skipped => tracing::trace!(frame = time.index, "skipped"),
    }
    Ok(LoopControl::Continue)
}

/// Builds the render map on start, renders one frame per update and closes
/// the map once the window asks to close.
pub struct LifecycleService {
    config: AppConfig,
    signals: Rc<WindowSignals>,
    gpu: Option<(GpuContext, SurfaceTarget)>,
    map: Option<RenderMap<WgpuBackend>>,
}

impl LifecycleService {
    pub fn new(
        config: AppConfig,
        context: GpuContext,
        target: SurfaceTarget,
        signals: Rc<WindowSignals>,
    ) -> Self {
        Self {
            config,
            signals,
            gpu: Some((context, target)),
            map: None,
        }
    }

    fn build_map(&self, context: GpuContext, target: SurfaceTarget) -> Result<RenderMap<WgpuBackend>, RenderError> {
        let mut map = RenderMap::new(context, target);
        map.add_stage(ClearStage::new(self.config.clear_colour));
        let stage = match self.config.stage {
            StageKind::Pbr => {
                let camera = OrbitCamera {
                    distance: self.config.camera.distance,
                    orbit_speed: self.config.camera.orbit_speed,
                    ..OrbitCamera::default()
                };
                map.add_stage(
                    PbrStage::new(PbrShaders::in_dir(&self.config.shader_dir))
                        .with_camera(camera)
                        .with_model(self.config.model_transform()),
                )
            }
            StageKind::Mesh => map.add_stage(MeshStage::new()),
            StageKind::Quad => map.add_stage(QuadStage),
        };

        if self.config.stage.needs_model() {
            let model = Model::load(&self.config.model, &LoadOptions::default())?;
            let mesh = map.create_static_mesh(model.primary())?;
            map.set_mesh(stage, Some(mesh))?;
        }
        Ok(map)
    }
}

impl Updatable for LifecycleService {
    fn update(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError> {
        advance(&mut self.map, &self.signals, time).map_err(|e| KernelError::service("lifecycle", e))
    }
}

impl GameService for LifecycleService {
    fn name(&self) -> &str {
        "lifecycle"
    }

    fn start(&mut self) -> Result<(), KernelError> {
        let Some((context, target)) = self.gpu.take() else {
            return Err(KernelError::service("lifecycle", "GPU context already consumed"));
        };
        let map = self
            .build_map(context, target)
            .map_err(|e| KernelError::service("lifecycle", e))?;
        tracing::info!(stages = ?map.stage_names(), "render map ready");
        self.map = Some(map);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(map) = self.map.take() {
            map.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldwarning_assets::{AccessorType, IndexData, MeshData, Semantic, VertexFormat, VertexLayout};
    use fieldwarning_common::Colour;
    use fieldwarning_render::headless::{Command, Headless, HeadlessDevice, HeadlessTarget, ResourceLedger, TraceMeshStage};

    fn frame(index: u64) -> FrameTime {
        FrameTime {
            index,
            ..FrameTime::default()
        }
    }

    fn headless_map() -> (Option<RenderMap<Headless>>, ResourceLedger) {
        let device = HeadlessDevice::new();
        let ledger = device.ledger().clone();
        let mut map = RenderMap::new(device, HeadlessTarget::new(Extent::new(64, 48)));
        map.add_stage(ClearStage::new(Colour::BLACK));
        let stage = map.add_stage(TraceMeshStage::new());
        let layout = VertexLayout::packed(&[(Semantic::Position, VertexFormat::float(AccessorType::Vec3))]);
        let triangle = MeshData::from_vertices(&[[0.0f32; 3]; 3], layout, IndexData::U16(vec![0, 1, 2])).unwrap();
        let mesh = map.create_static_mesh(&triangle).unwrap();
        map.set_mesh(stage, Some(mesh)).unwrap();
        (Some(map), ledger)
    }

    #[test]
    fn close_request_releases_the_map_and_stops() {
        let (mut map, ledger) = headless_map();
        let signals = WindowSignals::default();
        assert_eq!(advance(&mut map, &signals, &frame(0)).unwrap(), LoopControl::Continue);
        assert!(ledger.total_live() > 0);

        signals.request_close();
        assert_eq!(advance(&mut map, &signals, &frame(1)).unwrap(), LoopControl::Stop);
        assert!(map.is_none());
        assert_eq!(ledger.total_live(), 0);
        for (label, counts) in ledger.snapshot() {
            assert_eq!(counts.allocated, counts.released, "{label}");
        }

        assert_eq!(advance(&mut map, &signals, &frame(2)).unwrap(), LoopControl::Stop);
    }

    #[test]
    fn pending_resize_applies_before_the_frame() {
        let (mut map, _ledger) = headless_map();
        let signals = WindowSignals::default();
        signals.request_resize(Extent::new(320, 200));
        advance(&mut map, &signals, &frame(0)).unwrap();

        let map = map.unwrap();
        assert_eq!(map.extent(), Extent::new(320, 200));
        assert!(matches!(
            map.target().last_frame().and_then(|commands| commands.first()),
            Some(Command::BeginPass { extent, .. }) if *extent == Extent::new(320, 200)
        ));
    }

    #[test]
    fn latest_resize_wins_and_is_consumed() {
        let signals = WindowSignals::default();
        signals.request_resize(Extent::new(800, 600));
        signals.request_resize(Extent::new(1024, 768));
        assert_eq!(signals.take_resize(), Some(Extent::new(1024, 768)));
        assert_eq!(signals.take_resize(), None);
    }

    #[test]
    fn close_is_sticky() {
        let signals = WindowSignals::default();
        assert!(!signals.close_requested());
        signals.request_close();
        assert!(signals.close_requested());
        assert!(signals.close_requested());
    }
}
