use crate::backend::{Backend, MeshHandle};
use crate::error::RenderError;
use crate::stage::{FrameInfo, RenderStage, Slot, StageSlot};
use fieldwarning_assets::MeshData;
use fieldwarning_common::{Colour, Extent, FrameTime};

/// Index of a stage inside its render map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StageId(usize);

impl StageId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What happened to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was presented; `draws` stages returned a pipeline.
    Presented { draws: usize },
    /// The target could not provide an image this frame.
    Skipped,
}

/// Ordered stages plus the device and target they render with.
pub struct RenderMap<B: Backend> {
    stages: Vec<Box<dyn StageSlot<B>>>,
    device: B::Device,
    target: B::Target,
}

impl<B: Backend> RenderMap<B> {
    pub fn new(device: B::Device, target: B::Target) -> Self {
        Self {
            stages: Vec::new(),
            device,
            target,
        }
    }

    /// Append a stage; it binds after every stage added before it.
    pub fn add_stage<S>(&mut self, stage: S) -> StageId
    where
        S: RenderStage<B> + 'static,
        S::State: 'static,
    {
        let id = StageId(self.stages.len());
        tracing::info!(stage = stage.name(), index = id.0, "stage added");
        self.stages.push(Box::new(Slot::new(stage)));
        id
    }

    /// Upload a mesh that lives as long as its handles.
    pub fn create_static_mesh(&self, data: &MeshData) -> Result<MeshHandle<B>, RenderError> {
        let mesh = B::create_mesh(&self.device, data)?;
        tracing::debug!(
            vertices = data.vertex_count,
            indices = data.index_count(),
            stride = data.layout.stride,
            "static mesh created"
        );
        Ok(MeshHandle::new(mesh))
    }

    /// Hand a mesh to a stage. The stage rebuilds its state on the next frame.
    pub fn set_mesh(&mut self, id: StageId, mesh: Option<MeshHandle<B>>) -> Result<(), RenderError> {
        let stage = self
            .stages
            .get_mut(id.0)
            .ok_or(RenderError::UnknownStage(id.0))?;
        if !stage.set_mesh(mesh) {
            return Err(RenderError::MeshNotAccepted {
                stage: stage.name().to_string(),
            });
        }
        Ok(())
    }

    /// Prepare, update and bind every stage, then present.
    pub fn render_frame(&mut self, time: &FrameTime) -> Result<FrameOutcome, RenderError> {
        let _span = tracing::trace_span!("render_frame", frame = time.index).entered();
        let extent = B::target_extent(&self.target);

        for stage in &mut self.stages {
            stage.prepare(&self.device)?;
        }
        let info = FrameInfo { time: *time, extent };
        for stage in &mut self.stages {
            stage.update(&self.device, &info);
        }

        let Some(mut frame) = B::acquire_frame(&self.device, &mut self.target)? else {
            tracing::debug!(frame = time.index, "frame skipped");
            return Ok(FrameOutcome::Skipped);
        };

        let clear = self
            .stages
            .iter()
            .rev()
            .find_map(|s| s.clear_colour())
            .unwrap_or(Colour::BLACK);

        let stages = &self.stages;
        let device = &self.device;
        let pipelines = B::encode_pass(device, &mut frame, clear, |pass| {
            let mut pipelines = Vec::with_capacity(stages.len());
            for stage in stages {
                if let Some(pipeline) = stage.bind(device, pass, extent)? {
                    pipelines.push(pipeline);
                }
            }
            Ok::<_, RenderError>(pipelines)
        })?;

        B::present(&self.device, &mut self.target, frame);
        let draws = pipelines.len();
        drop(pipelines);

        tracing::trace!(frame = time.index, draws, "frame presented");
        Ok(FrameOutcome::Presented { draws })
    }

    pub fn resize(&mut self, extent: Extent) {
        tracing::debug!(width = extent.width, height = extent.height, "target resized");
        B::resize(&self.device, &mut self.target, extent);
    }

    pub fn extent(&self) -> Extent {
        B::target_extent(&self.target)
    }

    /// How many times the stage's state has been built.
    pub fn rebuild_count(&self, id: StageId) -> Option<u64> {
        self.stages.get(id.0).map(|s| s.rebuilds())
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn device(&self) -> &B::Device {
        &self.device
    }

    pub fn target(&self) -> &B::Target {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut B::Target {
        &mut self.target
    }

    /// Release every stage state in reverse order, then the map itself.
    pub fn close(mut self) {
        tracing::info!(stages = self.stages.len(), "closing render map");
        self.release_states();
    }

    fn release_states(&mut self) {
        for stage in self.stages.iter_mut().rev() {
            stage.release();
        }
    }
}

impl<B: Backend> Drop for RenderMap<B> {
    fn drop(&mut self) {
        self.release_states();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clear::ClearStage;
    use crate::headless::tests::quad_mesh;
    use crate::headless::{Command, Headless, HeadlessDevice, HeadlessTarget, TraceMeshStage, Tracked};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn map() -> RenderMap<Headless> {
        RenderMap::new(HeadlessDevice::new(), HeadlessTarget::new(Extent::new(64, 48)))
    }

    fn frame(index: u64) -> FrameTime {
        FrameTime {
            index,
            ..FrameTime::default()
        }
    }

    /// Records lifecycle events and can be told to fail.
    struct LoggedStage {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        fail_init: bool,
        fail_bind: bool,
    }

    impl LoggedStage {
        fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                name,
                log: log.clone(),
                fail_init: false,
                fail_bind: false,
            }
        }
    }

    struct LoggedState {
        name: &'static str,
        log: Rc<RefCell<Vec<String>>>,
        _buffer: Tracked,
    }

    impl Drop for LoggedState {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("release {}", self.name));
        }
    }

    impl RenderStage<Headless> for LoggedStage {
        type State = LoggedState;

        fn name(&self) -> &str {
            self.name
        }

        fn initialise(&self, device: &HeadlessDevice) -> Result<LoggedState, RenderError> {
            let buffer = device.allocate("logged_buffer");
            if self.fail_init {
                return Err(RenderError::Device("out of memory".into()));
            }
            self.log.borrow_mut().push(format!("init {}", self.name));
            Ok(LoggedState {
                name: self.name,
                log: self.log.clone(),
                _buffer: buffer,
            })
        }

        fn update(&mut self, _state: &mut LoggedState, _device: &HeadlessDevice, _frame: &FrameInfo) {
            self.log.borrow_mut().push(format!("update {}", self.name));
        }

        fn bind(
            &self,
            _state: &LoggedState,
            device: &HeadlessDevice,
            pass: &mut Vec<Command>,
            _extent: Extent,
        ) -> Result<Option<Tracked>, RenderError> {
            if self.fail_bind {
                return Err(RenderError::Device("pipeline creation failed".into()));
            }
            self.log.borrow_mut().push(format!("bind {}", self.name));
            pass.push(Command::BindPipeline {
                label: self.name.to_string(),
            });
            Ok(Some(device.allocate("pipeline")))
        }
    }

    #[test]
    fn stages_bind_in_order_inside_one_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut map = map();
        map.add_stage(LoggedStage::new("a", &log));
        map.add_stage(LoggedStage::new("b", &log));

        let outcome = map.render_frame(&frame(0)).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented { draws: 2 });
        assert_eq!(
            *log.borrow(),
            vec!["init a", "init b", "update a", "update b", "bind a", "bind b"]
        );
        let commands = map.target().last_frame().unwrap();
        assert!(matches!(commands.first(), Some(Command::BeginPass { .. })));
        assert_eq!(commands.last(), Some(&Command::EndPass));
        assert_eq!(map.stage_names(), vec!["a", "b"]);
    }

    #[test]
    fn pipelines_live_for_one_frame() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut map = map();
        map.add_stage(LoggedStage::new("a", &log));
        for i in 0..3 {
            map.render_frame(&frame(i)).unwrap();
            assert_eq!(map.device().ledger().live("pipeline"), 0);
        }
        assert_eq!(map.device().ledger().allocated("pipeline"), 3);
        assert_eq!(map.device().ledger().released("pipeline"), 3);
    }

    #[test]
    fn state_rebuilt_only_when_mesh_identity_changes() {
        let mut map = map();
        let stage = map.add_stage(TraceMeshStage::new());
        let mesh = map.create_static_mesh(&quad_mesh()).unwrap();

        map.render_frame(&frame(0)).unwrap();
        assert_eq!(map.rebuild_count(stage), Some(1));

        map.set_mesh(stage, Some(mesh.clone())).unwrap();
        map.render_frame(&frame(1)).unwrap();
        map.render_frame(&frame(2)).unwrap();
        assert_eq!(map.rebuild_count(stage), Some(2));

        // Same allocation handed over again: no rebuild.
        map.set_mesh(stage, Some(mesh.clone())).unwrap();
        map.render_frame(&frame(3)).unwrap();
        assert_eq!(map.rebuild_count(stage), Some(2));

        // Equal data, different allocation: rebuild.
        let other = map.create_static_mesh(&quad_mesh()).unwrap();
        map.set_mesh(stage, Some(other)).unwrap();
        map.render_frame(&frame(4)).unwrap();
        assert_eq!(map.rebuild_count(stage), Some(3));

        let ledger = map.device().ledger().clone();
        assert_eq!(ledger.live("uniform_buffer"), 1);
        assert_eq!(ledger.released("uniform_buffer"), 2);
    }

    #[test]
    fn stale_state_released_before_rebuild() {
        let mut map = map();
        let stage = map.add_stage(TraceMeshStage::new());
        map.render_frame(&frame(0)).unwrap();

        let mesh = map.create_static_mesh(&quad_mesh()).unwrap();
        map.set_mesh(stage, Some(mesh)).unwrap();
        map.render_frame(&frame(1)).unwrap();

        let ledger = map.device().ledger();
        assert_eq!(ledger.allocated("bind_group"), 2);
        assert_eq!(ledger.live("bind_group"), 1);
    }

    #[test]
    fn trace_stage_draws_the_assigned_mesh() {
        let mut map = map();
        map.add_stage(ClearStage::new(Colour::rgba(0.1, 0.2, 0.3, 1.0)));
        let stage = map.add_stage(TraceMeshStage::new());

        assert_eq!(
            map.render_frame(&frame(0)).unwrap(),
            FrameOutcome::Presented { draws: 0 }
        );

        let mesh = map.create_static_mesh(&quad_mesh()).unwrap();
        map.set_mesh(stage, Some(mesh)).unwrap();
        assert_eq!(
            map.render_frame(&frame(1)).unwrap(),
            FrameOutcome::Presented { draws: 1 }
        );
        let commands = map.target().last_frame().unwrap();
        assert!(commands.contains(&Command::DrawIndexed { index_count: 6 }));
        assert!(commands.contains(&Command::SetViewport(Extent::new(64, 48))));
    }

    #[test]
    fn last_clear_stage_wins() {
        let mut map = map();
        map.add_stage(ClearStage::new(Colour::WHITE));
        map.add_stage(ClearStage::new(Colour::rgba(0.0, 0.5, 0.0, 1.0)));
        map.render_frame(&frame(0)).unwrap();
        assert_eq!(
            map.target().last_frame().unwrap()[0],
            Command::BeginPass {
                clear: Colour::rgba(0.0, 0.5, 0.0, 1.0),
                extent: Extent::new(64, 48)
            }
        );
    }

    #[test]
    fn default_clear_is_black() {
        let mut map = map();
        map.render_frame(&frame(0)).unwrap();
        assert!(matches!(
            map.target().last_frame().unwrap()[0],
            Command::BeginPass { clear, .. } if clear == Colour::BLACK
        ));
    }

    #[test]
    fn skipped_frame_presents_nothing() {
        let mut map = map();
        map.add_stage(TraceMeshStage::new());
        map.target_mut().skip_next_frame();
        assert_eq!(map.render_frame(&frame(0)).unwrap(), FrameOutcome::Skipped);
        assert!(map.target().frames().is_empty());
        assert_eq!(map.render_frame(&frame(1)).unwrap(), FrameOutcome::Presented { draws: 0 });
    }

    #[test]
    fn resize_changes_the_extent_seen_by_stages() {
        let mut map = map();
        map.resize(Extent::new(200, 100));
        assert_eq!(map.extent(), Extent::new(200, 100));
        map.render_frame(&frame(0)).unwrap();
        assert!(matches!(
            map.target().last_frame().unwrap()[0],
            Command::BeginPass { extent: Extent { width: 200, height: 100 }, .. }
        ));
    }

    #[test]
    fn close_releases_states_in_reverse_order_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut map = map();
        map.add_stage(LoggedStage::new("a", &log));
        map.add_stage(LoggedStage::new("b", &log));
        map.add_stage(LoggedStage::new("c", &log));
        map.render_frame(&frame(0)).unwrap();
        let ledger = map.device().ledger().clone();

        map.close();

        let releases: Vec<String> = log
            .borrow()
            .iter()
            .filter(|l| l.starts_with("release"))
            .cloned()
            .collect();
        assert_eq!(releases, vec!["release c", "release b", "release a"]);
        assert_eq!(ledger.counts("logged_buffer").released, 3);
        assert_eq!(ledger.total_live(), 0);
    }

    #[test]
    fn dropping_the_map_releases_everything() {
        let mut map = map();
        let stage = map.add_stage(TraceMeshStage::new());
        let mesh = map.create_static_mesh(&quad_mesh()).unwrap();
        map.set_mesh(stage, Some(mesh)).unwrap();
        map.render_frame(&frame(0)).unwrap();
        let ledger = map.device().ledger().clone();
        assert!(ledger.total_live() > 0);

        drop(map);
        assert_eq!(ledger.total_live(), 0);
        for counts in ledger.snapshot().values() {
            assert_eq!(counts.allocated, counts.released);
        }
    }

    #[test]
    fn failed_initialise_is_reported_and_leaks_nothing() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut map = map();
        map.add_stage(LoggedStage::new("ok", &log));
        map.add_stage(LoggedStage {
            fail_init: true,
            ..LoggedStage::new("broken", &log)
        });

        let err = map.render_frame(&frame(0)).unwrap_err();
        assert!(matches!(&err, RenderError::StageInit { stage, .. } if stage == "broken"));
        let ledger = map.device().ledger().clone();
        assert_eq!(ledger.live("logged_buffer"), 1);

        drop(map);
        assert_eq!(ledger.counts("logged_buffer").allocated, 2);
        assert_eq!(ledger.counts("logged_buffer").released, 2);
        assert_eq!(
            log.borrow().iter().filter(|l| l.starts_with("release")).count(),
            1
        );
    }

    #[test]
    fn failed_bind_drops_pipelines_already_built() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut map = map();
        map.add_stage(LoggedStage::new("a", &log));
        map.add_stage(LoggedStage {
            fail_bind: true,
            ..LoggedStage::new("b", &log)
        });

        assert!(map.render_frame(&frame(0)).is_err());
        assert!(map.target().frames().is_empty());
        let ledger = map.device().ledger();
        assert_eq!(ledger.allocated("pipeline"), 1);
        assert_eq!(ledger.live("pipeline"), 0);
    }

    #[test]
    fn set_mesh_errors() {
        let mut map = map();
        let clear = map.add_stage(ClearStage::new(Colour::BLACK));
        let mesh = map.create_static_mesh(&quad_mesh()).unwrap();

        assert!(matches!(
            map.set_mesh(clear, Some(mesh.clone())),
            Err(RenderError::MeshNotAccepted { .. })
        ));
        assert!(matches!(
            map.set_mesh(StageId(7), Some(mesh)),
            Err(RenderError::UnknownStage(7))
        ));
    }
}
