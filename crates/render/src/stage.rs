use crate::backend::{Backend, MeshHandle};
use crate::error::RenderError;
use fieldwarning_common::{Colour, Extent, FrameTime};
use std::marker::PhantomData;

/// Per-frame input to [`RenderStage::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub time: FrameTime,
    /// Extent of the target the frame is rendered into.
    pub extent: Extent,
}

/// A logical drawing operation inside the frame's pass.
///
/// The stage itself holds configuration and at most one mesh; everything it
/// allocates on the device lives in its `State`, which the render map caches
/// and rebuilds whenever `is_valid` reports false.
pub trait RenderStage<B: Backend> {
    type State;

    fn name(&self) -> &str;

    /// Allocate shaders, layouts, buffers and bind groups.
    fn initialise(&self, device: &B::Device) -> Result<Self::State, RenderError>;

    /// Whether `state` still matches the stage. Mesh-drawing stages compare
    /// the identity of their current mesh with the one captured in `state`.
    fn is_valid(&self, _state: &Self::State) -> bool {
        true
    }

    /// Refresh per-frame data such as uniform buffers.
    fn update(&mut self, _state: &mut Self::State, _device: &B::Device, _frame: &FrameInfo) {}

    /// Record this stage's commands into `pass`. The returned pipeline is
    /// kept alive until the frame has been submitted, then dropped.
    fn bind(
        &self,
        state: &Self::State,
        device: &B::Device,
        pass: &mut B::Pass<'_>,
        extent: Extent,
    ) -> Result<Option<B::Pipeline>, RenderError>;

    /// Colour this stage wants the pass cleared to.
    fn clear_colour(&self) -> Option<Colour> {
        None
    }

    /// Offer an external mesh. Returns false if the stage does not draw one.
    fn set_mesh(&mut self, _mesh: Option<MeshHandle<B>>) -> bool {
        false
    }
}

/// Object-safe view of a stage together with its cached state.
pub(crate) trait StageSlot<B: Backend> {
    fn name(&self) -> &str;
    fn prepare(&mut self, device: &B::Device) -> Result<(), RenderError>;
    fn update(&mut self, device: &B::Device, frame: &FrameInfo);
    fn bind(
        &self,
        device: &B::Device,
        pass: &mut B::Pass<'_>,
        extent: Extent,
    ) -> Result<Option<B::Pipeline>, RenderError>;
    fn clear_colour(&self) -> Option<Colour>;
    fn set_mesh(&mut self, mesh: Option<MeshHandle<B>>) -> bool;
    fn release(&mut self);
    fn rebuilds(&self) -> u64;
}

pub(crate) struct Slot<B: Backend, S: RenderStage<B>> {
    stage: S,
    state: Option<S::State>,
    rebuilds: u64,
    _backend: PhantomData<fn() -> B>,
}

impl<B: Backend, S: RenderStage<B>> Slot<B, S> {
    pub(crate) fn new(stage: S) -> Self {
        Self {
            stage,
            state: None,
            rebuilds: 0,
            _backend: PhantomData,
        }
    }
}

impl<B: Backend, S: RenderStage<B>> StageSlot<B> for Slot<B, S> {
    fn name(&self) -> &str {
        self.stage.name()
    }

    fn prepare(&mut self, device: &B::Device) -> Result<(), RenderError> {
        if let Some(state) = &self.state {
            if self.stage.is_valid(state) {
                return Ok(());
            }
            tracing::debug!(stage = self.stage.name(), "stage state invalidated");
        }
        // The stale state goes before its replacement is allocated.
        self.state = None;
        let state = self
            .stage
            .initialise(device)
            .map_err(|e| RenderError::StageInit {
                stage: self.stage.name().to_string(),
                source: Box::new(e),
            })?;
        self.state = Some(state);
        self.rebuilds += 1;
        tracing::debug!(stage = self.stage.name(), rebuilds = self.rebuilds, "stage state built");
        Ok(())
    }

    fn update(&mut self, device: &B::Device, frame: &FrameInfo) {
        if let Some(state) = self.state.as_mut() {
            self.stage.update(state, device, frame);
        }
    }

    fn bind(
        &self,
        device: &B::Device,
        pass: &mut B::Pass<'_>,
        extent: Extent,
    ) -> Result<Option<B::Pipeline>, RenderError> {
        match &self.state {
            Some(state) => self.stage.bind(state, device, pass, extent),
            None => Ok(None),
        }
    }

    fn clear_colour(&self) -> Option<Colour> {
        self.stage.clear_colour()
    }

    fn set_mesh(&mut self, mesh: Option<MeshHandle<B>>) -> bool {
        self.stage.set_mesh(mesh)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            tracing::debug!(stage = self.stage.name(), "stage state released");
        }
    }

    fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}
