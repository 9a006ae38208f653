//! Backend that records commands instead of talking to a GPU.
//!
//! Every allocation goes through a [`ResourceLedger`] so tests and the CLI
//! can check that each resource is released exactly once.

use crate::backend::{Backend, MeshHandle, same_mesh};
use crate::error::RenderError;
use crate::stage::{FrameInfo, RenderStage};
use crate::uniforms::MaterialBlock;
use fieldwarning_assets::MeshData;
use fieldwarning_common::{Colour, Extent};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// One recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BeginPass { clear: Colour, extent: Extent },
    BindPipeline { label: String },
    SetViewport(Extent),
    BindGroups { count: u32 },
    PushConstants { size: u32 },
    BindMesh { vertex_count: u32, index_count: u32, stride: u32 },
    DrawIndexed { index_count: u32 },
    EndPass,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BeginPass { clear, extent } => write!(
                f,
                "begin_pass {}x{} clear=({:.2}, {:.2}, {:.2}, {:.2})",
                extent.width, extent.height, clear.r, clear.g, clear.b, clear.a
            ),
            Self::BindPipeline { label } => write!(f, "bind_pipeline {label}"),
            Self::SetViewport(e) => write!(f, "set_viewport {}x{}", e.width, e.height),
            Self::BindGroups { count } => write!(f, "bind_groups {count}"),
            Self::PushConstants { size } => write!(f, "push_constants {size}B"),
            Self::BindMesh {
                vertex_count,
                index_count,
                stride,
            } => write!(
                f,
                "bind_mesh vertices={vertex_count} indices={index_count} stride={stride}"
            ),
            Self::DrawIndexed { index_count } => write!(f, "draw_indexed {index_count}"),
            Self::EndPass => write!(f, "end_pass"),
        }
    }
}

/// Allocation and release counts for one resource label.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counts {
    pub allocated: u64,
    pub released: u64,
}

/// Shared tally of allocations and releases, keyed by label.
#[derive(Debug, Default, Clone)]
pub struct ResourceLedger(Rc<RefCell<BTreeMap<String, Counts>>>);

impl ResourceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an allocation; the returned guard records the release on drop.
    pub fn allocate(&self, label: &str) -> Tracked {
        self.0.borrow_mut().entry(label.to_string()).or_default().allocated += 1;
        Tracked {
            label: label.to_string(),
            ledger: self.clone(),
        }
    }

    pub fn counts(&self, label: &str) -> Counts {
        self.0.borrow().get(label).copied().unwrap_or_default()
    }

    pub fn allocated(&self, label: &str) -> u64 {
        self.counts(label).allocated
    }

    pub fn released(&self, label: &str) -> u64 {
        self.counts(label).released
    }

    pub fn live(&self, label: &str) -> u64 {
        let c = self.counts(label);
        c.allocated - c.released
    }

    pub fn total_live(&self) -> u64 {
        self.0
            .borrow()
            .values()
            .map(|c| c.allocated - c.released)
            .sum()
    }

    pub fn snapshot(&self) -> BTreeMap<String, Counts> {
        self.0.borrow().clone()
    }

    fn release(&self, label: &str) {
        self.0.borrow_mut().entry(label.to_string()).or_default().released += 1;
    }
}

/// A live ledger entry. Dropping it counts as releasing the resource.
pub struct Tracked {
    label: String,
    ledger: ResourceLedger,
}

impl Tracked {
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for Tracked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tracked").field(&self.label).finish()
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.ledger.release(&self.label);
    }
}

#[derive(Debug, Default)]
pub struct HeadlessDevice {
    ledger: ResourceLedger,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }

    pub fn allocate(&self, label: &str) -> Tracked {
        self.ledger.allocate(label)
    }
}

#[derive(Debug)]
pub struct HeadlessMesh {
    pub vertex_count: u32,
    pub index_count: u32,
    pub stride: u32,
    _buffers: Tracked,
}

/// Off-screen target keeping every presented frame's commands.
#[derive(Debug)]
pub struct HeadlessTarget {
    extent: Extent,
    frames: Vec<Vec<Command>>,
    skip_next: bool,
}

impl HeadlessTarget {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            frames: Vec::new(),
            skip_next: false,
        }
    }

    pub fn frames(&self) -> &[Vec<Command>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Command]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Make the next acquire report an out-of-date target.
    pub fn skip_next_frame(&mut self) {
        self.skip_next = true;
    }
}

#[derive(Debug)]
pub struct HeadlessFrame {
    extent: Extent,
    commands: Vec<Command>,
}

#[derive(Debug, Clone, Copy)]
pub struct Headless;

impl Backend for Headless {
    type Device = HeadlessDevice;
    type Target = HeadlessTarget;
    type Frame = HeadlessFrame;
    type Pass<'p> = Vec<Command>;
    type Pipeline = Tracked;
    type Mesh = HeadlessMesh;

    fn create_mesh(device: &HeadlessDevice, mesh: &MeshData) -> Result<HeadlessMesh, RenderError> {
        let expected = mesh.vertex_count as usize * mesh.layout.stride as usize;
        if mesh.vertices.len() != expected {
            return Err(RenderError::Device(format!(
                "vertex buffer holds {} bytes, layout needs {expected}",
                mesh.vertices.len()
            )));
        }
        Ok(HeadlessMesh {
            vertex_count: mesh.vertex_count,
            index_count: mesh.index_count(),
            stride: mesh.layout.stride,
            _buffers: device.allocate("mesh"),
        })
    }

    fn target_extent(target: &HeadlessTarget) -> Extent {
        target.extent
    }

    fn resize(_device: &HeadlessDevice, target: &mut HeadlessTarget, extent: Extent) {
        target.extent = extent;
    }

    fn acquire_frame(
        _device: &HeadlessDevice,
        target: &mut HeadlessTarget,
    ) -> Result<Option<HeadlessFrame>, RenderError> {
        if std::mem::take(&mut target.skip_next) || target.extent.is_empty() {
            return Ok(None);
        }
        Ok(Some(HeadlessFrame {
            extent: target.extent,
            commands: Vec::new(),
        }))
    }

    fn encode_pass<R>(
        _device: &HeadlessDevice,
        frame: &mut HeadlessFrame,
        clear: Colour,
        record: impl FnOnce(&mut Self::Pass<'_>) -> R,
    ) -> R {
        frame.commands.push(Command::BeginPass {
            clear,
            extent: frame.extent,
        });
        let mut pass = Vec::new();
        let result = record(&mut pass);
        frame.commands.append(&mut pass);
        frame.commands.push(Command::EndPass);
        result
    }

    fn present(_device: &HeadlessDevice, target: &mut HeadlessTarget, frame: HeadlessFrame) {
        target.frames.push(frame.commands);
    }
}

/// Mesh-drawing stage that allocates the same kinds of resources as the
/// GPU mesh stages and records their draw.
#[derive(Debug, Default)]
pub struct TraceMeshStage {
    mesh: Option<MeshHandle<Headless>>,
}

impl TraceMeshStage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub struct TraceMeshState {
    mesh: Option<MeshHandle<Headless>>,
    updates: u64,
    _layout: Tracked,
    _uniforms: Tracked,
    _bind_group: Tracked,
}

impl TraceMeshState {
    pub fn updates(&self) -> u64 {
        self.updates
    }
}

impl RenderStage<Headless> for TraceMeshStage {
    type State = TraceMeshState;

    fn name(&self) -> &str {
        "trace-mesh"
    }

    fn initialise(&self, device: &HeadlessDevice) -> Result<TraceMeshState, RenderError> {
        Ok(TraceMeshState {
            mesh: self.mesh.clone(),
            updates: 0,
            _layout: device.allocate("pipeline_layout"),
            _uniforms: device.allocate("uniform_buffer"),
            _bind_group: device.allocate("bind_group"),
        })
    }

    fn is_valid(&self, state: &TraceMeshState) -> bool {
        same_mesh(self.mesh.as_ref(), state.mesh.as_ref())
    }

    fn update(&mut self, state: &mut TraceMeshState, _device: &HeadlessDevice, _frame: &FrameInfo) {
        state.updates += 1;
    }

    fn bind(
        &self,
        state: &TraceMeshState,
        device: &HeadlessDevice,
        pass: &mut Vec<Command>,
        extent: Extent,
    ) -> Result<Option<Tracked>, RenderError> {
        let Some(mesh) = &state.mesh else {
            return Ok(None);
        };
        let pipeline = device.allocate("pipeline");
        pass.push(Command::BindPipeline {
            label: self.name().to_string(),
        });
        pass.push(Command::SetViewport(extent));
        pass.push(Command::BindGroups { count: 1 });
        pass.push(Command::PushConstants {
            size: std::mem::size_of::<MaterialBlock>() as u32,
        });
        pass.push(Command::BindMesh {
            vertex_count: mesh.vertex_count,
            index_count: mesh.index_count,
            stride: mesh.stride,
        });
        pass.push(Command::DrawIndexed {
            index_count: mesh.index_count,
        });
        Ok(Some(pipeline))
    }

    fn set_mesh(&mut self, mesh: Option<MeshHandle<Headless>>) -> bool {
        self.mesh = mesh;
        true
    }
}
