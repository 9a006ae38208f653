use crate::{FrameClock, KernelError, LoopControl, Updatable, UpdatableId, UpdateLoop};
use fieldwarning_common::FrameTime;

/// A long-lived part of the game, updated every frame between `start` and `stop`.
pub trait GameService: Updatable {
    fn name(&self) -> &str;

    /// Acquire resources. Runs once, in registration order.
    fn start(&mut self) -> Result<(), KernelError> {
        Ok(())
    }

    /// Release resources. Runs once, in reverse registration order, for
    /// every service whose `start` succeeded.
    fn stop(&mut self) {}
}

/// Lifecycle of a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Created,
    Running,
    Stopped,
}

/// Owns the services and drives them through start, frames and stop.
pub struct Game {
    services: UpdateLoop<dyn GameService>,
    state: GameState,
    clock: FrameClock,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            services: UpdateLoop::new(),
            state: GameState::Created,
            clock: FrameClock::new(),
        }
    }
}

impl Game {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Register a service. Only allowed before `start`, so every service
    /// that is updated and stopped has also been started.
    pub fn add_service(&mut self, service: impl GameService + 'static) -> Result<UpdatableId, KernelError> {
        if self.state != GameState::Created {
            return Err(KernelError::InvalidState(self.state, GameState::Created));
        }
        Ok(self.services.register(Box::new(service)))
    }

    /// Start every service in order. If one fails, the services already
    /// started are stopped in reverse order and the error is returned.
    pub fn start(&mut self) -> Result<(), KernelError> {
        if self.state != GameState::Created {
            return Err(KernelError::InvalidState(self.state, GameState::Created));
        }

        let mut started = 0;
        let mut failure = None;
        for service in self.services.iter_mut() {
            tracing::info!(service = service.name(), "starting service");
            match service.start() {
                Ok(()) => started += 1,
                Err(e) => {
                    tracing::error!(service = service.name(), "service failed to start: {e}");
                    failure = Some(e);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            self.stop_first(started);
            self.state = GameState::Stopped;
            return Err(err);
        }
        self.state = GameState::Running;
        Ok(())
    }

    /// Run one frame with wall-clock timing.
    pub fn frame(&mut self) -> Result<LoopControl, KernelError> {
        let time = self.clock.tick();
        self.frame_at(&time)
    }

    /// Run one frame with the given timing. On `Stop` or error every
    /// service is stopped before returning.
    pub fn frame_at(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError> {
        if self.state != GameState::Running {
            return Err(KernelError::InvalidState(self.state, GameState::Running));
        }
        match self.services.update_all(time) {
            Ok(LoopControl::Continue) => Ok(LoopControl::Continue),
            Ok(LoopControl::Stop) => {
                tracing::info!(frame = time.index, "stop requested");
                self.stop();
                Ok(LoopControl::Stop)
            }
            Err(e) => {
                tracing::error!(frame = time.index, "frame failed: {e}");
                self.stop();
                Err(e)
            }
        }
    }

    /// Start if needed, then run frames until a service stops the game or
    /// `max_frames` have run. Returns the number of frames run.
    pub fn run_headless(&mut self, max_frames: u64) -> Result<u64, KernelError> {
        if self.state == GameState::Created {
            self.start()?;
        }
        let mut frames = 0;
        while frames < max_frames {
            let control = self.frame()?;
            frames += 1;
            if control == LoopControl::Stop {
                return Ok(frames);
            }
        }
        self.stop();
        Ok(frames)
    }

    /// Stop all services. Does nothing unless the game is running.
    pub fn stop(&mut self) {
        if self.state == GameState::Running {
            let count = self.services.len();
            self.stop_first(count);
            self.state = GameState::Stopped;
        }
    }

    fn stop_first(&mut self, count: usize) {
        let mut running: Vec<_> = self.services.iter_mut().take(count).collect();
        for service in running.iter_mut().rev() {
            tracing::info!(service = service.name(), "stopping service");
            service.stop();
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Service that runs a closure every frame.
pub struct ActionService<F> {
    name: String,
    action: F,
}

impl<F> ActionService<F>
where
    F: FnMut(&FrameTime) -> Result<LoopControl, KernelError>,
{
    pub fn new(name: impl Into<String>, action: F) -> Self {
        Self {
            name: name.into(),
            action,
        }
    }
}

impl<F> Updatable for ActionService<F>
where
    F: FnMut(&FrameTime) -> Result<LoopControl, KernelError>,
{
    fn update(&mut self, time: &FrameTime) -> Result<LoopControl, KernelError> {
        (self.action)(time)
    }
}

impl<F> GameService for ActionService<F>
where
    F: FnMut(&FrameTime) -> Result<LoopControl, KernelError>,
{
    fn name(&self) -> &str {
        &self.name
    }
}
