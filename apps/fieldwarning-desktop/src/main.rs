mod config;
mod lifecycle;

use anyhow::{Context, Result};
use clap::Parser;
use config::{AppConfig, StageKind};
use fieldwarning_common::{Colour, Extent};
use fieldwarning_kernel::{Game, GameState, LoopControl};
use fieldwarning_render_wgpu::GpuContext;
use lifecycle::{LifecycleService, WindowSignals};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "fieldwarning-desktop", about = "Render a glTF model in a window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write a daily rolling log file into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// glTF model to render
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory holding the PBR shaders
    #[arg(long)]
    shader_dir: Option<PathBuf>,

    /// Stage drawn over the clear colour
    #[arg(long, value_enum)]
    stage: Option<StageKind>,

    /// Clear colour as r,g,b,a
    #[arg(long, value_delimiter = ',', num_args = 4)]
    clear: Option<Vec<f32>>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

impl Cli {
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(dir) = &self.shader_dir {
            config.shader_dir = dir.clone();
        }
        if let Some(stage) = self.stage {
            config.stage = stage;
        }
        if let Some([r, g, b, a]) = self.clear.as_deref() {
            config.clear_colour = Colour::rgba(*r, *g, *b, *a);
        }
        if let Some(width) = self.width {
            config.window.width = width;
        }
        if let Some(height) = self.height {
            config.window.height = height;
        }
        Ok(config)
    }
}

struct DesktopApp {
    config: AppConfig,
    signals: Rc<WindowSignals>,
    window: Option<Arc<Window>>,
    game: Option<Game>,
    /// Zero-sized window; redraws wait for the next non-empty resize.
    minimised: bool,
    error: Option<anyhow::Error>,
}

impl DesktopApp {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            signals: Rc::new(WindowSignals::default()),
            window: None,
            game: None,
            minimised: false,
            error: None,
        }
    }

    /// Forward a new window size. Returns true when the window comes back
    /// from being minimised.
    fn track_resize(&mut self, extent: Extent) -> bool {
        self.signals.request_resize(extent);
        let was_minimised = self.minimised;
        self.minimised = extent.is_empty();
        was_minimised && !self.minimised
    }

    fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn run_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if game.state() != GameState::Running {
            event_loop.exit();
            return;
        }
        match game.frame() {
            Ok(LoopControl::Continue) => {
                if !self.minimised {
                    self.request_redraw();
                }
            }
            Ok(LoopControl::Stop) => event_loop.exit(),
            Err(e) => self.fail(event_loop, anyhow::Error::new(e).context("rendering frame")),
        }
    }

    fn create_game(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.window.width, self.config.window.height));
        let window = Arc::new(event_loop.create_window(attrs).context("creating window")?);
        let size = window.inner_size();

        let (context, target) = GpuContext::with_surface(window.clone(), Extent::new(size.width, size.height))
            .context("initialising GPU")?;

        let mut game = Game::new();
        game.add_service(LifecycleService::new(
            self.config.clone(),
            context,
            target,
            self.signals.clone(),
        ))?;
        game.start().context("starting services")?;

        window.request_redraw();
        self.window = Some(window);
        self.game = Some(game);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.error = Some(error);
        event_loop.exit();
    }
}

impl ApplicationHandler for DesktopApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_game(event_loop) {
            self.fail(event_loop, e);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                self.signals.request_close();
                // A minimised window may never deliver the redraw.
                if self.minimised {
                    self.run_frame(event_loop);
                } else {
                    self.request_redraw();
                }
            }
            WindowEvent::Resized(size) => {
                if self.track_resize(Extent::new(size.width, size.height)) {
                    event_loop.set_control_flow(ControlFlow::Poll);
                    self.request_redraw();
                } else if self.minimised {
                    event_loop.set_control_flow(ControlFlow::Wait);
                }
            }
            WindowEvent::RedrawRequested => self.run_frame(event_loop),
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(mut game) = self.game.take() {
            game.stop();
        }
        tracing::info!("fieldwarning-desktop exiting");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let file_layer = cli.log_dir.as_ref().map(|dir| {
        let appender = tracing_appender::rolling::daily(dir, "fieldwarning.log");
        tracing_appender::non_blocking(appender)
    });
    let (file_writer, _guard) = match file_layer {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };
    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .with(file_writer.map(|writer| tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false)))
        .init();

    let config = cli.resolve_config()?;
    tracing::info!(model = %config.model.display(), stage = ?config.stage, "fieldwarning-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = DesktopApp::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "fieldwarning-desktop",
            "--stage",
            "mesh",
            "--clear",
            "0.1,0.2,0.3,1.0",
            "--width",
            "640",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.stage, StageKind::Mesh);
        assert_eq!(config.clear_colour, Colour::rgba(0.1, 0.2, 0.3, 1.0));
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 960);
    }

    #[test]
    fn minimised_window_pauses_redraws_until_restored() {
        let mut app = DesktopApp::new(AppConfig::default());
        assert!(!app.track_resize(Extent::new(800, 600)));
        assert!(!app.minimised);

        assert!(!app.track_resize(Extent::new(0, 0)));
        assert!(app.minimised);
        assert!(!app.track_resize(Extent::new(800, 0)));
        assert!(app.minimised);

        assert!(app.track_resize(Extent::new(1024, 768)));
        assert!(!app.minimised);
        assert!(!app.track_resize(Extent::new(1280, 800)));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("desktop.json");
        std::fs::write(&path, r#"{ "stage": "quad", "shader_dir": "from_file" }"#).unwrap();

        let cli = Cli::parse_from([
            "fieldwarning-desktop",
            "--config",
            path.to_str().unwrap(),
            "--shader-dir",
            "from_flag",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.stage, StageKind::Quad);
        assert_eq!(config.shader_dir, PathBuf::from("from_flag"));
    }
}
