use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use fieldwarning_assets::{AccessorType, ComponentType, LoadOptions, Model, element_size};
use fieldwarning_common::{Colour, Extent, FrameTime};
use fieldwarning_kernel::{ActionService, Game, KernelError, LoopControl};
use fieldwarning_render::headless::{Headless, HeadlessDevice, HeadlessTarget, TraceMeshStage};
use fieldwarning_render::{ClearStage, RenderMap, load_shader};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fieldwarning-cli", about = "Headless tools for the Field Warning renderer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// List the accessors and interleaved primitives of a glTF model
    Inspect {
        model: PathBuf,
    },
    /// Check that a shader file is valid SPIR-V or readable WGSL
    Shader {
        path: PathBuf,
    },
    /// Render a model headlessly and print the recorded commands and resources
    Trace {
        model: PathBuf,
        /// Number of frames to render
        #[arg(short, long, default_value = "2")]
        frames: u64,
        #[arg(long, default_value = "1440")]
        width: u32,
        #[arg(long, default_value = "960")]
        height: u32,
    },
}

fn inspect(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let gltf = gltf::Gltf::from_slice(&bytes).with_context(|| format!("parsing {}", path.display()))?;
    let asset = &gltf.document.as_json().asset;

    let mut lines = vec![format!(
        "{}: glTF {} ({})",
        path.display(),
        asset.version,
        asset.generator.as_deref().unwrap_or("unknown generator")
    )];
    lines.push(format!("accessors: {}", gltf.document.accessors().len()));
    for accessor in gltf.document.accessors() {
        let component = ComponentType::from(accessor.data_type());
        let shape = AccessorType::from(accessor.dimensions());
        let stride = accessor
            .view()
            .and_then(|view| view.stride())
            .map(|s| format!(" view_stride={s}"))
            .unwrap_or_default();
        lines.push(format!(
            "  #{:<3} {component:?} {} x{} element={}B{stride}",
            accessor.index(),
            shape.name(),
            accessor.count(),
            element_size(component, shape)
        ));
    }

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let model = Model::from_slice(&bytes, base_dir, &LoadOptions::default())?;
    lines.push(format!("primitives: {}", model.meshes.len()));
    for (index, mesh) in model.meshes.iter().enumerate() {
        lines.push(format!(
            "  [{index}] {} vertices={} indices={} stride={}",
            mesh.name.as_deref().unwrap_or("unnamed"),
            mesh.vertex_count,
            mesh.index_count(),
            mesh.layout.stride
        ));
        for attribute in &mesh.layout.attributes {
            lines.push(format!(
                "      location={} {} {} offset={}",
                attribute.location, attribute.semantic, attribute.format, attribute.offset
            ));
        }
    }
    Ok(lines)
}

fn check_shader(path: &Path) -> Result<String> {
    let code = load_shader(path)?;
    Ok(format!("{}: {} ({} bytes)", path.display(), code.kind(), code.size_bytes()))
}

fn trace(path: &Path, frames: u64, extent: Extent) -> Result<Vec<String>> {
    let model = Model::load(path, &LoadOptions::default())?;
    let device = HeadlessDevice::new();
    let ledger = device.ledger().clone();

    let mut map: RenderMap<Headless> = RenderMap::new(device, HeadlessTarget::new(extent));
    map.add_stage(ClearStage::new(Colour::BLACK));
    let stage = map.add_stage(TraceMeshStage::new());
    let mesh = map.create_static_mesh(model.primary())?;
    map.set_mesh(stage, Some(mesh))?;

    let map = Rc::new(RefCell::new(map));
    let frame_map = Rc::clone(&map);
    let mut game = Game::new();
    game.add_service(ActionService::new("trace", move |time: &FrameTime| {
        frame_map
            .borrow_mut()
            .render_frame(time)
            .map_err(|e| KernelError::service("trace", e))?;
        Ok(LoopControl::Continue)
    }))?;
    let ran = game.run_headless(frames)?;
    drop(game);
    tracing::info!(frames = ran, "trace finished");

    let map = Rc::try_unwrap(map)
        .map_err(|_| anyhow!("render map is still shared"))?
        .into_inner();
    let mut lines = vec![format!("frames rendered: {ran}")];
    for (index, commands) in map.target().frames().iter().enumerate() {
        lines.push(format!("frame {index}:"));
        lines.extend(commands.iter().map(|c| format!("  {c}")));
    }

    lines.push("resources while open:".into());
    lines.extend(ledger_lines(&ledger));
    map.close();
    lines.push("resources after close:".into());
    lines.extend(ledger_lines(&ledger));
    Ok(lines)
}

fn ledger_lines(ledger: &fieldwarning_render::headless::ResourceLedger) -> Vec<String> {
    ledger
        .snapshot()
        .iter()
        .map(|(label, counts)| {
            format!(
                "  {label:<16} allocated={} released={}",
                counts.allocated, counts.released
            )
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("fieldwarning-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("assets: {}", fieldwarning_assets::crate_info());
            println!("kernel: {}", fieldwarning_kernel::crate_info());
            println!("render: {}", fieldwarning_render::crate_info());
        }
        Commands::Inspect { model } => {
            for line in inspect(&model)? {
                println!("{line}");
            }
        }
        Commands::Shader { path } => {
            println!("{}", check_shader(&path)?);
        }
        Commands::Trace {
            model,
            frames,
            width,
            height,
        } => {
            for line in trace(&model, frames, Extent::new(width, height))? {
                println!("{line}");
            }
        }
    }

    Ok(())
}
