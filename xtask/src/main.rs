use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use fieldwarning_render::load_shader;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the Field Warning renderer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, shaders, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Validate every shader file in a directory
    Shaders {
        #[arg(long, default_value = "data/shaders")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt", &["fmt", "--all", "--", "--check"])?;
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            check_shaders(Path::new("data/shaders"))?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Shaders { dir } => check_shaders(&dir)?,
    }

    Ok(())
}

fn cargo(task: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        bail!("cargo {task} failed");
    }
    Ok(())
}

/// Load every `.spv` and `.wgsl` file under `dir`; fails on the first bad one.
fn check_shaders(dir: &Path) -> Result<()> {
    println!("==> Checking shaders in {}", dir.display());
    let mut checked = 0;
    let entries = std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        let is_shader = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("spv" | "wgsl")
        );
        if !is_shader {
            continue;
        }
        let code = load_shader(&path)?;
        println!("    {} {} ({} bytes)", path.display(), code.kind(), code.size_bytes());
        checked += 1;
    }
    if checked == 0 {
        bail!("no shaders found in {}", dir.display());
    }
    Ok(())
}
