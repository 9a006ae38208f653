use fieldwarning_assets::{AssetError, VertexFormat};
use std::path::PathBuf;
use thiserror::Error;

/// Failure to load a shader file.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("shader not found: {}", path.display())]
    Missing { path: PathBuf },
    #[error("failed to read shader {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed shader {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    #[error("unsupported shader type: {}", path.display())]
    UnsupportedExtension { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("failed to initialise stage '{stage}': {source}")]
    StageInit {
        stage: String,
        #[source]
        source: Box<RenderError>,
    },
    #[error("stage '{stage}' does not draw external meshes")]
    MeshNotAccepted { stage: String },
    #[error("no stage with id {0}")]
    UnknownStage(usize),
    #[error("vertex format {0} has no GPU equivalent")]
    UnsupportedVertexFormat(VertexFormat),
    #[error("device error: {0}")]
    Device(String),
}
