use crate::accessor::Semantic;

/// Errors from model loading. All of them are fatal for the load.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("unsupported primitive mode {0}, only triangle lists are loaded")]
    UnsupportedPrimitiveMode(u32),
    #[error("accessor {accessor} cannot be used as an index buffer: {reason}")]
    InvalidIndexAccessor { accessor: usize, reason: String },
    #[error("primitive {primitive} of mesh {mesh} has no {semantic} attribute")]
    MissingAttribute {
        mesh: usize,
        primitive: usize,
        semantic: Semantic,
    },
    #[error("accessor {0} has no buffer view (sparse accessors are not supported)")]
    SparseAccessor(usize),
    #[error("{kind} index {index} is out of range")]
    MissingReference { kind: &'static str, index: usize },
    #[error("accessor {accessor} reads past the end of its buffer ({needed} > {available} bytes)")]
    AccessorOutOfBounds {
        accessor: usize,
        needed: usize,
        available: usize,
    },
    #[error("attribute {semantic} has {actual} elements, expected {expected}")]
    MismatchedVertexCount {
        semantic: Semantic,
        expected: usize,
        actual: usize,
    },
    #[error("vertex layout stride {layout} does not match vertex size {vertex}")]
    StrideMismatch { layout: u32, vertex: usize },
    #[error("{0} vertices do not fit 32-bit indices")]
    TooManyVertices(usize),
    #[error("model contains no triangle primitives")]
    EmptyModel,
}

impl AssetError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn missing(kind: &'static str, index: usize) -> Self {
        Self::MissingReference { kind, index }
    }
}
