//! Model loading for the renderer: glTF 2.0 (`.gltf` with embedded or
//! external buffers, and `.glb`) to interleaved vertex buffers. Parsing and
//! buffer resolution go through the `gltf` crate.
//!
//! # Invariants
//! - Element stride is always component size times component count, looked
//!   up from explicit enum tables.
//! - Index data is copied through as a triangle list.
//! - Any unsupported construct is an error; nothing is silently skipped.

pub mod accessor;
mod error;
pub mod interleave;
mod model;

pub use accessor::{AccessorType, ComponentType, Semantic, VertexFormat, element_size};
pub use error::AssetError;
pub use interleave::{AttributeSource, Interleaved, VertexAttribute, VertexLayout, interleave};
pub use model::{IndexData, LoadOptions, MeshData, Model};

pub fn crate_info() -> &'static str {
    "fieldwarning-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("assets"));
    }
}
