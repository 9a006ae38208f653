use crate::accessor::{AccessorType, ComponentType, Semantic, VertexFormat, element_size};
use crate::error::AssetError;
use crate::interleave::{AttributeSource, VertexLayout, interleave};
use gltf::Accessor;
use gltf::buffer::Data;
use gltf::mesh::Mode;
use std::path::Path;

/// Which attributes to pull out of each primitive, in shader location order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub attributes: Vec<Semantic>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            attributes: vec![Semantic::Position, Semantic::Normal, Semantic::TexCoord(0)],
        }
    }
}

/// Triangle-list index data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexData {
    U16(Vec<u16>),
    U32(Vec<u32>),
}

impl IndexData {
    pub fn len(&self) -> usize {
        match self {
            Self::U16(v) => v.len(),
            Self::U32(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::U16(v) => bytemuck::cast_slice(v),
            Self::U32(v) => bytemuck::cast_slice(v),
        }
    }

    /// Largest index value, if any.
    pub fn max_index(&self) -> Option<u32> {
        match self {
            Self::U16(v) => v.iter().max().map(|&i| i as u32),
            Self::U32(v) => v.iter().max().copied(),
        }
    }
}

/// CPU-side mesh ready for upload: one interleaved vertex buffer plus indices.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: Option<String>,
    pub vertices: Vec<u8>,
    pub vertex_count: u32,
    pub layout: VertexLayout,
    pub indices: IndexData,
}

impl MeshData {
    /// Build a mesh from plain-old-data vertices described by `layout`.
    pub fn from_vertices<V: bytemuck::Pod>(
        vertices: &[V],
        layout: VertexLayout,
        indices: IndexData,
    ) -> Result<Self, AssetError> {
        let vertex = std::mem::size_of::<V>();
        if layout.stride as usize != vertex {
            return Err(AssetError::StrideMismatch {
                layout: layout.stride,
                vertex,
            });
        }
        let vertex_count =
            u32::try_from(vertices.len()).map_err(|_| AssetError::TooManyVertices(vertices.len()))?;
        Ok(Self {
            name: None,
            vertices: bytemuck::cast_slice(vertices).to_vec(),
            vertex_count,
            layout,
            indices,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// All triangle primitives of a model, one `MeshData` each.
#[derive(Debug, Clone)]
pub struct Model {
    pub meshes: Vec<MeshData>,
}

impl Model {
    /// Load a `.gltf` or `.glb` file. External buffers resolve relative to it.
    pub fn load(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let _span = tracing::info_span!("load_model", path = %path.display()).entered();
        let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let model = Self::from_slice(&bytes, base_dir, options)?;
        tracing::info!(
            meshes = model.meshes.len(),
            vertices = model.vertex_count(),
            "model loaded"
        );
        Ok(model)
    }

    /// Parse a model already in memory.
    pub fn from_slice(bytes: &[u8], base_dir: &Path, options: &LoadOptions) -> Result<Self, AssetError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
        let buffers = gltf::import_buffers(&document, Some(base_dir), blob)?;

        let mut meshes = Vec::new();
        for mesh in document.meshes() {
            for primitive in mesh.primitives() {
                let mode = primitive.mode();
                if mode != Mode::Triangles {
                    return Err(AssetError::UnsupportedPrimitiveMode(mode.as_gl_enum()));
                }

                let mut sources = Vec::with_capacity(options.attributes.len());
                for semantic in &options.attributes {
                    let accessor = primitive.get(&semantic.to_gltf()).ok_or(AssetError::MissingAttribute {
                        mesh: mesh.index(),
                        primitive: primitive.index(),
                        semantic: *semantic,
                    })?;
                    sources.push(attribute_source(&buffers, &accessor, *semantic)?);
                }

                let interleaved = interleave(&sources)?;
                let vertex_count = u32::try_from(interleaved.vertex_count)
                    .map_err(|_| AssetError::TooManyVertices(interleaved.vertex_count))?;
                let indices = match primitive.indices() {
                    Some(accessor) => read_indices(&buffers, &accessor, vertex_count)?,
                    None => IndexData::U32((0..vertex_count).collect()),
                };
                tracing::debug!(
                    mesh = mesh.index(),
                    primitive = primitive.index(),
                    vertices = vertex_count,
                    indices = indices.len(),
                    stride = interleaved.layout.stride,
                    "primitive interleaved"
                );

                meshes.push(MeshData {
                    name: mesh.name().map(str::to_owned),
                    vertices: interleaved.bytes,
                    vertex_count,
                    layout: interleaved.layout,
                    indices,
                });
            }
        }

        if meshes.is_empty() {
            return Err(AssetError::EmptyModel);
        }
        Ok(Self { meshes })
    }

    pub fn vertex_count(&self) -> u64 {
        self.meshes.iter().map(|m| m.vertex_count as u64).sum()
    }

    /// The first primitive, which is what the single-mesh stages draw.
    pub fn primary(&self) -> &MeshData {
        &self.meshes[0]
    }

    pub fn into_primary(mut self) -> MeshData {
        self.meshes.swap_remove(0)
    }
}

/// Resolve an accessor to a strided view into its buffer.
fn attribute_source<'a>(
    buffers: &'a [Data],
    accessor: &Accessor<'_>,
    semantic: Semantic,
) -> Result<AttributeSource<'a>, AssetError> {
    let index = accessor.index();
    let view = match accessor.view() {
        Some(view) if accessor.sparse().is_none() => view,
        _ => return Err(AssetError::SparseAccessor(index)),
    };
    let buffer_index = view.buffer().index();
    let buffer = buffers
        .get(buffer_index)
        .map(|data| data.0.as_slice())
        .ok_or(AssetError::missing("buffer", buffer_index))?;

    // Restricting to the view keeps reads from spilling into neighbouring views.
    let view_end = view.offset().checked_add(view.length());
    let data = match view_end {
        Some(end) if end <= buffer.len() => &buffer[view.offset()..end],
        _ => {
            return Err(AssetError::AccessorOutOfBounds {
                accessor: index,
                needed: view_end.unwrap_or(usize::MAX),
                available: buffer.len(),
            });
        }
    };

    let component = ComponentType::from(accessor.data_type());
    let shape = AccessorType::from(accessor.dimensions());
    let size = element_size(component, shape);
    let source = AttributeSource {
        accessor: index,
        semantic,
        format: VertexFormat {
            component,
            shape,
            normalized: accessor.normalized(),
        },
        data,
        offset: accessor.offset(),
        stride: view.stride().unwrap_or(size).max(size),
        count: accessor.count(),
    };
    source.check_bounds()?;
    Ok(source)
}

/// Read a scalar index accessor. Every index must name one of `vertex_count` vertices.
fn read_indices(buffers: &[Data], accessor: &Accessor<'_>, vertex_count: u32) -> Result<IndexData, AssetError> {
    let index = accessor.index();
    let shape = AccessorType::from(accessor.dimensions());
    if shape != AccessorType::Scalar {
        return Err(AssetError::InvalidIndexAccessor {
            accessor: index,
            reason: format!("type is {}", shape.name()),
        });
    }
    let source = attribute_source(buffers, accessor, Semantic::Position)?;
    let component = source.format.component;

    let elements = (0..source.count).map(|i| {
        let start = source.offset + i * source.stride;
        &source.data[start..start + component.byte_size()]
    });
    let indices = match component {
        // No 8-bit index format on the GPU side; widen.
        ComponentType::UnsignedByte => IndexData::U16(elements.map(|b| b[0] as u16).collect()),
        ComponentType::UnsignedShort => IndexData::U16(elements.map(|b| u16::from_le_bytes([b[0], b[1]])).collect()),
        ComponentType::UnsignedInt => IndexData::U32(
            elements
                .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect(),
        ),
        other => {
            return Err(AssetError::InvalidIndexAccessor {
                accessor: index,
                reason: format!("component type {other:?} is not an unsigned integer"),
            });
        }
    };

    if let Some(max) = indices.max_index().filter(|&max| max >= vertex_count) {
        return Err(AssetError::InvalidIndexAccessor {
            accessor: index,
            reason: format!("index {max} is out of range for {vertex_count} vertices"),
        });
    }
    Ok(indices)
}
