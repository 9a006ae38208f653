//! Interleaving of separate attribute streams into one vertex buffer.
//!
//! # Invariants
//! - Output length is `vertex_count * layout.stride`.
//! - The stride is the sum of the element sizes of all attributes.
//! - Attribute `i` of vertex `v` lives at `v * stride + offset_i`, where
//!   `offset_i` is the sum of the element sizes of attributes `0..i`.

use crate::accessor::{Semantic, VertexFormat};
use crate::error::AssetError;
use serde::{Deserialize, Serialize};

/// One attribute inside an interleaved vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    pub semantic: Semantic,
    pub format: VertexFormat,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
}

/// Description of an interleaved vertex: its size and attributes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VertexLayout {
    pub stride: u32,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Build a packed layout from attribute formats, assigning locations in order.
    pub fn packed(attributes: &[(Semantic, VertexFormat)]) -> Self {
        let mut layout = Self::default();
        for (location, (semantic, format)) in attributes.iter().enumerate() {
            layout.attributes.push(VertexAttribute {
                location: location as u32,
                semantic: *semantic,
                format: *format,
                offset: layout.stride,
            });
            layout.stride += format.size() as u32;
        }
        layout
    }

    pub fn attribute(&self, semantic: Semantic) -> Option<&VertexAttribute> {
        self.attributes.iter().find(|a| a.semantic == semantic)
    }
}

/// A strided source stream for one attribute.
#[derive(Debug, Clone, Copy)]
pub struct AttributeSource<'a> {
    /// Accessor index, used for error reporting.
    pub accessor: usize,
    pub semantic: Semantic,
    pub format: VertexFormat,
    /// Whole buffer the accessor reads from.
    pub data: &'a [u8],
    /// Offset of the first element within `data`.
    pub offset: usize,
    /// Distance between consecutive elements; at least the element size.
    pub stride: usize,
    /// Number of elements.
    pub count: usize,
}

impl AttributeSource<'_> {
    /// Fail unless every element of this source lies inside its buffer.
    pub fn check_bounds(&self) -> Result<(), AssetError> {
        if self.count == 0 {
            return Ok(());
        }
        let available = self.data.len();
        let needed = (self.count - 1)
            .checked_mul(self.stride)
            .and_then(|span| span.checked_add(self.offset))
            .and_then(|start| start.checked_add(self.format.size()));
        match needed {
            Some(needed) if needed <= available => Ok(()),
            needed => Err(AssetError::AccessorOutOfBounds {
                accessor: self.accessor,
                needed: needed.unwrap_or(usize::MAX),
                available,
            }),
        }
    }

    fn element(&self, index: usize) -> &[u8] {
        let start = self.offset + index * self.stride;
        &self.data[start..start + self.format.size()]
    }
}

/// Interleaved vertex data and the layout that describes it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interleaved {
    pub bytes: Vec<u8>,
    pub layout: VertexLayout,
    pub vertex_count: usize,
}

/// Interleave `sources` into one buffer. All sources must have the same
/// element count, which becomes the vertex count.
pub fn interleave(sources: &[AttributeSource<'_>]) -> Result<Interleaved, AssetError> {
    let vertex_count = sources.first().map_or(0, |s| s.count);
    for source in sources {
        if source.count != vertex_count {
            return Err(AssetError::MismatchedVertexCount {
                semantic: source.semantic,
                expected: vertex_count,
                actual: source.count,
            });
        }
        source.check_bounds()?;
    }

    let formats: Vec<_> = sources.iter().map(|s| (s.semantic, s.format)).collect();
    let layout = VertexLayout::packed(&formats);
    let stride = layout.stride as usize;

    // Vec allocations are capped at isize::MAX bytes.
    let total = vertex_count
        .checked_mul(stride)
        .ok_or(AssetError::AccessorOutOfBounds {
            accessor: sources.first().map_or(0, |s| s.accessor),
            needed: usize::MAX,
            available: isize::MAX as usize,
        })?;
    let mut bytes = vec![0u8; total];
    for (vertex, record) in bytes.chunks_exact_mut(stride.max(1)).enumerate() {
        for (source, attribute) in sources.iter().zip(&layout.attributes) {
            let offset = attribute.offset as usize;
            let element = source.element(vertex);
            record[offset..offset + element.len()].copy_from_slice(element);
        }
    }

    Ok(Interleaved {
        bytes,
        layout,
        vertex_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::{AccessorType, ComponentType};

    fn floats(values: &[f32]) -> Vec<u8> {
        bytemuck::cast_slice(values).to_vec()
    }

    fn source<'a>(semantic: Semantic, shape: AccessorType, data: &'a [u8], count: usize) -> AttributeSource<'a> {
        let format = VertexFormat::float(shape);
        AttributeSource {
            accessor: 0,
            semantic,
            format,
            data,
            offset: 0,
            stride: format.size(),
            count,
        }
    }

    #[test]
    fn output_size_is_vertices_times_summed_strides() {
        let positions = floats(&[0.0; 9]);
        let normals = floats(&[1.0; 9]);
        let uvs = floats(&[0.5; 6]);
        let out = interleave(&[
            source(Semantic::Position, AccessorType::Vec3, &positions, 3),
            source(Semantic::Normal, AccessorType::Vec3, &normals, 3),
            source(Semantic::TexCoord(0), AccessorType::Vec2, &uvs, 3),
        ])
        .unwrap();
        assert_eq!(out.layout.stride, 12 + 12 + 8);
        assert_eq!(out.bytes.len(), 3 * 32);
        assert_eq!(out.vertex_count, 3);
        let offsets: Vec<u32> = out.layout.attributes.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24]);
        let locations: Vec<u32> = out.layout.attributes.iter().map(|a| a.location).collect();
        assert_eq!(locations, vec![0, 1, 2]);
    }

    #[test]
    fn attributes_land_at_their_offsets() {
        let positions = floats(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let uvs = floats(&[10.0, 20.0, 30.0, 40.0]);
        let out = interleave(&[
            source(Semantic::Position, AccessorType::Vec3, &positions, 2),
            source(Semantic::TexCoord(0), AccessorType::Vec2, &uvs, 2),
        ])
        .unwrap();
        let values: &[f32] = bytemuck::cast_slice(&out.bytes);
        assert_eq!(values, &[1.0, 2.0, 3.0, 10.0, 20.0, 4.0, 5.0, 6.0, 30.0, 40.0]);
    }

    #[test]
    fn honours_source_stride_and_offset() {
        // Source is itself interleaved: [pos.x pos.y pos.z pad] per element, 4 bytes of header.
        let mut data = vec![0xAA; 4];
        data.extend(floats(&[1.0, 2.0, 3.0, -1.0, 4.0, 5.0, 6.0, -1.0]));
        let format = VertexFormat::float(AccessorType::Vec3);
        let out = interleave(&[AttributeSource {
            accessor: 0,
            semantic: Semantic::Position,
            format,
            data: &data,
            offset: 4,
            stride: 16,
            count: 2,
        }])
        .unwrap();
        let values: &[f32] = bytemuck::cast_slice(&out.bytes);
        assert_eq!(values, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn mixed_component_types_pack_tightly() {
        let positions = floats(&[0.0; 6]);
        let colours = vec![255u8; 8];
        let colour_format = VertexFormat {
            component: ComponentType::UnsignedByte,
            shape: AccessorType::Vec4,
            normalized: true,
        };
        let out = interleave(&[
            source(Semantic::Position, AccessorType::Vec3, &positions, 2),
            AttributeSource {
                accessor: 1,
                semantic: Semantic::Colour(0),
                format: colour_format,
                data: &colours,
                offset: 0,
                stride: 4,
                count: 2,
            },
        ])
        .unwrap();
        assert_eq!(out.layout.stride, 16);
        assert_eq!(&out.bytes[12..16], &[255; 4]);
        assert_eq!(&out.bytes[28..32], &[255; 4]);
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let a = floats(&[0.0; 9]);
        let b = floats(&[0.0; 6]);
        let err = interleave(&[
            source(Semantic::Position, AccessorType::Vec3, &a, 3),
            source(Semantic::Normal, AccessorType::Vec3, &b, 2),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            AssetError::MismatchedVertexCount { expected: 3, actual: 2, .. }
        ));
    }

    #[test]
    fn out_of_bounds_source_is_rejected() {
        let a = floats(&[0.0; 8]);
        let err = interleave(&[source(Semantic::Position, AccessorType::Vec3, &a, 3)]).unwrap_err();
        assert!(matches!(
            err,
            AssetError::AccessorOutOfBounds { needed: 36, available: 32, .. }
        ));
    }

    #[test]
    fn overflowing_extent_is_out_of_bounds() {
        let data = floats(&[0.0; 3]);
        let err = interleave(&[AttributeSource {
            offset: usize::MAX - 4,
            ..source(Semantic::Position, AccessorType::Vec3, &data, 1)
        }])
        .unwrap_err();
        assert!(matches!(
            err,
            AssetError::AccessorOutOfBounds { needed: usize::MAX, available: 12, .. }
        ));

        let err = interleave(&[source(Semantic::Position, AccessorType::Vec3, &data, usize::MAX / 4)]).unwrap_err();
        assert!(matches!(err, AssetError::AccessorOutOfBounds { available: 12, .. }));
    }

    #[test]
    fn empty_input_yields_empty_buffer() {
        let out = interleave(&[]).unwrap();
        assert!(out.bytes.is_empty());
        assert_eq!(out.layout.stride, 0);
    }
}
