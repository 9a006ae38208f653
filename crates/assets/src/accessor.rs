//! Accessor component types and shapes, and the stride table derived from them.

use gltf::accessor::{DataType, Dimensions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar type of each component of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Byte,
    UnsignedByte,
    Short,
    UnsignedShort,
    UnsignedInt,
    Float,
}

impl From<DataType> for ComponentType {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::I8 => Self::Byte,
            DataType::U8 => Self::UnsignedByte,
            DataType::I16 => Self::Short,
            DataType::U16 => Self::UnsignedShort,
            DataType::U32 => Self::UnsignedInt,
            DataType::F32 => Self::Float,
        }
    }
}

impl ComponentType {
    pub fn code(self) -> u32 {
        match self {
            Self::Byte => 5120,
            Self::UnsignedByte => 5121,
            Self::Short => 5122,
            Self::UnsignedShort => 5123,
            Self::UnsignedInt => 5125,
            Self::Float => 5126,
        }
    }

    /// Size of one component in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort => 2,
            Self::UnsignedInt | Self::Float => 4,
        }
    }
}

/// Shape of an accessor element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessorType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl From<Dimensions> for AccessorType {
    fn from(dimensions: Dimensions) -> Self {
        match dimensions {
            Dimensions::Scalar => Self::Scalar,
            Dimensions::Vec2 => Self::Vec2,
            Dimensions::Vec3 => Self::Vec3,
            Dimensions::Vec4 => Self::Vec4,
            Dimensions::Mat2 => Self::Mat2,
            Dimensions::Mat3 => Self::Mat3,
            Dimensions::Mat4 => Self::Mat4,
        }
    }
}

impl AccessorType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Scalar => "SCALAR",
            Self::Vec2 => "VEC2",
            Self::Vec3 => "VEC3",
            Self::Vec4 => "VEC4",
            Self::Mat2 => "MAT2",
            Self::Mat3 => "MAT3",
            Self::Mat4 => "MAT4",
        }
    }

    /// Number of components per element.
    pub fn component_count(self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vec2 => 2,
            Self::Vec3 => 3,
            Self::Vec4 | Self::Mat2 => 4,
            Self::Mat3 => 9,
            Self::Mat4 => 16,
        }
    }

    pub fn is_matrix(self) -> bool {
        matches!(self, Self::Mat2 | Self::Mat3 | Self::Mat4)
    }
}

/// Byte stride of one element: component size times component count.
pub fn element_size(component: ComponentType, shape: AccessorType) -> usize {
    component.byte_size() * shape.component_count()
}

/// Format of one interleaved vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexFormat {
    pub component: ComponentType,
    pub shape: AccessorType,
    /// Integer components are normalised to `[0, 1]` / `[-1, 1]` when read.
    pub normalized: bool,
}

impl VertexFormat {
    pub const fn float(shape: AccessorType) -> Self {
        Self {
            component: ComponentType::Float,
            shape,
            normalized: false,
        }
    }

    pub fn size(&self) -> usize {
        element_size(self.component, self.shape)
    }
}

impl fmt::Display for VertexFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}x{}", self.component, self.shape.name())?;
        if self.normalized {
            f.write_str(" (normalized)")?;
        }
        Ok(())
    }
}

/// Vertex attribute semantic, as named in a primitive's `attributes` map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Semantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Colour(u32),
}

impl Semantic {
    /// The key this semantic is stored under in a primitive.
    pub fn to_gltf(self) -> gltf::Semantic {
        match self {
            Self::Position => gltf::Semantic::Positions,
            Self::Normal => gltf::Semantic::Normals,
            Self::Tangent => gltf::Semantic::Tangents,
            Self::TexCoord(set) => gltf::Semantic::TexCoords(set),
            Self::Colour(set) => gltf::Semantic::Colors(set),
        }
    }

    pub fn gltf_name(&self) -> String {
        match self {
            Self::Position => "POSITION".into(),
            Self::Normal => "NORMAL".into(),
            Self::Tangent => "TANGENT".into(),
            Self::TexCoord(set) => format!("TEXCOORD_{set}"),
            Self::Colour(set) => format!("COLOR_{set}"),
        }
    }
}

impl fmt::Display for Semantic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.gltf_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENTS: [(ComponentType, usize); 6] = [
        (ComponentType::Byte, 1),
        (ComponentType::UnsignedByte, 1),
        (ComponentType::Short, 2),
        (ComponentType::UnsignedShort, 2),
        (ComponentType::UnsignedInt, 4),
        (ComponentType::Float, 4),
    ];

    const SHAPES: [(AccessorType, usize); 7] = [
        (AccessorType::Scalar, 1),
        (AccessorType::Vec2, 2),
        (AccessorType::Vec3, 3),
        (AccessorType::Vec4, 4),
        (AccessorType::Mat2, 4),
        (AccessorType::Mat3, 9),
        (AccessorType::Mat4, 16),
    ];

    #[test]
    fn stride_is_component_size_times_count() {
        for (component, bytes) in COMPONENTS {
            for (shape, count) in SHAPES {
                assert_eq!(
                    element_size(component, shape),
                    bytes * count,
                    "{component:?} {shape:?}"
                );
            }
        }
    }

    #[test]
    fn well_known_strides() {
        assert_eq!(element_size(ComponentType::Float, AccessorType::Vec3), 12);
        assert_eq!(element_size(ComponentType::Float, AccessorType::Vec2), 8);
        assert_eq!(element_size(ComponentType::UnsignedShort, AccessorType::Scalar), 2);
        assert_eq!(element_size(ComponentType::Float, AccessorType::Mat4), 64);
        assert_eq!(element_size(ComponentType::UnsignedByte, AccessorType::Vec4), 4);
    }

    #[test]
    fn gltf_component_types_map_onto_the_table() {
        let mapped = [DataType::I8, DataType::U8, DataType::I16, DataType::U16, DataType::U32, DataType::F32]
            .map(ComponentType::from);
        assert_eq!(mapped, COMPONENTS.map(|(component, _)| component));
        for (component, bytes) in COMPONENTS {
            assert_eq!(component.byte_size(), bytes);
        }
        assert_eq!(ComponentType::from(DataType::U16).code(), 5123);
    }

    #[test]
    fn gltf_dimensions_map_onto_the_table() {
        let mapped = [
            Dimensions::Scalar,
            Dimensions::Vec2,
            Dimensions::Vec3,
            Dimensions::Vec4,
            Dimensions::Mat2,
            Dimensions::Mat3,
            Dimensions::Mat4,
        ]
        .map(AccessorType::from);
        assert_eq!(mapped, SHAPES.map(|(shape, _)| shape));
        assert_eq!(AccessorType::from(Dimensions::Mat3).name(), "MAT3");
    }

    #[test]
    fn semantic_names() {
        assert_eq!(Semantic::Position.to_gltf(), gltf::Semantic::Positions);
        assert_eq!(Semantic::TexCoord(1).to_gltf(), gltf::Semantic::TexCoords(1));
        assert_eq!(Semantic::Colour(0).to_gltf(), gltf::Semantic::Colors(0));
        assert_eq!(Semantic::TexCoord(0).to_string(), "TEXCOORD_0");
        assert_eq!(Semantic::Colour(2).to_string(), "COLOR_2");
    }
}
