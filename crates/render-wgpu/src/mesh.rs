use fieldwarning_assets::{AccessorType, ComponentType, IndexData, MeshData, Semantic, VertexFormat, VertexLayout};
use fieldwarning_render::RenderError;
use wgpu::util::DeviceExt;

/// Vertex and index buffers of one mesh plus its vertex-input description.
pub struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_format: wgpu::IndexFormat,
    index_count: u32,
    vertex_count: u32,
    layout: VertexLayout,
    attributes: Vec<wgpu::VertexAttribute>,
}

impl GpuMesh {
    pub fn upload(device: &wgpu::Device, data: &MeshData) -> Result<Self, RenderError> {
        let attributes = vertex_attributes(&data.layout)?;
        if data.layout.stride % wgpu::VERTEX_STRIDE_ALIGNMENT as u32 != 0 {
            return Err(RenderError::Device(format!(
                "vertex stride {} is not a multiple of {}",
                data.layout.stride,
                wgpu::VERTEX_STRIDE_ALIGNMENT
            )));
        }

        let label = data.name.as_deref().unwrap_or("mesh");
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: &data.vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: data.indices.as_bytes(),
            usage: wgpu::BufferUsages::INDEX,
        });
        let index_format = match data.indices {
            IndexData::U16(_) => wgpu::IndexFormat::Uint16,
            IndexData::U32(_) => wgpu::IndexFormat::Uint32,
        };

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_format,
            index_count: data.index_count(),
            vertex_count: data.vertex_count,
            layout: data.layout.clone(),
            attributes,
        })
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.layout.stride as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }

    /// Fail unless `semantic` is present at shader `location`.
    pub fn require(&self, semantic: Semantic, location: u32) -> Result<(), RenderError> {
        match self.layout.attribute(semantic) {
            Some(a) if a.location == location => Ok(()),
            Some(a) => Err(RenderError::Device(format!(
                "{semantic} is at location {}, shader expects {location}",
                a.location
            ))),
            None => Err(RenderError::Device(format!("mesh has no {semantic} attribute"))),
        }
    }

    /// Bind the buffers and draw every index.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), self.index_format);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

fn vertex_attributes(layout: &VertexLayout) -> Result<Vec<wgpu::VertexAttribute>, RenderError> {
    layout
        .attributes
        .iter()
        .map(|a| {
            Ok(wgpu::VertexAttribute {
                format: vertex_format(&a.format)?,
                offset: a.offset as wgpu::BufferAddress,
                shader_location: a.location,
            })
        })
        .collect()
}

/// The wgpu vertex format for an accessor format.
///
/// 32-bit components map for every vector width. 8- and 16-bit components
/// only exist as two- and four-wide formats. Matrices are not vertex inputs.
pub fn vertex_format(format: &VertexFormat) -> Result<wgpu::VertexFormat, RenderError> {
    use AccessorType::*;
    use ComponentType::*;
    use wgpu::VertexFormat as F;

    let mapped = match (format.component, format.shape, format.normalized) {
        (Float, Scalar, _) => F::Float32,
        (Float, Vec2, _) => F::Float32x2,
        (Float, Vec3, _) => F::Float32x3,
        (Float, Vec4, _) => F::Float32x4,
        (UnsignedInt, Scalar, _) => F::Uint32,
        (UnsignedInt, Vec2, _) => F::Uint32x2,
        (UnsignedInt, Vec3, _) => F::Uint32x3,
        (UnsignedInt, Vec4, _) => F::Uint32x4,
        (UnsignedByte, Vec2, false) => F::Uint8x2,
        (UnsignedByte, Vec4, false) => F::Uint8x4,
        (UnsignedByte, Vec2, true) => F::Unorm8x2,
        (UnsignedByte, Vec4, true) => F::Unorm8x4,
        (Byte, Vec2, false) => F::Sint8x2,
        (Byte, Vec4, false) => F::Sint8x4,
        (Byte, Vec2, true) => F::Snorm8x2,
        (Byte, Vec4, true) => F::Snorm8x4,
        (UnsignedShort, Vec2, false) => F::Uint16x2,
        (UnsignedShort, Vec4, false) => F::Uint16x4,
        (UnsignedShort, Vec2, true) => F::Unorm16x2,
        (UnsignedShort, Vec4, true) => F::Unorm16x4,
        (Short, Vec2, false) => F::Sint16x2,
        (Short, Vec4, false) => F::Sint16x4,
        (Short, Vec2, true) => F::Snorm16x2,
        (Short, Vec4, true) => F::Snorm16x4,
        _ => return Err(RenderError::UnsupportedVertexFormat(*format)),
    };
    Ok(mapped)
}
