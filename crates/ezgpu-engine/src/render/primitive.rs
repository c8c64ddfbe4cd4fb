/// How a [`MeshRenderer`](super::MeshRenderer) assembles its vertices.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Primitive {
    Points,
    /// Mesh edges, from the line index buffer.
    Lines,
    LineStrip,
    /// Mesh faces, from the triangle index buffer.
    #[default]
    Triangles,
    TriangleStrip,
}

impl Primitive {
    pub fn topology(self) -> wgpu::PrimitiveTopology {
        match self {
            Primitive::Points => wgpu::PrimitiveTopology::PointList,
            Primitive::Lines => wgpu::PrimitiveTopology::LineList,
            Primitive::LineStrip => wgpu::PrimitiveTopology::LineStrip,
            Primitive::Triangles => wgpu::PrimitiveTopology::TriangleList,
            Primitive::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
        }
    }

    /// Whether drawing goes through one of the mesh index buffers.
    pub fn is_indexed(self) -> bool {
        matches!(self, Primitive::Lines | Primitive::Triangles)
    }
}
