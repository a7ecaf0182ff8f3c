//! Vertex buffer descriptors.

/// Primitive topology of a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Points,
    Lines,
    LineStrip,
    Triangles,
    TriangleStrip,
}

/// Component type of a vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeKind {
    I8,
    U8,
    I32,
    F32,
}

impl VertexAttributeKind {
    /// Size of one component in bytes.
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            VertexAttributeKind::I8 | VertexAttributeKind::U8 => 1,
            VertexAttributeKind::I32 | VertexAttributeKind::F32 => 4,
        }
    }
}

/// Index element width of an indexed vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U8,
    U16,
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            IndexFormat::U8 => 1,
            IndexFormat::U16 => 2,
            IndexFormat::U32 => 4,
        }
    }
}

/// One interleaved vertex attribute. Attributes are assigned to locations
/// `0..n` in declaration order and packed tightly, so byte offsets follow
/// from the component kinds alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub name: &'static str,
    pub components: usize,
    pub kind: VertexAttributeKind,
}

impl VertexAttribute {
    #[inline]
    pub fn new(name: &'static str, components: usize, kind: VertexAttributeKind) -> Self {
        VertexAttribute {
            name,
            components,
            kind,
        }
    }

    /// Size of the whole attribute in bytes.
    #[inline]
    pub fn stride(&self) -> usize {
        self.components * self.kind.stride()
    }
}

/// Layout of a vertex buffer. The descriptor is owned by the resource table
/// once loaded; callers are free to drop it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferParams {
    pub primitive: Primitive,
    pub attributes: Vec<VertexAttribute>,
    pub index_format: IndexFormat,
}

impl VertexBufferParams {
    pub fn new(primitive: Primitive, attributes: Vec<VertexAttribute>) -> Self {
        VertexBufferParams {
            primitive,
            attributes,
            index_format: IndexFormat::U32,
        }
    }

    pub fn index_format(mut self, format: IndexFormat) -> Self {
        self.index_format = format;
        self
    }

    /// Byte distance between two consecutive vertices.
    pub fn stride(&self) -> usize {
        self.attributes.iter().map(|v| v.stride()).sum()
    }
}
