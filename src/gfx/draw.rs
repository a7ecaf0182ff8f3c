//! Where a draw lands and what geometry it reads.

use super::handles::{FrameBufferHandle, VertexBufferHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    #[inline]
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Viewport {
            x,
            y,
            width,
            height,
        }
    }
}

/// Render target of a draw. `frame_buffer: None` targets the default
/// (window) frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawArea {
    pub frame_buffer: Option<FrameBufferHandle>,
    pub viewport: Viewport,
}

impl DrawArea {
    #[inline]
    pub fn backbuffer(viewport: Viewport) -> Self {
        DrawArea {
            frame_buffer: None,
            viewport,
        }
    }

    #[inline]
    pub fn offscreen(frame_buffer: FrameBufferHandle, viewport: Viewport) -> Self {
        DrawArea {
            frame_buffer: Some(frame_buffer),
            viewport,
        }
    }
}

/// Geometry of one draw: a vertex buffer and the index range to walk.
/// `first_index` is an element offset into the index buffer of an indexed
/// buffer, so several meshes can share one buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub vertex_buffer: VertexBufferHandle,
    pub index_count: u32,
    pub first_index: u32,
}

impl Geometry {
    #[inline]
    pub fn new(vertex_buffer: VertexBufferHandle, index_count: u32) -> Self {
        Geometry {
            vertex_buffer,
            index_count,
            first_index: 0,
        }
    }

    #[inline]
    pub fn with_offset(mut self, first_index: u32) -> Self {
        self.first_index = first_index;
        self
    }
}
