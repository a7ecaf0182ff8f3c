//! Compile-time capacities of the resource tables and binding slots. The
//! tables are dense arrays, so these bound memory up front; exceeding one at
//! runtime is an error, not a reallocation.

pub const MAX_VERTEX_BUFFERS: usize = 256;
pub const MAX_VERTEX_ATTRIBUTES: usize = 16;

pub const MAX_TEXTURES: usize = 512;
pub const MAX_TEXTURE_SLOTS: usize = 16;

pub const MAX_SHADERS: usize = 512;
pub const MAX_UNIFORMS: usize = 64;

pub const MAX_FRAME_BUFFERS: usize = 1024;
pub const MAX_COLOR_ATTACHMENTS: usize = 4;

pub const MAX_UNIFORM_BUFFERS: usize = 16;
pub const MAX_UNIFORM_BUFFER_SLOTS: usize = 16;

#[cfg(feature = "compute")]
pub const MAX_STORAGE_BUFFERS: usize = 512;
#[cfg(feature = "compute")]
pub const MAX_STORAGE_BUFFER_SLOTS: usize = 8;
