//! Backend seam of the layer.
//!
//! `GraphicLayer` is the complete surface a demo talks to. The OpenGL
//! implementation lives in [`gl`](gl/index.html); `headless` allocates
//! handles without touching any native API.

use std::os::raw::c_void;

use crate::errors::Result;

use super::draw::{DrawArea, Geometry};
use super::handles::*;
use super::raster::RasterTests;
use super::shading::{ShaderStage, ShadingParameters};
use super::texture::TextureParams;
use super::vertex::VertexBufferParams;

#[cfg(feature = "compute")]
use super::shading::ComputeParameters;

pub mod gl;
pub mod headless;

/// The operations of the graphics layer. Every call that touches a resource
/// validates its handle against the owning table; stale handles, capacity
/// overruns and contract violations surface as errors.
pub trait GraphicLayer {
    /// Allocates a vertex buffer and its index companion. The buffer holds
    /// no data until loaded.
    fn create_vertex_buffer(&mut self) -> Result<VertexBufferHandle>;

    /// Uploads vertex data, optional index data and the attribute layout.
    /// Attribute layout changes must go through this call; binds alone never
    /// re-specify attributes.
    fn load_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        params: VertexBufferParams,
        vertices: &[u8],
        indices: Option<&[u8]>,
    ) -> Result<()>;

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) -> Result<()>;

    fn create_texture(&mut self) -> Result<TextureHandle>;

    /// Uploads one image. `side` selects the cube-map face for cube
    /// textures and is ignored for 2D textures. A negative `lod` uploads the
    /// base level and generates the mipmap chain when the minify filter
    /// samples one; a non-negative `lod` uploads exactly that level.
    /// `data: None` allocates uninitialized storage (render targets).
    fn load_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        side: usize,
        lod: i32,
        data: Option<&[u8]>,
    ) -> Result<()>;

    /// Regenerates the mipmap chain from the base level.
    fn generate_mipmaps(&mut self, handle: TextureHandle) -> Result<()>;

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()>;

    fn create_shader(&mut self) -> Result<ShaderHandle>;

    /// Compiles and links up to two stages into the shader's program. A
    /// reload replaces the previous program and forgets every uniform value
    /// recorded for it.
    fn load_shader(&mut self, handle: ShaderHandle, stages: &[ShaderStage]) -> Result<()>;

    fn destroy_shader(&mut self, handle: ShaderHandle) -> Result<()>;

    fn create_uniform_buffer(&mut self) -> Result<UniformBufferHandle>;

    /// Uploads the buffer contents. The first load fixes the buffer's size;
    /// reloading with a different size is an error.
    fn load_uniform_buffer(&mut self, handle: UniformBufferHandle, data: &[u8]) -> Result<()>;

    fn destroy_uniform_buffer(&mut self, handle: UniformBufferHandle) -> Result<()>;

    #[cfg(feature = "compute")]
    fn create_storage_buffer(&mut self) -> Result<StorageBufferHandle>;

    #[cfg(feature = "compute")]
    fn load_storage_buffer(&mut self, handle: StorageBufferHandle, data: &[u8]) -> Result<()>;

    /// Reads the buffer back into `dest`. If the buffer was last bound for
    /// shader writing, the read is preceded by a memory barrier so those
    /// writes are visible.
    #[cfg(feature = "compute")]
    fn read_storage_buffer(&mut self, handle: StorageBufferHandle, dest: &mut [u8]) -> Result<()>;

    #[cfg(feature = "compute")]
    fn destroy_storage_buffer(&mut self, handle: StorageBufferHandle) -> Result<()>;

    /// Assembles a frame buffer from existing textures. Attachment points
    /// derive from each texture's format class; every attachment must share
    /// the same dimensions, checked before any native call. `side` and `lod`
    /// pick the cube face / mip level to attach.
    fn create_frame_buffer(
        &mut self,
        attachments: &[TextureHandle],
        side: usize,
        lod: i32,
    ) -> Result<FrameBufferHandle>;

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<()>;

    /// Clears the color buffer of `target` (the default frame buffer when
    /// `None`) and optionally the depth buffer. The scissor test is disabled
    /// so the whole target clears.
    fn clear_frame_buffer(
        &mut self,
        target: Option<FrameBufferHandle>,
        r: f32,
        g: f32,
        b: f32,
        clear_depth: bool,
    ) -> Result<()>;

    /// Submits one draw. Bindings happen in a fixed order (vertex buffer,
    /// shader, uniforms, frame buffer, rasterizer state) and every redundant
    /// native call is elided against the state cache.
    fn draw(
        &mut self,
        area: &DrawArea,
        tests: &RasterTests,
        geometry: &Geometry,
        shading: &ShadingParameters,
    ) -> Result<()>;

    /// Dispatches `x * y * z` work groups of a compute shader.
    #[cfg(feature = "compute")]
    fn compute(
        &mut self,
        shader: ShaderHandle,
        params: &ComputeParameters,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<()>;

    /// Marks the end of a frame. Presentation belongs to the platform layer,
    /// so the GL backend has nothing to flush here.
    fn end_frame(&mut self);
}

/// Creates the OpenGL backend. `loadfn` resolves native entry points, the
/// way `wglGetProcAddress` / `glXGetProcAddress` wrappers do.
pub fn new<F>(loadfn: F) -> Result<Box<dyn GraphicLayer>>
where
    F: FnMut(&str) -> *const c_void,
{
    let layer = gl::OpenGLLayer::from_loader(loadfn)?;
    info!("created OpenGL graphics layer.");
    Ok(Box::new(layer))
}

/// Creates the headless backend.
pub fn new_headless() -> Box<dyn GraphicLayer> {
    Box::new(headless::HeadlessLayer::new())
}
