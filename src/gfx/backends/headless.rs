//! A backend that allocates handles but never touches a native API. Keeps
//! tests and CI machines without a GPU on the same code paths.

use crate::errors::Result;
use crate::utils::prelude::HandleArena;

use super::super::config::*;
use super::super::draw::{DrawArea, Geometry};
use super::super::handles::*;
use super::super::raster::RasterTests;
use super::super::shading::{ShaderStage, ShadingParameters};
use super::super::texture::TextureParams;
use super::super::vertex::VertexBufferParams;
use super::GraphicLayer;

#[cfg(feature = "compute")]
use super::super::shading::ComputeParameters;

pub struct HeadlessLayer {
    vertex_buffers: HandleArena<VertexBufferHandle, ()>,
    textures: HandleArena<TextureHandle, ()>,
    shaders: HandleArena<ShaderHandle, ()>,
    frame_buffers: HandleArena<FrameBufferHandle, ()>,
    uniform_buffers: HandleArena<UniformBufferHandle, ()>,
    #[cfg(feature = "compute")]
    storage_buffers: HandleArena<StorageBufferHandle, Vec<u8>>,
}

impl HeadlessLayer {
    pub fn new() -> Self {
        HeadlessLayer {
            vertex_buffers: HandleArena::with_capacity(MAX_VERTEX_BUFFERS),
            textures: HandleArena::with_capacity(MAX_TEXTURES),
            shaders: HandleArena::with_capacity(MAX_SHADERS),
            frame_buffers: HandleArena::with_capacity(MAX_FRAME_BUFFERS),
            uniform_buffers: HandleArena::with_capacity(MAX_UNIFORM_BUFFERS),
            #[cfg(feature = "compute")]
            storage_buffers: HandleArena::with_capacity(MAX_STORAGE_BUFFERS),
        }
    }
}

impl Default for HeadlessLayer {
    fn default() -> Self {
        HeadlessLayer::new()
    }
}

impl GraphicLayer for HeadlessLayer {
    fn create_vertex_buffer(&mut self) -> Result<VertexBufferHandle> {
        self.vertex_buffers.create(())
    }

    fn load_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        _params: VertexBufferParams,
        _vertices: &[u8],
        _indices: Option<&[u8]>,
    ) -> Result<()> {
        ensure!(self.vertex_buffers.contains(handle), "{:?} is invalid.", handle);
        Ok(())
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) -> Result<()> {
        ensure!(self.vertex_buffers.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    fn create_texture(&mut self) -> Result<TextureHandle> {
        self.textures.create(())
    }

    fn load_texture(
        &mut self,
        handle: TextureHandle,
        _params: TextureParams,
        _side: usize,
        _lod: i32,
        _data: Option<&[u8]>,
    ) -> Result<()> {
        ensure!(self.textures.contains(handle), "{:?} is invalid.", handle);
        Ok(())
    }

    fn generate_mipmaps(&mut self, handle: TextureHandle) -> Result<()> {
        ensure!(self.textures.contains(handle), "{:?} is invalid.", handle);
        Ok(())
    }

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()> {
        ensure!(self.textures.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    fn create_shader(&mut self) -> Result<ShaderHandle> {
        self.shaders.create(())
    }

    fn load_shader(&mut self, handle: ShaderHandle, stages: &[ShaderStage]) -> Result<()> {
        ensure!(self.shaders.contains(handle), "{:?} is invalid.", handle);
        ensure!(
            !stages.is_empty() && stages.len() <= 2,
            "a shader links one or two stages, got {}.",
            stages.len()
        );
        Ok(())
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        ensure!(self.shaders.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    fn create_uniform_buffer(&mut self) -> Result<UniformBufferHandle> {
        self.uniform_buffers.create(())
    }

    fn load_uniform_buffer(&mut self, handle: UniformBufferHandle, _data: &[u8]) -> Result<()> {
        ensure!(self.uniform_buffers.contains(handle), "{:?} is invalid.", handle);
        Ok(())
    }

    fn destroy_uniform_buffer(&mut self, handle: UniformBufferHandle) -> Result<()> {
        ensure!(self.uniform_buffers.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    #[cfg(feature = "compute")]
    fn create_storage_buffer(&mut self) -> Result<StorageBufferHandle> {
        self.storage_buffers.create(Vec::new())
    }

    #[cfg(feature = "compute")]
    fn load_storage_buffer(&mut self, handle: StorageBufferHandle, data: &[u8]) -> Result<()> {
        match self.storage_buffers.get_mut(handle) {
            Some(buf) => {
                buf.clear();
                buf.extend_from_slice(data);
                Ok(())
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    #[cfg(feature = "compute")]
    fn read_storage_buffer(&mut self, handle: StorageBufferHandle, dest: &mut [u8]) -> Result<()> {
        match self.storage_buffers.get(handle) {
            Some(buf) => {
                ensure!(
                    dest.len() <= buf.len(),
                    "read of {} bytes exceeds the buffer's {} bytes.",
                    dest.len(),
                    buf.len()
                );
                dest.copy_from_slice(&buf[..dest.len()]);
                Ok(())
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    #[cfg(feature = "compute")]
    fn destroy_storage_buffer(&mut self, handle: StorageBufferHandle) -> Result<()> {
        ensure!(self.storage_buffers.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    fn create_frame_buffer(
        &mut self,
        attachments: &[TextureHandle],
        _side: usize,
        _lod: i32,
    ) -> Result<FrameBufferHandle> {
        ensure!(!attachments.is_empty(), "a frame buffer needs at least one attachment.");
        for &texture in attachments {
            ensure!(self.textures.contains(texture), "{:?} is invalid.", texture);
        }
        self.frame_buffers.create(())
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<()> {
        ensure!(self.frame_buffers.free(handle).is_some(), "{:?} is invalid.", handle);
        Ok(())
    }

    fn clear_frame_buffer(
        &mut self,
        target: Option<FrameBufferHandle>,
        _r: f32,
        _g: f32,
        _b: f32,
        _clear_depth: bool,
    ) -> Result<()> {
        if let Some(handle) = target {
            ensure!(self.frame_buffers.contains(handle), "{:?} is invalid.", handle);
        }
        Ok(())
    }

    fn draw(
        &mut self,
        area: &DrawArea,
        _tests: &RasterTests,
        geometry: &Geometry,
        shading: &ShadingParameters,
    ) -> Result<()> {
        if let Some(handle) = area.frame_buffer {
            ensure!(self.frame_buffers.contains(handle), "{:?} is invalid.", handle);
        }
        ensure!(
            self.vertex_buffers.contains(geometry.vertex_buffer),
            "{:?} is invalid.",
            geometry.vertex_buffer
        );
        ensure!(self.shaders.contains(shading.shader), "{:?} is invalid.", shading.shader);
        Ok(())
    }

    #[cfg(feature = "compute")]
    fn compute(
        &mut self,
        shader: ShaderHandle,
        _params: &ComputeParameters,
        _x: u32,
        _y: u32,
        _z: u32,
    ) -> Result<()> {
        ensure!(self.shaders.contains(shader), "{:?} is invalid.", shader);
        Ok(())
    }

    fn end_frame(&mut self) {}
}
