//! The OpenGL backend.
//!
//! `OpenGLLayer` keeps three kinds of state: the resource tables (one
//! bounded generational arena per resource kind), the state cache (a full
//! shadow of every pipeline binding the layer manages), and per-shader
//! tables of last-bound uniform values. All redundant native calls are
//! elided against the cache, so a caller can re-submit identical draws
//! every frame at next to no driver cost.
//!
//! The layer is generic over [`Device`](device/trait.Device.html), the
//! strongly typed record of native entry points. Production code uses
//! [`NativeDevice`](device/struct.NativeDevice.html); the unit tests run
//! the very same binding logic against a recording device and assert on
//! the exact command stream.

use std::cell::RefCell;
use std::collections::HashMap;
use std::os::raw::c_void;

use gl;
use gl::types::*;
use inlinable_string::InlinableString;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::utils::prelude::HandleArena;

use super::super::config::*;
use super::super::draw::{DrawArea, Geometry, Viewport};
use super::super::handles::*;
use super::super::raster::{RasterTests, StencilFace};
use super::super::shading::{BlendingMode, PolygonMode, ShaderStage, ShadingParameters};
use super::super::texture::{TextureFormat, TextureKind, TextureParams};
use super::super::uniforms::{Uniform, UniformValue};
use super::super::vertex::{Primitive, VertexBufferParams};
use super::GraphicLayer;

#[cfg(feature = "compute")]
use std::cell::Cell;

#[cfg(feature = "compute")]
use super::super::shading::ComputeParameters;

pub mod device;
mod types;

#[cfg(test)]
mod mock;
#[cfg(test)]
mod tests;

pub use self::device::{Device, NativeDevice};

struct VertexBufferRecord {
    vbo: GLuint,
    ibo: GLuint,
    params: VertexBufferParams,
    indexed: bool,
}

struct TextureRecord {
    id: GLuint,
    width: u32,
    height: u32,
    kind: TextureKind,
    format: TextureFormat,
}

struct ShaderRecord {
    program: GLuint,
    stages: SmallVec<[GLuint; 2]>,
    /// Last value written per uniform name, for redundant-bind elision.
    /// Lives and dies with the linked program.
    bound_uniforms: RefCell<HashMap<InlinableString, UniformValue>>,
}

struct FrameBufferRecord {
    id: GLuint,
}

struct UniformBufferRecord {
    id: GLuint,
    /// Fixed by the first load. Uniform blocks must not change size while
    /// bindings referencing them are held.
    size: usize,
}

#[cfg(feature = "compute")]
struct StorageBufferRecord {
    id: GLuint,
    size: usize,
    /// True while the last bind was as a shader write target. Decides
    /// whether a memory barrier precedes the next read.
    writing: Cell<bool>,
}

struct Resources {
    vertex_buffers: HandleArena<VertexBufferHandle, VertexBufferRecord>,
    textures: HandleArena<TextureHandle, TextureRecord>,
    shaders: HandleArena<ShaderHandle, ShaderRecord>,
    frame_buffers: HandleArena<FrameBufferHandle, FrameBufferRecord>,
    uniform_buffers: HandleArena<UniformBufferHandle, UniformBufferRecord>,
    #[cfg(feature = "compute")]
    storage_buffers: HandleArena<StorageBufferHandle, StorageBufferRecord>,
}

/// Shadow of every pipeline binding the layer manages. The sole source of
/// truth for redundant-call elision; seeded with the GL defaults of a fresh
/// context.
struct StateCache {
    viewport: Option<Viewport>,
    polygon_mode: PolygonMode,
    raster_tests: RasterTests,
    blending: BlendingMode,
    vertex_buffer: Option<VertexBufferHandle>,
    shader: Option<ShaderHandle>,
    frame_buffer: Option<FrameBufferHandle>,
    textures: [Option<TextureHandle>; MAX_TEXTURE_SLOTS],
    uniform_buffers: [Option<UniformBufferHandle>; MAX_UNIFORM_BUFFER_SLOTS],
    #[cfg(feature = "compute")]
    storage_buffers: [Option<StorageBufferHandle>; MAX_STORAGE_BUFFER_SLOTS],
    attributes: [bool; MAX_VERTEX_ATTRIBUTES],
}

impl StateCache {
    fn new() -> Self {
        StateCache {
            viewport: None,
            polygon_mode: PolygonMode::Filled,
            raster_tests: RasterTests::default(),
            blending: BlendingMode::OPAQUE,
            vertex_buffer: None,
            shader: None,
            frame_buffer: None,
            textures: [None; MAX_TEXTURE_SLOTS],
            uniform_buffers: [None; MAX_UNIFORM_BUFFER_SLOTS],
            #[cfg(feature = "compute")]
            storage_buffers: [None; MAX_STORAGE_BUFFER_SLOTS],
            attributes: [false; MAX_VERTEX_ATTRIBUTES],
        }
    }
}

pub struct OpenGLLayer<D: Device> {
    device: D,
    state: StateCache,
    resources: Resources,
}

impl OpenGLLayer<NativeDevice> {
    /// Creates the layer on top of a native context. `loadfn` resolves
    /// entry points by name.
    pub fn from_loader<F>(loadfn: F) -> Result<Self>
    where
        F: FnMut(&str) -> *const c_void,
    {
        OpenGLLayer::new(NativeDevice::from_loader(loadfn)?)
    }
}

impl<D: Device> OpenGLLayer<D> {
    /// Creates the layer on top of an arbitrary device.
    pub fn new(mut device: D) -> Result<Self> {
        device.enable(gl::TEXTURE_CUBE_MAP_SEAMLESS);
        Self::check(&mut device)?;

        Ok(OpenGLLayer {
            device,
            state: StateCache::new(),
            resources: Resources {
                vertex_buffers: HandleArena::with_capacity(MAX_VERTEX_BUFFERS),
                textures: HandleArena::with_capacity(MAX_TEXTURES),
                shaders: HandleArena::with_capacity(MAX_SHADERS),
                frame_buffers: HandleArena::with_capacity(MAX_FRAME_BUFFERS),
                uniform_buffers: HandleArena::with_capacity(MAX_UNIFORM_BUFFERS),
                #[cfg(feature = "compute")]
                storage_buffers: HandleArena::with_capacity(MAX_STORAGE_BUFFERS),
            },
        })
    }

    fn check(device: &mut D) -> Result<()> {
        match device.get_error() {
            gl::NO_ERROR => Ok(()),
            gl::INVALID_ENUM => bail!("invalid enum."),
            gl::INVALID_VALUE => bail!("invalid value."),
            gl::INVALID_OPERATION => bail!("invalid operation."),
            gl::INVALID_FRAMEBUFFER_OPERATION => bail!("invalid framebuffer operation."),
            gl::OUT_OF_MEMORY => bail!("out of memory."),
            other => bail!("unknown driver error {:#X}.", other),
        }
    }

    fn bind_vertex_buffer(
        device: &mut D,
        state: &mut StateCache,
        vertex_buffers: &HandleArena<VertexBufferHandle, VertexBufferRecord>,
        handle: VertexBufferHandle,
    ) -> Result<()> {
        if state.vertex_buffer == Some(handle) {
            return Ok(());
        }

        let vbo = vertex_buffers
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;
        ensure!(
            !vbo.params.attributes.is_empty(),
            "{:?} was never loaded.",
            handle
        );

        device.bind_buffer(gl::ARRAY_BUFFER, vbo.vbo);
        if vbo.indexed {
            device.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, vbo.ibo);
        }

        let stride = vbo.params.stride() as GLsizei;
        let mut offset = 0;
        for (location, attribute) in vbo.params.attributes.iter().enumerate() {
            if !state.attributes[location] {
                device.enable_vertex_attrib(location as u32);
                state.attributes[location] = true;
            }
            device.vertex_attrib_pointer(
                location as u32,
                attribute.components as GLint,
                GLenum::from(attribute.kind),
                false,
                stride,
                offset,
            );
            offset += attribute.stride();
        }

        // Attributes above the new layout's count would feed the next draw
        // stale pointers, so they are switched off.
        for location in vbo.params.attributes.len()..MAX_VERTEX_ATTRIBUTES {
            if state.attributes[location] {
                device.disable_vertex_attrib(location as u32);
                state.attributes[location] = false;
            }
        }

        state.vertex_buffer = Some(handle);
        Self::check(device)
    }

    fn bind_shader(
        device: &mut D,
        state: &mut StateCache,
        handle: ShaderHandle,
        record: &ShaderRecord,
    ) -> Result<()> {
        ensure!(record.program != 0, "{:?} was never loaded.", handle);

        if state.shader == Some(handle) {
            return Ok(());
        }

        device.use_program(record.program);
        state.shader = Some(handle);
        Self::check(device)
    }

    fn bind_texture_slot(
        device: &mut D,
        state: &mut StateCache,
        textures: &HandleArena<TextureHandle, TextureRecord>,
        handle: TextureHandle,
        slot: usize,
    ) -> Result<()> {
        if state.textures[slot] == Some(handle) {
            return Ok(());
        }

        let texture = textures
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        device.active_texture(slot as u32);
        device.bind_texture(GLenum::from(texture.kind), texture.id);
        state.textures[slot] = Some(handle);
        Self::check(device)
    }

    fn bind_uniform_buffer(
        device: &mut D,
        state: &mut StateCache,
        uniform_buffers: &HandleArena<UniformBufferHandle, UniformBufferRecord>,
        handle: UniformBufferHandle,
        program: GLuint,
        name: &str,
        slot: usize,
    ) -> Result<()> {
        let buffer = uniform_buffers
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        let index = device.uniform_block_index(program, name);
        if index == gl::INVALID_INDEX {
            error!("shader has no uniform block named {}.", name);
            return Ok(());
        }

        // Block-to-slot binding is a property of the {program, slot} pair
        // and idempotent, so it is reissued every time. Only the
        // buffer-to-slot occupancy is cached.
        device.uniform_block_binding(program, index, slot as u32);

        if state.uniform_buffers[slot] != Some(handle) {
            device.bind_buffer_base(gl::UNIFORM_BUFFER, slot as u32, buffer.id);
            state.uniform_buffers[slot] = Some(handle);
        }
        Self::check(device)
    }

    #[cfg(feature = "compute")]
    fn bind_storage_buffer(
        device: &mut D,
        state: &mut StateCache,
        storage_buffers: &HandleArena<StorageBufferHandle, StorageBufferRecord>,
        handle: StorageBufferHandle,
        program: GLuint,
        name: &str,
        slot: usize,
        writing: bool,
    ) -> Result<()> {
        let buffer = storage_buffers
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        let index = device.storage_block_index(program, name);
        if index == gl::INVALID_INDEX {
            error!("shader has no storage block named {}.", name);
            return Ok(());
        }

        device.storage_block_binding(program, index, slot as u32);

        // The write-to-read transition happens even when the slot occupancy
        // would elide the rebind below; shader stores stay invisible until a
        // barrier flushes them.
        if buffer.writing.get() && !writing {
            device.memory_barrier(gl::SHADER_STORAGE_BARRIER_BIT);
        }
        buffer.writing.set(writing);

        if state.storage_buffers[slot] != Some(handle) {
            device.bind_buffer_base(gl::SHADER_STORAGE_BUFFER, slot as u32, buffer.id);
            state.storage_buffers[slot] = Some(handle);
        }
        Self::check(device)
    }

    fn bind_frame_buffer(
        device: &mut D,
        state: &mut StateCache,
        frame_buffers: &HandleArena<FrameBufferHandle, FrameBufferRecord>,
        handle: Option<FrameBufferHandle>,
    ) -> Result<()> {
        if state.frame_buffer == handle {
            return Ok(());
        }

        match handle {
            Some(handle) => {
                let fb = frame_buffers
                    .get(handle)
                    .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;
                device.bind_framebuffer(fb.id);
            }
            None => device.bind_framebuffer(0),
        }

        state.frame_buffer = handle;
        Self::check(device)
    }

    fn set_stencil_face(device: &mut D, face: GLenum, stencil: &StencilFace) {
        device.stencil_func_separate(
            face,
            GLenum::from(stencil.test),
            stencil.reference as GLint,
            stencil.mask,
        );
        device.stencil_op_separate(
            face,
            GLenum::from(stencil.op_stencil_fail),
            GLenum::from(stencil.op_depth_fail),
            GLenum::from(stencil.op_pass),
        );
    }

    fn set_rasterizer_state(
        device: &mut D,
        state: &mut StateCache,
        viewport: Viewport,
        polygon_mode: PolygonMode,
        tests: &RasterTests,
        blending: &BlendingMode,
    ) -> Result<()> {
        if state.viewport != Some(viewport) {
            device.viewport(viewport.x, viewport.y, viewport.width, viewport.height);
            state.viewport = Some(viewport);
        }

        if state.polygon_mode != polygon_mode {
            device.polygon_mode(GLenum::from(polygon_mode));
            state.polygon_mode = polygon_mode;
        }

        // Rasterizer tests change rarely and as a unit; any difference
        // reissues the whole group.
        if state.raster_tests != *tests {
            match types::cull_face(tests.face_culling) {
                Some(face) => {
                    device.enable(gl::CULL_FACE);
                    device.cull_face(face);
                }
                None => device.disable(gl::CULL_FACE),
            }

            match tests.scissor {
                Some((x, y, width, height)) => {
                    device.enable(gl::SCISSOR_TEST);
                    device.scissor(x, y, width, height);
                }
                None => device.disable(gl::SCISSOR_TEST),
            }

            if tests.stencil_front.active() || tests.stencil_back.active() {
                device.enable(gl::STENCIL_TEST);
                Self::set_stencil_face(device, gl::FRONT, &tests.stencil_front);
                Self::set_stencil_face(device, gl::BACK, &tests.stencil_back);
            } else {
                device.disable(gl::STENCIL_TEST);
            }

            if tests.depth_active() {
                device.enable(gl::DEPTH_TEST);
                device.depth_func(GLenum::from(tests.depth_test));
                device.depth_mask(tests.depth_write);
            } else {
                device.disable(gl::DEPTH_TEST);
            }

            if tests.clip_distance {
                device.enable(gl::CLIP_DISTANCE0);
            } else {
                device.disable(gl::CLIP_DISTANCE0);
            }

            state.raster_tests = *tests;
        }

        if state.blending != *blending {
            if blending.enabled() {
                device.enable(gl::BLEND);
                device.blend_func_separate(
                    GLenum::from(blending.src_rgb),
                    GLenum::from(blending.dst_rgb),
                    GLenum::from(blending.src_alpha),
                    GLenum::from(blending.dst_alpha),
                );
                device.blend_equation_separate(
                    GLenum::from(blending.rgb_equation),
                    GLenum::from(blending.alpha_equation),
                );
            } else {
                device.disable(gl::BLEND);
            }
            state.blending = *blending;
        }

        Self::check(device)
    }

    fn location(device: &mut D, program: GLuint, name: &str) -> Option<GLint> {
        let location = device.uniform_location(program, name);
        if location < 0 {
            error!("shader has no uniform named {}.", name);
            None
        } else {
            Some(location)
        }
    }

    fn write_floats(device: &mut D, program: GLuint, name: &str, values: &[f32]) {
        if let Some(location) = Self::location(device, program, name) {
            device.uniform_floats(location, values.len(), values);
        }
    }

    fn write_ints(device: &mut D, program: GLuint, name: &str, values: &[i32]) {
        if let Some(location) = Self::location(device, program, name) {
            device.uniform_ints(location, values.len(), values);
        }
    }

    /// Walks the uniform list in order, eliding unchanged values against the
    /// shader's table and assigning texture / uniform-buffer / storage-buffer
    /// slots monotonically in list order.
    fn bind_uniforms(
        device: &mut D,
        state: &mut StateCache,
        resources: &Resources,
        shader: &ShaderRecord,
        uniforms: &[Uniform],
    ) -> Result<()> {
        ensure!(
            uniforms.len() <= MAX_UNIFORMS,
            "too many uniforms in one list ({} > {}).",
            uniforms.len(),
            MAX_UNIFORMS
        );

        let program = shader.program;
        let mut bound = shader.bound_uniforms.borrow_mut();

        let mut texture_slot = 0;
        let mut uniform_buffer_slot = 0;
        #[cfg(feature = "compute")]
        let mut storage_buffer_slot = 0;

        for uniform in uniforms {
            if uniform.is_none() {
                continue;
            }

            let name: &str = uniform.name.as_ref();

            let elide = match bound.get(&uniform.name) {
                Some(last) => *last == uniform.value,
                None => false,
            };
            if !elide {
                bound.insert(uniform.name.clone(), uniform.value);
            }

            if elide {
                // Slot assignment is stateful, so an unchanged sampler still
                // claims its slot and keeps the texture bound there; only
                // the uniform-location write is skipped.
                if let UniformValue::Texture(texture) = uniform.value {
                    ensure!(
                        texture_slot < MAX_TEXTURE_SLOTS,
                        "more than {} sampler uniforms in one list.",
                        MAX_TEXTURE_SLOTS
                    );
                    Self::bind_texture_slot(device, state, &resources.textures, texture, texture_slot)?;
                    texture_slot += 1;
                }
                continue;
            }

            match uniform.value {
                UniformValue::F32(v) => Self::write_floats(device, program, name, &[v]),
                UniformValue::Vector2f(v) => Self::write_floats(device, program, name, &v),
                UniformValue::Vector3f(v) => Self::write_floats(device, program, name, &v),
                UniformValue::Vector4f(v) => Self::write_floats(device, program, name, &v),
                UniformValue::Matrix4f(v) => {
                    if let Some(location) = Self::location(device, program, name) {
                        device.uniform_matrix4(location, &v);
                    }
                }
                UniformValue::I32(v) => Self::write_ints(device, program, name, &[v]),
                UniformValue::Vector2i(v) => Self::write_ints(device, program, name, &v),
                UniformValue::Vector3i(v) => Self::write_ints(device, program, name, &v),
                UniformValue::Vector4i(v) => Self::write_ints(device, program, name, &v),
                UniformValue::Texture(texture) => {
                    ensure!(
                        texture_slot < MAX_TEXTURE_SLOTS,
                        "more than {} sampler uniforms in one list.",
                        MAX_TEXTURE_SLOTS
                    );
                    if let Some(location) = Self::location(device, program, name) {
                        device.uniform_ints(location, 1, &[texture_slot as i32]);
                    }
                    Self::bind_texture_slot(device, state, &resources.textures, texture, texture_slot)?;
                    texture_slot += 1;
                }
                UniformValue::UniformBuffer(buffer) => {
                    ensure!(
                        uniform_buffer_slot < MAX_UNIFORM_BUFFER_SLOTS,
                        "more than {} uniform-buffer uniforms in one list.",
                        MAX_UNIFORM_BUFFER_SLOTS
                    );
                    Self::bind_uniform_buffer(
                        device,
                        state,
                        &resources.uniform_buffers,
                        buffer,
                        program,
                        name,
                        uniform_buffer_slot,
                    )?;
                    uniform_buffer_slot += 1;
                }
                #[cfg(feature = "compute")]
                UniformValue::StorageBufferInput(buffer) => {
                    ensure!(
                        storage_buffer_slot < MAX_STORAGE_BUFFER_SLOTS,
                        "more than {} storage-buffer uniforms in one list.",
                        MAX_STORAGE_BUFFER_SLOTS
                    );
                    Self::bind_storage_buffer(
                        device,
                        state,
                        &resources.storage_buffers,
                        buffer,
                        program,
                        name,
                        storage_buffer_slot,
                        false,
                    )?;
                    storage_buffer_slot += 1;
                }
                #[cfg(feature = "compute")]
                UniformValue::StorageBufferOutput(buffer) => {
                    ensure!(
                        storage_buffer_slot < MAX_STORAGE_BUFFER_SLOTS,
                        "more than {} storage-buffer uniforms in one list.",
                        MAX_STORAGE_BUFFER_SLOTS
                    );
                    Self::bind_storage_buffer(
                        device,
                        state,
                        &resources.storage_buffers,
                        buffer,
                        program,
                        name,
                        storage_buffer_slot,
                        true,
                    )?;
                    storage_buffer_slot += 1;
                }
            }
        }

        Self::check(device)
    }

    fn compile_stage(device: &mut D, stage: &ShaderStage<'_>) -> Result<GLuint> {
        let shader = device.create_shader(GLenum::from(stage.kind));
        device.shader_source(shader, stage.source);
        device.compile_shader(shader);

        let ok = device.shader_compile_status(shader);
        let log = device.shader_info_log(shader);
        if !ok {
            device.delete_shader(shader);
            bail!("failed to compile {}:\n{}", stage.origin, log);
        }
        if !log.is_empty() {
            warn!("{} compiled with warnings:\n{}", stage.origin, log);
        }

        Ok(shader)
    }

    fn link_program(device: &mut D, stages: &[GLuint]) -> Result<GLuint> {
        let program = device.create_program();
        for &stage in stages {
            device.attach_shader(program, stage);
        }
        device.link_program(program);
        for &stage in stages {
            device.detach_shader(program, stage);
        }

        let ok = device.program_link_status(program);
        let log = device.program_info_log(program);
        if !ok {
            device.delete_program(program);
            bail!("failed to link program:\n{}", log);
        }
        if !log.is_empty() {
            warn!("program linked with warnings:\n{}", log);
        }

        Ok(program)
    }
}

impl<D: Device> GraphicLayer for OpenGLLayer<D> {
    fn create_vertex_buffer(&mut self) -> Result<VertexBufferHandle> {
        let record = VertexBufferRecord {
            vbo: self.device.gen_buffer(),
            ibo: self.device.gen_buffer(),
            params: VertexBufferParams::new(Primitive::Triangles, Vec::new()),
            indexed: false,
        };
        Self::check(&mut self.device)?;
        self.resources.vertex_buffers.create(record)
    }

    fn load_vertex_buffer(
        &mut self,
        handle: VertexBufferHandle,
        params: VertexBufferParams,
        vertices: &[u8],
        indices: Option<&[u8]>,
    ) -> Result<()> {
        ensure!(
            !params.attributes.is_empty(),
            "a vertex buffer needs at least one attribute."
        );
        ensure!(
            params.attributes.len() <= MAX_VERTEX_ATTRIBUTES,
            "too many vertex attributes ({} > {}).",
            params.attributes.len(),
            MAX_VERTEX_ATTRIBUTES
        );
        ensure!(!vertices.is_empty(), "vertex data must not be empty.");

        let record = self
            .resources
            .vertex_buffers
            .get_mut(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        let saved = self.device.get_integer(gl::ARRAY_BUFFER_BINDING) as GLuint;
        self.device.bind_buffer(gl::ARRAY_BUFFER, record.vbo);
        self.device.buffer_data(gl::ARRAY_BUFFER, vertices, gl::STATIC_DRAW);
        self.device.bind_buffer(gl::ARRAY_BUFFER, saved);

        if let Some(indices) = indices {
            let saved = self.device.get_integer(gl::ELEMENT_ARRAY_BUFFER_BINDING) as GLuint;
            self.device.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, record.ibo);
            self.device
                .buffer_data(gl::ELEMENT_ARRAY_BUFFER, indices, gl::STATIC_DRAW);
            self.device.bind_buffer(gl::ELEMENT_ARRAY_BUFFER, saved);
        }

        record.indexed = indices.is_some();
        record.params = params;

        // The attribute layout may just have changed under the current
        // bind, which the bind elision would otherwise never re-apply.
        if self.state.vertex_buffer == Some(handle) {
            self.state.vertex_buffer = None;
        }

        Self::check(&mut self.device)
    }

    fn destroy_vertex_buffer(&mut self, handle: VertexBufferHandle) -> Result<()> {
        match self.resources.vertex_buffers.free(handle) {
            Some(record) => {
                self.device.delete_buffer(record.vbo);
                self.device.delete_buffer(record.ibo);
                if self.state.vertex_buffer == Some(handle) {
                    self.state.vertex_buffer = None;
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    fn create_texture(&mut self) -> Result<TextureHandle> {
        let record = TextureRecord {
            id: self.device.gen_texture(),
            width: 0,
            height: 0,
            kind: TextureKind::Texture2D,
            format: TextureFormat::Rgba8,
        };
        Self::check(&mut self.device)?;
        self.resources.textures.create(record)
    }

    fn load_texture(
        &mut self,
        handle: TextureHandle,
        params: TextureParams,
        side: usize,
        lod: i32,
        data: Option<&[u8]>,
    ) -> Result<()> {
        ensure!(
            params.width > 0 && params.height > 0,
            "texture dimensions must not be zero."
        );
        if params.kind == TextureKind::CubeMap {
            ensure!(side < 6, "a cube map has six sides, got side {}.", side);
        }

        let record = self
            .resources
            .textures
            .get_mut(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        let target = GLenum::from(params.kind);
        let binding = match params.kind {
            TextureKind::Texture2D => gl::TEXTURE_BINDING_2D,
            TextureKind::CubeMap => gl::TEXTURE_BINDING_CUBE_MAP,
        };
        let upload_target = match params.kind {
            TextureKind::Texture2D => gl::TEXTURE_2D,
            TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP_POSITIVE_X + side as u32,
        };

        // The upload goes through whatever texture unit is active; the
        // binding is restored afterwards so the slot cache stays honest.
        let saved = self.device.get_integer(binding) as GLuint;
        self.device.bind_texture(target, record.id);

        let (internal_format, format, kind) = types::texture_format(params.format);
        self.device.tex_image_2d(
            upload_target,
            if lod < 0 { 0 } else { lod },
            internal_format,
            params.width as GLsizei,
            params.height as GLsizei,
            format,
            kind,
            data,
        );

        if data.is_some() && lod < 0 && params.sampling.minify.mipmapped() {
            self.device.generate_mipmap(target);
        }

        let sampling = &params.sampling;
        self.device.tex_parameter(
            target,
            gl::TEXTURE_MIN_FILTER,
            GLenum::from(sampling.minify) as GLint,
        );
        self.device.tex_parameter(
            target,
            gl::TEXTURE_MAG_FILTER,
            GLenum::from(sampling.magnify) as GLint,
        );
        self.device
            .tex_parameter(target, gl::TEXTURE_WRAP_S, GLenum::from(sampling.s_wrap) as GLint);
        self.device
            .tex_parameter(target, gl::TEXTURE_WRAP_T, GLenum::from(sampling.t_wrap) as GLint);
        if params.kind == TextureKind::CubeMap {
            self.device
                .tex_parameter(target, gl::TEXTURE_WRAP_R, GLenum::from(sampling.r_wrap) as GLint);
        }
        if sampling.max_anisotropy > 1.0 {
            self.device.tex_parameter_f(
                target,
                types::TEXTURE_MAX_ANISOTROPY_EXT,
                sampling.max_anisotropy,
            );
        }

        self.device.bind_texture(target, saved);

        record.width = params.width;
        record.height = params.height;
        record.kind = params.kind;
        record.format = params.format;

        Self::check(&mut self.device)
    }

    fn generate_mipmaps(&mut self, handle: TextureHandle) -> Result<()> {
        let record = self
            .resources
            .textures
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;
        ensure!(record.width > 0, "{:?} was never loaded.", handle);

        let target = GLenum::from(record.kind);
        let binding = match record.kind {
            TextureKind::Texture2D => gl::TEXTURE_BINDING_2D,
            TextureKind::CubeMap => gl::TEXTURE_BINDING_CUBE_MAP,
        };

        let saved = self.device.get_integer(binding) as GLuint;
        self.device.bind_texture(target, record.id);
        self.device.generate_mipmap(target);
        self.device.bind_texture(target, saved);

        Self::check(&mut self.device)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) -> Result<()> {
        match self.resources.textures.free(handle) {
            Some(record) => {
                self.device.delete_texture(record.id);
                // Deleting unbinds the texture from every unit it was bound
                // to, so the cache follows suit.
                for slot in self.state.textures.iter_mut() {
                    if *slot == Some(handle) {
                        *slot = None;
                    }
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    fn create_shader(&mut self) -> Result<ShaderHandle> {
        self.resources.shaders.create(ShaderRecord {
            program: 0,
            stages: SmallVec::new(),
            bound_uniforms: RefCell::new(HashMap::new()),
        })
    }

    fn load_shader(&mut self, handle: ShaderHandle, stages: &[ShaderStage]) -> Result<()> {
        ensure!(
            !stages.is_empty() && stages.len() <= 2,
            "a shader links one or two stages, got {}.",
            stages.len()
        );

        let record = self
            .resources
            .shaders
            .get_mut(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        if record.program != 0 {
            self.device.delete_program(record.program);
            record.program = 0;
        }
        for stage in record.stages.drain() {
            self.device.delete_shader(stage);
        }
        // A new program invalidates every value the old one had bound.
        record.bound_uniforms.borrow_mut().clear();

        if self.state.shader == Some(handle) {
            self.state.shader = None;
        }

        for stage in stages {
            let compiled = Self::compile_stage(&mut self.device, stage)?;
            record.stages.push(compiled);
        }
        record.program = Self::link_program(&mut self.device, &record.stages)?;

        Self::check(&mut self.device)
    }

    fn destroy_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        match self.resources.shaders.free(handle) {
            Some(record) => {
                if record.program != 0 {
                    self.device.delete_program(record.program);
                }
                for &stage in &record.stages {
                    self.device.delete_shader(stage);
                }
                if self.state.shader == Some(handle) {
                    self.state.shader = None;
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    fn create_uniform_buffer(&mut self) -> Result<UniformBufferHandle> {
        let record = UniformBufferRecord {
            id: self.device.gen_buffer(),
            size: 0,
        };
        Self::check(&mut self.device)?;
        self.resources.uniform_buffers.create(record)
    }

    fn load_uniform_buffer(&mut self, handle: UniformBufferHandle, data: &[u8]) -> Result<()> {
        ensure!(!data.is_empty(), "uniform buffer data must not be empty.");

        let record = self
            .resources
            .uniform_buffers
            .get_mut(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;
        ensure!(
            record.size == 0 || record.size == data.len(),
            "uniform buffer size is fixed at {} bytes by the first load, got {}.",
            record.size,
            data.len()
        );

        let saved = self.device.get_integer(gl::UNIFORM_BUFFER_BINDING) as GLuint;
        self.device.bind_buffer(gl::UNIFORM_BUFFER, record.id);
        if record.size == 0 {
            self.device
                .buffer_data(gl::UNIFORM_BUFFER, data, gl::DYNAMIC_DRAW);
            record.size = data.len();
        } else {
            self.device.buffer_sub_data(gl::UNIFORM_BUFFER, 0, data);
        }
        self.device.bind_buffer(gl::UNIFORM_BUFFER, saved);

        Self::check(&mut self.device)
    }

    fn destroy_uniform_buffer(&mut self, handle: UniformBufferHandle) -> Result<()> {
        match self.resources.uniform_buffers.free(handle) {
            Some(record) => {
                self.device.delete_buffer(record.id);
                for slot in self.state.uniform_buffers.iter_mut() {
                    if *slot == Some(handle) {
                        *slot = None;
                    }
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    #[cfg(feature = "compute")]
    fn create_storage_buffer(&mut self) -> Result<StorageBufferHandle> {
        let record = StorageBufferRecord {
            id: self.device.gen_buffer(),
            size: 0,
            writing: Cell::new(false),
        };
        Self::check(&mut self.device)?;
        self.resources.storage_buffers.create(record)
    }

    #[cfg(feature = "compute")]
    fn load_storage_buffer(&mut self, handle: StorageBufferHandle, data: &[u8]) -> Result<()> {
        ensure!(!data.is_empty(), "storage buffer data must not be empty.");

        let record = self
            .resources
            .storage_buffers
            .get_mut(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;

        let saved = self.device.get_integer(gl::SHADER_STORAGE_BUFFER_BINDING) as GLuint;
        self.device.bind_buffer(gl::SHADER_STORAGE_BUFFER, record.id);
        self.device
            .buffer_data(gl::SHADER_STORAGE_BUFFER, data, gl::DYNAMIC_COPY);
        self.device.bind_buffer(gl::SHADER_STORAGE_BUFFER, saved);
        record.size = data.len();

        Self::check(&mut self.device)
    }

    #[cfg(feature = "compute")]
    fn read_storage_buffer(&mut self, handle: StorageBufferHandle, dest: &mut [u8]) -> Result<()> {
        let record = self
            .resources
            .storage_buffers
            .get(handle)
            .ok_or_else(|| format_err!("{:?} is invalid.", handle))?;
        ensure!(
            dest.len() <= record.size,
            "read of {} bytes exceeds the buffer's {} bytes.",
            dest.len(),
            record.size
        );

        if record.writing.get() {
            self.device.memory_barrier(gl::SHADER_STORAGE_BARRIER_BIT);
            record.writing.set(false);
        }

        let saved = self.device.get_integer(gl::SHADER_STORAGE_BUFFER_BINDING) as GLuint;
        self.device.bind_buffer(gl::SHADER_STORAGE_BUFFER, record.id);
        self.device.read_buffer(gl::SHADER_STORAGE_BUFFER, dest);
        self.device.bind_buffer(gl::SHADER_STORAGE_BUFFER, saved);

        Self::check(&mut self.device)
    }

    #[cfg(feature = "compute")]
    fn destroy_storage_buffer(&mut self, handle: StorageBufferHandle) -> Result<()> {
        match self.resources.storage_buffers.free(handle) {
            Some(record) => {
                self.device.delete_buffer(record.id);
                for slot in self.state.storage_buffers.iter_mut() {
                    if *slot == Some(handle) {
                        *slot = None;
                    }
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    fn create_frame_buffer(
        &mut self,
        attachments: &[TextureHandle],
        side: usize,
        lod: i32,
    ) -> Result<FrameBufferHandle> {
        ensure!(
            !attachments.is_empty(),
            "a frame buffer needs at least one attachment."
        );

        // Validate everything before the first native call.
        let mut width = 0;
        let mut height = 0;
        let mut colors = 0;
        for &texture in attachments {
            let record = self
                .resources
                .textures
                .get(texture)
                .ok_or_else(|| format_err!("{:?} is invalid.", texture))?;
            ensure!(record.width > 0, "{:?} was never loaded.", texture);

            if width == 0 {
                width = record.width;
                height = record.height;
            } else {
                ensure!(
                    record.width == width && record.height == height,
                    "frame buffer attachments must share dimensions, got {}x{} and {}x{}.",
                    width,
                    height,
                    record.width,
                    record.height
                );
            }

            if record.format.is_color() {
                colors += 1;
                ensure!(
                    colors <= MAX_COLOR_ATTACHMENTS,
                    "more than {} color attachments.",
                    MAX_COLOR_ATTACHMENTS
                );
            }

            if record.kind == TextureKind::CubeMap {
                ensure!(side < 6, "a cube map has six sides, got side {}.", side);
            }
        }

        let id = self.device.gen_framebuffer();
        self.device.bind_framebuffer(id);

        let mut draw_buffers: SmallVec<[GLenum; MAX_COLOR_ATTACHMENTS]> = SmallVec::new();
        for &texture in attachments {
            let record = self
                .resources
                .textures
                .get(texture)
                .ok_or_else(|| format_err!("{:?} is invalid.", texture))?;

            let attachment = if record.format.is_depth() {
                gl::DEPTH_ATTACHMENT
            } else if record.format.is_stencil() {
                gl::STENCIL_ATTACHMENT
            } else if record.format.is_depth_stencil() {
                gl::DEPTH_STENCIL_ATTACHMENT
            } else {
                let attachment = gl::COLOR_ATTACHMENT0 + draw_buffers.len() as u32;
                draw_buffers.push(attachment);
                attachment
            };

            let target = match record.kind {
                TextureKind::Texture2D => gl::TEXTURE_2D,
                TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP_POSITIVE_X + side as u32,
            };

            self.device.framebuffer_texture_2d(
                attachment,
                target,
                record.id,
                if lod < 0 { 0 } else { lod },
            );
        }
        self.device.draw_buffers(&draw_buffers);

        let status = self.device.check_framebuffer_status();
        if status != gl::FRAMEBUFFER_COMPLETE {
            self.device.delete_framebuffer(id);
            self.device.bind_framebuffer(0);
            self.state.frame_buffer = None;
            bail!("frame buffer is incomplete ({:#X}).", status);
        }

        let handle = match self.resources.frame_buffers.create(FrameBufferRecord { id }) {
            Ok(handle) => handle,
            Err(err) => {
                self.device.delete_framebuffer(id);
                self.device.bind_framebuffer(0);
                self.state.frame_buffer = None;
                return Err(err);
            }
        };

        // The assembly left the new frame buffer bound.
        self.state.frame_buffer = Some(handle);
        Self::check(&mut self.device)?;
        Ok(handle)
    }

    fn destroy_frame_buffer(&mut self, handle: FrameBufferHandle) -> Result<()> {
        match self.resources.frame_buffers.free(handle) {
            Some(record) => {
                self.device.delete_framebuffer(record.id);
                // Deleting a bound frame buffer rebinds the default one.
                if self.state.frame_buffer == Some(handle) {
                    self.state.frame_buffer = None;
                }
                Self::check(&mut self.device)
            }
            None => bail!("{:?} is invalid.", handle),
        }
    }

    fn clear_frame_buffer(
        &mut self,
        target: Option<FrameBufferHandle>,
        r: f32,
        g: f32,
        b: f32,
        clear_depth: bool,
    ) -> Result<()> {
        Self::bind_frame_buffer(
            &mut self.device,
            &mut self.state,
            &self.resources.frame_buffers,
            target,
        )?;

        self.device.clear_color(r, g, b, 0.0);

        // The whole target clears, scissor or not.
        if self.state.raster_tests.scissor.is_some() {
            self.device.disable(gl::SCISSOR_TEST);
            self.state.raster_tests.scissor = None;
        }

        let mut buffers = gl::COLOR_BUFFER_BIT;
        if clear_depth {
            if !self.state.raster_tests.depth_write {
                self.device.depth_mask(true);
                self.state.raster_tests.depth_write = true;
            }
            buffers |= gl::DEPTH_BUFFER_BIT;
        }
        self.device.clear(buffers);

        Self::check(&mut self.device)
    }

    fn draw(
        &mut self,
        area: &DrawArea,
        tests: &RasterTests,
        geometry: &Geometry,
        shading: &ShadingParameters,
    ) -> Result<()> {
        ensure!(shading.instances >= 1, "a draw needs at least one instance.");

        Self::bind_vertex_buffer(
            &mut self.device,
            &mut self.state,
            &self.resources.vertex_buffers,
            geometry.vertex_buffer,
        )?;

        let shader = self
            .resources
            .shaders
            .get(shading.shader)
            .ok_or_else(|| format_err!("{:?} is invalid.", shading.shader))?;
        Self::bind_shader(&mut self.device, &mut self.state, shading.shader, shader)?;
        Self::bind_uniforms(
            &mut self.device,
            &mut self.state,
            &self.resources,
            shader,
            &shading.uniforms,
        )?;

        Self::bind_frame_buffer(
            &mut self.device,
            &mut self.state,
            &self.resources.frame_buffers,
            area.frame_buffer,
        )?;
        Self::set_rasterizer_state(
            &mut self.device,
            &mut self.state,
            area.viewport,
            shading.polygon_mode,
            tests,
            &shading.blending,
        )?;

        let vbo = self
            .resources
            .vertex_buffers
            .get(geometry.vertex_buffer)
            .ok_or_else(|| format_err!("{:?} is invalid.", geometry.vertex_buffer))?;

        let primitive = GLenum::from(vbo.params.primitive);
        if vbo.indexed {
            let offset = geometry.first_index as usize * vbo.params.index_format.stride();
            self.device.draw_elements_instanced(
                primitive,
                geometry.index_count as GLsizei,
                GLenum::from(vbo.params.index_format),
                offset,
                shading.instances as GLsizei,
            );
        } else {
            self.device.draw_arrays_instanced(
                primitive,
                geometry.first_index as GLint,
                geometry.index_count as GLsizei,
                shading.instances as GLsizei,
            );
        }

        Self::check(&mut self.device)
    }

    #[cfg(feature = "compute")]
    fn compute(
        &mut self,
        shader: ShaderHandle,
        params: &ComputeParameters,
        x: u32,
        y: u32,
        z: u32,
    ) -> Result<()> {
        ensure!(
            x >= 1 && y >= 1 && z >= 1,
            "a dispatch needs at least one work group per axis."
        );

        let record = self
            .resources
            .shaders
            .get(shader)
            .ok_or_else(|| format_err!("{:?} is invalid.", shader))?;
        Self::bind_shader(&mut self.device, &mut self.state, shader, record)?;
        Self::bind_uniforms(
            &mut self.device,
            &mut self.state,
            &self.resources,
            record,
            &params.uniforms,
        )?;

        self.device.dispatch_compute(x, y, z);
        Self::check(&mut self.device)
    }

    fn end_frame(&mut self) {
        trace!("frame ended.");
    }
}
