//! The native call surface of the GL backend.
//!
//! `Device` is a strongly typed record of every entry point the layer
//! invokes. The layer is generic over it, so tests can substitute a
//! recording device and assert on the exact command stream while
//! `NativeDevice` forwards to the loaded GL entry points.

use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use gl;
use gl::types::*;

use crate::errors::Result;

pub trait Device {
    // Buffers.
    fn gen_buffer(&mut self) -> GLuint;
    fn delete_buffer(&mut self, id: GLuint);
    fn bind_buffer(&mut self, target: GLenum, id: GLuint);
    fn bind_buffer_base(&mut self, target: GLenum, slot: u32, id: GLuint);
    fn buffer_data(&mut self, target: GLenum, data: &[u8], usage: GLenum);
    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]);
    fn read_buffer(&mut self, target: GLenum, dest: &mut [u8]);
    fn memory_barrier(&mut self, barriers: GLbitfield);

    // Textures.
    fn gen_texture(&mut self) -> GLuint;
    fn delete_texture(&mut self, id: GLuint);
    fn active_texture(&mut self, slot: u32);
    fn bind_texture(&mut self, target: GLenum, id: GLuint);
    fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        kind: GLenum,
        data: Option<&[u8]>,
    );
    fn tex_parameter(&mut self, target: GLenum, pname: GLenum, value: GLint);
    fn tex_parameter_f(&mut self, target: GLenum, pname: GLenum, value: GLfloat);
    fn generate_mipmap(&mut self, target: GLenum);

    // Shaders and programs.
    fn create_shader(&mut self, kind: GLenum) -> GLuint;
    fn shader_source(&mut self, id: GLuint, source: &str);
    fn compile_shader(&mut self, id: GLuint);
    fn shader_compile_status(&mut self, id: GLuint) -> bool;
    fn shader_info_log(&mut self, id: GLuint) -> String;
    fn delete_shader(&mut self, id: GLuint);
    fn create_program(&mut self) -> GLuint;
    fn attach_shader(&mut self, program: GLuint, shader: GLuint);
    fn detach_shader(&mut self, program: GLuint, shader: GLuint);
    fn link_program(&mut self, program: GLuint);
    fn program_link_status(&mut self, program: GLuint) -> bool;
    fn program_info_log(&mut self, program: GLuint) -> String;
    fn delete_program(&mut self, program: GLuint);
    fn use_program(&mut self, program: GLuint);

    // Uniforms and interface blocks.
    fn uniform_location(&mut self, program: GLuint, name: &str) -> GLint;
    fn uniform_floats(&mut self, location: GLint, components: usize, values: &[f32]);
    fn uniform_ints(&mut self, location: GLint, components: usize, values: &[i32]);
    fn uniform_matrix4(&mut self, location: GLint, values: &[f32; 16]);
    fn uniform_block_index(&mut self, program: GLuint, name: &str) -> GLuint;
    fn uniform_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32);
    #[cfg(feature = "compute")]
    fn storage_block_index(&mut self, program: GLuint, name: &str) -> GLuint;
    #[cfg(feature = "compute")]
    fn storage_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32);

    // Frame buffers.
    fn gen_framebuffer(&mut self) -> GLuint;
    fn delete_framebuffer(&mut self, id: GLuint);
    fn bind_framebuffer(&mut self, id: GLuint);
    fn framebuffer_texture_2d(&mut self, attachment: GLenum, target: GLenum, texture: GLuint, level: GLint);
    fn draw_buffers(&mut self, buffers: &[GLenum]);
    fn check_framebuffer_status(&mut self) -> GLenum;

    // Pipeline state.
    fn enable(&mut self, cap: GLenum);
    fn disable(&mut self, cap: GLenum);
    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn polygon_mode(&mut self, mode: GLenum);
    fn cull_face(&mut self, face: GLenum);
    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint);
    fn stencil_op_separate(&mut self, face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum);
    fn depth_func(&mut self, func: GLenum);
    fn depth_mask(&mut self, write: bool);
    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn blend_equation_separate(&mut self, rgb: GLenum, alpha: GLenum);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear(&mut self, buffers: GLbitfield);

    // Vertex attributes and draws.
    fn enable_vertex_attrib(&mut self, location: u32);
    fn disable_vertex_attrib(&mut self, location: u32);
    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    );
    fn draw_elements_instanced(
        &mut self,
        primitive: GLenum,
        count: GLsizei,
        index_kind: GLenum,
        offset: usize,
        instances: GLsizei,
    );
    fn draw_arrays_instanced(&mut self, primitive: GLenum, first: GLint, count: GLsizei, instances: GLsizei);
    #[cfg(feature = "compute")]
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32);

    // Queries.
    fn get_integer(&mut self, pname: GLenum) -> GLint;
    fn get_error(&mut self) -> GLenum;
}

/// The real thing. Every method forwards to the GL entry points loaded by
/// [`OpenGLLayer::from_loader`](../struct.OpenGLLayer.html).
pub struct NativeDevice {
    // One VAO for the whole layer; attribute state is re-specified per
    // vertex buffer bind, as the cache expects.
    vao: GLuint,
}

fn ensure_loaded(name: &str, loaded: bool) -> Result<()> {
    ensure!(loaded, "missing native entry point {}.", name);
    Ok(())
}

impl NativeDevice {
    /// Loads the entry points through `loadfn` and verifies the ones the
    /// layer can not work without beyond the GL 2.x baseline.
    pub fn from_loader<F>(mut loadfn: F) -> Result<NativeDevice>
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(|symbol| loadfn(symbol));

        ensure_loaded("glGenVertexArrays", gl::GenVertexArrays::is_loaded())?;
        ensure_loaded("glBindBufferBase", gl::BindBufferBase::is_loaded())?;
        ensure_loaded("glMapBufferRange", gl::MapBufferRange::is_loaded())?;
        ensure_loaded("glDrawElementsInstanced", gl::DrawElementsInstanced::is_loaded())?;
        ensure_loaded("glDrawArraysInstanced", gl::DrawArraysInstanced::is_loaded())?;
        ensure_loaded("glBlendFuncSeparate", gl::BlendFuncSeparate::is_loaded())?;
        ensure_loaded("glStencilFuncSeparate", gl::StencilFuncSeparate::is_loaded())?;
        ensure_loaded("glUniformBlockBinding", gl::UniformBlockBinding::is_loaded())?;
        ensure_loaded("glFramebufferTexture2D", gl::FramebufferTexture2D::is_loaded())?;

        #[cfg(feature = "compute")]
        {
            ensure_loaded("glDispatchCompute", gl::DispatchCompute::is_loaded())?;
            ensure_loaded("glMemoryBarrier", gl::MemoryBarrier::is_loaded())?;
            ensure_loaded(
                "glShaderStorageBlockBinding",
                gl::ShaderStorageBlockBinding::is_loaded(),
            )?;
            ensure_loaded(
                "glGetProgramResourceIndex",
                gl::GetProgramResourceIndex::is_loaded(),
            )?;
        }

        let mut vao = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut vao);
            gl::BindVertexArray(vao);
        }

        Ok(NativeDevice { vao })
    }
}

impl Drop for NativeDevice {
    fn drop(&mut self) {
        if self.vao != 0 && gl::DeleteVertexArrays::is_loaded() {
            unsafe {
                gl::DeleteVertexArrays(1, &self.vao);
            }
        }
    }
}

fn data_ptr(data: &[u8]) -> *const c_void {
    if data.is_empty() {
        ptr::null()
    } else {
        data.as_ptr() as *const c_void
    }
}

impl Device for NativeDevice {
    fn gen_buffer(&mut self) -> GLuint {
        unsafe {
            let mut id = 0;
            gl::GenBuffers(1, &mut id);
            id
        }
    }

    fn delete_buffer(&mut self, id: GLuint) {
        unsafe {
            gl::DeleteBuffers(1, &id);
        }
    }

    fn bind_buffer(&mut self, target: GLenum, id: GLuint) {
        unsafe {
            gl::BindBuffer(target, id);
        }
    }

    fn bind_buffer_base(&mut self, target: GLenum, slot: u32, id: GLuint) {
        unsafe {
            gl::BindBufferBase(target, slot, id);
        }
    }

    fn buffer_data(&mut self, target: GLenum, data: &[u8], usage: GLenum) {
        unsafe {
            gl::BufferData(target, data.len() as isize, data_ptr(data), usage);
        }
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]) {
        unsafe {
            gl::BufferSubData(target, offset as isize, data.len() as isize, data_ptr(data));
        }
    }

    fn read_buffer(&mut self, target: GLenum, dest: &mut [u8]) {
        unsafe {
            let ptr = gl::MapBufferRange(target, 0, dest.len() as isize, gl::MAP_READ_BIT);
            if !ptr.is_null() {
                ptr::copy_nonoverlapping(ptr as *const u8, dest.as_mut_ptr(), dest.len());
                gl::UnmapBuffer(target);
            }
        }
    }

    fn memory_barrier(&mut self, barriers: GLbitfield) {
        unsafe {
            gl::MemoryBarrier(barriers);
        }
    }

    fn gen_texture(&mut self) -> GLuint {
        unsafe {
            let mut id = 0;
            gl::GenTextures(1, &mut id);
            id
        }
    }

    fn delete_texture(&mut self, id: GLuint) {
        unsafe {
            gl::DeleteTextures(1, &id);
        }
    }

    fn active_texture(&mut self, slot: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
        }
    }

    fn bind_texture(&mut self, target: GLenum, id: GLuint) {
        unsafe {
            gl::BindTexture(target, id);
        }
    }

    fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        kind: GLenum,
        data: Option<&[u8]>,
    ) {
        unsafe {
            gl::TexImage2D(
                target,
                level,
                internal_format as GLint,
                width,
                height,
                0,
                format,
                kind,
                data.map_or(ptr::null(), |v| v.as_ptr() as *const c_void),
            );
        }
    }

    fn tex_parameter(&mut self, target: GLenum, pname: GLenum, value: GLint) {
        unsafe {
            gl::TexParameteri(target, pname, value);
        }
    }

    fn tex_parameter_f(&mut self, target: GLenum, pname: GLenum, value: GLfloat) {
        unsafe {
            gl::TexParameterf(target, pname, value);
        }
    }

    fn generate_mipmap(&mut self, target: GLenum) {
        unsafe {
            gl::GenerateMipmap(target);
        }
    }

    fn create_shader(&mut self, kind: GLenum) -> GLuint {
        unsafe { gl::CreateShader(kind) }
    }

    fn shader_source(&mut self, id: GLuint, source: &str) {
        unsafe {
            let source = CString::new(source).unwrap();
            gl::ShaderSource(id, 1, &source.as_ptr(), ptr::null());
        }
    }

    fn compile_shader(&mut self, id: GLuint) {
        unsafe {
            gl::CompileShader(id);
        }
    }

    fn shader_compile_status(&mut self, id: GLuint) -> bool {
        unsafe {
            let mut status = 0;
            gl::GetShaderiv(id, gl::COMPILE_STATUS, &mut status);
            status == GLint::from(gl::TRUE)
        }
    }

    fn shader_info_log(&mut self, id: GLuint) -> String {
        unsafe {
            let mut len = 0;
            gl::GetShaderiv(id, gl::INFO_LOG_LENGTH, &mut len);
            if len <= 1 {
                return String::new();
            }

            let mut log = vec![0u8; len as usize];
            gl::GetShaderInfoLog(id, len, ptr::null_mut(), log.as_mut_ptr() as *mut GLchar);
            log.pop();
            String::from_utf8_lossy(&log).into_owned()
        }
    }

    fn delete_shader(&mut self, id: GLuint) {
        unsafe {
            gl::DeleteShader(id);
        }
    }

    fn create_program(&mut self) -> GLuint {
        unsafe { gl::CreateProgram() }
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        unsafe {
            gl::AttachShader(program, shader);
        }
    }

    fn detach_shader(&mut self, program: GLuint, shader: GLuint) {
        unsafe {
            gl::DetachShader(program, shader);
        }
    }

    fn link_program(&mut self, program: GLuint) {
        unsafe {
            gl::LinkProgram(program);
        }
    }

    fn program_link_status(&mut self, program: GLuint) -> bool {
        unsafe {
            let mut status = 0;
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
            status == GLint::from(gl::TRUE)
        }
    }

    fn program_info_log(&mut self, program: GLuint) -> String {
        unsafe {
            let mut len = 0;
            gl::GetProgramiv(program, gl::INFO_LOG_LENGTH, &mut len);
            if len <= 1 {
                return String::new();
            }

            let mut log = vec![0u8; len as usize];
            gl::GetProgramInfoLog(program, len, ptr::null_mut(), log.as_mut_ptr() as *mut GLchar);
            log.pop();
            String::from_utf8_lossy(&log).into_owned()
        }
    }

    fn delete_program(&mut self, program: GLuint) {
        unsafe {
            gl::DeleteProgram(program);
        }
    }

    fn use_program(&mut self, program: GLuint) {
        unsafe {
            gl::UseProgram(program);
        }
    }

    fn uniform_location(&mut self, program: GLuint, name: &str) -> GLint {
        unsafe {
            let name = CString::new(name).unwrap();
            gl::GetUniformLocation(program, name.as_ptr())
        }
    }

    fn uniform_floats(&mut self, location: GLint, components: usize, values: &[f32]) {
        unsafe {
            let ptr = values.as_ptr();
            match components {
                1 => gl::Uniform1fv(location, 1, ptr),
                2 => gl::Uniform2fv(location, 1, ptr),
                3 => gl::Uniform3fv(location, 1, ptr),
                _ => gl::Uniform4fv(location, 1, ptr),
            }
        }
    }

    fn uniform_ints(&mut self, location: GLint, components: usize, values: &[i32]) {
        unsafe {
            let ptr = values.as_ptr();
            match components {
                1 => gl::Uniform1iv(location, 1, ptr),
                2 => gl::Uniform2iv(location, 1, ptr),
                3 => gl::Uniform3iv(location, 1, ptr),
                _ => gl::Uniform4iv(location, 1, ptr),
            }
        }
    }

    fn uniform_matrix4(&mut self, location: GLint, values: &[f32; 16]) {
        unsafe {
            gl::UniformMatrix4fv(location, 1, gl::FALSE, values.as_ptr());
        }
    }

    fn uniform_block_index(&mut self, program: GLuint, name: &str) -> GLuint {
        unsafe {
            let name = CString::new(name).unwrap();
            gl::GetUniformBlockIndex(program, name.as_ptr())
        }
    }

    fn uniform_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32) {
        unsafe {
            gl::UniformBlockBinding(program, index, slot);
        }
    }

    #[cfg(feature = "compute")]
    fn storage_block_index(&mut self, program: GLuint, name: &str) -> GLuint {
        unsafe {
            let name = CString::new(name).unwrap();
            gl::GetProgramResourceIndex(program, gl::SHADER_STORAGE_BLOCK, name.as_ptr())
        }
    }

    #[cfg(feature = "compute")]
    fn storage_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32) {
        unsafe {
            gl::ShaderStorageBlockBinding(program, index, slot);
        }
    }

    fn gen_framebuffer(&mut self) -> GLuint {
        unsafe {
            let mut id = 0;
            gl::GenFramebuffers(1, &mut id);
            id
        }
    }

    fn delete_framebuffer(&mut self, id: GLuint) {
        unsafe {
            gl::DeleteFramebuffers(1, &id);
        }
    }

    fn bind_framebuffer(&mut self, id: GLuint) {
        unsafe {
            gl::BindFramebuffer(gl::FRAMEBUFFER, id);
        }
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: GLenum,
        target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        unsafe {
            gl::FramebufferTexture2D(gl::FRAMEBUFFER, attachment, target, texture, level);
        }
    }

    fn draw_buffers(&mut self, buffers: &[GLenum]) {
        unsafe {
            gl::DrawBuffers(buffers.len() as GLsizei, buffers.as_ptr());
        }
    }

    fn check_framebuffer_status(&mut self) -> GLenum {
        unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER) }
    }

    fn enable(&mut self, cap: GLenum) {
        unsafe {
            gl::Enable(cap);
        }
    }

    fn disable(&mut self, cap: GLenum) {
        unsafe {
            gl::Disable(cap);
        }
    }

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe {
            gl::Viewport(x, y, width, height);
        }
    }

    fn polygon_mode(&mut self, mode: GLenum) {
        unsafe {
            gl::PolygonMode(gl::FRONT_AND_BACK, mode);
        }
    }

    fn cull_face(&mut self, face: GLenum) {
        unsafe {
            gl::CullFace(face);
        }
    }

    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        unsafe {
            gl::Scissor(x, y, width, height);
        }
    }

    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        unsafe {
            gl::StencilFuncSeparate(face, func, reference, mask);
        }
    }

    fn stencil_op_separate(&mut self, face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum) {
        unsafe {
            gl::StencilOpSeparate(face, sfail, dpfail, dppass);
        }
    }

    fn depth_func(&mut self, func: GLenum) {
        unsafe {
            gl::DepthFunc(func);
        }
    }

    fn depth_mask(&mut self, write: bool) {
        unsafe {
            gl::DepthMask(if write { gl::TRUE } else { gl::FALSE });
        }
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) {
        unsafe {
            gl::BlendFuncSeparate(src_rgb, dst_rgb, src_alpha, dst_alpha);
        }
    }

    fn blend_equation_separate(&mut self, rgb: GLenum, alpha: GLenum) {
        unsafe {
            gl::BlendEquationSeparate(rgb, alpha);
        }
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        unsafe {
            gl::ClearColor(r, g, b, a);
        }
    }

    fn clear(&mut self, buffers: GLbitfield) {
        unsafe {
            gl::Clear(buffers);
        }
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        unsafe {
            gl::EnableVertexAttribArray(location);
        }
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        unsafe {
            gl::DisableVertexAttribArray(location);
        }
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: GLint,
        kind: GLenum,
        normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                components,
                kind,
                if normalized { gl::TRUE } else { gl::FALSE },
                stride,
                offset as *const c_void,
            );
        }
    }

    fn draw_elements_instanced(
        &mut self,
        primitive: GLenum,
        count: GLsizei,
        index_kind: GLenum,
        offset: usize,
        instances: GLsizei,
    ) {
        unsafe {
            gl::DrawElementsInstanced(
                primitive,
                count,
                index_kind,
                offset as *const c_void,
                instances,
            );
        }
    }

    fn draw_arrays_instanced(
        &mut self,
        primitive: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
    ) {
        unsafe {
            gl::DrawArraysInstanced(primitive, first, count, instances);
        }
    }

    #[cfg(feature = "compute")]
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        unsafe {
            gl::DispatchCompute(x, y, z);
        }
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        unsafe {
            let mut value = 0;
            gl::GetIntegerv(pname, &mut value);
            value
        }
    }

    fn get_error(&mut self) -> GLenum {
        unsafe { gl::GetError() }
    }
}
