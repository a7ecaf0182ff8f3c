//! A recording device for the unit tests.
//!
//! Every native call is appended to `calls`, so tests can assert on the
//! exact command stream the binding logic emits. Buffer storage is
//! emulated, and shader stores are modeled as incoherent: a dispatch hook
//! writes into `pending`, which becomes visible to reads only after a
//! memory barrier. That makes the barrier and round-trip properties
//! observable without a GPU.

use std::collections::HashMap;

use gl;
use gl::types::*;

use super::device::Device;

fn target_name(target: GLenum) -> &'static str {
    match target {
        gl::ARRAY_BUFFER => "ARRAY_BUFFER",
        gl::ELEMENT_ARRAY_BUFFER => "ELEMENT_ARRAY_BUFFER",
        gl::UNIFORM_BUFFER => "UNIFORM_BUFFER",
        gl::SHADER_STORAGE_BUFFER => "SHADER_STORAGE_BUFFER",
        gl::TEXTURE_2D => "TEXTURE_2D",
        gl::TEXTURE_CUBE_MAP => "TEXTURE_CUBE_MAP",
        _ => "OTHER",
    }
}

/// The emulated memory a dispatch hook operates on. `buffers` holds the
/// contents visible to reads; `pending` holds shader stores awaiting a
/// barrier. The slot arrays expose which native buffer is bound where.
pub struct MockMemory<'a> {
    pub buffers: &'a mut HashMap<GLuint, Vec<u8>>,
    pub pending: &'a mut HashMap<GLuint, Vec<u8>>,
    pub uniform_slots: &'a [GLuint],
    pub storage_slots: &'a [GLuint],
}

pub type DispatchHook = Box<dyn FnMut(&mut MockMemory)>;

pub struct MockDevice {
    pub calls: Vec<String>,
    next_id: GLuint,
    buffers: HashMap<GLuint, Vec<u8>>,
    pending: HashMap<GLuint, Vec<u8>>,
    bound_buffers: HashMap<GLenum, GLuint>,
    bound_textures: HashMap<GLenum, GLuint>,
    uniform_slots: [GLuint; 16],
    storage_slots: [GLuint; 8],
    locations: HashMap<(GLuint, String), GLint>,
    block_indices: HashMap<(GLuint, String), GLuint>,
    on_dispatch: Option<DispatchHook>,
}

impl MockDevice {
    pub fn new() -> Self {
        MockDevice {
            calls: Vec::new(),
            next_id: 1,
            buffers: HashMap::new(),
            pending: HashMap::new(),
            bound_buffers: HashMap::new(),
            bound_textures: HashMap::new(),
            uniform_slots: [0; 16],
            storage_slots: [0; 8],
            locations: HashMap::new(),
            block_indices: HashMap::new(),
            on_dispatch: None,
        }
    }

    /// Installs the emulated behavior of the next dispatches.
    pub fn on_dispatch<F>(&mut self, hook: F)
    where
        F: FnMut(&mut MockMemory) + 'static,
    {
        self.on_dispatch = Some(Box::new(hook));
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|v| v.starts_with(prefix)).count()
    }

    fn record(&mut self, call: String) {
        self.calls.push(call);
    }

    fn fresh_id(&mut self) -> GLuint {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn location_of(&mut self, program: GLuint, name: &str) -> GLint {
        let next = self.locations.len() as GLint;
        *self
            .locations
            .entry((program, name.to_string()))
            .or_insert(next)
    }

    fn block_index_of(&mut self, program: GLuint, name: &str) -> GLuint {
        let next = self.block_indices.len() as GLuint;
        *self
            .block_indices
            .entry((program, name.to_string()))
            .or_insert(next)
    }
}

impl Device for MockDevice {
    fn gen_buffer(&mut self) -> GLuint {
        let id = self.fresh_id();
        self.record(format!("gen_buffer() = {}", id));
        id
    }

    fn delete_buffer(&mut self, id: GLuint) {
        self.record(format!("delete_buffer({})", id));
        self.buffers.remove(&id);
        self.pending.remove(&id);
    }

    fn bind_buffer(&mut self, target: GLenum, id: GLuint) {
        self.record(format!("bind_buffer({}, {})", target_name(target), id));
        self.bound_buffers.insert(target, id);
    }

    fn bind_buffer_base(&mut self, target: GLenum, slot: u32, id: GLuint) {
        self.record(format!(
            "bind_buffer_base({}, {}, {})",
            target_name(target),
            slot,
            id
        ));
        match target {
            gl::UNIFORM_BUFFER => self.uniform_slots[slot as usize] = id,
            gl::SHADER_STORAGE_BUFFER => self.storage_slots[slot as usize] = id,
            _ => {}
        }
    }

    fn buffer_data(&mut self, target: GLenum, data: &[u8], _usage: GLenum) {
        self.record(format!(
            "buffer_data({}, {} bytes)",
            target_name(target),
            data.len()
        ));
        let id = self.bound_buffers.get(&target).cloned().unwrap_or(0);
        self.buffers.insert(id, data.to_vec());
        self.pending.remove(&id);
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]) {
        self.record(format!(
            "buffer_sub_data({}, {}, {} bytes)",
            target_name(target),
            offset,
            data.len()
        ));
        let id = self.bound_buffers.get(&target).cloned().unwrap_or(0);
        if let Some(buffer) = self.buffers.get_mut(&id) {
            buffer[offset..offset + data.len()].copy_from_slice(data);
        }
    }

    fn read_buffer(&mut self, target: GLenum, dest: &mut [u8]) {
        self.record(format!(
            "read_buffer({}, {} bytes)",
            target_name(target),
            dest.len()
        ));
        let id = self.bound_buffers.get(&target).cloned().unwrap_or(0);
        if let Some(buffer) = self.buffers.get(&id) {
            dest.copy_from_slice(&buffer[..dest.len()]);
        }
    }

    fn memory_barrier(&mut self, _barriers: GLbitfield) {
        self.record("memory_barrier".to_string());
        let pending: Vec<(GLuint, Vec<u8>)> = self.pending.drain().collect();
        for (id, data) in pending {
            self.buffers.insert(id, data);
        }
    }

    fn gen_texture(&mut self) -> GLuint {
        let id = self.fresh_id();
        self.record(format!("gen_texture() = {}", id));
        id
    }

    fn delete_texture(&mut self, id: GLuint) {
        self.record(format!("delete_texture({})", id));
    }

    fn active_texture(&mut self, slot: u32) {
        self.record(format!("active_texture({})", slot));
    }

    fn bind_texture(&mut self, target: GLenum, id: GLuint) {
        self.record(format!("bind_texture({}, {})", target_name(target), id));
        self.bound_textures.insert(target, id);
    }

    fn tex_image_2d(
        &mut self,
        target: GLenum,
        level: GLint,
        _internal_format: GLenum,
        width: GLsizei,
        height: GLsizei,
        _format: GLenum,
        _kind: GLenum,
        _data: Option<&[u8]>,
    ) {
        self.record(format!(
            "tex_image_2d({:#X}, {}, {}x{})",
            target, level, width, height
        ));
    }

    fn tex_parameter(&mut self, _target: GLenum, pname: GLenum, value: GLint) {
        self.record(format!("tex_parameter({:#X}, {})", pname, value));
    }

    fn tex_parameter_f(&mut self, _target: GLenum, pname: GLenum, value: GLfloat) {
        self.record(format!("tex_parameter_f({:#X}, {})", pname, value));
    }

    fn generate_mipmap(&mut self, target: GLenum) {
        self.record(format!("generate_mipmap({})", target_name(target)));
    }

    fn create_shader(&mut self, kind: GLenum) -> GLuint {
        let id = self.fresh_id();
        self.record(format!("create_shader({:#X}) = {}", kind, id));
        id
    }

    fn shader_source(&mut self, id: GLuint, source: &str) {
        self.record(format!("shader_source({}, {} bytes)", id, source.len()));
    }

    fn compile_shader(&mut self, id: GLuint) {
        self.record(format!("compile_shader({})", id));
    }

    fn shader_compile_status(&mut self, _id: GLuint) -> bool {
        true
    }

    fn shader_info_log(&mut self, _id: GLuint) -> String {
        String::new()
    }

    fn delete_shader(&mut self, id: GLuint) {
        self.record(format!("delete_shader({})", id));
    }

    fn create_program(&mut self) -> GLuint {
        let id = self.fresh_id();
        self.record(format!("create_program() = {}", id));
        id
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        self.record(format!("attach_shader({}, {})", program, shader));
    }

    fn detach_shader(&mut self, program: GLuint, shader: GLuint) {
        self.record(format!("detach_shader({}, {})", program, shader));
    }

    fn link_program(&mut self, program: GLuint) {
        self.record(format!("link_program({})", program));
    }

    fn program_link_status(&mut self, _program: GLuint) -> bool {
        true
    }

    fn program_info_log(&mut self, _program: GLuint) -> String {
        String::new()
    }

    fn delete_program(&mut self, program: GLuint) {
        self.record(format!("delete_program({})", program));
    }

    fn use_program(&mut self, program: GLuint) {
        self.record(format!("use_program({})", program));
    }

    fn uniform_location(&mut self, program: GLuint, name: &str) -> GLint {
        self.location_of(program, name)
    }

    fn uniform_floats(&mut self, location: GLint, components: usize, values: &[f32]) {
        self.record(format!(
            "uniform_floats({}, {}, {:?})",
            location, components, values
        ));
    }

    fn uniform_ints(&mut self, location: GLint, components: usize, values: &[i32]) {
        self.record(format!(
            "uniform_ints({}, {}, {:?})",
            location, components, values
        ));
    }

    fn uniform_matrix4(&mut self, location: GLint, _values: &[f32; 16]) {
        self.record(format!("uniform_matrix4({})", location));
    }

    fn uniform_block_index(&mut self, program: GLuint, name: &str) -> GLuint {
        self.block_index_of(program, name)
    }

    fn uniform_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32) {
        self.record(format!(
            "uniform_block_binding({}, {}, {})",
            program, index, slot
        ));
    }

    #[cfg(feature = "compute")]
    fn storage_block_index(&mut self, program: GLuint, name: &str) -> GLuint {
        self.block_index_of(program, name)
    }

    #[cfg(feature = "compute")]
    fn storage_block_binding(&mut self, program: GLuint, index: GLuint, slot: u32) {
        self.record(format!(
            "storage_block_binding({}, {}, {})",
            program, index, slot
        ));
    }

    fn gen_framebuffer(&mut self) -> GLuint {
        let id = self.fresh_id();
        self.record(format!("gen_framebuffer() = {}", id));
        id
    }

    fn delete_framebuffer(&mut self, id: GLuint) {
        self.record(format!("delete_framebuffer({})", id));
    }

    fn bind_framebuffer(&mut self, id: GLuint) {
        self.record(format!("bind_framebuffer({})", id));
    }

    fn framebuffer_texture_2d(
        &mut self,
        attachment: GLenum,
        _target: GLenum,
        texture: GLuint,
        level: GLint,
    ) {
        self.record(format!(
            "framebuffer_texture_2d({:#X}, {}, {})",
            attachment, texture, level
        ));
    }

    fn draw_buffers(&mut self, buffers: &[GLenum]) {
        self.record(format!("draw_buffers({:?})", buffers));
    }

    fn check_framebuffer_status(&mut self) -> GLenum {
        gl::FRAMEBUFFER_COMPLETE
    }

    fn enable(&mut self, cap: GLenum) {
        self.record(format!("enable({:#X})", cap));
    }

    fn disable(&mut self, cap: GLenum) {
        self.record(format!("disable({:#X})", cap));
    }

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(format!("viewport({}, {}, {}, {})", x, y, width, height));
    }

    fn polygon_mode(&mut self, mode: GLenum) {
        self.record(format!("polygon_mode({:#X})", mode));
    }

    fn cull_face(&mut self, face: GLenum) {
        self.record(format!("cull_face({:#X})", face));
    }

    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        self.record(format!("scissor({}, {}, {}, {})", x, y, width, height));
    }

    fn stencil_func_separate(&mut self, face: GLenum, func: GLenum, reference: GLint, mask: GLuint) {
        self.record(format!(
            "stencil_func_separate({:#X}, {:#X}, {}, {:#X})",
            face, func, reference, mask
        ));
    }

    fn stencil_op_separate(&mut self, face: GLenum, sfail: GLenum, dpfail: GLenum, dppass: GLenum) {
        self.record(format!(
            "stencil_op_separate({:#X}, {:#X}, {:#X}, {:#X})",
            face, sfail, dpfail, dppass
        ));
    }

    fn depth_func(&mut self, func: GLenum) {
        self.record(format!("depth_func({:#X})", func));
    }

    fn depth_mask(&mut self, write: bool) {
        self.record(format!("depth_mask({})", write));
    }

    fn blend_func_separate(
        &mut self,
        src_rgb: GLenum,
        dst_rgb: GLenum,
        src_alpha: GLenum,
        dst_alpha: GLenum,
    ) {
        self.record(format!(
            "blend_func_separate({:#X}, {:#X}, {:#X}, {:#X})",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }

    fn blend_equation_separate(&mut self, rgb: GLenum, alpha: GLenum) {
        self.record(format!("blend_equation_separate({:#X}, {:#X})", rgb, alpha));
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.record(format!("clear_color({}, {}, {}, {})", r, g, b, a));
    }

    fn clear(&mut self, buffers: GLbitfield) {
        self.record(format!("clear({:#X})", buffers));
    }

    fn enable_vertex_attrib(&mut self, location: u32) {
        self.record(format!("enable_vertex_attrib({})", location));
    }

    fn disable_vertex_attrib(&mut self, location: u32) {
        self.record(format!("disable_vertex_attrib({})", location));
    }

    fn vertex_attrib_pointer(
        &mut self,
        location: u32,
        components: GLint,
        _kind: GLenum,
        _normalized: bool,
        stride: GLsizei,
        offset: usize,
    ) {
        self.record(format!(
            "vertex_attrib_pointer({}, {}, stride {}, offset {})",
            location, components, stride, offset
        ));
    }

    fn draw_elements_instanced(
        &mut self,
        _primitive: GLenum,
        count: GLsizei,
        _index_kind: GLenum,
        offset: usize,
        instances: GLsizei,
    ) {
        self.record(format!(
            "draw_elements_instanced({}, offset {}, {} instances)",
            count, offset, instances
        ));
    }

    fn draw_arrays_instanced(
        &mut self,
        _primitive: GLenum,
        first: GLint,
        count: GLsizei,
        instances: GLsizei,
    ) {
        self.record(format!(
            "draw_arrays_instanced({}, {}, {} instances)",
            first, count, instances
        ));
    }

    #[cfg(feature = "compute")]
    fn dispatch_compute(&mut self, x: u32, y: u32, z: u32) {
        self.record(format!("dispatch_compute({}, {}, {})", x, y, z));
        if let Some(mut hook) = self.on_dispatch.take() {
            {
                let mut memory = MockMemory {
                    buffers: &mut self.buffers,
                    pending: &mut self.pending,
                    uniform_slots: &self.uniform_slots,
                    storage_slots: &self.storage_slots,
                };
                hook(&mut memory);
            }
            self.on_dispatch = Some(hook);
        }
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        let value = match pname {
            gl::ARRAY_BUFFER_BINDING => {
                self.bound_buffers.get(&gl::ARRAY_BUFFER).cloned().unwrap_or(0)
            }
            gl::ELEMENT_ARRAY_BUFFER_BINDING => self
                .bound_buffers
                .get(&gl::ELEMENT_ARRAY_BUFFER)
                .cloned()
                .unwrap_or(0),
            gl::UNIFORM_BUFFER_BINDING => {
                self.bound_buffers.get(&gl::UNIFORM_BUFFER).cloned().unwrap_or(0)
            }
            gl::SHADER_STORAGE_BUFFER_BINDING => self
                .bound_buffers
                .get(&gl::SHADER_STORAGE_BUFFER)
                .cloned()
                .unwrap_or(0),
            gl::TEXTURE_BINDING_2D => {
                self.bound_textures.get(&gl::TEXTURE_2D).cloned().unwrap_or(0)
            }
            gl::TEXTURE_BINDING_CUBE_MAP => self
                .bound_textures
                .get(&gl::TEXTURE_CUBE_MAP)
                .cloned()
                .unwrap_or(0),
            _ => 0,
        };
        value as GLint
    }

    fn get_error(&mut self) -> GLenum {
        gl::NO_ERROR
    }
}
