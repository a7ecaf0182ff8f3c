use super::mock::MockDevice;
use super::OpenGLLayer;

use crate::gfx::backends::GraphicLayer;
use crate::gfx::config::*;
use crate::gfx::draw::{DrawArea, Geometry, Viewport};
use crate::gfx::handles::*;
use crate::gfx::raster::RasterTests;
use crate::gfx::shading::{ShaderStage, ShaderStageKind, ShadingParameters};
use crate::gfx::texture::{TextureFormat, TextureParams};
use crate::gfx::uniforms::Uniform;
use crate::gfx::vertex::{Primitive, VertexAttribute, VertexAttributeKind, VertexBufferParams};

#[cfg(feature = "compute")]
use super::mock::MockMemory;
#[cfg(feature = "compute")]
use crate::gfx::shading::ComputeParameters;

fn layer() -> OpenGLLayer<MockDevice> {
    OpenGLLayer::new(MockDevice::new()).unwrap()
}

fn params(attributes: usize) -> VertexBufferParams {
    const NAMES: [&str; 4] = ["position", "normal", "uv", "color"];
    let attributes = NAMES[..attributes]
        .iter()
        .map(|&name| VertexAttribute::new(name, 3, VertexAttributeKind::F32))
        .collect();
    VertexBufferParams::new(Primitive::Triangles, attributes)
}

fn make_vertex_buffer(layer: &mut OpenGLLayer<MockDevice>, attributes: usize) -> VertexBufferHandle {
    let handle = layer.create_vertex_buffer().unwrap();
    let vertices = vec![0u8; params(attributes).stride() * 3];
    layer
        .load_vertex_buffer(handle, params(attributes), &vertices, None)
        .unwrap();
    handle
}

fn make_shader(layer: &mut OpenGLLayer<MockDevice>) -> ShaderHandle {
    let handle = layer.create_shader().unwrap();
    layer
        .load_shader(
            handle,
            &[
                ShaderStage::new(ShaderStageKind::Vertex, "void main() {}", "test.vert"),
                ShaderStage::new(ShaderStageKind::Fragment, "void main() {}", "test.frag"),
            ],
        )
        .unwrap();
    handle
}

fn make_texture(layer: &mut OpenGLLayer<MockDevice>, size: u32, format: TextureFormat) -> TextureHandle {
    let handle = layer.create_texture().unwrap();
    layer
        .load_texture(handle, TextureParams::new(size, size, format), 0, -1, None)
        .unwrap();
    handle
}

fn area() -> DrawArea {
    DrawArea::backbuffer(Viewport::new(0, 0, 640, 360))
}

fn draw(layer: &mut OpenGLLayer<MockDevice>, vb: VertexBufferHandle, shader: ShaderHandle, uniforms: &[Uniform]) {
    let mut shading = ShadingParameters::new(shader);
    shading.uniforms.extend(uniforms.iter().cloned());
    layer
        .draw(&area(), &RasterTests::default(), &Geometry::new(vb, 3), &shading)
        .unwrap();
}

#[test]
fn vertex_buffer_binds_are_elided() {
    let mut layer = layer();
    let a = make_vertex_buffer(&mut layer, 1);
    let b = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(&mut layer, a, shader, &[]);
    draw(&mut layer, a, shader, &[]);
    draw(&mut layer, b, shader, &[]);
    draw(&mut layer, a, shader, &[]);

    assert_eq!(layer.device.count("bind_buffer(ARRAY_BUFFER"), 3);
    assert_eq!(layer.device.count("use_program"), 1);
}

#[test]
fn shader_binds_are_elided() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let a = make_shader(&mut layer);
    let b = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(&mut layer, vb, a, &[]);
    draw(&mut layer, vb, a, &[]);
    draw(&mut layer, vb, b, &[]);
    draw(&mut layer, vb, a, &[]);

    assert_eq!(layer.device.count("use_program"), 3);
}

#[test]
fn attributes_follow_the_bound_layout() {
    let mut layer = layer();
    let wide = make_vertex_buffer(&mut layer, 3);
    let narrow = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(&mut layer, wide, shader, &[]);
    assert_eq!(layer.device.count("enable_vertex_attrib"), 3);
    assert_eq!(layer.device.count("disable_vertex_attrib"), 0);
    assert_eq!(layer.device.count("vertex_attrib_pointer"), 3);

    layer.device.calls.clear();
    draw(&mut layer, narrow, shader, &[]);
    assert_eq!(layer.device.count("enable_vertex_attrib"), 0);
    assert_eq!(layer.device.count("disable_vertex_attrib"), 2);
    assert_eq!(layer.device.count("vertex_attrib_pointer"), 1);
}

#[test]
fn unchanged_uniform_values_are_elided() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(&mut layer, vb, shader, &[Uniform::float3("color", 1.0, 0.5, 0.0)]);
    draw(&mut layer, vb, shader, &[Uniform::float3("color", 1.0, 0.5, 0.0)]);
    assert_eq!(layer.device.count("uniform_floats"), 1);

    draw(&mut layer, vb, shader, &[Uniform::float3("color", 1.0, 0.5, 0.1)]);
    assert_eq!(layer.device.count("uniform_floats"), 2);
}

#[test]
fn shader_reload_forgets_bound_values() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(&mut layer, vb, shader, &[Uniform::float1("time", 1.0)]);
    draw(&mut layer, vb, shader, &[Uniform::float1("time", 1.0)]);
    assert_eq!(layer.device.count("uniform_floats"), 1);

    layer
        .load_shader(
            shader,
            &[
                ShaderStage::new(ShaderStageKind::Vertex, "void main() {}", "test.vert"),
                ShaderStage::new(ShaderStageKind::Fragment, "void main() {}", "test.frag"),
            ],
        )
        .unwrap();
    draw(&mut layer, vb, shader, &[Uniform::float1("time", 1.0)]);
    assert_eq!(layer.device.count("uniform_floats"), 2);
}

#[test]
fn unchanged_sampler_still_claims_its_slot() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let s1 = make_shader(&mut layer);
    let s2 = make_shader(&mut layer);
    let t1 = make_texture(&mut layer, 4, TextureFormat::Rgba8);
    let t2 = make_texture(&mut layer, 4, TextureFormat::Rgba8);

    draw(&mut layer, vb, s1, &[Uniform::sampler("tex", t1)]);
    // Another shader parks a different texture in slot 0.
    draw(&mut layer, vb, s2, &[Uniform::sampler("tex", t2)]);

    // The value is unchanged for s1, so the uniform write is skipped, but
    // slot 0 must be re-occupied by t1.
    layer.device.calls.clear();
    draw(&mut layer, vb, s1, &[Uniform::sampler("tex", t1)]);
    assert_eq!(layer.device.count("uniform_ints"), 0);
    assert_eq!(layer.device.count("bind_texture"), 1);
}

#[test]
fn no_op_uniforms_are_skipped() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.device.calls.clear();
    draw(
        &mut layer,
        vb,
        shader,
        &[Uniform::none(), Uniform::float1("time", 1.0), Uniform::none()],
    );
    assert_eq!(layer.device.count("uniform_floats"), 1);
    assert_eq!(layer.device.count("uniform_ints"), 0);
}

#[test]
fn sampler_slots_are_bounded() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);
    let texture = make_texture(&mut layer, 4, TextureFormat::Rgba8);

    let uniforms: Vec<Uniform> = (0..MAX_TEXTURE_SLOTS + 1)
        .map(|i| Uniform::sampler(&format!("tex{}", i), texture))
        .collect();

    layer.device.calls.clear();
    let mut shading = ShadingParameters::new(shader);
    shading.uniforms.extend(uniforms);
    let result = layer.draw(
        &area(),
        &RasterTests::default(),
        &Geometry::new(vb, 3),
        &shading,
    );

    assert!(result.is_err());
    // The offending entry fails before its own native calls.
    assert_eq!(layer.device.count("bind_texture"), MAX_TEXTURE_SLOTS);
}

#[test]
fn uniform_block_binding_is_reissued_per_shader() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let s1 = make_shader(&mut layer);
    let s2 = make_shader(&mut layer);

    let ubo = layer.create_uniform_buffer().unwrap();
    layer.load_uniform_buffer(ubo, &[0u8; 16]).unwrap();

    layer.device.calls.clear();
    draw(&mut layer, vb, s1, &[Uniform::uniform_buffer("Params", ubo)]);
    draw(&mut layer, vb, s2, &[Uniform::uniform_buffer("Params", ubo)]);

    // Each program gets its block pointed at the slot, but the buffer is
    // already sitting there the second time.
    assert_eq!(layer.device.count("uniform_block_binding"), 2);
    assert_eq!(layer.device.count("bind_buffer_base(UNIFORM_BUFFER"), 1);
}

#[test]
fn uniform_buffer_size_is_fixed_by_first_load() {
    let mut layer = layer();
    let ubo = layer.create_uniform_buffer().unwrap();

    layer.load_uniform_buffer(ubo, &[0u8; 16]).unwrap();
    layer.load_uniform_buffer(ubo, &[1u8; 16]).unwrap();
    assert!(layer.load_uniform_buffer(ubo, &[2u8; 8]).is_err());

    assert_eq!(layer.device.count("buffer_data(UNIFORM_BUFFER"), 1);
    assert_eq!(layer.device.count("buffer_sub_data(UNIFORM_BUFFER"), 1);
}

#[test]
fn raster_tests_are_reissued_as_a_group() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    // The defaults match a fresh context, so nothing is issued.
    layer.device.calls.clear();
    draw(&mut layer, vb, shader, &[]);
    assert_eq!(layer.device.count("depth_func"), 0);

    let tests = RasterTests::regular_depth_test();
    let shading = ShadingParameters::new(shader);
    layer
        .draw(&area(), &tests, &Geometry::new(vb, 3), &shading)
        .unwrap();
    assert_eq!(layer.device.count("depth_func"), 1);
    assert_eq!(layer.device.count("depth_mask(true)"), 1);
    assert_eq!(layer.device.count("cull_face"), 1);

    // Identical state on the next draw leaves the group alone.
    layer
        .draw(&area(), &tests, &Geometry::new(vb, 3), &shading)
        .unwrap();
    assert_eq!(layer.device.count("depth_func"), 1);
}

#[test]
fn frame_buffer_attachments_must_share_dimensions() {
    let mut layer = layer();
    let color = make_texture(&mut layer, 4, TextureFormat::Rgba8);
    let depth = make_texture(&mut layer, 8, TextureFormat::Depth32F);

    layer.device.calls.clear();
    assert!(layer.create_frame_buffer(&[color, depth], 0, -1).is_err());

    // Validation rejects the assembly before the first native call.
    assert_eq!(layer.device.count("gen_framebuffer"), 0);
    assert_eq!(layer.device.count("framebuffer_texture_2d"), 0);
}

#[test]
fn frame_buffer_assembly_and_bind_elision() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);
    let c0 = make_texture(&mut layer, 8, TextureFormat::Rgba8);
    let c1 = make_texture(&mut layer, 8, TextureFormat::Rgba16F);
    let depth = make_texture(&mut layer, 8, TextureFormat::Depth32F);

    layer.device.calls.clear();
    let fb = layer.create_frame_buffer(&[c0, c1, depth], 0, -1).unwrap();
    assert_eq!(layer.device.count("framebuffer_texture_2d"), 3);
    assert_eq!(layer.device.count("draw_buffers"), 1);
    assert_eq!(layer.device.count("bind_framebuffer"), 1);

    // The assembly left it bound, so the draw has nothing to do.
    let area = DrawArea::offscreen(fb, Viewport::new(0, 0, 8, 8));
    let shading = ShadingParameters::new(shader);
    layer
        .draw(&area, &RasterTests::default(), &Geometry::new(vb, 3), &shading)
        .unwrap();
    assert_eq!(layer.device.count("bind_framebuffer"), 1);

    // Going back to the backbuffer is a real transition.
    draw(&mut layer, vb, shader, &[]);
    assert_eq!(layer.device.count("bind_framebuffer(0)"), 1);
}

#[test]
fn clearing_overrides_scissor_and_depth_mask() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    let mut tests = RasterTests::default();
    tests.scissor = Some((0, 0, 16, 16));
    let shading = ShadingParameters::new(shader);
    layer
        .draw(&area(), &tests, &Geometry::new(vb, 3), &shading)
        .unwrap();

    layer.device.calls.clear();
    layer.clear_frame_buffer(None, 0.0, 0.0, 0.0, true).unwrap();
    assert_eq!(layer.device.count("disable"), 1);
    assert_eq!(layer.device.count("depth_mask(true)"), 1);
    assert_eq!(layer.device.count("clear("), 1);

    // Both overrides land in the cache, so a second clear is just a clear.
    layer.clear_frame_buffer(None, 0.0, 0.0, 0.0, true).unwrap();
    assert_eq!(layer.device.count("depth_mask(true)"), 1);
    assert_eq!(layer.device.count("clear("), 2);
}

#[test]
fn stale_handles_are_rejected() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    layer.destroy_vertex_buffer(vb).unwrap();
    assert!(layer.destroy_vertex_buffer(vb).is_err());

    let shading = ShadingParameters::new(shader);
    let result = layer.draw(
        &area(),
        &RasterTests::default(),
        &Geometry::new(vb, 3),
        &shading,
    );
    assert!(result.is_err());
}

#[test]
fn draws_need_at_least_one_instance() {
    let mut layer = layer();
    let vb = make_vertex_buffer(&mut layer, 1);
    let shader = make_shader(&mut layer);

    let mut shading = ShadingParameters::new(shader);
    shading.instances = 0;
    let result = layer.draw(
        &area(),
        &RasterTests::default(),
        &Geometry::new(vb, 3),
        &shading,
    );
    assert!(result.is_err());
}

#[test]
fn indexed_draws_offset_in_bytes() {
    let mut layer = layer();
    let shader = make_shader(&mut layer);

    let vb = layer.create_vertex_buffer().unwrap();
    let vertices = vec![0u8; params(1).stride() * 4];
    let indices = [0u8; 6 * 2];
    layer
        .load_vertex_buffer(
            vb,
            params(1).index_format(crate::gfx::vertex::IndexFormat::U16),
            &vertices,
            Some(&indices),
        )
        .unwrap();

    layer.device.calls.clear();
    let shading = ShadingParameters::new(shader);
    layer
        .draw(
            &area(),
            &RasterTests::default(),
            &Geometry::new(vb, 3).with_offset(3),
            &shading,
        )
        .unwrap();

    // 3 indices of 2 bytes each.
    assert_eq!(layer.device.count("draw_elements_instanced(3, offset 6"), 1);
}

#[cfg(feature = "compute")]
fn make_compute_shader(layer: &mut OpenGLLayer<MockDevice>) -> ShaderHandle {
    let handle = layer.create_shader().unwrap();
    layer
        .load_shader(
            handle,
            &[ShaderStage::new(
                ShaderStageKind::Compute,
                "void main() {}",
                "test.comp",
            )],
        )
        .unwrap();
    handle
}

#[cfg(feature = "compute")]
fn make_storage_buffer(layer: &mut OpenGLLayer<MockDevice>, values: &[i32]) -> StorageBufferHandle {
    let handle = layer.create_storage_buffer().unwrap();
    layer.load_storage_buffer(handle, &bytes_of(values)).unwrap();
    handle
}

#[cfg(feature = "compute")]
fn read_ints(layer: &mut OpenGLLayer<MockDevice>, handle: StorageBufferHandle, count: usize) -> Vec<i32> {
    let mut data = vec![0u8; count * 4];
    layer.read_storage_buffer(handle, &mut data).unwrap();
    data.chunks_exact(4)
        .map(|v| i32::from_le_bytes([v[0], v[1], v[2], v[3]]))
        .collect()
}

#[cfg(feature = "compute")]
fn ints_of(data: &[u8]) -> Vec<i32> {
    data.chunks_exact(4)
        .map(|v| i32::from_le_bytes([v[0], v[1], v[2], v[3]]))
        .collect()
}

#[cfg(feature = "compute")]
fn bytes_of(values: &[i32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes().to_vec()).collect()
}

#[cfg(feature = "compute")]
#[test]
fn storage_buffers_round_trip() {
    let mut layer = layer();
    let buffer = make_storage_buffer(&mut layer, &[42, 44, 46, 48]);
    assert_eq!(read_ints(&mut layer, buffer, 4), vec![42, 44, 46, 48]);
}

#[cfg(feature = "compute")]
#[test]
fn reads_beyond_the_buffer_are_rejected() {
    let mut layer = layer();
    let buffer = make_storage_buffer(&mut layer, &[42]);
    let mut dest = [0u8; 8];
    assert!(layer.read_storage_buffer(buffer, &mut dest).is_err());
}

#[cfg(feature = "compute")]
#[test]
fn one_barrier_between_write_and_read() {
    let mut layer = layer();
    let shader = make_compute_shader(&mut layer);
    let buffer = make_storage_buffer(&mut layer, &[1, 2, 3, 4]);

    let mut params = ComputeParameters::default();
    params.uniforms.push(Uniform::storage_output("Data", buffer));
    layer.compute(shader, &params, 4, 1, 1).unwrap();

    layer.device.calls.clear();
    let mut dest = [0u8; 16];
    layer.read_storage_buffer(buffer, &mut dest).unwrap();
    assert_eq!(layer.device.count("memory_barrier"), 1);

    // The buffer is clean now; further reads need no barrier.
    layer.read_storage_buffer(buffer, &mut dest).unwrap();
    assert_eq!(layer.device.count("memory_barrier"), 1);
}

#[cfg(feature = "compute")]
#[test]
fn rebinding_a_written_buffer_as_input_inserts_a_barrier() {
    let mut layer = layer();
    let shader = make_compute_shader(&mut layer);
    let buffer = make_storage_buffer(&mut layer, &[1, 2, 3, 4]);

    let mut write = ComputeParameters::default();
    write.uniforms.push(Uniform::storage_output("Data", buffer));
    layer.compute(shader, &write, 4, 1, 1).unwrap();

    layer.device.calls.clear();
    let mut read = ComputeParameters::default();
    read.uniforms.push(Uniform::storage_input("Data", buffer));
    layer.compute(shader, &read, 4, 1, 1).unwrap();
    assert_eq!(layer.device.count("memory_barrier"), 1);
}

#[cfg(feature = "compute")]
#[test]
fn dispatches_reach_the_bound_storage_buffer() {
    let mut layer = layer();
    let shader = make_compute_shader(&mut layer);

    let values: Vec<i32> = (0..1024).map(|i| 42 + 2 * i).collect();
    let buffer = make_storage_buffer(&mut layer, &values);

    // The emulated kernel doubles every element.
    layer.device.on_dispatch(|memory: &mut MockMemory| {
        let id = memory.storage_slots[0];
        let doubled: Vec<i32> = ints_of(&memory.buffers[&id]).iter().map(|v| v * 2).collect();
        memory.pending.insert(id, bytes_of(&doubled));
    });

    let mut params = ComputeParameters::default();
    params.uniforms.push(Uniform::storage_output("Data", buffer));
    layer.compute(shader, &params, 1024, 1, 1).unwrap();

    let expected: Vec<i32> = values.iter().map(|v| v * 2).collect();
    assert_eq!(read_ints(&mut layer, buffer, 1024), expected);
}

#[cfg(feature = "compute")]
#[test]
fn uniform_blocks_feed_dispatches() {
    let mut layer = layer();
    let shader = make_compute_shader(&mut layer);

    let values: Vec<i32> = (0..1024).map(|i| 42 + 2 * i).collect();
    let buffer = make_storage_buffer(&mut layer, &values);

    let ubo = layer.create_uniform_buffer().unwrap();
    // { offset = 3, multiplier = 2 }
    layer.load_uniform_buffer(ubo, &bytes_of(&[3, 2])).unwrap();

    // (x + offset) * multiplier, parameters read from the bound block.
    layer.device.on_dispatch(|memory: &mut MockMemory| {
        let params = ints_of(&memory.buffers[&memory.uniform_slots[0]]);
        let id = memory.storage_slots[0];
        let mapped: Vec<i32> = ints_of(&memory.buffers[&id])
            .iter()
            .map(|v| (v + params[0]) * params[1])
            .collect();
        memory.pending.insert(id, bytes_of(&mapped));
    });

    let mut params = ComputeParameters::default();
    params.uniforms.push(Uniform::uniform_buffer("Params", ubo));
    params.uniforms.push(Uniform::storage_output("Data", buffer));
    layer.compute(shader, &params, 1024, 1, 1).unwrap();

    let expected: Vec<i32> = values.iter().map(|v| (v + 3) * 2).collect();
    assert_eq!(read_ints(&mut layer, buffer, 1024), expected);
}

#[cfg(feature = "compute")]
#[test]
fn dispatches_need_at_least_one_group_per_axis() {
    let mut layer = layer();
    let shader = make_compute_shader(&mut layer);
    let params = ComputeParameters::default();
    assert!(layer.compute(shader, &params, 0, 1, 1).is_err());
}
