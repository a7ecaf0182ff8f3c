//! Named shader inputs.
//!
//! A draw or compute dispatch carries a flat list of `Uniform`s. Entries with
//! an empty name are no-op slots, so callers can keep a fixed-size uniform
//! array and blank out the entries a particular material does not use.

use inlinable_string::InlinableString;

use super::handles::{TextureHandle, UniformBufferHandle};

#[cfg(feature = "compute")]
use super::handles::StorageBufferHandle;

/// The value of a shader input. The variant fixes both the component type
/// and the declared count, so a `vec3` uniform can never be fed two floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix4f([f32; 16]),
    I32(i32),
    Vector2i([i32; 2]),
    Vector3i([i32; 3]),
    Vector4i([i32; 4]),
    Texture(TextureHandle),
    UniformBuffer(UniformBufferHandle),
    #[cfg(feature = "compute")]
    StorageBufferInput(StorageBufferHandle),
    #[cfg(feature = "compute")]
    StorageBufferOutput(StorageBufferHandle),
}

/// A named shader input.
#[derive(Debug, Clone, PartialEq)]
pub struct Uniform {
    pub name: InlinableString,
    pub value: UniformValue,
}

impl Uniform {
    #[inline]
    pub fn new(name: &str, value: UniformValue) -> Self {
        Uniform {
            name: InlinableString::from(name),
            value,
        }
    }

    /// A no-op slot, skipped by the binding protocol.
    #[inline]
    pub fn none() -> Self {
        Uniform::new("", UniformValue::I32(0))
    }

    #[inline]
    pub fn float1(name: &str, x: f32) -> Self {
        Uniform::new(name, UniformValue::F32(x))
    }

    #[inline]
    pub fn float2(name: &str, x: f32, y: f32) -> Self {
        Uniform::new(name, UniformValue::Vector2f([x, y]))
    }

    #[inline]
    pub fn float3(name: &str, x: f32, y: f32, z: f32) -> Self {
        Uniform::new(name, UniformValue::Vector3f([x, y, z]))
    }

    #[inline]
    pub fn float4(name: &str, x: f32, y: f32, z: f32, w: f32) -> Self {
        Uniform::new(name, UniformValue::Vector4f([x, y, z, w]))
    }

    #[inline]
    pub fn matrix4(name: &str, m: [f32; 16]) -> Self {
        Uniform::new(name, UniformValue::Matrix4f(m))
    }

    #[inline]
    pub fn int1(name: &str, x: i32) -> Self {
        Uniform::new(name, UniformValue::I32(x))
    }

    #[inline]
    pub fn int2(name: &str, x: i32, y: i32) -> Self {
        Uniform::new(name, UniformValue::Vector2i([x, y]))
    }

    #[inline]
    pub fn int3(name: &str, x: i32, y: i32, z: i32) -> Self {
        Uniform::new(name, UniformValue::Vector3i([x, y, z]))
    }

    #[inline]
    pub fn int4(name: &str, x: i32, y: i32, z: i32, w: i32) -> Self {
        Uniform::new(name, UniformValue::Vector4i([x, y, z, w]))
    }

    #[inline]
    pub fn sampler(name: &str, texture: TextureHandle) -> Self {
        Uniform::new(name, UniformValue::Texture(texture))
    }

    #[inline]
    pub fn uniform_buffer(name: &str, buffer: UniformBufferHandle) -> Self {
        Uniform::new(name, UniformValue::UniformBuffer(buffer))
    }

    /// A storage buffer the shader only reads from.
    #[cfg(feature = "compute")]
    #[inline]
    pub fn storage_input(name: &str, buffer: StorageBufferHandle) -> Self {
        Uniform::new(name, UniformValue::StorageBufferInput(buffer))
    }

    /// A storage buffer the shader writes to. Binding one marks the buffer
    /// dirty so a later read or re-bind inserts the required memory barrier.
    #[cfg(feature = "compute")]
    #[inline]
    pub fn storage_output(name: &str, buffer: StorageBufferHandle) -> Self {
        Uniform::new(name, UniformValue::StorageBufferOutput(buffer))
    }

    /// Returns true if this entry is a no-op slot.
    #[inline]
    pub fn is_none(&self) -> bool {
        let name: &str = self.name.as_ref();
        name.is_empty()
    }
}
