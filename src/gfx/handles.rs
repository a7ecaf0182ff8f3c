//! Strongly typed handles for every resource kind the layer manages. Mixing
//! up kinds is a compile error instead of a runtime surprise.

impl_handle!(VertexBufferHandle);
impl_handle!(TextureHandle);
impl_handle!(ShaderHandle);
impl_handle!(FrameBufferHandle);
impl_handle!(UniformBufferHandle);

#[cfg(feature = "compute")]
impl_handle!(StorageBufferHandle);
