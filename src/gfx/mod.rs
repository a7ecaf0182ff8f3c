//! The graphics abstraction layer: typed handles, value types and the
//! backends that consume them.

pub mod backends;
pub mod config;
pub mod draw;
pub mod handles;
pub mod raster;
pub mod shading;
pub mod texture;
pub mod uniforms;
pub mod vertex;

pub mod prelude {
    pub use super::backends::GraphicLayer;
    pub use super::config::*;
    pub use super::draw::{DrawArea, Geometry, Viewport};
    pub use super::handles::*;
    pub use super::raster::{
        DepthFunction, FaceCulling, RasterTests, StencilFace, StencilFunction, StencilOperation,
    };
    pub use super::shading::{
        BlendEquation, BlendFunction, BlendingMode, PolygonMode, ShaderStage, ShaderStageKind,
        ShadingParameters,
    };
    #[cfg(feature = "compute")]
    pub use super::shading::ComputeParameters;
    pub use super::texture::{
        TextureFilter, TextureFormat, TextureKind, TextureParams, TextureSampling, TextureWrap,
    };
    pub use super::uniforms::{Uniform, UniformValue};
    pub use super::vertex::{
        IndexFormat, Primitive, VertexAttribute, VertexAttributeKind, VertexBufferParams,
    };
}
