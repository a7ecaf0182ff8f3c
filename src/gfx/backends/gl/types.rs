use gl;
use gl::types::*;

use super::super::super::raster::{DepthFunction, FaceCulling, StencilOperation};
use super::super::super::shading::{BlendEquation, BlendFunction, PolygonMode, ShaderStageKind};
use super::super::super::texture::{TextureFilter, TextureFormat, TextureKind, TextureWrap};
use super::super::super::vertex::{IndexFormat, Primitive, VertexAttributeKind};

// Ubiquitous on desktop drivers, but not part of the core registry the `gl`
// crate generates from.
pub const TEXTURE_MAX_ANISOTROPY_EXT: GLenum = 0x84FE;

impl From<Primitive> for GLenum {
    fn from(primitive: Primitive) -> Self {
        match primitive {
            Primitive::Points => gl::POINTS,
            Primitive::Lines => gl::LINES,
            Primitive::LineStrip => gl::LINE_STRIP,
            Primitive::Triangles => gl::TRIANGLES,
            Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }
}

impl From<VertexAttributeKind> for GLenum {
    fn from(kind: VertexAttributeKind) -> Self {
        match kind {
            VertexAttributeKind::I8 => gl::BYTE,
            VertexAttributeKind::U8 => gl::UNSIGNED_BYTE,
            VertexAttributeKind::I32 => gl::INT,
            VertexAttributeKind::F32 => gl::FLOAT,
        }
    }
}

impl From<IndexFormat> for GLenum {
    fn from(format: IndexFormat) -> Self {
        match format {
            IndexFormat::U8 => gl::UNSIGNED_BYTE,
            IndexFormat::U16 => gl::UNSIGNED_SHORT,
            IndexFormat::U32 => gl::UNSIGNED_INT,
        }
    }
}

impl From<TextureKind> for GLenum {
    fn from(kind: TextureKind) -> Self {
        match kind {
            TextureKind::Texture2D => gl::TEXTURE_2D,
            TextureKind::CubeMap => gl::TEXTURE_CUBE_MAP,
        }
    }
}

/// `(internal format, format, component type)` for texture uploads.
pub fn texture_format(format: TextureFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        TextureFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        TextureFormat::Rg8 => (gl::RG8, gl::RG, gl::UNSIGNED_BYTE),
        TextureFormat::Rgb8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        TextureFormat::Rgba8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        TextureFormat::R32F => (gl::R32F, gl::RED, gl::FLOAT),
        TextureFormat::Rgba16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        TextureFormat::Rgba32F => (gl::RGBA32F, gl::RGBA, gl::FLOAT),
        TextureFormat::Depth16 => (gl::DEPTH_COMPONENT16, gl::DEPTH_COMPONENT, gl::FLOAT),
        TextureFormat::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
        TextureFormat::Depth24Stencil8 => {
            (gl::DEPTH24_STENCIL8, gl::DEPTH_STENCIL, gl::UNSIGNED_INT_24_8)
        }
        TextureFormat::Stencil8 => (gl::STENCIL_INDEX8, gl::STENCIL_INDEX, gl::UNSIGNED_BYTE),
    }
}

impl From<TextureFilter> for GLenum {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => gl::NEAREST,
            TextureFilter::Linear => gl::LINEAR,
            TextureFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Clamp => gl::CLAMP_TO_EDGE,
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT,
        }
    }
}

impl From<DepthFunction> for GLenum {
    fn from(function: DepthFunction) -> Self {
        match function {
            DepthFunction::Never => gl::NEVER,
            DepthFunction::Less => gl::LESS,
            DepthFunction::Equal => gl::EQUAL,
            DepthFunction::LessOrEqual => gl::LEQUAL,
            DepthFunction::Greater => gl::GREATER,
            DepthFunction::NotEqual => gl::NOTEQUAL,
            DepthFunction::GreaterOrEqual => gl::GEQUAL,
            DepthFunction::Always => gl::ALWAYS,
        }
    }
}

impl From<StencilOperation> for GLenum {
    fn from(op: StencilOperation) -> Self {
        match op {
            StencilOperation::Keep => gl::KEEP,
            StencilOperation::Zero => gl::ZERO,
            StencilOperation::Increment => gl::INCR,
            StencilOperation::Decrement => gl::DECR,
            StencilOperation::IncrementWrap => gl::INCR_WRAP,
            StencilOperation::DecrementWrap => gl::DECR_WRAP,
            StencilOperation::Replace => gl::REPLACE,
            StencilOperation::Invert => gl::INVERT,
        }
    }
}

impl From<BlendEquation> for GLenum {
    fn from(equation: BlendEquation) -> Self {
        match equation {
            BlendEquation::Add => gl::FUNC_ADD,
            BlendEquation::Subtract => gl::FUNC_SUBTRACT,
            BlendEquation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
            BlendEquation::Min => gl::MIN,
            BlendEquation::Max => gl::MAX,
        }
    }
}

impl From<BlendFunction> for GLenum {
    fn from(function: BlendFunction) -> Self {
        match function {
            BlendFunction::Zero => gl::ZERO,
            BlendFunction::One => gl::ONE,
            BlendFunction::SrcColor => gl::SRC_COLOR,
            BlendFunction::OneMinusSrcColor => gl::ONE_MINUS_SRC_COLOR,
            BlendFunction::DstColor => gl::DST_COLOR,
            BlendFunction::OneMinusDstColor => gl::ONE_MINUS_DST_COLOR,
            BlendFunction::SrcAlpha => gl::SRC_ALPHA,
            BlendFunction::OneMinusSrcAlpha => gl::ONE_MINUS_SRC_ALPHA,
            BlendFunction::DstAlpha => gl::DST_ALPHA,
            BlendFunction::OneMinusDstAlpha => gl::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl From<PolygonMode> for GLenum {
    fn from(mode: PolygonMode) -> Self {
        match mode {
            PolygonMode::Filled => gl::FILL,
            PolygonMode::Lines => gl::LINE,
            PolygonMode::Points => gl::POINT,
        }
    }
}

impl From<ShaderStageKind> for GLenum {
    fn from(kind: ShaderStageKind) -> Self {
        match kind {
            ShaderStageKind::Vertex => gl::VERTEX_SHADER,
            ShaderStageKind::Fragment => gl::FRAGMENT_SHADER,
            ShaderStageKind::Geometry => gl::GEOMETRY_SHADER,
            ShaderStageKind::TessControl => gl::TESS_CONTROL_SHADER,
            ShaderStageKind::TessEvaluation => gl::TESS_EVALUATION_SHADER,
            #[cfg(feature = "compute")]
            ShaderStageKind::Compute => gl::COMPUTE_SHADER,
        }
    }
}

/// `FaceCulling::None` maps to disabling the cull unit, so only the other
/// variants convert.
pub fn cull_face(culling: FaceCulling) -> Option<GLenum> {
    match culling {
        FaceCulling::None => None,
        FaceCulling::Front => Some(gl::FRONT),
        FaceCulling::Back => Some(gl::BACK),
        FaceCulling::FrontAndBack => Some(gl::FRONT_AND_BACK),
    }
}
