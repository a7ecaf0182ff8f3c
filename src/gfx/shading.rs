//! Per-draw shading state: blending, polygon mode, the shader and its
//! uniforms.

use smallvec::SmallVec;

use super::handles::ShaderHandle;
use super::uniforms::Uniform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFunction {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    DstColor,
    OneMinusDstColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstAlpha,
    OneMinusDstAlpha,
}

/// Blending of one draw, separate for the color and alpha channels. Like the
/// rasterizer tests, the whole struct is compared against the cached copy
/// and reissued as a group on any difference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendingMode {
    pub rgb_equation: BlendEquation,
    pub alpha_equation: BlendEquation,
    pub src_rgb: BlendFunction,
    pub dst_rgb: BlendFunction,
    pub src_alpha: BlendFunction,
    pub dst_alpha: BlendFunction,
}

impl BlendingMode {
    pub const OPAQUE: BlendingMode = BlendingMode {
        rgb_equation: BlendEquation::Add,
        alpha_equation: BlendEquation::Add,
        src_rgb: BlendFunction::One,
        dst_rgb: BlendFunction::Zero,
        src_alpha: BlendFunction::One,
        dst_alpha: BlendFunction::Zero,
    };

    pub const TRANSLUCENT: BlendingMode = BlendingMode {
        rgb_equation: BlendEquation::Add,
        alpha_equation: BlendEquation::Add,
        src_rgb: BlendFunction::SrcAlpha,
        dst_rgb: BlendFunction::OneMinusSrcAlpha,
        src_alpha: BlendFunction::SrcAlpha,
        dst_alpha: BlendFunction::OneMinusSrcAlpha,
    };

    /// `src * 1 + dst * 0` with addition is a plain overwrite, so the blend
    /// unit can stay disabled for it.
    #[inline]
    pub fn enabled(&self) -> bool {
        *self != BlendingMode::OPAQUE
    }
}

impl Default for BlendingMode {
    fn default() -> Self {
        BlendingMode::OPAQUE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolygonMode {
    Filled,
    Lines,
    Points,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    #[cfg(feature = "compute")]
    Compute,
}

/// One shader stage to compile. `origin` names the source in compiler logs
/// (a file name, or anything that helps a human find the GLSL).
#[derive(Debug, Clone, Copy)]
pub struct ShaderStage<'a> {
    pub kind: ShaderStageKind,
    pub source: &'a str,
    pub origin: &'a str,
}

impl<'a> ShaderStage<'a> {
    #[inline]
    pub fn new(kind: ShaderStageKind, source: &'a str, origin: &'a str) -> Self {
        ShaderStage {
            kind,
            source,
            origin,
        }
    }
}

/// Everything a draw needs besides geometry and rasterizer tests.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadingParameters {
    pub blending: BlendingMode,
    pub polygon_mode: PolygonMode,
    pub instances: u32,
    pub shader: ShaderHandle,
    pub uniforms: SmallVec<[Uniform; 8]>,
}

impl ShadingParameters {
    pub fn new(shader: ShaderHandle) -> Self {
        ShadingParameters {
            blending: BlendingMode::OPAQUE,
            polygon_mode: PolygonMode::Filled,
            instances: 1,
            shader,
            uniforms: SmallVec::new(),
        }
    }
}

/// The inputs of a compute dispatch.
#[cfg(feature = "compute")]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputeParameters {
    pub uniforms: SmallVec<[Uniform; 8]>,
}
