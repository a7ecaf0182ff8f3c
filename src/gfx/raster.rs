//! Per-draw rasterizer tests. The whole struct is compared against the
//! cached copy in one shot; any difference reissues the full group of native
//! calls, which keeps the cache logic trivial for state that rarely changes.

/// Comparison used by the depth test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunction {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Stencil comparisons share the depth comparison set.
pub type StencilFunction = DepthFunction;

/// What happens to the stencil value on pass/fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOperation {
    Keep,
    Zero,
    Increment,
    Decrement,
    IncrementWrap,
    DecrementWrap,
    Replace,
    Invert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceCulling {
    None,
    Front,
    Back,
    FrontAndBack,
}

/// Stencil test and write-back for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFace {
    pub test: StencilFunction,
    pub reference: u32,
    pub mask: u32,
    pub op_stencil_fail: StencilOperation,
    pub op_depth_fail: StencilOperation,
    pub op_pass: StencilOperation,
}

impl Default for StencilFace {
    fn default() -> Self {
        StencilFace {
            test: StencilFunction::Always,
            reference: 0,
            mask: u32::max_value(),
            op_stencil_fail: StencilOperation::Keep,
            op_depth_fail: StencilOperation::Keep,
            op_pass: StencilOperation::Keep,
        }
    }
}

impl StencilFace {
    /// The stencil unit only needs to be switched on when this face either
    /// rejects fragments or writes back.
    #[inline]
    pub fn active(&self) -> bool {
        self.test != StencilFunction::Always || self.op_pass != StencilOperation::Keep
    }
}

/// The full rasterizer test state of one draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterTests {
    pub face_culling: FaceCulling,
    /// `Some((x, y, width, height))` enables the scissor test.
    pub scissor: Option<(i32, i32, i32, i32)>,
    pub stencil_front: StencilFace,
    pub stencil_back: StencilFace,
    pub depth_test: DepthFunction,
    pub depth_write: bool,
    pub clip_distance: bool,
}

impl Default for RasterTests {
    fn default() -> Self {
        RasterTests {
            face_culling: FaceCulling::None,
            scissor: None,
            stencil_front: StencilFace::default(),
            stencil_back: StencilFace::default(),
            depth_test: DepthFunction::Always,
            depth_write: false,
            clip_distance: false,
        }
    }
}

impl RasterTests {
    pub fn new(face_culling: FaceCulling, depth_test: DepthFunction, depth_write: bool) -> Self {
        RasterTests {
            face_culling,
            depth_test,
            depth_write,
            ..Default::default()
        }
    }

    pub fn no_depth_test() -> Self {
        RasterTests::new(FaceCulling::Back, DepthFunction::Always, false)
    }

    pub fn regular_depth_test() -> Self {
        RasterTests::new(FaceCulling::Back, DepthFunction::LessOrEqual, true)
    }

    pub fn two_sided_no_depth_test() -> Self {
        RasterTests::new(FaceCulling::None, DepthFunction::Always, false)
    }

    pub fn two_sided_regular_depth_test() -> Self {
        RasterTests::new(FaceCulling::None, DepthFunction::LessOrEqual, true)
    }

    /// The depth unit stays off only when nothing tests and nothing writes.
    #[inline]
    pub fn depth_active(&self) -> bool {
        self.depth_test != DepthFunction::Always || self.depth_write
    }
}
