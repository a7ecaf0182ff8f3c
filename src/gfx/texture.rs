//! Texture descriptors.

/// Shape of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2D,
    CubeMap,
}

/// Pixel format. The class of a format (color, depth, stencil or combined)
/// decides which frame-buffer attachment point a texture lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8,
    Rg8,
    Rgb8,
    Rgba8,
    R32F,
    Rgba16F,
    Rgba32F,
    Depth16,
    Depth32F,
    Depth24Stencil8,
    Stencil8,
}

impl TextureFormat {
    #[inline]
    pub fn is_depth(self) -> bool {
        match self {
            TextureFormat::Depth16 | TextureFormat::Depth32F => true,
            _ => false,
        }
    }

    #[inline]
    pub fn is_stencil(self) -> bool {
        self == TextureFormat::Stencil8
    }

    #[inline]
    pub fn is_depth_stencil(self) -> bool {
        self == TextureFormat::Depth24Stencil8
    }

    #[inline]
    pub fn is_color(self) -> bool {
        !self.is_depth() && !self.is_stencil() && !self.is_depth_stencil()
    }
}

/// Minification / magnification filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl TextureFilter {
    /// Returns true if the filter samples from mipmap levels.
    #[inline]
    pub fn mipmapped(self) -> bool {
        match self {
            TextureFilter::Nearest | TextureFilter::Linear => false,
            _ => true,
        }
    }
}

/// Texture coordinate wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureWrap {
    Clamp,
    Repeat,
    MirroredRepeat,
}

/// Sampling state uploaded with every texture load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureSampling {
    pub minify: TextureFilter,
    pub magnify: TextureFilter,
    pub s_wrap: TextureWrap,
    pub t_wrap: TextureWrap,
    pub r_wrap: TextureWrap,
    pub max_anisotropy: f32,
}

impl Default for TextureSampling {
    fn default() -> Self {
        TextureSampling {
            minify: TextureFilter::LinearMipmapLinear,
            magnify: TextureFilter::Linear,
            s_wrap: TextureWrap::Repeat,
            t_wrap: TextureWrap::Repeat,
            r_wrap: TextureWrap::Repeat,
            max_anisotropy: 1.0,
        }
    }
}

/// Everything a texture load needs besides the pixels themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureParams {
    pub width: u32,
    pub height: u32,
    pub kind: TextureKind,
    pub format: TextureFormat,
    pub sampling: TextureSampling,
}

impl TextureParams {
    pub fn new(width: u32, height: u32, format: TextureFormat) -> Self {
        TextureParams {
            width,
            height,
            kind: TextureKind::Texture2D,
            format,
            sampling: TextureSampling::default(),
        }
    }

    pub fn cube_map(mut self) -> Self {
        self.kind = TextureKind::CubeMap;
        self
    }

    pub fn sampling(mut self, sampling: TextureSampling) -> Self {
        self.sampling = sampling;
        self
    }
}
