//! 2D texture descriptors. A `Texture` carries either an uncompressed RGBA8
//! bitmap or a block-compressed payload, plus the sampler state applied when it
//! is realized on the GPU.

use std::str::FromStr;

use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::math::Vector2;

impl_handle!(TextureHandle);

/// A decoded RGBA8 image, rows stored bottom to top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let len = width as usize * height as usize * 4;
        if pixels.len() != len {
            return Err(Error::InvalidBitmap(width, height, len, pixels.len()));
        }

        Ok(Bitmap {
            width,
            height,
            pixels,
        })
    }

    /// Creates a bitmap filled with one color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba
            .iter()
            .cloned()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();

        Bitmap {
            width,
            height,
            pixels,
        }
    }

    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        Vector2::new(self.width, self.height)
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the pixel at `(x, y)`, where `y = 0` is the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = (y as usize * self.width as usize + x as usize) * 4;
        let p = &self.pixels[i..i + 4];
        Some([p[0], p[1], p[2], p[3]])
    }
}

/// The S3TC block-compression variants a compressed payload may declare.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CompressedFormat {
    #[serde(rename = "DXT1")]
    Dxt1,
    #[serde(rename = "DXT1_ONEBITALPHA")]
    Dxt1OneBitAlpha,
    #[serde(rename = "DXT3")]
    Dxt3,
    #[serde(rename = "DXT5")]
    Dxt5,
}

impl FromStr for CompressedFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DXT1" => Ok(CompressedFormat::Dxt1),
            "DXT1_ONEBITALPHA" => Ok(CompressedFormat::Dxt1OneBitAlpha),
            "DXT3" => Ok(CompressedFormat::Dxt3),
            "DXT5" => Ok(CompressedFormat::Dxt5),
            _ => Err(Error::Config(format!(
                "Undefined compressed texture format '{}'.",
                s
            ))),
        }
    }
}

/// A pre-compressed image payload, uploaded as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedImage {
    pub format: CompressedFormat,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// The binding point a texture is bound to. Only 2D textures are used.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureTarget {
    Texture2D,
}

impl Default for TextureTarget {
    fn default() -> Self {
        TextureTarget::Texture2D
    }
}

impl FromStr for TextureTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TEXTURE_2D" => Ok(TextureTarget::Texture2D),
            _ => Err(Error::Config(format!("Undefined texture target '{}'.", s))),
        }
    }
}

/// Sets the wrap parameter for texture.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureWrap {
    /// Samples at coord x + 1 map to coord x.
    Repeat,
    /// Samples at coord x + 1 map to coord 1 - x.
    MirroredRepeat,
    /// Samples at coord x + 1 map to coord 1.
    ClampToEdge,
}

impl Default for TextureWrap {
    fn default() -> Self {
        TextureWrap::Repeat
    }
}

impl FromStr for TextureWrap {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "REPEAT" => Ok(TextureWrap::Repeat),
            "MIRRORED_REPEAT" => Ok(TextureWrap::MirroredRepeat),
            "CLAMP_TO_EDGE" => Ok(TextureWrap::ClampToEdge),
            _ => Err(Error::Config(format!("Undefined texture wrap '{}'.", s))),
        }
    }
}

/// Specify how the texture is used whenever the pixel being sampled.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum TextureFilter {
    Nearest,
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl Default for TextureFilter {
    fn default() -> Self {
        TextureFilter::Linear
    }
}

impl TextureFilter {
    /// Returns true if sampling with this filter reads from a mipmap chain.
    pub fn is_mipmap(self) -> bool {
        match self {
            TextureFilter::Nearest | TextureFilter::Linear => false,
            _ => true,
        }
    }
}

impl FromStr for TextureFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "NEAREST" => Ok(TextureFilter::Nearest),
            "LINEAR" => Ok(TextureFilter::Linear),
            "NEAREST_MIPMAP_NEAREST" => Ok(TextureFilter::NearestMipmapNearest),
            "LINEAR_MIPMAP_NEAREST" => Ok(TextureFilter::LinearMipmapNearest),
            "NEAREST_MIPMAP_LINEAR" => Ok(TextureFilter::NearestMipmapLinear),
            "LINEAR_MIPMAP_LINEAR" => Ok(TextureFilter::LinearMipmapLinear),
            _ => Err(Error::Config(format!("Undefined texture filter '{}'.", s))),
        }
    }
}

/// The sampler state a texture is realized with, after defaults are applied.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SamplerParams {
    pub wrap_s: TextureWrap,
    pub wrap_t: TextureWrap,
    pub mag_filter: TextureFilter,
    pub min_filter: TextureFilter,
}

/// A texture descriptor. The GPU texture realized from it is cached by `uid`,
/// descriptors sharing a `uid` share a texture.
#[derive(Debug, Clone, Default)]
pub struct Texture {
    pub uid: Option<Uuid>,
    pub image: Option<Bitmap>,
    pub format: Option<CompressedImage>,
    pub wrap_s: Option<TextureWrap>,
    pub wrap_t: Option<TextureWrap>,
    pub mag_filter: Option<TextureFilter>,
    pub min_filter: Option<TextureFilter>,
    /// Should we generates a complete set of mipmaps for the texture.
    pub mipmaps: bool,
}

impl Texture {
    /// Creates a texture wrapping `image` under a fresh uid.
    pub fn new(image: Bitmap) -> Self {
        Texture {
            uid: Some(Uuid::new_v4()),
            image: Some(image),
            ..Default::default()
        }
    }

    /// Creates a texture wrapping a block-compressed payload under a fresh uid.
    pub fn compressed(image: CompressedImage) -> Self {
        Texture {
            uid: Some(Uuid::new_v4()),
            format: Some(image),
            ..Default::default()
        }
    }

    pub fn with_wrap(mut self, wrap_s: TextureWrap, wrap_t: TextureWrap) -> Self {
        self.wrap_s = Some(wrap_s);
        self.wrap_t = Some(wrap_t);
        self
    }

    pub fn with_filter(mut self, mag: TextureFilter, min: TextureFilter) -> Self {
        self.mag_filter = Some(mag);
        self.min_filter = Some(min);
        self
    }

    pub fn with_mipmaps(mut self, mipmaps: bool) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    pub fn sampler(&self) -> SamplerParams {
        SamplerParams {
            wrap_s: self.wrap_s.unwrap_or_default(),
            wrap_t: self.wrap_t.unwrap_or_default(),
            mag_filter: self.mag_filter.unwrap_or_default(),
            min_filter: self.min_filter.unwrap_or_default(),
        }
    }

    /// Mipmaps are generated when requested, or when either filter samples
    /// from a mipmap chain.
    pub fn needs_mipmaps(&self) -> bool {
        let sampler = self.sampler();
        self.mipmaps || sampler.mag_filter.is_mipmap() || sampler.min_filter.is_mipmap()
    }
}
