//! Heightmap sampling.
//!
//! `HeightSampler` wraps a captured 2D scalar field and answers integer
//! lookups with edge clamping. Storage can be 8-bit normalized (the common
//! case for framebuffer readbacks and PNG files) or floating point; the
//! sampler remembers which one it holds and applies the matching scale on
//! every read, so callers always see values in [0, 1].

use image::DynamicImage;
use std::path::Path;

/// Errors that can occur when constructing a height sampler.
#[derive(Debug)]
pub enum HeightmapError {
    /// Width or height is zero
    EmptyDimensions { width: usize, height: usize },
    /// Buffer length does not match the declared dimensions
    BufferSize { expected: usize, actual: usize },
    /// Image decoding error
    Image(image::ImageError),
}

impl std::fmt::Display for HeightmapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeightmapError::EmptyDimensions { width, height } => {
                write!(f, "heightmap has empty dimensions {}x{}", width, height)
            }
            HeightmapError::BufferSize { expected, actual } => write!(
                f,
                "heightmap buffer has {} values, expected {}",
                actual, expected
            ),
            HeightmapError::Image(e) => write!(f, "Image error: {}", e),
        }
    }
}

impl std::error::Error for HeightmapError {}

impl From<image::ImageError> for HeightmapError {
    fn from(e: image::ImageError) -> Self {
        HeightmapError::Image(e)
    }
}

/// Anything that can answer clamped integer height lookups.
///
/// `MeshBuilder` reads elevation through this trait so tests and callers can
/// plug in their own fields.
pub trait HeightField {
    /// Width of the field in samples.
    fn width(&self) -> usize;

    /// Height of the field in samples.
    fn height(&self) -> usize;

    /// Sample at (x, y), clamped to the field bounds. Returns a value in [0, 1].
    fn get(&self, x: i64, y: i64) -> f32;
}

/// Backing storage of a sampler.
#[derive(Debug, Clone, PartialEq)]
enum HeightStorage {
    /// 0..255, scaled by 1/255 on read
    Unorm8(Vec<u8>),
    /// Already normalized, scale 1
    Float(Vec<f32>),
}

/// Edge-clamped nearest-sample lookup over a captured heightmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSampler {
    width: usize,
    height: usize,
    storage: HeightStorage,
    /// Distance between consecutive samples in the backing buffer
    stride: usize,
    scale: f32,
}

impl HeightSampler {
    /// Single-channel 8-bit heightmap.
    pub fn from_unorm8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, HeightmapError> {
        Self::build(width, height, HeightStorage::Unorm8(data), 1)
    }

    /// Single-channel floating point heightmap.
    pub fn from_f32(width: usize, height: usize, data: Vec<f32>) -> Result<Self, HeightmapError> {
        Self::build(width, height, HeightStorage::Float(data), 1)
    }

    /// RGBA8 framebuffer readback. The red channel holds the height.
    pub fn from_rgba8(width: usize, height: usize, data: Vec<u8>) -> Result<Self, HeightmapError> {
        Self::build(width, height, HeightStorage::Unorm8(data), 4)
    }

    /// RGBA float framebuffer readback. The red channel holds the height.
    pub fn from_rgba_f32(
        width: usize,
        height: usize,
        data: Vec<f32>,
    ) -> Result<Self, HeightmapError> {
        Self::build(width, height, HeightStorage::Float(data), 4)
    }

    /// A constant field, mostly useful for tests and placeholder terrain.
    pub fn flat(width: usize, height: usize, value: f32) -> Result<Self, HeightmapError> {
        Self::from_f32(width, height, vec![value; width * height])
    }

    /// Convert a decoded image. 8-bit images keep 8-bit storage, anything
    /// deeper is converted to float luma.
    pub fn from_image(image: &DynamicImage) -> Result<Self, HeightmapError> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        match image {
            DynamicImage::ImageLuma8(_)
            | DynamicImage::ImageLumaA8(_)
            | DynamicImage::ImageRgb8(_)
            | DynamicImage::ImageRgba8(_) => {
                Self::from_unorm8(width, height, image.to_luma8().into_raw())
            }
            _ => Self::from_f32(width, height, image.to_luma32f().into_raw()),
        }
    }

    /// Load a heightmap image from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HeightmapError> {
        let image = image::open(path)?;
        Self::from_image(&image)
    }

    fn build(
        width: usize,
        height: usize,
        storage: HeightStorage,
        stride: usize,
    ) -> Result<Self, HeightmapError> {
        if width == 0 || height == 0 {
            return Err(HeightmapError::EmptyDimensions { width, height });
        }

        let expected = width * height * stride;
        let (actual, scale) = match &storage {
            HeightStorage::Unorm8(data) => (data.len(), 1.0 / 255.0),
            HeightStorage::Float(data) => (data.len(), 1.0),
        };
        if actual != expected {
            return Err(HeightmapError::BufferSize { expected, actual });
        }

        Ok(Self {
            width,
            height,
            storage,
            stride,
            scale,
        })
    }

    /// Scale applied to raw stored values (1/255 for 8-bit storage, 1 for float).
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Whether the backing buffer is 8-bit normalized.
    pub fn is_unorm8(&self) -> bool {
        matches!(self.storage, HeightStorage::Unorm8(_))
    }

    fn raw(&self, index: usize) -> f32 {
        match &self.storage {
            HeightStorage::Unorm8(data) => data[index] as f32,
            HeightStorage::Float(data) => data[index],
        }
    }
}

impl HeightField for HeightSampler {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn get(&self, x: i64, y: i64) -> f32 {
        let x = x.clamp(0, self.width as i64 - 1) as usize;
        let y = y.clamp(0, self.height as i64 - 1) as usize;
        self.raw((x + y * self.width) * self.stride) * self.scale
    }
}
