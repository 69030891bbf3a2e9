//! Conversion between RGBA images and flat buffers of packed ARGB pixels.
//!
//! A packed pixel keeps alpha in bits 24..32, red in 16..24, green in 8..16
//! and blue in 0..8.

use fimg::Image;

use crate::error::{try_zeroed, Error, Result};

/// Packs an `[r, g, b, a]` pixel into `0xAARRGGBB`.
#[inline]
pub const fn pack([r, g, b, a]: [u8; 4]) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Unpacks `0xAARRGGBB` into an `[r, g, b, a]` pixel.
#[inline]
pub const fn unpack(argb: u32) -> [u8; 4] {
    [
        (argb >> 16) as u8,
        (argb >> 8) as u8,
        argb as u8,
        (argb >> 24) as u8,
    ]
}

/// Row-major packed pixels. `pixels.len() == width * height` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: Vec<u32>,
    width: usize,
    height: usize,
}

impl PixelBuffer {
    /// Wraps `pixels`, checking that they cover exactly `width * height`.
    pub fn new(pixels: Vec<u32>, width: usize, height: usize) -> Result<Self> {
        match width.checked_mul(height) {
            Some(len) if len == pixels.len() => Ok(Self {
                pixels,
                width,
                height,
            }),
            _ => Err(Error::DimensionMismatch {
                width,
                height,
                len: pixels.len(),
            }),
        }
    }

    pub(crate) fn zeroed(width: usize, height: usize) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or(Error::DimensionMismatch {
                width,
                height,
                len: 0,
            })?;
        Ok(Self {
            pixels: try_zeroed(len)?,
            width,
            height,
        })
    }

    /// Reads every pixel of `image` row by row.
    pub fn from_image<T: AsRef<[u8]>>(image: &Image<T, 4>) -> Result<Self> {
        let width = image.width() as usize;
        let height = image.height() as usize;
        let bytes = image.buffer().as_ref();

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(width * height)?;
        pixels.extend(
            bytes
                .chunks_exact(4)
                .map(|px| pack([px[0], px[1], px[2], px[3]])),
        );
        Self::new(pixels, width, height)
    }

    /// Unpacks into a freshly allocated image.
    pub fn into_image(self) -> Result<Image<Vec<u8>, 4>> {
        let mut bytes = Vec::new();
        bytes.try_reserve_exact(self.pixels.len() * 4)?;
        self.into_image_in(bytes)
    }

    /// Unpacks into `bytes`, which is cleared first.
    pub(crate) fn into_image_in(self, mut bytes: Vec<u8>) -> Result<Image<Vec<u8>, 4>> {
        let Self {
            pixels,
            width,
            height,
        } = self;
        if pixels.is_empty() {
            return Err(Error::EmptyImage { width, height });
        }
        let mismatch = || Error::DimensionMismatch {
            width,
            height,
            len: pixels.len(),
        };
        let w = u32::try_from(width).map_err(|_| mismatch())?;
        let h = u32::try_from(height).map_err(|_| mismatch())?;

        bytes.clear();
        bytes.try_reserve_exact(pixels.len() * 4)?;
        bytes.extend(pixels.iter().flat_map(|&px| unpack(px)));
        Ok(Image::build(w, h).buf(bytes))
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub(crate) fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    /// Packed pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        self.pixels[y * self.width + x]
    }
}

/// Flattens `image` into packed ARGB pixels.
pub fn to_buffer<T: AsRef<[u8]>>(image: &Image<T, 4>) -> Result<PixelBuffer> {
    PixelBuffer::from_image(image)
}

/// Builds a new image from packed ARGB pixels. Fails with
/// [`Error::DimensionMismatch`] unless `pixels.len() == width * height`.
pub fn from_buffer(pixels: Vec<u32>, width: usize, height: usize) -> Result<Image<Vec<u8>, 4>> {
    PixelBuffer::new(pixels, width, height)?.into_image()
}
