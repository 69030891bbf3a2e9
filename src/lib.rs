#![doc = include_str!("../README.md")]
mod convolve;
mod error;
mod kernel;
mod pixel;
mod radius;

use std::sync::atomic::AtomicBool;

use fimg::Image;

pub use convolve::{convolve_1d, Axis};
pub use error::{Error, Result};
pub use kernel::{build_kernel, Kernel, ParseVariantError, Variant};
pub use pixel::{from_buffer, pack, to_buffer, unpack, PixelBuffer};
pub use radius::{map_intensity_to_radius, RadiusMap, DEFAULT_MAX_RADIUS, DEFAULT_SCALE};

/// Blur a image.
///
/// Runs a horizontal then a vertical pass of the `variant` kernel over a copy
/// of `image`; the input is never modified. A radius of zero returns an
/// unchanged copy.
///
/// # Errors
///
/// [`Error::InvalidRadius`] for a negative radius, [`Error::Allocation`] when
/// the kernel or the working buffers cannot be allocated. Both are reported
/// before any pixel is touched.
pub fn blur<T: AsRef<[u8]>>(
    image: &Image<T, 4>,
    radius: i32,
    variant: Variant,
) -> Result<Image<Vec<u8>, 4>> {
    run(image, radius, variant, None)
}

/// Like [`blur`], but gives up with [`Error::Cancelled`] once `cancel` is set.
///
/// The flag is checked before every scanline of both passes.
pub fn blur_cancellable<T: AsRef<[u8]>>(
    image: &Image<T, 4>,
    radius: i32,
    variant: Variant,
    cancel: &AtomicBool,
) -> Result<Image<Vec<u8>, 4>> {
    run(image, radius, variant, Some(cancel))
}

/// Blur a packed buffer, returning a new one of the same size.
pub fn blur_buffer(buffer: &PixelBuffer, radius: usize, variant: Variant) -> Result<PixelBuffer> {
    let kernel = build_kernel(radius, variant)?;
    let mut scratch = PixelBuffer::zeroed(buffer.width(), buffer.height())?;
    let mut out = PixelBuffer::zeroed(buffer.width(), buffer.height())?;
    two_pass(buffer, &mut scratch, &mut out, &kernel, None)?;
    Ok(out)
}

fn run<T: AsRef<[u8]>>(
    image: &Image<T, 4>,
    radius: i32,
    variant: Variant,
    cancel: Option<&AtomicBool>,
) -> Result<Image<Vec<u8>, 4>> {
    let radius = usize::try_from(radius).map_err(|_| Error::InvalidRadius(radius))?;
    let (width, height) = (image.width(), image.height());
    log::debug!("blurring {width}x{height} image, {variant} radius {radius}");

    if radius == 0 {
        let src = image.buffer().as_ref();
        let mut copy = Vec::new();
        copy.try_reserve_exact(src.len())?;
        copy.extend_from_slice(src);
        return Ok(Image::build(width, height).buf(copy));
    }

    // every allocation happens up front, so failure leaves nothing half done
    let kernel = build_kernel(radius, variant)?;
    let src = PixelBuffer::from_image(image)?;
    let mut scratch = PixelBuffer::zeroed(src.width(), src.height())?;
    let mut out = PixelBuffer::zeroed(src.width(), src.height())?;
    let mut bytes = Vec::new();
    bytes.try_reserve_exact(src.pixels().len() * 4)?;

    two_pass(&src, &mut scratch, &mut out, &kernel, cancel)?;
    drop((src, scratch));
    out.into_image_in(bytes)
}

/// Horizontal pass into `scratch`, then vertical pass into `out`.
fn two_pass(
    src: &PixelBuffer,
    scratch: &mut PixelBuffer,
    out: &mut PixelBuffer,
    kernel: &Kernel,
    cancel: Option<&AtomicBool>,
) -> Result<()> {
    convolve::convolve_into(src, scratch, kernel, Axis::Horizontal, cancel)?;
    convolve::convolve_into(scratch, out, kernel, Axis::Vertical, cancel)
}
