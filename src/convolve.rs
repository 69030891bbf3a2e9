//! One-dimensional convolution along a single image axis.
//!
//! Neighbours that fall outside the image are clamped to the nearest border
//! pixel. Every channel, alpha included, is weighted identically, so colours
//! are treated as straight (not premultiplied) alpha.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use umath::FF32;

use crate::{
    error::{Error, Result},
    kernel::Kernel,
    pixel::{pack, unpack, PixelBuffer},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Convolves `buffer` with `kernel` along `axis` into a new buffer.
pub fn convolve_1d(buffer: &PixelBuffer, kernel: &Kernel, axis: Axis) -> Result<PixelBuffer> {
    let mut out = PixelBuffer::zeroed(buffer.width(), buffer.height())?;
    convolve_into(buffer, &mut out, kernel, axis, None)?;
    Ok(out)
}

/// Writes the convolution of `src` into `dst`, one output row per task.
///
/// `cancel` is polled before each row; once it reads `true` the pass stops and
/// [`Error::Cancelled`] is returned, leaving `dst` partially written.
pub(crate) fn convolve_into(
    src: &PixelBuffer,
    dst: &mut PixelBuffer,
    kernel: &Kernel,
    axis: Axis,
    cancel: Option<&AtomicBool>,
) -> Result<()> {
    let (width, height) = (src.width(), src.height());
    debug_assert_eq!((width, height), (dst.width(), dst.height()));
    if src.pixels().is_empty() {
        return Ok(());
    }
    let pixels = src.pixels();

    dst.pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .try_for_each_init(
            || vec![[0.0f64; 4]; width],
            |sums: &mut Vec<[f64; 4]>, (y, row)| {
                if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
                    return Err(Error::Cancelled);
                }
                match axis {
                    Axis::Horizontal => {
                        let line = &pixels[y * width..][..width];
                        for (x, out) in row.iter_mut().enumerate() {
                            let mut sum = [0.0; 4];
                            for (i, w) in taps(kernel, x, width) {
                                accumulate(&mut sum, line[i], w);
                            }
                            *out = finish(sum);
                        }
                    }
                    Axis::Vertical => {
                        // whole source rows at a time, in memory order
                        sums.fill([0.0; 4]);
                        for (j, w) in taps(kernel, y, height) {
                            let line = &pixels[j * width..][..width];
                            for (sum, &px) in sums.iter_mut().zip(line) {
                                accumulate(sum, px, w);
                            }
                        }
                        for (out, &sum) in row.iter_mut().zip(sums.iter()) {
                            *out = finish(sum);
                        }
                    }
                }
                Ok(())
            },
        )
}

/// Taps around `i` as `(source index, weight)` over a line of `len` pixels.
///
/// Tap `k` reads `i + k - radius`. All taps before the line are folded into
/// one tap on its first pixel, all taps past it into one on its last, so at
/// most `len + 2` taps are produced whatever the radius.
fn taps(kernel: &Kernel, i: usize, len: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
    let radius = kernel.radius();
    let first = radius.saturating_sub(i);
    let end = radius.saturating_add(len - i).min(kernel.len());

    let before = (first > 0).then(|| (0, kernel.span(0..first) as f32));
    let after = (end < kernel.len()).then(|| (len - 1, kernel.span(end..kernel.len()) as f32));
    let inside = kernel.weights()[first..end]
        .iter()
        .enumerate()
        .map(move |(k, &w)| (i + first + k - radius, w));
    before.into_iter().chain(inside).chain(after)
}

#[inline]
fn accumulate(sum: &mut [f64; 4], px: u32, w: f32) {
    let px = unpack(px);
    for c in 0..4 {
        // SAFETY: channels are at most 255 and weights lie in [0, 1], so
        // every product is finite.
        sum[c] += f64::from(*(unsafe { FF32::new(f32::from(px[c])) } * w));
    }
}

/// Rounds and saturates each channel, then packs.
#[inline]
fn finish(sum: [f64; 4]) -> u32 {
    pack(sum.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{build_kernel, Variant};

    const BLACK: u32 = 0xFF00_0000;
    const WHITE: u32 = 0xFFFF_FFFF;

    #[test]
    fn horizontal_clamps_edges() {
        let src = PixelBuffer::new(vec![BLACK, WHITE, BLACK], 3, 1).unwrap();
        let k = build_kernel(1, Variant::Box).unwrap();
        let out = convolve_1d(&src, &k, Axis::Horizontal).unwrap();
        let grey = pack([85, 85, 85, 255]);
        assert_eq!(out.pixels(), &[grey, grey, grey]);
        // input untouched
        assert_eq!(src.pixels(), &[BLACK, WHITE, BLACK]);
    }

    #[test]
    fn vertical_only_mixes_columns() {
        // white column on the left, black on the right
        let src = PixelBuffer::new(vec![WHITE, BLACK, WHITE, BLACK, WHITE, BLACK], 2, 3).unwrap();
        let k = build_kernel(2, Variant::Gaussian).unwrap();
        assert_eq!(convolve_1d(&src, &k, Axis::Vertical).unwrap(), src);

        let out = convolve_1d(&src, &k, Axis::Horizontal).unwrap();
        assert_ne!(out, src);
        assert_eq!(out.get(0, 0), out.get(0, 2));
    }

    #[test]
    fn radius_larger_than_image() {
        let src = PixelBuffer::new(vec![BLACK, WHITE], 2, 1).unwrap();
        let k = build_kernel(4, Variant::Box).unwrap();
        let out = convolve_1d(&src, &k, Axis::Horizontal).unwrap();
        // left: 5 black + 4 white taps, right: 4 black + 5 white taps
        assert_eq!(unpack(out.get(0, 0)), [113, 113, 113, 255]);
        assert_eq!(unpack(out.get(1, 0)), [142, 142, 142, 255]);
    }

    #[test]
    fn alpha_is_blurred_like_colour() {
        let clear = pack([0, 0, 0, 0]);
        let src = PixelBuffer::new(vec![clear, WHITE, clear], 3, 1).unwrap();
        let k = build_kernel(1, Variant::Box).unwrap();
        let out = convolve_1d(&src, &k, Axis::Horizontal).unwrap();
        assert_eq!(unpack(out.get(1, 0)), [85, 85, 85, 85]);
    }

    #[test]
    fn border_taps_are_folded() {
        for variant in [Variant::Box, Variant::Gaussian] {
            let k = build_kernel(100_000, variant).unwrap();
            for i in 0..3 {
                let folded: Vec<_> = taps(&k, i, 3).collect();
                assert!(folded.len() <= 5);
                assert!(folded.iter().all(|&(j, _)| j < 3));
                let total: f64 = folded.iter().map(|&(_, w)| f64::from(w)).sum();
                assert!((total - 1.0).abs() < 1e-6, "{variant} i={i}: {total}");
            }
        }
        // small radius in a long line only reads the neighbourhood
        let k = build_kernel(2, Variant::Box).unwrap();
        let got: Vec<_> = taps(&k, 5, 10).map(|(j, _)| j).collect();
        assert_eq!(got, [3, 4, 5, 6, 7]);
        let got: Vec<_> = taps(&k, 0, 10).map(|(j, _)| j).collect();
        assert_eq!(got, [0, 0, 1, 2]);
    }

    #[test]
    fn solid_colour_survives_huge_radius() {
        let colour = pack([255, 255, 255, 255]);
        let src = PixelBuffer::new(vec![colour; 4], 2, 2).unwrap();
        for variant in [Variant::Box, Variant::Gaussian] {
            let k = build_kernel(1_000_000, variant).unwrap();
            let h = convolve_1d(&src, &k, Axis::Horizontal).unwrap();
            assert_eq!(convolve_1d(&h, &k, Axis::Vertical).unwrap(), src, "{variant}");
        }
    }

    #[test]
    fn stops_when_cancelled() {
        let src = PixelBuffer::new(vec![WHITE; 16], 4, 4).unwrap();
        let mut dst = PixelBuffer::zeroed(4, 4).unwrap();
        let flag = AtomicBool::new(true);
        let k = build_kernel(1, Variant::Box).unwrap();
        assert!(matches!(
            convolve_into(&src, &mut dst, &k, Axis::Horizontal, Some(&flag)),
            Err(Error::Cancelled)
        ));
    }
}
