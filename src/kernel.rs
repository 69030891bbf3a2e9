//! Box and Gaussian convolution kernels.

use std::{fmt, ops::Range, str::FromStr};

use crate::error::{try_zeroed, Error, Result};

/// Smallest sigma used for the Gaussian curve, so that tiny radii never
/// divide by zero.
const MIN_SIGMA: f64 = 1e-3;

/// Shape of the blur kernel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Equal weights over the whole support.
    Box,
    /// Bell curve with `sigma = radius / 3`.
    #[default]
    Gaussian,
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Variant::Box => "box",
            Variant::Gaussian => "gaussian",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blur variant {0:?}, expected \"box\" or \"gaussian\"")]
pub struct ParseVariantError(String);

impl FromStr for Variant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "box" => Ok(Variant::Box),
            "gaussian" | "gauss" => Ok(Variant::Gaussian),
            _ => Err(ParseVariantError(s.to_owned())),
        }
    }
}

/// Normalized, symmetric 1-D convolution weights.
///
/// Holds `2 * radius + 1` weights summing to one, mirrored around the
/// centre index `radius`.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    weights: Box<[f32]>,
    /// `cumulative[k]` is the sum of the first `k` weights.
    cumulative: Box<[f64]>,
}

impl Kernel {
    #[inline]
    pub fn radius(&self) -> usize {
        self.weights.len() / 2
    }

    #[inline]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Never true; a kernel has at least its centre tap.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Total weight of the taps in `taps`.
    #[inline]
    pub(crate) fn span(&self, taps: Range<usize>) -> f64 {
        self.cumulative[taps.end] - self.cumulative[taps.start]
    }
}

/// Builds the kernel for `radius` pixels on either side of the centre.
///
/// # Errors
///
/// [`Error::RadiusTooLarge`] when `2 * radius + 1` taps cannot be counted,
/// [`Error::Allocation`] when they cannot be stored.
pub fn build_kernel(radius: usize, variant: Variant) -> Result<Kernel> {
    let size = radius
        .checked_mul(2)
        .and_then(|n| n.checked_add(2))
        .ok_or(Error::RadiusTooLarge(radius))?
        - 1;
    let mut weights = try_zeroed::<f32>(size)?;
    let mut cumulative = try_zeroed::<f64>(size + 1)?;

    let sigma = (radius as f64 / 3.0).max(MIN_SIGMA);
    let denom = 2.0 * sigma * sigma;
    let raw = |i: usize| match variant {
        Variant::Box => 1.0,
        Variant::Gaussian => {
            let d = i as f64 - radius as f64;
            (-(d * d) / denom).exp()
        }
    };
    let sum: f64 = (0..size).map(raw).sum();
    for (i, w) in weights.iter_mut().enumerate() {
        *w = (raw(i) / sum) as f32;
    }
    for (i, &w) in weights.iter().enumerate() {
        cumulative[i + 1] = cumulative[i] + f64::from(w);
    }

    log::trace!("built {variant} kernel of radius {radius}");
    Ok(Kernel {
        weights: weights.into_boxed_slice(),
        cumulative: cumulative.into_boxed_slice(),
    })
}
