//! Pixel transforms used to augment the dataset.
//!
//! All transforms work on any 8-bit image buffer (luma, RGB, RGBA), treat
//! every channel independently and return a new image of the same shape.

use image::{imageops, GrayImage, ImageBuffer, Luma, Pixel};

use crate::error::{AugmentError, Result};

/// Default exponent of the gamma correction (brightens)
pub const DEFAULT_GAMMA: f64 = 0.8;

/// Default side of the averaging window
pub const DEFAULT_KERNEL_SIZE: u32 = 5;

/// Accepted gamma exponents, inclusive
pub const GAMMA_RANGE: (f64, f64) = (0.01, 10.0);

/// Largest accepted averaging window
pub const MAX_KERNEL_SIZE: u32 = 99;

type Image8<P> = ImageBuffer<P, Vec<u8>>;

/// Logarithmic stretch: `c * ln(1 + x)` with `c = 255 / ln(1 + max)`.
///
/// Results are truncated to 8 bits, not rounded. A fully black image has no
/// dynamic range to stretch and is returned unchanged.
pub fn log_stretch<P>(image: &Image8<P>) -> Image8<P>
where
    P: Pixel<Subpixel = u8>,
{
    let max = image.as_raw().iter().copied().max().unwrap_or(0);
    if max == 0 {
        return image.clone();
    }

    let c = 255.0 / (1.0 + max as f64).ln();
    let lut: [u8; 256] = std::array::from_fn(|v| truncate_u8(c * (1.0 + v as f64).ln()));
    apply_lut(image, &lut)
}

/// Gamma correction on the normalized intensity: `255 * (x / 255)^gamma`.
///
/// `gamma < 1` brightens, `gamma > 1` darkens, `gamma == 1` is the identity.
pub fn gamma_correct<P>(image: &Image8<P>, gamma: f64) -> Result<Image8<P>>
where
    P: Pixel<Subpixel = u8>,
{
    validate_gamma(gamma)?;
    let lut: [u8; 256] = std::array::from_fn(|v| to_u8((v as f64 / 255.0).powf(gamma) * 255.0));
    Ok(apply_lut(image, &lut))
}

/// Mean filter with a normalized `kernel_size x kernel_size` window, applied
/// per channel. Borders are mirrored without repeating the edge pixel
/// (`dcb|abcd|cba`), so a window at the edge averages real neighbours only.
pub fn box_filter<P>(image: &Image8<P>, kernel_size: u32) -> Result<Image8<P>>
where
    P: Pixel<Subpixel = u8>,
{
    validate_kernel_size(kernel_size)?;

    let (width, height) = image.dimensions();
    let mut filtered = image.clone();
    if width == 0 || height == 0 {
        return Ok(filtered);
    }

    let radius = kernel_size / 2;
    for channel in 0..P::CHANNEL_COUNT as usize {
        let padded = GrayImage::from_fn(width + 2 * radius, height + 2 * radius, |x, y| {
            let source_x = reflect_101(x as i64 - radius as i64, width);
            let source_y = reflect_101(y as i64 - radius as i64, height);
            Luma([image.get_pixel(source_x, source_y).channels()[channel]])
        });
        let smoothed = imageproc::filter::box_filter(&padded, radius, radius);
        let smoothed = imageops::crop_imm(&smoothed, radius, radius, width, height).to_image();

        for (x, y, pixel) in filtered.enumerate_pixels_mut() {
            pixel.channels_mut()[channel] = smoothed.get_pixel(x, y)[0];
        }
    }

    Ok(filtered)
}

// Mirror an out-of-range index back into 0..len, edge pixel excluded
fn reflect_101(index: i64, len: u32) -> u32 {
    if len == 1 {
        return 0;
    }
    let last = len as i64 - 1;
    let folded = index.rem_euclid(2 * last);
    (if folded > last { 2 * last - folded } else { folded }) as u32
}

pub(crate) fn validate_gamma(gamma: f64) -> Result<()> {
    let (min, max) = GAMMA_RANGE;
    if !gamma.is_finite() || gamma < min || gamma > max {
        return Err(AugmentError::InvalidParameter(format!(
            "gamma must be between {} and {}, got {}",
            min, max, gamma
        )));
    }
    Ok(())
}

pub(crate) fn validate_kernel_size(kernel_size: u32) -> Result<()> {
    if kernel_size == 0 || kernel_size % 2 == 0 || kernel_size > MAX_KERNEL_SIZE {
        return Err(AugmentError::InvalidParameter(format!(
            "kernel size must be odd and between 1 and {}, got {}",
            MAX_KERNEL_SIZE, kernel_size
        )));
    }
    Ok(())
}

fn apply_lut<P>(image: &Image8<P>, lut: &[u8; 256]) -> Image8<P>
where
    P: Pixel<Subpixel = u8>,
{
    let mut mapped = image.clone();
    for pixel in mapped.pixels_mut() {
        for value in pixel.channels_mut() {
            *value = lut[*value as usize];
        }
    }
    mapped
}

fn to_u8(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

// Float error can land an exact integer such as the maximum just below it
fn truncate_u8(value: f64) -> u8 {
    (value + 1e-9).clamp(0.0, 255.0) as u8
}
