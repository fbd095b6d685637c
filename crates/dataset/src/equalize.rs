//! Histogram equalization on the value channel of HSV.
//!
//! Equalizing R, G and B independently shifts the colour balance; working on
//! V alone redistributes brightness while hue and saturation are kept.

use image::{Rgb, RgbImage};

use crate::loader::Dataset;

/// Number of bins used to build the value-channel distribution
pub const EQUALIZE_BINS: usize = 256;

/// RGB in [0, 1] → (hue, saturation, value), all in [0, 1]
pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max == 0.0 { 0.0 } else { delta / max };
    if delta == 0.0 {
        return (0.0, saturation, max);
    }

    let sector = if r == max {
        (g - b) / delta
    } else if g == max {
        2.0 + (b - r) / delta
    } else {
        4.0 + (r - g) / delta
    };

    ((sector / 6.0).rem_euclid(1.0), saturation, max)
}

/// (hue, saturation, value) in [0, 1] → RGB in [0, 1]
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    let scaled = h * 6.0;
    let sector = scaled.floor();
    let f = scaled - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - f * s);
    let t = v * (1.0 - (1.0 - f) * s);

    match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

/// Equalize a set of floating point samples in place.
///
/// The samples are binned into `bins` equal-width bins spanning their own
/// range, the cumulative distribution is normalized to end at 1, and every
/// sample is replaced by the CDF linearly interpolated at the bin centres.
/// A constant input has no distribution to flatten and is left unchanged.
/// scikit-image's `equalize_hist` instead widens the range by half a unit on
/// each side and maps every sample to 0.5.
pub fn equalize_samples(values: &mut [f64], bins: usize) {
    if values.is_empty() || bins == 0 {
        return;
    }

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        return;
    }
    let width = (hi - lo) / bins as f64;

    let mut cdf = vec![0.0f64; bins];
    for &value in values.iter() {
        let index = (((value - lo) / width) as usize).min(bins - 1);
        cdf[index] += 1.0;
    }
    for i in 1..bins {
        cdf[i] += cdf[i - 1];
    }
    let total = cdf[bins - 1];
    cdf.iter_mut().for_each(|c| *c /= total);

    let centers: Vec<f64> = (0..bins).map(|i| lo + width * (i as f64 + 0.5)).collect();
    for value in values.iter_mut() {
        *value = interpolate(*value, &centers, &cdf);
    }
}

/// Piecewise-linear interpolation of `(xs, ys)` at `x`, clamped to the end
/// values outside `xs`
fn interpolate(x: f64, xs: &[f64], ys: &[f64]) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let upper = xs.partition_point(|&c| c <= x).min(last);
    let lower = upper - 1;
    let span = xs[upper] - xs[lower];
    if span == 0.0 {
        return ys[upper];
    }
    ys[lower] + (ys[upper] - ys[lower]) * (x - xs[lower]) / span
}

/// Equalize the brightness of an RGB image through its HSV value channel
pub fn equalize_hsv(image: &RgbImage) -> RgbImage {
    let hsv: Vec<(f64, f64, f64)> = image
        .pixels()
        .map(|p| rgb_to_hsv(p[0] as f64 / 255.0, p[1] as f64 / 255.0, p[2] as f64 / 255.0))
        .collect();
    if hsv.is_empty() {
        return image.clone();
    }

    let mut values: Vec<f64> = hsv.iter().map(|&(_, _, v)| v).collect();
    equalize_samples(&mut values, EQUALIZE_BINS);

    let mut equalized = RgbImage::new(image.width(), image.height());
    for ((pixel, &(h, s, _)), v) in equalized.pixels_mut().zip(hsv.iter()).zip(values) {
        let (r, g, b) = hsv_to_rgb(h, s, v);
        *pixel = Rgb([to_u8(r), to_u8(g), to_u8(b)]);
    }
    equalized
}

/// Equalize every image of the dataset
pub fn equalize_dataset(dataset: &Dataset) -> Dataset {
    dataset.map_images(equalize_hsv)
}

// Scales to 8 bits and truncates
fn to_u8(value: f64) -> u8 {
    (value * 255.0).clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ClassImages, LoadedImage};

    #[test]
    fn test_hsv_round_trip() {
        for &(r, g, b) in &[(1.0, 0.0, 0.0), (0.2, 0.6, 0.4), (0.5, 0.5, 0.5), (0.1, 0.2, 0.9), (0.0, 0.0, 0.0)] {
            let (h, s, v) = rgb_to_hsv(r, g, b);
            let (r2, g2, b2) = hsv_to_rgb(h, s, v);
            assert!((r - r2).abs() < 1e-9 && (g - g2).abs() < 1e-9 && (b - b2).abs() < 1e-9);
        }
    }

    #[test]
    fn test_known_hues() {
        assert_eq!(rgb_to_hsv(1.0, 0.0, 0.0).0, 0.0);
        assert!((rgb_to_hsv(0.0, 1.0, 0.0).0 - 1.0 / 3.0).abs() < 1e-12);
        assert!((rgb_to_hsv(0.0, 0.0, 1.0).0 - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(rgb_to_hsv(0.4, 0.4, 0.4), (0.0, 0.0, 0.4));
    }

    #[test]
    fn test_equalize_samples_spreads_values() {
        let mut values = vec![0.40, 0.41, 0.42, 0.43];
        equalize_samples(&mut values, 256);
        assert!(values.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(values[3], 1.0);
        assert!((values[0] - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_equalize_constant_samples() {
        let mut values = vec![0.3; 5];
        equalize_samples(&mut values, 256);
        assert!(values.iter().all(|&v| v == 0.3));
    }

    #[test]
    fn test_low_contrast_image_is_stretched() {
        let image = RgbImage::from_fn(10, 10, |x, y| {
            let v = 100 + ((x + y) % 11) as u8;
            Rgb([v, v, v])
        });
        let equalized = equalize_hsv(&image);
        let max = equalized.pixels().map(|p| p[0]).max().unwrap();
        let min = equalized.pixels().map(|p| p[0]).min().unwrap();
        assert_eq!(max, 255);
        assert!(max - min > 10);
        // grey stays grey
        assert!(equalized.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn test_hue_order_is_preserved() {
        let hues = [0.02, 0.15, 0.35, 0.55, 0.75, 0.9];
        let brightness = [0.3, 0.9, 0.5, 0.2, 0.7, 0.4];
        let image = RgbImage::from_fn(hues.len() as u32, 1, |x, _| {
            let (r, g, b) = hsv_to_rgb(hues[x as usize], 1.0, brightness[x as usize]);
            Rgb([to_u8(r), to_u8(g), to_u8(b)])
        });

        let equalized = equalize_hsv(&image);
        let hue_of = |p: &Rgb<u8>| rgb_to_hsv(p[0] as f64 / 255.0, p[1] as f64 / 255.0, p[2] as f64 / 255.0).0;
        let before: Vec<f64> = image.pixels().map(hue_of).collect();
        let after: Vec<f64> = equalized.pixels().map(hue_of).collect();

        for i in 0..hues.len() {
            for j in 0..hues.len() {
                if before[i] < before[j] {
                    assert!(after[i] < after[j], "hue order changed for pixels {} and {}", i, j);
                }
            }
            assert!((before[i] - after[i]).abs() < 0.02);
        }
    }

    #[test]
    fn test_equalize_dataset_keeps_shape() {
        let dataset = Dataset::new(vec![ClassImages {
            label: "c".into(),
            images: vec![LoadedImage { path: "c/0.png".into(), image: RgbImage::new(3, 2) }],
        }]);
        let equalized = equalize_dataset(&dataset);
        assert_eq!(equalized.labels(), vec!["c"]);
        assert_eq!(equalized.classes()[0].images[0].image.dimensions(), (3, 2));
    }
}
