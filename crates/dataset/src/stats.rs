//! Per-class summaries: mean prototypes, mean colour histograms and the
//! variance of those histograms.

use pdi_common::{BatchReport, SkipReason};
use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use tracing::{debug, warn};

use crate::{
    error::{DatasetError, Result},
    loader::Dataset,
};

/// Number of intensity bins of an 8-bit channel
pub const BINS: usize = 256;

const CHANNEL_NAMES: [&str; 3] = ["R", "G", "B"];

/// Per-pixel average of a class, one plane per channel (R, G, B), row-major
#[derive(Debug, Clone, PartialEq)]
pub struct MeanPrototype {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub channels: [Vec<f64>; 3],
}

impl MeanPrototype {
    /// Average intensity of `channel` at (x, y)
    pub fn value(&self, channel: usize, x: u32, y: u32) -> f64 {
        self.channels[channel][(y * self.width + x) as usize]
    }
}

/// Compute the mean image of every class with at least one image.
///
/// The first image fixes the size of its class. Images of any other size are
/// left out of the mean and recorded as skipped in the returned report.
pub fn mean_prototypes(dataset: &Dataset) -> (Vec<MeanPrototype>, BatchReport) {
    let mut prototypes = Vec::new();
    let mut report = BatchReport::new();

    for class in dataset.classes() {
        let Some(first) = class.first() else {
            continue;
        };
        let (width, height) = first.dimensions();
        let plane_len = (width as usize) * (height as usize);
        let mut sums: [Vec<f64>; 3] = std::array::from_fn(|_| vec![0.0; plane_len]);

        let mut used = 0usize;
        for item in &class.images {
            let found = item.image.dimensions();
            if found != (width, height) {
                warn!(
                    "Leaving {} out of the '{}' prototype: {}x{}, expected {}x{}",
                    item.path.display(),
                    class.label,
                    found.0,
                    found.1,
                    width,
                    height
                );
                report.record_skipped(
                    &item.path,
                    SkipReason::DimensionMismatch { expected: (width, height), found },
                );
                continue;
            }
            for (i, pixel) in item.image.pixels().enumerate() {
                for (c, sum) in sums.iter_mut().enumerate() {
                    sum[i] += pixel[c] as f64;
                }
            }
            used += 1;
        }

        let count = used as f64;
        for plane in sums.iter_mut() {
            plane.iter_mut().for_each(|v| *v /= count);
        }

        debug!("Mean prototype for '{}' from {} images", class.label, used);
        prototypes.push(MeanPrototype {
            label: class.label.clone(),
            width,
            height,
            channels: sums,
        });
    }

    (prototypes, report)
}

/// Average 256-bin histogram of a class, per channel
#[derive(Debug, Clone, PartialEq)]
pub struct MeanHistogram {
    pub label: String,
    /// `bins[i][c]`: mean count of intensity `i` in channel `c`
    pub bins: Vec<[f64; 3]>,
    /// Mean number of pixels per image of the class
    pub pixels_per_image: f64,
}

impl MeanHistogram {
    /// The 256 mean counts of one channel
    pub fn channel(&self, channel: usize) -> Vec<f64> {
        self.bins.iter().map(|bin| bin[channel]).collect()
    }

    /// Largest mean count over all channels
    pub fn max_count(&self) -> f64 {
        self.bins
            .iter()
            .flat_map(|bin| bin.iter().copied())
            .fold(0.0, f64::max)
    }
}

/// Compute the mean histogram of every class with at least one image. Bins
/// cover the full 8-bit domain, one bin per intensity.
pub fn mean_histograms(dataset: &Dataset) -> Vec<MeanHistogram> {
    let mut histograms = Vec::new();

    for class in dataset.classes() {
        if class.is_empty() {
            continue;
        }

        let mut bins = vec![[0.0f64; 3]; BINS];
        let mut pixels = 0.0;
        for item in &class.images {
            let histogram = imageproc::stats::histogram(&item.image);
            for (c, channel) in histogram.channels.iter().enumerate().take(3) {
                for (bin, count) in channel.iter().enumerate() {
                    bins[bin][c] += *count as f64;
                }
            }
            pixels += item.image.width() as f64 * item.image.height() as f64;
        }

        let count = class.len() as f64;
        for bin in bins.iter_mut() {
            for value in bin.iter_mut() {
                *value /= count;
            }
        }

        histograms.push(MeanHistogram {
            label: class.label.clone(),
            bins,
            pixels_per_image: pixels / count,
        });
    }

    histograms
}

/// Variance of a normalized mean histogram, per channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ChannelVariance {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl ChannelVariance {
    pub fn get(&self, channel: usize) -> Option<f64> {
        match channel {
            0 => Some(self.r),
            1 => Some(self.g),
            2 => Some(self.b),
            _ => None,
        }
    }

    /// (channel name, value) pairs in R, G, B order
    pub fn named(&self) -> [(&'static str, f64); 3] {
        [
            (CHANNEL_NAMES[0], self.r),
            (CHANNEL_NAMES[1], self.g),
            (CHANNEL_NAMES[2], self.b),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HistogramVariance {
    pub label: String,
    pub variance: ChannelVariance,
}

/// Normalize the histogram by the class's pixel count per image and take the
/// population variance of the 256 bins of each channel. A peaked
/// distribution gives a high value, a flat one a low value.
pub fn histogram_variance(histogram: &MeanHistogram) -> HistogramVariance {
    variance_with_pixel_count(histogram, histogram.pixels_per_image)
}

/// Like [`histogram_variance`], normalizing by an explicit (height, width)
pub fn histogram_variance_for_shape(histogram: &MeanHistogram, shape: (u32, u32)) -> Result<HistogramVariance> {
    let pixels = shape.0 as f64 * shape.1 as f64;
    if pixels == 0.0 {
        return Err(DatasetError::InvalidParameter(format!(
            "image shape {:?} has no pixels",
            shape
        )));
    }
    Ok(variance_with_pixel_count(histogram, pixels))
}

/// [`histogram_variance`] for every class
pub fn histogram_variances(histograms: &[MeanHistogram]) -> Vec<HistogramVariance> {
    histograms.iter().map(histogram_variance).collect()
}

fn variance_with_pixel_count(histogram: &MeanHistogram, pixels: f64) -> HistogramVariance {
    let per_channel: [f64; 3] = std::array::from_fn(|c| {
        let normalized: Vec<f64> = histogram
            .bins
            .iter()
            .map(|bin| if pixels > 0.0 { bin[c] / pixels } else { 0.0 })
            .collect();
        population_variance(&normalized)
    });

    HistogramVariance {
        label: histogram.label.clone(),
        variance: ChannelVariance {
            r: per_channel[0],
            g: per_channel[1],
            b: per_channel[2],
        },
    }
}

fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{ClassImages, LoadedImage};
    use image::{Rgb, RgbImage};

    fn class(label: &str, images: Vec<RgbImage>) -> ClassImages {
        ClassImages {
            label: label.to_string(),
            images: images
                .into_iter()
                .enumerate()
                .map(|(i, image)| LoadedImage { path: format!("{}/{}.png", label, i).into(), image })
                .collect(),
        }
    }

    fn patterned(seed: u32) -> RgbImage {
        RgbImage::from_fn(5, 4, |x, y| {
            let v = (x * 37 + y * 11 + seed * 53) % 256;
            Rgb([v as u8, (255 - v) as u8, ((v * 3) % 256) as u8])
        })
    }

    #[test]
    fn test_mean_prototype_is_pixel_mean() {
        let images = vec![patterned(0), patterned(1), patterned(7)];
        let dataset = Dataset::new(vec![class("c", images.clone()), class("none", vec![])]);

        let (prototypes, report) = mean_prototypes(&dataset);
        assert!(report.is_clean());
        assert_eq!(prototypes.len(), 1);
        let proto = &prototypes[0];
        assert_eq!((proto.width, proto.height), (5, 4));

        for y in 0..4 {
            for x in 0..5 {
                for c in 0..3 {
                    let expected = images.iter().map(|img| img.get_pixel(x, y)[c] as f64).sum::<f64>() / 3.0;
                    assert!((proto.value(c, x, y) - expected).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_mean_prototype_skips_mismatched_sizes() {
        let dataset = Dataset::new(vec![
            class(
                "c",
                vec![
                    RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])),
                    RgbImage::new(2, 3),
                    RgbImage::from_pixel(4, 4, Rgb([30, 40, 50])),
                ],
            ),
            class("d", vec![RgbImage::from_pixel(1, 1, Rgb([7, 7, 7]))]),
        ]);
        let (prototypes, report) = mean_prototypes(&dataset);

        assert_eq!(prototypes.len(), 2);
        // the 2x3 image takes no part in the mean
        assert_eq!(prototypes[0].value(0, 3, 3), 20.0);
        assert_eq!(prototypes[0].value(2, 0, 0), 40.0);
        assert_eq!(prototypes[1].value(1, 0, 0), 7.0);

        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, std::path::Path::new("c/1.png"));
        assert_eq!(
            skipped[0].1,
            &SkipReason::DimensionMismatch { expected: (4, 4), found: (2, 3) }
        );
    }

    #[test]
    fn test_mean_histogram_bins_sum_to_pixel_count() {
        let dataset = Dataset::new(vec![class("c", vec![patterned(2), patterned(3)])]);
        let histograms = mean_histograms(&dataset);
        let hist = &histograms[0];

        assert_eq!(hist.bins.len(), BINS);
        assert_eq!(hist.pixels_per_image, 20.0);
        for c in 0..3 {
            let total: f64 = hist.channel(c).iter().sum();
            assert!((total - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mean_histogram_counts() {
        let a = RgbImage::from_pixel(2, 2, Rgb([0, 10, 255]));
        let b = RgbImage::from_pixel(2, 2, Rgb([0, 20, 255]));
        let dataset = Dataset::new(vec![class("c", vec![a, b])]);
        let hist = &mean_histograms(&dataset)[0];

        assert_eq!(hist.bins[0][0], 4.0);
        assert_eq!(hist.bins[10][1], 2.0);
        assert_eq!(hist.bins[20][1], 2.0);
        assert_eq!(hist.bins[255][2], 4.0);
        assert_eq!(hist.max_count(), 4.0);
    }

    #[test]
    fn test_variance_peaked_vs_flat() {
        // Constant image: every pixel in one bin
        let peaked = Dataset::new(vec![class("p", vec![RgbImage::from_pixel(16, 16, Rgb([9, 9, 9]))])]);
        // Every intensity exactly once
        let flat = Dataset::new(vec![class(
            "f",
            vec![RgbImage::from_fn(16, 16, |x, y| {
                let v = (y * 16 + x) as u8;
                Rgb([v, v, v])
            })],
        )]);

        let peaked_var = histogram_variance(&mean_histograms(&peaked)[0]);
        let flat_var = histogram_variance(&mean_histograms(&flat)[0]);

        // one bin at 1.0, the rest 0: mean 1/256, var = (1/256)(1 - 1/256)
        let expected = (1.0 / 256.0) * (1.0 - 1.0 / 256.0);
        assert!((peaked_var.variance.r - expected).abs() < 1e-12);
        assert!(flat_var.variance.g.abs() < 1e-12);
        assert!(peaked_var.variance.b > flat_var.variance.b);
    }

    #[test]
    fn test_variance_for_explicit_shape() {
        let dataset = Dataset::new(vec![class("p", vec![RgbImage::from_pixel(4, 4, Rgb([1, 1, 1]))])]);
        let hist = &mean_histograms(&dataset)[0];
        let by_shape = histogram_variance_for_shape(hist, (4, 4)).unwrap();
        assert_eq!(by_shape, histogram_variance(hist));
        assert!(histogram_variance_for_shape(hist, (0, 4)).is_err());
    }

    #[test]
    fn test_channel_variance_accessors() {
        let v = ChannelVariance { r: 1.0, g: 2.0, b: 3.0 };
        assert_eq!(v.get(1), Some(2.0));
        assert_eq!(v.get(3), None);
        assert_eq!(v.named()[2], ("B", 3.0));
    }
}
