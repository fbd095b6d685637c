use image::GrayImage;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{error::Result, traits::ImagePreprocessor};

/// Global binary threshold: pixels strictly above `threshold` become 255,
/// everything else becomes 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl Default for ThresholdPreprocessor {
    /// Any labelled (non-zero) pixel counts as foreground
    fn default() -> Self {
        Self { threshold: 0 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        Ok(imageproc::contrast::threshold(image, self.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_threshold_at_zero_is_binary() {
        let image = GrayImage::from_fn(3, 1, |x, _| Luma([[0u8, 50, 200][x as usize]]));
        let binary = ThresholdPreprocessor::default().preprocess(&image).unwrap();
        assert_eq!(binary.into_raw(), vec![0, 255, 255]);
    }

    #[test]
    fn test_threshold_is_strict() {
        let image = GrayImage::from_fn(3, 1, |x, _| Luma([[127u8, 128, 129][x as usize]]));
        let binary = ThresholdPreprocessor { threshold: 128 }.preprocess(&image).unwrap();
        assert_eq!(binary.into_raw(), vec![0, 0, 255]);
    }
}
