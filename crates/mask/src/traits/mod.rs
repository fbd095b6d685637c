use image::GrayImage;
use crate::error::Result;

/// Trait for mask preprocessing algorithms
pub trait ImagePreprocessor: Send + Sync {
    /// Preprocess the input mask (e.g., threshold, invert)
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}
