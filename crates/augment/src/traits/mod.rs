use image::RgbImage;

use crate::{
    error::Result,
    transforms::{self, DEFAULT_GAMMA, DEFAULT_KERNEL_SIZE},
};

/// Trait for augmentation transforms: one image in, one new image out
pub trait Augmentation: Send + Sync {
    /// Produce the augmented copy of `image`
    fn apply(&self, image: &RgbImage) -> Result<RgbImage>;
}

/// Any matching closure is an augmentation, so callers can register their
/// own transforms without a dedicated type.
impl<F> Augmentation for F
where
    F: Fn(&RgbImage) -> Result<RgbImage> + Send + Sync,
{
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        self(image)
    }
}

/// Logarithmic stretch
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTransform;

impl Augmentation for LogTransform {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        Ok(transforms::log_stretch(image))
    }
}

/// Gamma (exponential) correction
#[derive(Debug, Clone, Copy)]
pub struct GammaTransform {
    pub gamma: f64,
}

impl GammaTransform {
    pub fn new(gamma: f64) -> Result<Self> {
        transforms::validate_gamma(gamma)?;
        Ok(Self { gamma })
    }
}

impl Default for GammaTransform {
    fn default() -> Self {
        Self { gamma: DEFAULT_GAMMA }
    }
}

impl Augmentation for GammaTransform {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        transforms::gamma_correct(image, self.gamma)
    }
}

/// Mean (box) filter
#[derive(Debug, Clone, Copy)]
pub struct BoxFilterTransform {
    pub kernel_size: u32,
}

impl BoxFilterTransform {
    pub fn new(kernel_size: u32) -> Result<Self> {
        transforms::validate_kernel_size(kernel_size)?;
        Ok(Self { kernel_size })
    }
}

impl Default for BoxFilterTransform {
    fn default() -> Self {
        Self { kernel_size: DEFAULT_KERNEL_SIZE }
    }
}

impl Augmentation for BoxFilterTransform {
    fn apply(&self, image: &RgbImage) -> Result<RgbImage> {
        transforms::box_filter(image, self.kernel_size)
    }
}
