pub mod builder;

use std::fs;
use std::path::Path;

use image::GrayImage;
use pdi_common::{utils, BatchReport, SkipReason};
use tracing::{error, info, warn};

use crate::{
    error::{MaskError, Result},
    traits::ImagePreprocessor,
};

/// Converts annotation masks into strict black/white masks.
///
/// Every mask is passed through the configured preprocessors in order; the
/// default binarizer holds a single threshold at 0.
pub struct MaskBinarizer {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
}

impl MaskBinarizer {
    /// Create a new binarizer builder
    pub fn builder() -> builder::BinarizerBuilder {
        builder::BinarizerBuilder::new()
    }

    /// Create a binarizer with the given preprocessors
    pub fn new(preprocessors: Vec<Box<dyn ImagePreprocessor>>) -> Self {
        Self { preprocessors }
    }

    /// Binarizer thresholding at `threshold` (pixel > threshold → 255)
    pub fn with_threshold(threshold: u8) -> Self {
        builder::BinarizerBuilder::build_simple(threshold)
    }

    /// Run one mask through every preprocessor
    pub fn binarize_image(&self, image: &GrayImage) -> Result<GrayImage> {
        let mut processed = image.clone();
        for preprocessor in &self.preprocessors {
            processed = preprocessor.preprocess(&processed)?;
        }
        Ok(processed)
    }

    /// Binarize every PNG mask directly inside `input_dir`, writing each
    /// result under the same file name in `output_dir`.
    ///
    /// Unreadable masks and failed writes are recorded as skipped and the run
    /// continues. A missing or empty input directory yields an empty report.
    pub fn binarize_directory<P, Q>(&self, input_dir: P, output_dir: Q) -> Result<BatchReport>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.as_ref();
        let mut report = BatchReport::new();

        fs::create_dir_all(output_dir).map_err(|source| MaskError::OutputDirectory {
            path: output_dir.to_path_buf(),
            source,
        })?;

        let masks = if input_dir.is_dir() {
            utils::list_files(input_dir, Some(utils::PNG_EXTENSIONS))?
        } else {
            Vec::new()
        };

        if masks.is_empty() {
            error!("No masks found in '{}'", input_dir.display());
            return Ok(report);
        }
        info!("Found {} masks to binarize", masks.len());

        for mask_path in masks {
            let Some(file_name) = mask_path.file_name() else {
                continue;
            };

            let mask = match image::open(&mask_path) {
                Ok(img) => img.to_luma8(),
                Err(e) => {
                    warn!("Failed to read mask {}: {}", mask_path.display(), e);
                    report.record_skipped(&mask_path, SkipReason::Unreadable(e.to_string()));
                    continue;
                }
            };

            let binary = match self.binarize_image(&mask) {
                Ok(binary) => binary,
                Err(e) => {
                    warn!("Failed to binarize {}: {}", mask_path.display(), e);
                    report.record_skipped(&mask_path, SkipReason::TransformFailed(e.to_string()));
                    continue;
                }
            };

            let output_path = output_dir.join(file_name);
            match binary.save(&output_path) {
                Ok(()) => report.record_written(&mask_path, output_path),
                Err(e) => {
                    warn!("Failed to write {}: {}", output_path.display(), e);
                    report.record_skipped(&mask_path, SkipReason::WriteFailed(e.to_string()));
                }
            }
        }

        info!(
            "Binarization finished ({}), masks saved in '{}'",
            report.summary(),
            output_dir.display()
        );
        Ok(report)
    }

    /// Get information about the binarizer configuration
    pub fn info(&self) -> String {
        format!("MaskBinarizer: {} preprocessors", self.preprocessors.len())
    }
}

impl Default for MaskBinarizer {
    fn default() -> Self {
        Self::builder().build()
    }
}
