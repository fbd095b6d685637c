//! # Dataset Statistics Library
//!
//! Loads a class-organized image dataset into memory and summarizes it:
//! per-class mean prototypes, mean colour histograms and their variance,
//! brightness equalization in HSV, and per-class montages. Summaries render
//! to PNG through [`plot`] and [`montage`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dataset::{mean_histograms, histogram_variances, Dataset};
//!
//! let (dataset, report) = Dataset::load_dir("dataset/train")?;
//! println!("{}", report.summary());
//!
//! for v in histogram_variances(&mean_histograms(&dataset)) {
//!     println!("{}: R {:.3e} G {:.3e} B {:.3e}", v.label, v.variance.r, v.variance.g, v.variance.b);
//! }
//! # Ok::<(), dataset::DatasetError>(())
//! ```

pub mod error;
pub mod loader;
pub mod stats;
pub mod equalize;
pub mod montage;
pub mod plot;

pub use error::{DatasetError, Result};
pub use loader::{ClassImages, Dataset, LoadedImage};
pub use stats::{
    histogram_variance, histogram_variance_for_shape, histogram_variances, mean_histograms, mean_prototypes,
    ChannelVariance, HistogramVariance, MeanHistogram, MeanPrototype,
};
pub use equalize::{equalize_dataset, equalize_hsv};
pub use montage::{build_class_montages, render_montage_sheet, GridShape, MontageConfig, MontagePanel, PanelContent};
