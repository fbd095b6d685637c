//! # Mask Binarization Library
//!
//! Turns annotation masks exported from a labelling tool (where every class
//! is painted with its own grey level) into strict binary masks: background
//! stays 0 and every labelled pixel becomes 255.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mask::MaskBinarizer;
//!
//! let binarizer = MaskBinarizer::default();
//! let report = binarizer.binarize_directory("SegmentationClass", "masks_binary")?;
//! println!("{}", report.summary());
//! # Ok::<(), mask::MaskError>(())
//! ```
//!
//! ## Custom Binarizer
//!
//! ```rust,no_run
//! use mask::{MaskBinarizer, algorithms::*};
//!
//! let binarizer = MaskBinarizer::builder()
//!     .add_preprocessor(ThresholdPreprocessor { threshold: 127 })
//!     .build();
//! ```

pub mod error;
pub mod traits;
pub mod algorithms;
pub mod pipeline;

pub use error::{MaskError, Result};
pub use traits::*;
pub use algorithms::*;
pub use pipeline::{MaskBinarizer, builder::BinarizerBuilder};
