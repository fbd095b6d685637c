//! # Dataset Augmentation Library
//!
//! Pixel transforms (logarithmic stretch, gamma correction, mean filter) and
//! an orchestrator that applies a caller-supplied set of them to every image
//! of a class-organized dataset.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use augment::{augment_dataset, AugmentationPlan};
//! use pdi_common::ClassRegistry;
//!
//! let registry = ClassRegistry::from_labels("dataset/train", ["healthy", "blight"])?;
//! let report = augment_dataset(&registry, "dataset/augmented", &AugmentationPlan::standard())?;
//! println!("{}", report.summary());
//! # Ok::<(), augment::AugmentError>(())
//! ```
//!
//! ## Custom Plan
//!
//! ```rust,no_run
//! use augment::{AugmentationPlan, GammaTransform, BoxFilterTransform};
//!
//! let plan = AugmentationPlan::builder()
//!     .add("dark", GammaTransform::new(1.5)?)
//!     .add("blur", BoxFilterTransform::new(3)?)
//!     .build();
//! # Ok::<(), augment::AugmentError>(())
//! ```

pub mod error;
pub mod traits;
pub mod transforms;
pub mod plan;
pub mod orchestrator;

pub use error::{AugmentError, Result};
pub use traits::*;
pub use plan::{AugmentationPlan, TransformKind, TransformSpec, builder::AugmentationPlanBuilder};
pub use orchestrator::{augment_class_map, augment_dataset};
