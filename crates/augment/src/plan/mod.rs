pub mod builder;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, IntoStaticStr, VariantNames};

use crate::{
    error::{AugmentError, Result},
    traits::{Augmentation, BoxFilterTransform, GammaTransform, LogTransform},
    transforms::{DEFAULT_GAMMA, DEFAULT_KERNEL_SIZE},
};

fn default_gamma() -> f64 {
    DEFAULT_GAMMA
}

fn default_kernel_size() -> u32 {
    DEFAULT_KERNEL_SIZE
}

/// Built-in transforms that can be named in a configuration file
#[derive(
    Debug, Clone,
    Serialize, Deserialize, JsonSchema,
    Display, VariantNames, IntoStaticStr,
    PartialEq
)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransformKind {
    /// Logarithmic stretch to the full 8-bit range
    Log,
    /// Gamma correction; values below 1 brighten, above 1 darken
    Gamma {
        #[serde(default = "default_gamma")]
        #[schemars(range(min = 0.01, max = 10.0))]
        gamma: f64,
    },
    /// Mean filter over an odd-sized square window
    BoxFilter {
        #[serde(default = "default_kernel_size")]
        #[schemars(range(min = 1, max = 99))]
        kernel_size: u32,
    },
}

impl TransformKind {
    /// Get a list of all available transform names
    pub fn names() -> &'static [&'static str] {
        <Self as VariantNames>::VARIANTS
    }

    /// Instantiate the transform, validating its parameters
    pub fn build(&self) -> Result<Box<dyn Augmentation>> {
        Ok(match self {
            Self::Log => Box::new(LogTransform),
            Self::Gamma { gamma } => Box::new(GammaTransform::new(*gamma)?),
            Self::BoxFilter { kernel_size } => Box::new(BoxFilterTransform::new(*kernel_size)?),
        })
    }
}

/// A transform together with the file-name suffix of its outputs
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TransformSpec {
    pub suffix: String,
    pub transform: TransformKind,
}

impl TransformSpec {
    pub fn new(suffix: impl Into<String>, transform: TransformKind) -> Self {
        Self { suffix: suffix.into(), transform }
    }

    /// The transforms applied when nothing else is configured
    pub fn standard() -> Vec<Self> {
        vec![
            Self::new("log", TransformKind::Log),
            Self::new("exp", TransformKind::Gamma { gamma: DEFAULT_GAMMA }),
            Self::new("mean", TransformKind::BoxFilter { kernel_size: DEFAULT_KERNEL_SIZE }),
        ]
    }
}

/// Ordered set of transforms, each keyed by the suffix its outputs carry
pub struct AugmentationPlan {
    steps: Vec<(String, Box<dyn Augmentation>)>,
}

impl AugmentationPlan {
    /// Create a new plan builder
    pub fn builder() -> builder::AugmentationPlanBuilder {
        builder::AugmentationPlanBuilder::new()
    }

    /// Log stretch, gamma 0.8 and 5x5 mean filter, suffixed `log`, `exp`, `mean`
    pub fn standard() -> Self {
        Self::builder()
            .add("log", LogTransform)
            .add("exp", GammaTransform::default())
            .add("mean", BoxFilterTransform::default())
            .build()
    }

    /// Build a plan from configuration entries
    pub fn from_specs(specs: &[TransformSpec]) -> Result<Self> {
        let mut builder = Self::builder();
        for spec in specs {
            validate_suffix(&spec.suffix)?;
            if builder.contains(&spec.suffix) {
                return Err(AugmentError::InvalidParameter(format!(
                    "duplicate suffix '{}'",
                    spec.suffix
                )));
            }
            builder = builder.add_boxed(spec.suffix.clone(), spec.transform.build()?);
        }
        Ok(builder.build())
    }

    pub(crate) fn new(steps: Vec<(String, Box<dyn Augmentation>)>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> impl Iterator<Item = (&str, &dyn Augmentation)> {
        self.steps.iter().map(|(suffix, t)| (suffix.as_str(), t.as_ref()))
    }

    pub fn suffixes(&self) -> Vec<&str> {
        self.steps.iter().map(|(suffix, _)| suffix.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn validate_suffix(suffix: &str) -> Result<()> {
    if suffix.is_empty() || suffix.contains(['/', '\\', '.']) {
        return Err(AugmentError::InvalidParameter(format!(
            "suffix must be a non-empty name without separators or dots, got '{}'",
            suffix
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan() {
        let plan = AugmentationPlan::standard();
        assert_eq!(plan.suffixes(), vec!["log", "exp", "mean"]);
    }

    #[test]
    fn test_from_specs_matches_standard() {
        let plan = AugmentationPlan::from_specs(&TransformSpec::standard()).unwrap();
        assert_eq!(plan.suffixes(), AugmentationPlan::standard().suffixes());
    }

    #[test]
    fn test_from_specs_rejects_bad_entries() {
        let dup = vec![
            TransformSpec::new("a", TransformKind::Log),
            TransformSpec::new("a", TransformKind::Log),
        ];
        assert!(AugmentationPlan::from_specs(&dup).is_err());

        let bad_suffix = vec![TransformSpec::new("../x", TransformKind::Log)];
        assert!(AugmentationPlan::from_specs(&bad_suffix).is_err());

        let bad_kernel = vec![TransformSpec::new("m", TransformKind::BoxFilter { kernel_size: 4 })];
        assert!(matches!(
            AugmentationPlan::from_specs(&bad_kernel),
            Err(AugmentError::InvalidParameter(_))
        ));

        let huge_kernel = vec![TransformSpec::new("m", TransformKind::BoxFilter { kernel_size: 101 })];
        assert!(AugmentationPlan::from_specs(&huge_kernel).is_err());

        let steep_gamma = vec![TransformSpec::new("g", TransformKind::Gamma { gamma: 20.0 })];
        assert!(AugmentationPlan::from_specs(&steep_gamma).is_err());
    }

    #[test]
    fn test_transform_kind_serde() {
        let json = r#"{"type":"gamma","params":{}}"#;
        let kind: TransformKind = serde_json::from_str(json).unwrap();
        assert_eq!(kind, TransformKind::Gamma { gamma: 0.8 });

        let log: TransformKind = serde_json::from_str(r#"{"type":"log"}"#).unwrap();
        assert_eq!(log, TransformKind::Log);

        let out = serde_json::to_value(TransformKind::BoxFilter { kernel_size: 3 }).unwrap();
        assert_eq!(out["type"], "box_filter");
        assert_eq!(out["params"]["kernel_size"], 3);
    }

    #[test]
    fn test_transform_names() {
        assert_eq!(TransformKind::names(), &["log", "gamma", "box_filter"]);
        assert_eq!(TransformKind::Log.to_string(), "log");
    }
}
