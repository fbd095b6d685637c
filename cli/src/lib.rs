use std::fs;
use std::path::{Path, PathBuf};

use augment::TransformSpec;
use dataset::MontageConfig;
use pdi_common::ClassRegistry;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Convert segmentation masks into strict black-and-white masks
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BinarizeSection {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Pixels strictly above this value become white
    #[serde(default)]
    pub threshold: u8,
}

/// Write transformed copies of every class image
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AugmentSection {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Class folders to process; every subdirectory when empty
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default = "TransformSpec::standard")]
    pub transforms: Vec<TransformSpec>,
}

fn default_true() -> bool {
    true
}

/// Per-class statistics and their plots
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct StatisticsSection {
    pub dataset_dir: PathBuf,
    /// Directory receiving the plots and the variance table
    pub output_dir: PathBuf,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Also equalize the dataset and compare
    #[serde(default = "default_true")]
    pub equalize: bool,
}

/// Sample montage of every class
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MontageSection {
    pub dataset_dir: PathBuf,
    /// PNG file receiving the montage sheet
    pub output: PathBuf,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub layout: MontageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MetadataSection {
    pub path: PathBuf,
}

/// Every stage of a dataset preparation run. Absent sections are skipped;
/// present ones run in declaration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct PipelineConfig {
    pub metadata: Option<MetadataSection>,
    pub binarize: Option<BinarizeSection>,
    pub augment: Option<AugmentSection>,
    pub statistics: Option<StatisticsSection>,
    pub montage: Option<MontageSection>,
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from a JSON string
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(ConfigError::UnsupportedFileFormat),
        }
    }

    /// Save configuration to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    /// Save configuration to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// JSON schema of the configuration file
    pub fn schema_json() -> Result<String, ConfigError> {
        let schema = schemars::schema_for!(PipelineConfig);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    /// Number of configured sections
    pub fn section_count(&self) -> usize {
        [
            self.metadata.is_some(),
            self.binarize.is_some(),
            self.augment.is_some(),
            self.statistics.is_some(),
            self.montage.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }
}

/// The named classes under `root`, or every subdirectory when `classes` is
/// empty
pub fn class_registry(root: &Path, classes: &[String]) -> pdi_common::Result<ClassRegistry> {
    if classes.is_empty() {
        ClassRegistry::discover(root)
    } else {
        ClassRegistry::from_labels(root, classes.iter().cloned())
    }
}
