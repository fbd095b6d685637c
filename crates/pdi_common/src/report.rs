use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Why an input item produced no output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The file could not be opened or decoded as an image
    Unreadable(String),
    /// A class folder named in the registry does not exist
    MissingDirectory,
    /// A transform rejected the image
    TransformFailed(String),
    /// The derived image could not be written
    WriteFailed(String),
    /// The image size differs from the rest of its class
    DimensionMismatch {
        expected: (u32, u32),
        found: (u32, u32),
    },
}

impl SkipReason {
    /// Reason for a class folder whose listing failed
    pub fn listing_failed(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::MissingDirectory,
            _ => Self::Unreadable(format!("cannot list directory: {}", error)),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "unreadable: {}", msg),
            Self::MissingDirectory => write!(f, "directory not found"),
            Self::TransformFailed(msg) => write!(f, "transform failed: {}", msg),
            Self::WriteFailed(msg) => write!(f, "write failed: {}", msg),
            Self::DimensionMismatch { expected, found } => write!(
                f,
                "dimension mismatch: expected {}x{}, found {}x{}",
                expected.0, expected.1, found.0, found.1
            ),
        }
    }
}

/// Outcome of one item of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    /// An output was produced at `output`
    Written { output: PathBuf },
    /// The input was read into memory
    Loaded,
    /// Nothing was produced for this input
    Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ItemOutcome {
    /// Input file or directory the outcome refers to
    pub source: PathBuf,
    #[serde(flatten)]
    pub status: ItemStatus,
}

/// Per-item results of a batch run.
///
/// Lets callers tell "zero failures" from "some failures" without parsing
/// log output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BatchReport {
    pub items: Vec<ItemOutcome>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_written(&mut self, source: impl Into<PathBuf>, output: impl Into<PathBuf>) {
        self.items.push(ItemOutcome {
            source: source.into(),
            status: ItemStatus::Written { output: output.into() },
        });
    }

    pub fn record_loaded(&mut self, source: impl Into<PathBuf>) {
        self.items.push(ItemOutcome {
            source: source.into(),
            status: ItemStatus::Loaded,
        });
    }

    pub fn record_skipped(&mut self, source: impl Into<PathBuf>, reason: SkipReason) {
        self.items.push(ItemOutcome {
            source: source.into(),
            status: ItemStatus::Skipped { reason },
        });
    }

    /// Append all outcomes of another report
    pub fn merge(&mut self, other: BatchReport) {
        self.items.extend(other.items);
    }

    /// Outputs that were produced, in order
    pub fn written(&self) -> impl Iterator<Item = &Path> {
        self.items.iter().filter_map(|item| match &item.status {
            ItemStatus::Written { output } => Some(output.as_path()),
            _ => None,
        })
    }

    /// Skipped inputs with their reasons, in order
    pub fn skipped(&self) -> impl Iterator<Item = (&Path, &SkipReason)> {
        self.items.iter().filter_map(|item| match &item.status {
            ItemStatus::Skipped { reason } => Some((item.source.as_path(), reason)),
            _ => None,
        })
    }

    pub fn written_count(&self) -> usize {
        self.written().count()
    }

    pub fn loaded_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == ItemStatus::Loaded)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped_count() == 0
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        match self.loaded_count() {
            0 => format!("{} written, {} skipped", self.written_count(), self.skipped_count()),
            loaded => format!(
                "{} written, {} loaded, {} skipped",
                self.written_count(),
                loaded,
                self.skipped_count()
            ),
        }
    }

    /// Save the report as pretty JSON
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_clean() {
        let mut report = BatchReport::new();
        assert!(report.is_clean());

        report.record_written("a.png", "out/a.png");
        assert!(report.is_clean());

        report.record_skipped("b.png", SkipReason::Unreadable("bad header".into()));
        assert!(!report.is_clean());
        assert_eq!(report.written_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(report.summary(), "1 written, 1 skipped");

        report.record_loaded("c.png");
        assert_eq!(report.loaded_count(), 1);
        assert_eq!(report.summary(), "1 written, 1 loaded, 1 skipped");

        let (path, reason) = report.skipped().next().unwrap();
        assert_eq!(path, Path::new("b.png"));
        assert_eq!(reason.to_string(), "unreadable: bad header");
    }

    #[test]
    fn test_merge_preserves_order() {
        let mut first = BatchReport::new();
        first.record_written("1", "o1");
        let mut second = BatchReport::new();
        second.record_skipped("2", SkipReason::MissingDirectory);
        second.record_written("3", "o3");

        first.merge(second);
        let sources: Vec<_> = first.items.iter().map(|i| i.source.clone()).collect();
        assert_eq!(sources, vec![PathBuf::from("1"), PathBuf::from("2"), PathBuf::from("3")]);
    }

    #[test]
    fn test_listing_failure_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let missing = fs::read_dir(dir.path().join("gone")).unwrap_err();
        assert_eq!(SkipReason::listing_failed(&missing), SkipReason::MissingDirectory);

        let file = dir.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        let not_dir = fs::read_dir(&file).unwrap_err();
        assert!(matches!(
            SkipReason::listing_failed(&not_dir),
            SkipReason::Unreadable(msg) if msg.starts_with("cannot list directory")
        ));
    }

    #[test]
    fn test_json_shape() {
        let mut report = BatchReport::new();
        report.record_skipped(
            "c.png",
            SkipReason::DimensionMismatch { expected: (4, 4), found: (2, 2) },
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["items"][0]["status"], "skipped");
        assert_eq!(json["items"][0]["reason"]["kind"], "dimension_mismatch");

        let parsed: BatchReport = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, report);
    }
}
