//! # PDI Common - Shared Types and Utilities
//!
//! Shared data structures for the dataset tooling crates: the explicit class
//! registry, the per-item batch report and a handful of file helpers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdi_common::{BatchReport, ClassRegistry};
//!
//! // Discover classes once and hand the registry to every stage
//! let registry = ClassRegistry::discover("dataset/train")?;
//! for entry in registry.iter() {
//!     println!("{} -> {}", entry.label, entry.path.display());
//! }
//!
//! let report = BatchReport::default();
//! assert!(report.is_clean());
//! # Ok::<(), pdi_common::PdiError>(())
//! ```

pub mod registry;
pub mod report;

use thiserror::Error;

pub use registry::{ClassEntry, ClassRegistry};
pub use report::{BatchReport, ItemOutcome, ItemStatus, SkipReason};

/// Result type for shared dataset operations
pub type Result<T> = std::result::Result<T, PdiError>;

/// Standard error type for shared dataset operations
#[derive(Error, Debug)]
pub enum PdiError {
    #[error("Dataset root not found: {path}")]
    RootNotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Invalid class label: {label:?}")]
    InvalidLabel { label: String },

    #[error("Duplicate class label: {label}")]
    DuplicateLabel { label: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// File and naming helpers shared by the dataset crates
pub mod utils {
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    /// Extensions accepted when sampling class folders for display
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

    /// Extensions accepted by the mask binarizer and the augmentation run
    pub const PNG_EXTENSIONS: &[&str] = &["png"];

    /// Check whether a path carries one of the given extensions (case-insensitive)
    pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|allowed| ext.eq_ignore_ascii_case(allowed)))
            .unwrap_or(false)
    }

    /// List regular files directly inside `dir`, sorted by file name.
    ///
    /// When `extensions` is `Some`, only files with a matching extension are
    /// returned. The listing is never recursive.
    pub fn list_files(dir: &Path, extensions: Option<&[&str]>) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(exts) = extensions {
                if !has_extension(&path, exts) {
                    continue;
                }
            }
            files.push(path);
        }

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Build the `{stem}_{suffix}{.ext}` file name used for derived images
    pub fn suffixed_file_name(path: &Path, suffix: &str) -> Option<String> {
        let stem = path.file_stem()?.to_str()?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => Some(format!("{}_{}.{}", stem, suffix, ext)),
            None => Some(format!("{}_{}", stem, suffix)),
        }
    }

    /// Turn a folder or key name into a display title: `_` becomes a space
    /// and every word is capitalized.
    pub fn display_title(name: &str) -> String {
        name.replace('_', " ")
            .split(' ')
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Upper-case the first character and lower-case the rest
    pub fn capitalize(word: &str) -> String {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first
                .to_uppercase()
                .chain(chars.flat_map(|c| c.to_lowercase()))
                .collect(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::utils::*;
    use std::path::Path;

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/b.PNG"), PNG_EXTENSIONS));
        assert!(has_extension(Path::new("b.jpeg"), IMAGE_EXTENSIONS));
        assert!(!has_extension(Path::new("b.txt"), IMAGE_EXTENSIONS));
        assert!(!has_extension(Path::new("README"), IMAGE_EXTENSIONS));
    }

    #[test]
    fn test_suffixed_file_name() {
        assert_eq!(
            suffixed_file_name(Path::new("class/img_01.png"), "log").as_deref(),
            Some("img_01_log.png")
        );
        assert_eq!(suffixed_file_name(Path::new("noext"), "exp").as_deref(), Some("noext_exp"));
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title("leaf_blight"), "Leaf Blight");
        assert_eq!(display_title("dataset_info"), "Dataset Info");
        assert_eq!(display_title("HEALTHY"), "Healthy");
    }

    #[test]
    fn test_list_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.png", "c.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.png")).unwrap();

        let files = list_files(dir.path(), Some(PNG_EXTENSIONS)).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.png"]);

        let all = list_files(dir.path(), None).unwrap();
        assert_eq!(all.len(), 3);
    }
}
