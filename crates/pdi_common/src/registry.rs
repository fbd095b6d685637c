use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PdiError, Result};

/// One class of the dataset: its label and the folder holding its images
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassEntry {
    /// Ground-truth label, equal to the folder name
    pub label: String,
    /// Folder containing the class images
    pub path: PathBuf,
}

/// Explicit, ordered list of the classes a run operates on.
///
/// Built once (either from a directory listing or from an explicit label
/// mapping) and then passed to every stage, so no stage re-scans the
/// dataset root to decide which classes exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassRegistry {
    root: PathBuf,
    entries: Vec<ClassEntry>,
}

impl ClassRegistry {
    /// Discover classes as the immediate subdirectories of `root`, sorted by name.
    /// Files at the top level are ignored.
    pub fn discover<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref();
        if !root.exists() {
            return Err(PdiError::RootNotFound { path: root.display().to_string() });
        }
        if !root.is_dir() {
            return Err(PdiError::NotADirectory { path: root.display().to_string() });
        }

        let mut labels = Vec::new();
        for entry in fs::read_dir(root)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                labels.push(name.to_string());
            }
        }
        labels.sort();

        debug!("Discovered {} classes under {}", labels.len(), root.display());
        Self::from_labels(root, labels)
    }

    /// Build a registry from an id → folder name mapping, ordered by id
    pub fn from_class_map<P: AsRef<Path>>(root: P, class_map: &BTreeMap<u32, String>) -> Result<Self> {
        Self::from_labels(root, class_map.values().cloned())
    }

    /// Build a registry from labels in caller order. Does not touch the filesystem.
    pub fn from_labels<P, I, S>(root: P, labels: I) -> Result<Self>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let root = root.as_ref().to_path_buf();
        let mut entries: Vec<ClassEntry> = Vec::new();

        for label in labels {
            let label = label.into();
            if label.is_empty() || label.contains(['/', '\\']) || label == "." || label == ".." {
                return Err(PdiError::InvalidLabel { label });
            }
            if entries.iter().any(|e| e.label == label) {
                return Err(PdiError::DuplicateLabel { label });
            }
            entries.push(ClassEntry { path: root.join(&label), label });
        }

        Ok(Self { root, entries })
    }

    /// Re-root the registry, keeping labels and order (e.g. source tree → output tree)
    pub fn rebase<P: AsRef<Path>>(&self, root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        let entries = self
            .entries
            .iter()
            .map(|e| ClassEntry { label: e.label.clone(), path: root.join(&e.label) })
            .collect();
        Self { root, entries }
    }

    /// Dataset root the class folders live under
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassEntry> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    pub fn get(&self, label: &str) -> Option<&ClassEntry> {
        self.entries.iter().find(|e| e.label == label)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_labels_keeps_order() {
        let registry = ClassRegistry::from_labels("/data", ["zebra", "apple"]).unwrap();
        assert_eq!(registry.labels(), vec!["zebra", "apple"]);
        assert_eq!(registry.get("apple").unwrap().path, PathBuf::from("/data/apple"));
        assert!(registry.get("pear").is_none());
    }

    #[test]
    fn test_from_class_map_orders_by_id() {
        let mut map = BTreeMap::new();
        map.insert(2, "rust".to_string());
        map.insert(0, "healthy".to_string());
        map.insert(1, "blight".to_string());

        let registry = ClassRegistry::from_class_map("src", &map).unwrap();
        assert_eq!(registry.labels(), vec!["healthy", "blight", "rust"]);
    }

    #[test]
    fn test_invalid_and_duplicate_labels() {
        assert!(matches!(
            ClassRegistry::from_labels("r", ["a/b"]),
            Err(PdiError::InvalidLabel { .. })
        ));
        assert!(matches!(
            ClassRegistry::from_labels("r", [""]),
            Err(PdiError::InvalidLabel { .. })
        ));
        assert!(matches!(
            ClassRegistry::from_labels("r", ["a", "a"]),
            Err(PdiError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn test_discover_ignores_files_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("b_class")).unwrap();
        fs::create_dir(dir.path().join("a_class")).unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let registry = ClassRegistry::discover(dir.path()).unwrap();
        assert_eq!(registry.labels(), vec!["a_class", "b_class"]);
        assert_eq!(registry.root(), dir.path());
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = ClassRegistry::discover(dir.path().join("missing"));
        assert!(matches!(result, Err(PdiError::RootNotFound { .. })));
    }

    #[test]
    fn test_rebase() {
        let registry = ClassRegistry::from_labels("in", ["x"]).unwrap();
        let out = registry.rebase("out");
        assert_eq!(out.get("x").unwrap().path, PathBuf::from("out/x"));
        assert_eq!(out.root(), Path::new("out"));
    }
}
