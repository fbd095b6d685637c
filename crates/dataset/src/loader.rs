use std::path::{Path, PathBuf};

use image::RgbImage;
use pdi_common::{utils, BatchReport, ClassRegistry, SkipReason};
use tracing::{info, warn};

use crate::error::Result;

/// One decoded image and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub image: RgbImage,
}

/// All images of one class, in file-name order
#[derive(Debug, Clone, PartialEq)]
pub struct ClassImages {
    pub label: String,
    pub images: Vec<LoadedImage>,
}

impl ClassImages {
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn first(&self) -> Option<&RgbImage> {
        self.images.first().map(|item| &item.image)
    }
}

/// Class label → images, built by a single pass over the class folders.
///
/// The whole dataset is held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    classes: Vec<ClassImages>,
}

impl Dataset {
    pub fn new(classes: Vec<ClassImages>) -> Self {
        Self { classes }
    }

    /// Load every class of the registry. Each class folder is listed once
    /// (no recursion) and every file in it is decoded as RGB; files that do
    /// not decode are skipped, as are class folders that cannot be listed.
    pub fn load(registry: &ClassRegistry) -> Result<(Self, BatchReport)> {
        let mut classes = Vec::with_capacity(registry.len());
        let mut report = BatchReport::new();

        info!("Loading images from '{}'", registry.root().display());
        for entry in registry.iter() {
            let files = match utils::list_files(&entry.path, None) {
                Ok(files) => files,
                Err(e) => {
                    warn!("Cannot list class directory '{}', skipping: {}", entry.path.display(), e);
                    report.record_skipped(&entry.path, SkipReason::listing_failed(&e));
                    continue;
                }
            };

            let mut images = Vec::new();
            for path in files {
                match image::open(&path) {
                    Ok(img) => {
                        report.record_loaded(&path);
                        images.push(LoadedImage { path, image: img.to_rgb8() });
                    }
                    Err(e) => {
                        warn!("Skipping unreadable file {}: {}", path.display(), e);
                        report.record_skipped(&path, SkipReason::Unreadable(e.to_string()));
                    }
                }
            }

            classes.push(ClassImages { label: entry.label.clone(), images });
        }

        info!("Loaded data for {} classes ({})", classes.len(), report.summary());
        Ok((Self { classes }, report))
    }

    /// Discover the classes under `root` and load them
    pub fn load_dir<P: AsRef<Path>>(root: P) -> Result<(Self, BatchReport)> {
        let registry = ClassRegistry::discover(root)?;
        Self::load(&registry)
    }

    pub fn classes(&self) -> &[ClassImages] {
        &self.classes
    }

    pub fn get(&self, label: &str) -> Option<&ClassImages> {
        self.classes.iter().find(|c| c.label == label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.label.as_str()).collect()
    }

    /// Total number of images over all classes
    pub fn image_count(&self) -> usize {
        self.classes.iter().map(ClassImages::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.image_count() == 0
    }

    /// Apply `f` to every image, keeping labels and paths
    pub fn map_images<F>(&self, mut f: F) -> Self
    where
        F: FnMut(&RgbImage) -> RgbImage,
    {
        let classes = self
            .classes
            .iter()
            .map(|class| ClassImages {
                label: class.label.clone(),
                images: class
                    .images
                    .iter()
                    .map(|item| LoadedImage { path: item.path.clone(), image: f(&item.image) })
                    .collect(),
            })
            .collect();
        Self { classes }
    }
}
