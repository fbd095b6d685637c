use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use pdi_common::{utils, BatchReport, ClassRegistry, SkipReason};
use tracing::{info, warn};

use crate::{
    error::{AugmentError, Result},
    plan::AugmentationPlan,
};

/// Apply every transform of `plan` to every PNG image of every class in
/// `registry`, writing `{stem}_{suffix}{.ext}` files into a mirror of the
/// class folders under `output_dir`.
///
/// Missing class folders, unreadable images, failing transforms and failed
/// writes are recorded in the report and the run continues.
pub fn augment_dataset<P: AsRef<Path>>(
    registry: &ClassRegistry,
    output_dir: P,
    plan: &AugmentationPlan,
) -> Result<BatchReport> {
    let output_dir = output_dir.as_ref();
    let mut report = BatchReport::new();

    create_dir(output_dir)?;
    info!("Augmenting {} classes into '{}'", registry.len(), output_dir.display());
    if plan.is_empty() {
        warn!("Augmentation plan is empty, no images will be written");
    }

    let mirror = registry.rebase(output_dir);
    for (source, target) in registry.iter().zip(mirror.iter()) {
        create_dir(&target.path)?;
        info!("Processing class '{}'", source.label);

        let images = match utils::list_files(&source.path, Some(utils::PNG_EXTENSIONS)) {
            Ok(images) => images,
            Err(e) => {
                warn!("Cannot list source directory '{}', skipping: {}", source.path.display(), e);
                report.record_skipped(&source.path, SkipReason::listing_failed(&e));
                continue;
            }
        };
        info!("  Found {} images", images.len());

        for image_path in images {
            let image = match image::open(&image_path) {
                Ok(img) => img.to_rgb8(),
                Err(e) => {
                    warn!("  Could not read image {}: {}", image_path.display(), e);
                    report.record_skipped(&image_path, SkipReason::Unreadable(e.to_string()));
                    continue;
                }
            };

            for (suffix, augmentation) in plan.steps() {
                let Some(file_name) = utils::suffixed_file_name(&image_path, suffix) else {
                    continue;
                };
                let output_path = target.path.join(file_name);

                let augmented = match augmentation.apply(&image) {
                    Ok(augmented) => augmented,
                    Err(e) => {
                        warn!("  Transform '{}' failed on {}: {}", suffix, image_path.display(), e);
                        report.record_skipped(&image_path, SkipReason::TransformFailed(e.to_string()));
                        continue;
                    }
                };

                match augmented.save(&output_path) {
                    Ok(()) => report.record_written(&image_path, output_path),
                    Err(e) => {
                        warn!("  Failed to write {}: {}", output_path.display(), e);
                        report.record_skipped(&image_path, SkipReason::WriteFailed(e.to_string()));
                    }
                }
            }
        }
    }

    info!("Augmentation finished: {}", report.summary());
    Ok(report)
}

/// Same as [`augment_dataset`], with classes given as an id → folder name mapping
/// relative to `source_dir`
pub fn augment_class_map<P, Q>(
    source_dir: P,
    output_dir: Q,
    class_map: &BTreeMap<u32, String>,
    plan: &AugmentationPlan,
) -> Result<BatchReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let registry = ClassRegistry::from_class_map(source_dir, class_map)?;
    augment_dataset(&registry, output_dir, plan)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|source| AugmentError::OutputDirectory {
        path: path.to_path_buf(),
        source,
    })
}
