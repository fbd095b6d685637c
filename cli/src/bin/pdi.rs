use clap::{Parser, Subcommand};
use cli::{
    class_registry, AugmentSection, BinarizeSection, MetadataSection, MontageSection, PipelineConfig,
    StatisticsSection,
};
use color_eyre::eyre::Result;
use augment::{augment_dataset, AugmentationPlan};
use dataset::{
    build_class_montages, equalize_dataset, histogram_variances, mean_histograms, mean_prototypes,
    plot::{render_equalization_comparison, render_mean_histograms, render_mean_prototypes, save_plot},
    render_montage_sheet, Dataset, GridShape, HistogramVariance, MontageConfig,
};
use mask::MaskBinarizer;
use pdi_common::BatchReport;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "pdi", author, version, about = "Image dataset preparation for leaf disease classification", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert segmentation masks into black-and-white masks
    Binarize {
        /// Directory containing the PNG masks
        #[arg(short, long)]
        input_dir: PathBuf,
        /// Directory receiving the binary masks
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Pixels strictly above this value become white
        #[arg(short, long, default_value_t = 0)]
        threshold: u8,
        /// Write the per-file report as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Write log, gamma and mean-filtered copies of every class image
    Augment {
        /// Dataset root containing one folder per class
        #[arg(short, long)]
        source_dir: PathBuf,
        /// Root of the augmented copy
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Class folders to process (comma separated); all when omitted
        #[arg(short, long, value_delimiter = ',')]
        classes: Vec<String>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Compute mean prototypes, mean histograms and their variance
    Stats {
        #[arg(short, long)]
        dataset_dir: PathBuf,
        /// Directory receiving the plots and the variance table
        #[arg(short, long)]
        output_dir: PathBuf,
        #[arg(short, long, value_delimiter = ',')]
        classes: Vec<String>,
        /// Skip HSV equalization
        #[arg(long)]
        no_equalize: bool,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Render a sample montage of every class
    Montage {
        #[arg(short, long)]
        dataset_dir: PathBuf,
        /// PNG file receiving the montage sheet
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_delimiter = ',')]
        classes: Vec<String>,
        #[arg(long, default_value_t = 4)]
        images_per_class: usize,
        #[arg(long, default_value_t = 1)]
        rows: u32,
        #[arg(long, default_value_t = 4)]
        cols: u32,
        #[arg(long, default_value_t = 0)]
        padding: u32,
    },
    /// Pretty-print a JSON metadata file
    Metadata {
        path: PathBuf,
    },
    /// Run every stage configured in a TOML or JSON file
    Run {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the JSON schema of the pipeline configuration
    Schema,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Binarize { input_dir, output_dir, threshold, report } => {
            let section = BinarizeSection { input_dir, output_dir, threshold };
            finish(run_binarize(&section)?, report.as_deref())?;
        }
        Commands::Augment { source_dir, output_dir, classes, report } => {
            let section = AugmentSection {
                source_dir,
                output_dir,
                classes,
                transforms: augment::TransformSpec::standard(),
            };
            finish(run_augment(&section)?, report.as_deref())?;
        }
        Commands::Stats { dataset_dir, output_dir, classes, no_equalize, report } => {
            let section = StatisticsSection { dataset_dir, output_dir, classes, equalize: !no_equalize };
            finish(run_statistics(&section)?, report.as_deref())?;
        }
        Commands::Montage { dataset_dir, output, classes, images_per_class, rows, cols, padding } => {
            let layout = MontageConfig {
                images_per_class,
                grid: GridShape { rows, cols },
                padding,
            };
            finish(run_montage(&MontageSection { dataset_dir, output, classes, layout })?, None)?;
        }
        Commands::Metadata { path } => {
            if !run_metadata(&MetadataSection { path }) {
                warn!("Metadata could not be shown");
            }
        }
        Commands::Run { config, report } => {
            let pipeline = PipelineConfig::from_file(&config)?;
            finish(run_pipeline(&pipeline)?, report.as_deref())?;
        }
        Commands::Schema => {
            println!("{}", PipelineConfig::schema_json()?);
        }
    }

    Ok(())
}

/// Log the summary and optionally save the report
fn finish(report: BatchReport, report_path: Option<&Path>) -> Result<()> {
    for (source, reason) in report.skipped() {
        warn!("Skipped {}: {}", source.display(), reason);
    }
    info!("✅ Done: {}", report.summary());

    if let Some(path) = report_path {
        report.to_json_file(path)?;
        info!("📄 Report saved to: {:?}", path);
    }
    Ok(())
}

fn run_pipeline(config: &PipelineConfig) -> Result<BatchReport> {
    if config.section_count() == 0 {
        warn!("Configuration has no sections, nothing to do");
    }

    let mut report = BatchReport::new();
    if let Some(section) = &config.metadata {
        if !run_metadata(section) {
            warn!("Continuing without metadata");
        }
    }
    if let Some(section) = &config.binarize {
        report.merge(run_binarize(section)?);
    }
    if let Some(section) = &config.augment {
        report.merge(run_augment(section)?);
    }
    if let Some(section) = &config.statistics {
        report.merge(run_statistics(section)?);
    }
    if let Some(section) = &config.montage {
        report.merge(run_montage(section)?);
    }
    Ok(report)
}

fn run_metadata(section: &MetadataSection) -> bool {
    metadata::show_json_metadata(&section.path)
}

fn run_binarize(section: &BinarizeSection) -> Result<BatchReport> {
    let binarizer = MaskBinarizer::with_threshold(section.threshold);
    info!("{}", binarizer.info());
    Ok(binarizer.binarize_directory(&section.input_dir, &section.output_dir)?)
}

fn run_augment(section: &AugmentSection) -> Result<BatchReport> {
    let registry = class_registry(&section.source_dir, &section.classes)?;
    let plan = AugmentationPlan::from_specs(&section.transforms)?;
    info!("Augmentation plan: {}", plan.suffixes().join(", "));
    Ok(augment_dataset(&registry, &section.output_dir, &plan)?)
}

fn run_statistics(section: &StatisticsSection) -> Result<BatchReport> {
    let registry = class_registry(&section.dataset_dir, &section.classes)?;
    let (data, mut report) = Dataset::load(&registry)?;
    if data.is_empty() {
        warn!("No images loaded from '{}'", section.dataset_dir.display());
        return Ok(report);
    }
    fs::create_dir_all(&section.output_dir)?;
    let out = |name: &str| section.output_dir.join(name);

    let (prototypes, mismatched) = mean_prototypes(&data);
    report.merge(mismatched);
    let path = out("mean_prototypes.png");
    save_plot(&render_mean_prototypes(&prototypes)?, &path)?;
    report.record_written(&section.dataset_dir, path);

    let histograms = mean_histograms(&data);
    let path = out("mean_histograms.png");
    save_plot(&render_mean_histograms(&histograms)?, &path)?;
    report.record_written(&section.dataset_dir, path);

    let original = histogram_variances(&histograms);
    log_variances("original", &original);

    let mut table = serde_json::Map::new();
    table.insert("original".to_string(), serde_json::to_value(&original)?);
    if section.equalize {
        let equalized = equalize_dataset(&data);
        let path = out("equalization.png");
        save_plot(&render_equalization_comparison(&data, &equalized)?, &path)?;
        report.record_written(&section.dataset_dir, path);

        let after = histogram_variances(&mean_histograms(&equalized));
        log_variances("equalized", &after);
        table.insert("equalized".to_string(), serde_json::to_value(&after)?);
    }

    let path = out("histogram_variance.json");
    fs::write(&path, serde_json::to_string_pretty(&table)?)?;
    report.record_written(&section.dataset_dir, path);

    Ok(report)
}

fn log_variances(stage: &str, variances: &[HistogramVariance]) {
    for entry in variances {
        let [r, g, b] = entry.variance.named();
        info!(
            "Histogram variance ({}) '{}': {}={:.3e} {}={:.3e} {}={:.3e}",
            stage, entry.label, r.0, r.1, g.0, g.1, b.0, b.1
        );
    }
}

fn run_montage(section: &MontageSection) -> Result<BatchReport> {
    let registry = class_registry(&section.dataset_dir, &section.classes)?;
    let panels = build_class_montages(&registry, &section.layout)?;

    let mut report = BatchReport::new();
    if panels.is_empty() {
        return Ok(report);
    }
    save_plot(&render_montage_sheet(&panels)?, &section.output)?;
    report.record_written(&section.dataset_dir, &section.output);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pdi_common::SkipReason;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_augment_classes() {
        let cli = Cli::try_parse_from([
            "pdi", "augment", "-s", "train", "-o", "aug", "--classes", "healthy,early_blight",
        ])
        .unwrap();
        match cli.command {
            Commands::Augment { classes, report, .. } => {
                assert_eq!(classes, vec!["healthy", "early_blight"]);
                assert!(report.is_none());
            }
            _ => panic!("expected augment"),
        }
    }

    #[test]
    fn test_montage_defaults() {
        let cli = Cli::try_parse_from(["pdi", "montage", "-d", "train", "-o", "m.png"]).unwrap();
        match cli.command {
            Commands::Montage { images_per_class, rows, cols, padding, classes, .. } => {
                assert_eq!((images_per_class, rows, cols, padding), (4, 1, 4, 0));
                assert!(classes.is_empty());
            }
            _ => panic!("expected montage"),
        }
    }

    #[test]
    fn test_pipeline_runs_configured_sections() {
        let dir = tempfile::tempdir().unwrap();
        let masks = dir.path().join("masks");
        fs::create_dir(&masks).unwrap();
        image::GrayImage::from_fn(4, 4, |x, _| image::Luma([(x * 60) as u8]))
            .save(masks.join("m.png"))
            .unwrap();

        let train = dir.path().join("train");
        fs::create_dir_all(train.join("healthy")).unwrap();
        image::RgbImage::from_fn(4, 4, |x, y| image::Rgb([(x * 50) as u8, (y * 50) as u8, 90]))
            .save(train.join("healthy").join("leaf.png"))
            .unwrap();

        let config = PipelineConfig {
            binarize: Some(BinarizeSection {
                input_dir: masks,
                output_dir: dir.path().join("binary"),
                threshold: 0,
            }),
            augment: Some(AugmentSection {
                source_dir: train.clone(),
                output_dir: dir.path().join("aug"),
                classes: vec![],
                transforms: augment::TransformSpec::standard(),
            }),
            statistics: Some(StatisticsSection {
                dataset_dir: train.clone(),
                output_dir: dir.path().join("plots"),
                classes: vec![],
                equalize: true,
            }),
            montage: Some(MontageSection {
                dataset_dir: train,
                output: dir.path().join("plots").join("montage.png"),
                classes: vec![],
                layout: MontageConfig::default(),
            }),
            metadata: None,
        };

        let report = run_pipeline(&config).unwrap();
        assert!(report.is_clean());
        // 1 mask + 3 augmented + 4 statistics outputs + 1 montage
        assert_eq!(report.written_count(), 9);
        assert_eq!(report.loaded_count(), 1);
        assert!(dir.path().join("aug").join("healthy").join("leaf_exp.png").is_file());
        assert!(dir.path().join("plots").join("histogram_variance.json").is_file());
    }

    #[test]
    fn test_statistics_survive_mixed_sizes() {
        let dir = tempfile::tempdir().unwrap();
        let class_dir = dir.path().join("train").join("healthy");
        fs::create_dir_all(&class_dir).unwrap();
        image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]))
            .save(class_dir.join("a.png"))
            .unwrap();
        image::RgbImage::from_pixel(2, 2, image::Rgb([10, 20, 30]))
            .save(class_dir.join("b.png"))
            .unwrap();

        let section = StatisticsSection {
            dataset_dir: dir.path().join("train"),
            output_dir: dir.path().join("plots"),
            classes: vec![],
            equalize: false,
        };
        let report = run_statistics(&section).unwrap();

        assert_eq!(report.loaded_count(), 2);
        let skipped: Vec<_> = report.skipped().collect();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].0, class_dir.join("b.png"));
        assert!(matches!(skipped[0].1, SkipReason::DimensionMismatch { .. }));
        assert!(dir.path().join("plots").join("mean_prototypes.png").is_file());
    }
}
