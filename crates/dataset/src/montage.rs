//! Per-class image montages: a few samples of every class tiled into a grid,
//! one panel per class, stacked into a single contact sheet.

use std::io;

use image::{imageops, DynamicImage, Rgb, RgbImage};
use pdi_common::{utils, ClassRegistry};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DatasetError, Result};

/// Placeholder colour of a class whose folder is missing
pub const MISSING_COLOR: Rgb<u8> = Rgb([220, 40, 40]);
/// Placeholder colour of a class with no readable images
pub const EMPTY_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

const PLACEHOLDER_WIDTH: u32 = 256;
const PLACEHOLDER_HEIGHT: u32 = 48;
const PANEL_GAP: u32 = 8;
const SHEET_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    pub fn capacity(&self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

impl Default for GridShape {
    fn default() -> Self {
        Self { rows: 1, cols: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MontageConfig {
    /// Maximum number of images read per class
    pub images_per_class: usize,
    pub grid: GridShape,
    /// Pixels between tiles and around the border
    pub padding: u32,
}

impl Default for MontageConfig {
    fn default() -> Self {
        Self {
            images_per_class: 4,
            grid: GridShape::default(),
            padding: 0,
        }
    }
}

impl MontageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.grid.capacity() == 0 {
            return Err(DatasetError::InvalidParameter(format!(
                "montage grid {}x{} has no cells",
                self.grid.rows, self.grid.cols
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelContent {
    Montage(RgbImage),
    /// The class folder does not exist
    MissingClass,
    /// The class folder has no readable images
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MontagePanel {
    pub label: String,
    pub title: String,
    pub content: PanelContent,
}

/// Bring any decoded image to 8-bit RGB. Gray is replicated to the three
/// channels; images with alpha are composited over a white background.
pub fn normalize_channels(image: DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let p = rgba.get_pixel(x, y);
        let alpha = p[3] as f64 / 255.0;
        let blend = |c: u8| (c as f64 * alpha + 255.0 * (1.0 - alpha)).round().clamp(0.0, 255.0) as u8;
        Rgb([blend(p[0]), blend(p[1]), blend(p[2])])
    })
}

/// Tile images row-major into `grid`.
///
/// Every tile takes the size of the first image (others are resized), at
/// most `rows * cols` images are used, and unused cells and padding are
/// filled with the mean colour of the tiles.
pub fn montage(images: &[RgbImage], grid: GridShape, padding: u32) -> Result<RgbImage> {
    let Some(first) = images.first() else {
        return Err(DatasetError::NothingToRender("montage of zero images".to_string()));
    };
    if grid.capacity() == 0 {
        return Err(DatasetError::InvalidParameter(format!(
            "montage grid {}x{} has no cells",
            grid.rows, grid.cols
        )));
    }

    let (tile_w, tile_h) = first.dimensions();
    let tiles: Vec<RgbImage> = images
        .iter()
        .take(grid.capacity())
        .map(|img| {
            if img.dimensions() == (tile_w, tile_h) {
                img.clone()
            } else {
                imageops::resize(img, tile_w, tile_h, imageops::FilterType::Triangle)
            }
        })
        .collect();

    let width = grid.cols * (tile_w + padding) + padding;
    let height = grid.rows * (tile_h + padding) + padding;
    let mut canvas = RgbImage::from_pixel(width, height, mean_color(&tiles));

    for (i, tile) in tiles.iter().enumerate() {
        let row = i as u32 / grid.cols;
        let col = i as u32 % grid.cols;
        let x = padding + col * (tile_w + padding);
        let y = padding + row * (tile_h + padding);
        imageops::overlay(&mut canvas, tile, x as i64, y as i64);
    }

    Ok(canvas)
}

fn mean_color(tiles: &[RgbImage]) -> Rgb<u8> {
    let mut sums = [0.0f64; 3];
    let mut count = 0.0;
    for tile in tiles {
        for pixel in tile.pixels() {
            for (c, sum) in sums.iter_mut().enumerate() {
                *sum += pixel[c] as f64;
            }
            count += 1.0;
        }
    }
    if count == 0.0 {
        return Rgb([0, 0, 0]);
    }
    Rgb(sums.map(|s| (s / count).round() as u8))
}

/// Build one montage panel per class of the registry.
///
/// Missing folders and folders without readable images become placeholder
/// panels instead of errors.
pub fn build_class_montages(registry: &ClassRegistry, config: &MontageConfig) -> Result<Vec<MontagePanel>> {
    config.validate()?;
    if registry.is_empty() {
        warn!("No classes given, nothing to show");
        return Ok(Vec::new());
    }
    if config.images_per_class > config.grid.capacity() {
        warn!(
            "{} images per class requested but the {}x{} grid holds {}; extra images are dropped",
            config.images_per_class,
            config.grid.rows,
            config.grid.cols,
            config.grid.capacity()
        );
    }

    info!("Building montages for {} classes from '{}'", registry.len(), registry.root().display());

    let mut panels = Vec::with_capacity(registry.len());
    for entry in registry.iter() {
        let title = utils::display_title(&entry.label);

        let files = match utils::list_files(&entry.path, Some(utils::IMAGE_EXTENSIONS)) {
            Ok(files) => files,
            Err(e) => {
                let content = if e.kind() == io::ErrorKind::NotFound {
                    warn!("Directory not found for class '{}', skipping", entry.label);
                    PanelContent::MissingClass
                } else {
                    warn!("Cannot list the folder of class '{}': {}", entry.label, e);
                    PanelContent::Empty
                };
                panels.push(MontagePanel { label: entry.label.clone(), title, content });
                continue;
            }
        };
        let mut images = Vec::new();
        for path in files.into_iter().take(config.images_per_class) {
            match image::open(&path) {
                Ok(img) => images.push(normalize_channels(img)),
                Err(e) => warn!("Failed to read image {}: {}", path.display(), e),
            }
        }

        let content = if images.is_empty() {
            warn!("No images found or read in the folder of class '{}'", entry.label);
            PanelContent::Empty
        } else {
            PanelContent::Montage(montage(&images, config.grid, config.padding)?)
        };
        panels.push(MontagePanel { label: entry.label.clone(), title, content });
    }

    Ok(panels)
}

/// Stack the panels vertically on a white sheet. Placeholder panels are drawn
/// as red (missing class) or orange (no images) blocks.
pub fn render_montage_sheet(panels: &[MontagePanel]) -> Result<RgbImage> {
    if panels.is_empty() {
        return Err(DatasetError::NothingToRender("no montage panels".to_string()));
    }

    let blocks: Vec<RgbImage> = panels
        .iter()
        .map(|panel| {
            info!("Panel '{}'", panel.title);
            match &panel.content {
                PanelContent::Montage(image) => image.clone(),
                PanelContent::MissingClass => RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, MISSING_COLOR),
                PanelContent::Empty => RgbImage::from_pixel(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, EMPTY_COLOR),
            }
        })
        .collect();

    let width = blocks.iter().map(RgbImage::width).max().unwrap_or(PLACEHOLDER_WIDTH) + 2 * PANEL_GAP;
    let height = blocks.iter().map(|b| b.height() + PANEL_GAP).sum::<u32>() + PANEL_GAP;
    let mut sheet = RgbImage::from_pixel(width, height, SHEET_BACKGROUND);

    let mut y = PANEL_GAP;
    for block in &blocks {
        imageops::overlay(&mut sheet, block, PANEL_GAP as i64, y as i64);
        y += block.height() + PANEL_GAP;
    }

    Ok(sheet)
}
