//! Rendering of dataset summaries to PNG images.
//!
//! No text is drawn; panel titles go to the log in panel order.

pub mod canvas;

use std::fs;
use std::path::Path;

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use tracing::info;

use crate::{
    error::{DatasetError, Result},
    loader::Dataset,
    stats::{MeanHistogram, MeanPrototype, BINS},
};
use canvas::PanelGrid;

pub const HISTOGRAM_PANEL_WIDTH: u32 = 512;
pub const HISTOGRAM_PANEL_HEIGHT: u32 = 256;

/// Line colours of the R, G and B curves
pub const CHANNEL_COLORS: [Rgb<u8>; 3] = [Rgb([214, 39, 40]), Rgb([44, 160, 44]), Rgb([31, 119, 180])];

const GRID_COLOR: Rgb<u8> = Rgb([225, 225, 225]);
const FRAME_COLOR: Rgb<u8> = Rgb([90, 90, 90]);
const GRID_STEP: u32 = 64;
const DASH: u32 = 4;

/// One row per class, one gray panel per channel (R, G, B). Each panel is
/// min-max normalized on its own.
pub fn render_mean_prototypes(prototypes: &[MeanPrototype]) -> Result<RgbImage> {
    if prototypes.is_empty() {
        return Err(DatasetError::NothingToRender("no mean prototypes".to_string()));
    }

    let panel_w = prototypes.iter().map(|p| p.width).max().unwrap_or(0);
    let panel_h = prototypes.iter().map(|p| p.height).max().unwrap_or(0);
    let mut grid = PanelGrid::new(prototypes.len() as u32, 3, panel_w, panel_h);

    for (row, proto) in prototypes.iter().enumerate() {
        info!("Mean prototype '{}' (R, G, B)", proto.label);
        for (col, plane) in proto.channels.iter().enumerate() {
            let gray = normalized_plane(plane, proto.width, proto.height);
            let panel = image::DynamicImage::ImageLuma8(gray).to_rgb8();
            grid.place(row as u32, col as u32, &panel);
        }
    }

    Ok(grid.into_image())
}

/// Scale a plane so its minimum maps to 0 and its maximum to 255. A constant
/// plane renders black.
fn normalized_plane(plane: &[f64], width: u32, height: u32) -> GrayImage {
    let lo = plane.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = plane.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = hi - lo;

    GrayImage::from_fn(width, height, |x, y| {
        let v = plane[(y * width + x) as usize];
        if range > 0.0 {
            Luma([((v - lo) / range * 255.0).round() as u8])
        } else {
            Luma([0])
        }
    })
}

/// Two panels per row, one per class, with the R, G and B curves of the
/// mean histogram scaled to the panel's largest count. Unused panels stay
/// blank.
pub fn render_mean_histograms(histograms: &[MeanHistogram]) -> Result<RgbImage> {
    if histograms.is_empty() {
        return Err(DatasetError::NothingToRender("no mean histograms".to_string()));
    }

    let rows = histograms.len().div_ceil(2) as u32;
    let mut grid = PanelGrid::new(rows, 2, HISTOGRAM_PANEL_WIDTH, HISTOGRAM_PANEL_HEIGHT);

    for (i, histogram) in histograms.iter().enumerate() {
        info!("Mean histogram '{}'", histogram.label);
        let panel = histogram_panel(histogram);
        grid.place(i as u32 / 2, i as u32 % 2, &panel);
    }

    Ok(grid.into_image())
}

fn histogram_panel(histogram: &MeanHistogram) -> RgbImage {
    let (w, h) = (HISTOGRAM_PANEL_WIDTH, HISTOGRAM_PANEL_HEIGHT);
    let mut panel = RgbImage::from_pixel(w, h, canvas::BACKGROUND);

    draw_dashed_grid(&mut panel);
    draw_hollow_rect_mut(&mut panel, Rect::at(0, 0).of_size(w, h), FRAME_COLOR);

    let max = histogram.max_count();
    let x_scale = (w - 1) as f32 / (BINS - 1) as f32;
    let y_of = |count: f64| {
        let fraction = if max > 0.0 { count / max } else { 0.0 };
        (h - 1) as f32 * (1.0 - fraction as f32)
    };

    for (c, color) in CHANNEL_COLORS.iter().enumerate() {
        let counts = histogram.channel(c);
        for (i, pair) in counts.windows(2).enumerate() {
            let start = (i as f32 * x_scale, y_of(pair[0]));
            let end = ((i + 1) as f32 * x_scale, y_of(pair[1]));
            draw_line_segment_mut(&mut panel, start, end, *color);
        }
    }

    panel
}

fn draw_dashed_grid(panel: &mut RgbImage) {
    let (w, h) = panel.dimensions();
    for x in (GRID_STEP..w).step_by(GRID_STEP as usize) {
        for y in (0..h).filter(|y| (y / DASH) % 2 == 0) {
            panel.put_pixel(x, y, GRID_COLOR);
        }
    }
    for y in (GRID_STEP..h).step_by(GRID_STEP as usize) {
        for x in (0..w).filter(|x| (x / DASH) % 2 == 0) {
            panel.put_pixel(x, y, GRID_COLOR);
        }
    }
}

/// For every class with images, the first original image beside its
/// equalized version
pub fn render_equalization_comparison(original: &Dataset, equalized: &Dataset) -> Result<RgbImage> {
    let pairs: Vec<(&str, &RgbImage, &RgbImage)> = original
        .classes()
        .iter()
        .filter_map(|class| {
            let before = class.first()?;
            let after = equalized.get(&class.label)?.first()?;
            Some((class.label.as_str(), before, after))
        })
        .collect();
    if pairs.is_empty() {
        return Err(DatasetError::NothingToRender("no class has images to compare".to_string()));
    }

    let panel_w = pairs.iter().map(|(_, a, b)| a.width().max(b.width())).max().unwrap_or(0);
    let panel_h = pairs.iter().map(|(_, a, b)| a.height().max(b.height())).max().unwrap_or(0);
    let mut grid = PanelGrid::new(pairs.len() as u32, 2, panel_w, panel_h);

    for (row, (label, before, after)) in pairs.iter().enumerate() {
        info!("Original and equalized image of '{}'", label);
        grid.place(row as u32, 0, before);
        grid.place(row as u32, 1, after);
    }

    Ok(grid.into_image())
}

/// Write a rendered plot, creating the parent directory if needed
pub fn save_plot<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    image.save(path)?;
    info!("Saved plot to {}", path.display());
    Ok(())
}
