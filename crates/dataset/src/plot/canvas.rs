use image::{imageops, Rgb, RgbImage};

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const GAP: u32 = 8;

/// White sheet divided into `rows x cols` equally sized panels
pub struct PanelGrid {
    rows: u32,
    cols: u32,
    panel_width: u32,
    panel_height: u32,
    image: RgbImage,
}

impl PanelGrid {
    pub fn new(rows: u32, cols: u32, panel_width: u32, panel_height: u32) -> Self {
        let width = cols * panel_width + (cols + 1) * GAP;
        let height = rows * panel_height + (rows + 1) * GAP;
        Self {
            rows,
            cols,
            panel_width,
            panel_height,
            image: RgbImage::from_pixel(width, height, BACKGROUND),
        }
    }

    /// Top-left corner of a panel
    pub fn origin(&self, row: u32, col: u32) -> (u32, u32) {
        (
            GAP + col * (self.panel_width + GAP),
            GAP + row * (self.panel_height + GAP),
        )
    }

    /// Copy `panel` into a cell; anything beyond the cell size is cut off
    pub fn place(&mut self, row: u32, col: u32, panel: &RgbImage) {
        if row >= self.rows || col >= self.cols {
            return;
        }
        let w = panel.width().min(self.panel_width);
        let h = panel.height().min(self.panel_height);
        let cropped = imageops::crop_imm(panel, 0, 0, w, h).to_image();
        let (x, y) = self.origin(row, col);
        imageops::overlay(&mut self.image, &cropped, x as i64, y as i64);
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}
