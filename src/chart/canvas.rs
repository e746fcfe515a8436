//! In-memory raster used by the chart renderers

use std::io::Cursor;

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{ImageFormat, Rgb, RgbImage};

/// Glyph cell size of the built-in font, in pixels at scale 1
pub const GLYPH_SIZE: u32 = 8;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const LIGHT_GREY: Rgb<u8> = Rgb([225, 225, 225]);

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.image.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.width() && (y as u32) < self.height() {
            self.image.put_pixel(x as u32, y as u32, color);
        }
    }

    /// Fill an axis-aligned rectangle, clipped to the canvas
    pub fn fill_rect(&mut self, x: i64, y: i64, width: u32, height: u32, color: Rgb<u8>) {
        for py in y..y + i64::from(height) {
            for px in x..x + i64::from(width) {
                self.put(px, py, color);
            }
        }
    }

    pub fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb<u8>) {
        for x in x0.min(x1)..=x0.max(x1) {
            self.put(x, y, color);
        }
    }

    pub fn vline(&mut self, x: i64, y0: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..=y0.max(y1) {
            self.put(x, y, color);
        }
    }

    /// Fill a circular sector.
    ///
    /// Angles are in degrees, measured counter-clockwise from the positive
    /// x-axis; the sector runs from `start` over `sweep` degrees.
    pub fn fill_wedge(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        sweep: f64,
        color: Rgb<u8>,
    ) {
        if sweep <= 0.0 || radius <= 0.0 {
            return;
        }
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        let r2 = radius * radius;

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f64 + 0.5 - cx;
                // Image rows grow downwards
                let dy = cy - (py as f64 + 0.5);
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                if sweep >= 360.0 {
                    self.put(px, py, color);
                    continue;
                }
                let angle = dy.atan2(dx).to_degrees();
                let relative = (angle - start).rem_euclid(360.0);
                if relative < sweep {
                    self.put(px, py, color);
                }
            }
        }
    }

    pub fn text_width(text: &str, scale: u32) -> u32 {
        text.chars().count() as u32 * GLYPH_SIZE * scale
    }

    /// Draw text with its top-left corner at (x, y)
    pub fn draw_text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let step = i64::from(GLYPH_SIZE * scale);
        for (i, ch) in text.chars().enumerate() {
            let glyph = glyph(ch);
            let gx = x + i as i64 * step;
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (bits >> col) & 1 == 1 {
                        self.fill_rect(
                            gx + i64::from(col * scale),
                            y + row as i64 * i64::from(scale),
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }

    /// Draw text horizontally centered on `cx`
    pub fn draw_text_centered(&mut self, cx: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let half = i64::from(Self::text_width(text, scale) / 2);
        self.draw_text(cx - half, y, text, scale, color);
    }

    /// Draw text rotated 90 degrees counter-clockwise, reading bottom to top.
    ///
    /// (x, y) is the bottom-left corner of the rotated text block.
    pub fn draw_text_vertical(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let s = i64::from(scale);
        for (i, ch) in text.chars().enumerate() {
            let glyph = glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_SIZE {
                    if (bits >> col) & 1 == 1 {
                        let along = i as i64 * i64::from(GLYPH_SIZE) + i64::from(col) + 1;
                        self.fill_rect(x + row as i64 * s, y - along * s, scale, scale, color);
                    }
                }
            }
        }
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut buf = Vec::new();
        self.image
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
        Ok(buf)
    }
}

fn glyph(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Truncate `text` so it fits in `max_width` pixels at `scale`
pub fn fit_text(text: &str, max_width: u32, scale: u32) -> String {
    let max_chars = (max_width / (GLYPH_SIZE * scale)) as usize;
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars <= 2 {
        return text.chars().take(max_chars).collect();
    }
    let mut out: String = text.chars().take(max_chars - 2).collect();
    out.push_str("..");
    out
}
