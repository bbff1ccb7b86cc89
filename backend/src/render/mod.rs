//! Certificate rendering.
//!
//! A certificate is the template background with the value of each text box
//! drawn inside it. Text shrinks 1px at a time until it fits its box width,
//! bounded below by the configured minimum size. The result is encoded as PNG
//! or as a single-page PDF.

mod fonts;
mod pdf;
mod text;

pub use fonts::FontLibrary;
pub use text::{fit_font_size, resolve_text, text_origin};

use crate::config::RenderConfig;
use crate::error::{ApiError, Result};
use ab_glyph::PxScale;
use common::jobs::OutputFormat;
use common::model::template::{parse_hex_color, TextBox};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::collections::HashMap;
use std::io::Cursor;

pub struct Renderer {
    fonts: FontLibrary,
    min_font_size: f32,
    pdf_dpi: f64,
}

/// Decodes a PNG or JPEG background.
pub fn load_background(bytes: &[u8]) -> Result<RgbaImage> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|e| ApiError::FileProcessing(format!("cannot decode template image: {}", e)))
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| ApiError::Render(format!("PNG encoding: {}", e)))?;
    Ok(out.into_inner())
}

impl Renderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            fonts: FontLibrary::new(&config.fonts_dir, &config.font_family),
            min_font_size: config.min_font_size as f32,
            pdf_dpi: config.pdf_dpi,
        }
    }

    pub fn fonts(&self) -> &FontLibrary {
        &self.fonts
    }

    /// Draws every box whose value (or default) is non-empty onto a copy of
    /// `background`. `values` is keyed by template key.
    pub fn render(
        &self,
        background: &RgbaImage,
        boxes: &[TextBox],
        values: &HashMap<String, String>,
    ) -> Result<RgbaImage> {
        let mut canvas = background.clone();
        for tb in boxes {
            let Some(content) = resolve_text(tb, values.get(&tb.key).map(String::as_str)) else {
                continue;
            };
            self.draw_box(&mut canvas, tb, &content)?;
        }
        Ok(canvas)
    }

    fn draw_box(&self, canvas: &mut RgbaImage, tb: &TextBox, content: &str) -> Result<()> {
        let font = self.fonts.font(tb.font_family.as_deref(), tb.bold)?;
        let [r, g, b] = parse_hex_color(&tb.font_color).unwrap_or([0, 0, 0]);

        let size = fit_font_size(tb.font_size, self.min_font_size, tb.width, |s| {
            text_size(PxScale::from(s), &*font, content).0
        });
        let scale = PxScale::from(size);
        let (w, h) = text_size(scale, &*font, content);
        let (x, y) = text_origin(tb, w, h);
        draw_text_mut(canvas, Rgba([r, g, b, 255]), x, y, scale, &*font, content);
        Ok(())
    }

    pub fn encode(&self, image: &RgbaImage, format: OutputFormat, title: &str) -> Result<Vec<u8>> {
        match format {
            OutputFormat::Png => encode_png(image),
            OutputFormat::Pdf => pdf::encode_pdf(
                image,
                self.pdf_dpi,
                &self.fonts.default_regular_bytes()?,
                title,
            ),
        }
    }
}
