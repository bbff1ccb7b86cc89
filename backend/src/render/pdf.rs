//! Single-page PDF output.
//!
//! genpdf links against an older `image` release than the rest of the crate,
//! so the rendered certificate is handed over as a temporary RGB PNG written
//! with the `png` encoder and loaded back by `genpdf::elements::Image`.

use crate::error::{ApiError, Result};
use genpdf::elements::Image as PdfImage;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::{Document, SimplePageDecorator, Size};
use image::{DynamicImage, Rgba, RgbaImage};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use tempfile::NamedTempFile;

const MM_PER_INCH: f64 = 25.4;
/// genpdf refuses elements that exactly fill the printable area.
const PAGE_SLACK_MM: f64 = 1.0;

/// Page size in millimetres for an image of `width` x `height` pixels at `dpi`.
pub fn page_size_mm(width: u32, height: u32, dpi: f64) -> (f64, f64) {
    let to_mm = |px: u32| f64::from(px) / dpi * MM_PER_INCH;
    (to_mm(width), to_mm(height))
}

/// Flattens alpha over white.
fn flatten_to_rgb(image: &RgbaImage) -> image::RgbImage {
    let (w, h) = image.dimensions();
    let mut background = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, image, 0, 0);
    DynamicImage::ImageRgba8(background).to_rgb8()
}

fn write_temp_png(image: &RgbaImage) -> Result<NamedTempFile> {
    let rgb = flatten_to_rgb(image);
    let (w, h) = rgb.dimensions();
    let mut tmp = tempfile::Builder::new().suffix(".png").tempfile()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| ApiError::Render(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgb.as_raw())
            .map_err(|e| ApiError::Render(format!("PNG data: {}", e)))?;
    }
    Ok(tmp)
}

fn font_family(font_bytes: &[u8]) -> Result<FontFamily<FontData>> {
    let data = FontData::new(font_bytes.to_vec(), None)
        .map_err(|e| ApiError::Render(format!("PDF font: {}", e)))?;
    Ok(FontFamily {
        regular: data.clone(),
        bold: data.clone(),
        italic: data.clone(),
        bold_italic: data,
    })
}

/// Encodes `image` as a one-page PDF sized to the image at `dpi`.
pub fn encode_pdf(image: &RgbaImage, dpi: f64, font_bytes: &[u8], title: &str) -> Result<Vec<u8>> {
    let (w_mm, h_mm) = page_size_mm(image.width(), image.height(), dpi);

    let mut doc = Document::new(font_family(font_bytes)?);
    doc.set_title(title);
    doc.set_paper_size(Size::new(w_mm + PAGE_SLACK_MM, h_mm + PAGE_SLACK_MM));
    let mut decorator = SimplePageDecorator::new();
    decorator.set_margins(0);
    doc.set_page_decorator(decorator);

    // Must outlive `render`.
    let tmp = write_temp_png(image)?;
    let mut element = PdfImage::from_path(tmp.path())
        .map_err(|e| ApiError::Render(format!("PDF image: {}", e)))?;
    element.set_dpi(dpi);
    doc.push(element);

    let mut out = Vec::new();
    doc.render(&mut out)
        .map_err(|e| ApiError::Render(format!("PDF: {}", e)))?;
    Ok(out)
}
