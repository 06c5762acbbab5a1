//! Local text extraction: PDF text layers and OCR for images.

use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::Command;

use image::{GenericImageView, ImageFormat};

use super::{ExtractionError, RegionRequest, TextExtractor};
use crate::config::OcrConfig;
use crate::model::{DocumentKind, SourceFile};

/// Recognizes text in encoded image bytes (PNG, JPEG, ...).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// OCR through the `tesseract` command-line tool.
///
/// The image is staged in a temporary file and the recognized text is read
/// from the tool's standard output.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    binary: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(binary: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new(&config.tesseract_path, &config.language)
    }

    /// Check whether the configured binary can be launched.
    pub fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Result<String, ExtractionError> {
        let mut staged = tempfile::Builder::new()
            .prefix("docmark-ocr-")
            .suffix(".png")
            .tempfile()?;
        staged.write_all(image_bytes)?;
        staged.flush()?;

        let output = Command::new(&self.binary)
            .arg(staged.path())
            .arg("stdout")
            .args(["-l", &self.language])
            .output()
            .map_err(|e| {
                ExtractionError::OcrUnavailable(format!("{}: {}", self.binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Ocr(stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        log::info!("OCR extracted {} characters", text.len());
        Ok(text)
    }
}

/// Extracts text locally: `pdf-extract` for PDFs, an [`OcrEngine`] for images.
pub struct LocalExtractor {
    ocr: Box<dyn OcrEngine>,
}

impl LocalExtractor {
    pub fn new(ocr: Box<dyn OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        let ocr = TesseractOcr::from_config(config);
        if !ocr.is_available() {
            log::warn!(
                "Tesseract not found at {:?}, image text extraction will fail",
                config.tesseract_path
            );
        }
        Self::new(Box::new(ocr))
    }

    fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractionError::Pdf(e.to_string()))?;
        log::info!("PDF text layer yielded {} characters", text.len());
        Ok(text)
    }
}

impl TextExtractor for LocalExtractor {
    fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError> {
        log::debug!("Extracting text from '{}' ({})", source.name, source.content_type);
        match DocumentKind::from_content_type(&source.content_type) {
            DocumentKind::Image => self.ocr.recognize(&source.bytes),
            DocumentKind::Pdf => Self::extract_pdf(&source.bytes),
        }
    }

    fn extract_region_text(
        &self,
        source: &SourceFile,
        region: &RegionRequest,
    ) -> Result<String, ExtractionError> {
        if DocumentKind::from_content_type(&source.content_type) != DocumentKind::Image {
            return Err(ExtractionError::NotAnImage);
        }

        let cropped = crop_region(&source.bytes, region)?;
        let text = self.ocr.recognize(&cropped)?;
        Ok(text.trim().to_string())
    }
}

/// Crop the requested region out of an encoded image and re-encode it as PNG.
///
/// The rectangle is given in displayed coordinates and scaled by
/// `natural / displayed` on each axis, then clamped to the image bounds.
pub(crate) fn crop_region(
    image_bytes: &[u8],
    region: &RegionRequest,
) -> Result<Vec<u8>, ExtractionError> {
    let img = image::load_from_memory(image_bytes)?;
    let (natural_w, natural_h) = img.dimensions();

    let scale = |natural: u32, displayed: f32| {
        if displayed > 0.0 {
            natural as f32 / displayed
        } else {
            1.0
        }
    };
    let rect = region
        .rect
        .normalized()
        .scaled(
            scale(natural_w, region.displayed_width),
            scale(natural_h, region.displayed_height),
        );

    let x0 = rect.x.max(0.0).floor() as u32;
    let y0 = rect.y.max(0.0).floor() as u32;
    let x1 = ((rect.x + rect.width).ceil().max(0.0) as u32).min(natural_w);
    let y1 = ((rect.y + rect.height).ceil().max(0.0) as u32).min(natural_h);
    if x1 <= x0 || y1 <= y0 {
        return Err(ExtractionError::EmptyRegion);
    }

    let cropped = img.crop_imm(x0, y0, x1 - x0, y1 - y0);
    log::debug!(
        "Cropped region {}x{} at ({}, {}) from {}x{} image",
        x1 - x0,
        y1 - y0,
        x0,
        y0,
        natural_w,
        natural_h
    );

    let mut png = Vec::new();
    cropped.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}
