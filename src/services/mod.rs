//! External capabilities consumed by the workbench.
//!
//! Text extraction, summarization and translation are long-running and
//! fallible. They are expressed as blocking traits and only ever called from
//! the [`ProcessingWorker`](crate::worker::ProcessingWorker) thread; results
//! re-enter the document store as ordinary mutations.
//!
//! ## Implementations
//!
//! - [`LocalExtractor`]: PDF text layer via `pdf-extract`, images via an
//!   [`OcrEngine`] (the `tesseract` CLI by default)
//! - [`GeminiSummarizer`]: Google Generative Language API
//! - [`LibreTranslator`]: LibreTranslate HTTP API

mod error;
mod extract;
mod summarize;
mod translate;

pub use error::{ExtractionError, SummarizationError, TranslationError};
pub use extract::{LocalExtractor, OcrEngine, TesseractOcr};
pub use summarize::GeminiSummarizer;
pub use translate::LibreTranslator;

use crate::model::{Rect, SourceFile};

/// A region of an image document to OCR, in displayed coordinates.
///
/// The displayed size is the size the preview was rendered at when the region
/// was drawn; it is used to scale the rectangle to the image's natural pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionRequest {
    pub rect: Rect,
    pub displayed_width: f32,
    pub displayed_height: f32,
}

impl RegionRequest {
    pub fn new(rect: Rect, displayed_width: f32, displayed_height: f32) -> Self {
        Self {
            rect,
            displayed_width,
            displayed_height,
        }
    }
}

/// Turns a document (or part of one) into text.
pub trait TextExtractor: Send + Sync {
    /// Extract all text from an image or PDF.
    fn extract_text(&self, source: &SourceFile) -> Result<String, ExtractionError>;

    /// OCR a sub-region of an image document.
    fn extract_region_text(
        &self,
        source: &SourceFile,
        region: &RegionRequest,
    ) -> Result<String, ExtractionError>;
}

/// Produces a concise summary of a text.
pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> Result<String, SummarizationError>;
}

/// Translates text into a target language code (e.g. `hi`).
pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError>;
}
