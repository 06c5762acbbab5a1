//! Error types for the external capabilities.
//!
//! None of these are fatal to the document store: the workbench turns them
//! into placeholder text or transient notices.

use thiserror::Error;

/// Text extraction (OCR or PDF parsing) failed.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// PDF text layer could not be read
    #[error("PDF text extraction failed: {0}")]
    Pdf(String),

    /// The OCR engine ran but reported a failure
    #[error("OCR failed: {0}")]
    Ocr(String),

    /// The OCR engine could not be started
    #[error("OCR engine unavailable: {0}")]
    OcrUnavailable(String),

    /// Image bytes could not be decoded or re-encoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error while staging data for the engine
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Region OCR was requested on a document that is not an image
    #[error("Region text extraction requires an image document")]
    NotAnImage,

    /// The requested region does not overlap the image
    #[error("Selected region is empty")]
    EmptyRegion,

    /// The extractor panicked while handling the file
    #[error("Text extraction crashed: {0}")]
    Crashed(String),
}

/// Summary generation failed.
#[derive(Error, Debug)]
pub enum SummarizationError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the request because the quota is exhausted
    #[error("Summarization quota exceeded")]
    Quota,

    /// The backend answered with a non-success status
    #[error("Summarization backend returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, for diagnostics
        body: String,
    },

    /// The response could not be understood
    #[error("Invalid summarization response: {0}")]
    InvalidResponse(String),

    /// The backend returned no text
    #[error("No summary generated")]
    Empty,

    /// No API key is configured
    #[error("Missing API key (set {0})")]
    MissingApiKey(String),

    /// Nothing to summarize
    #[error("Document has no text to summarize")]
    NoText,

    /// No summarizer is configured
    #[error("Summarization is not configured")]
    Unavailable,

    /// The summarizer panicked
    #[error("Summarization crashed: {0}")]
    Crashed(String),
}

/// Translation failed.
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("Translation failed with status: {0}")]
    Status(u16),

    /// The response did not contain a translation
    #[error("Invalid response from translation service: {0}")]
    InvalidResponse(String),

    /// Nothing to translate
    #[error("No text to translate")]
    EmptyInput,

    /// No translator is configured
    #[error("Translation is not configured")]
    Unavailable,

    /// The translator panicked
    #[error("Translation crashed: {0}")]
    Crashed(String),
}
