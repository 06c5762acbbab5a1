//! Error types for export operations.

use thiserror::Error;

/// Errors that can occur while writing an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error while writing the output file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the docx package failed
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing the document XML failed
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Building the PDF failed
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// The source image could not be decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Annotated export was requested for a document that is not an image
    #[error("Annotated export requires an image document, '{0}' is not one")]
    NotAnImage(String),
}
