//! Export of document text and annotated images to files.
//!
//! - [`export_docx`]: text as a Word document, one paragraph per line
//! - [`export_pdf`]: text as a paginated A4 PDF
//! - [`export_annotated`]: an image document with its annotations drawn in,
//!   embedded in a single-page PDF
//!
//! Every exporter writes to the given path and returns it on success.

mod docx;
mod error;
mod pdf;
mod raster;

pub use docx::export_docx;
pub use error::ExportError;
pub use pdf::export_pdf;
pub use raster::{export_annotated, render_annotated};

/// File name up to the first `.`, used to name exported files.
///
/// `report.final.pdf` becomes `report`. A name without a dot is returned
/// unchanged and an empty stem falls back to `document`.
pub fn export_file_stem(name: &str) -> &str {
    let stem = name.split('.').next().unwrap_or(name);
    if stem.is_empty() { "document" } else { stem }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_stem() {
        assert_eq!(export_file_stem("scan.png"), "scan");
        assert_eq!(export_file_stem("report.final.pdf"), "report");
        assert_eq!(export_file_stem("README"), "README");
        assert_eq!(export_file_stem(".hidden"), "document");
    }
}
