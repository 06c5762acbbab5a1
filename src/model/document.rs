//! Loaded documents and their derived state.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::annotation::{Annotation, AnnotationId};
use crate::constants::{IMAGE_CONTENT_PREFIX, PDF_CONTENT_TYPE};
use crate::preview::PreviewHandle;

/// Opaque identifier of a document, stable for the document's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(u64);

impl DocumentId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// Kind of a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    /// Classify by content type: `image/*` is an image, everything else a PDF.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with(IMAGE_CONTENT_PREFIX) {
            DocumentKind::Image
        } else {
            DocumentKind::Pdf
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DocumentKind::Image => "image",
            DocumentKind::Pdf => "pdf",
        }
    }
}

/// Whether the uploader accepts a file of this content type.
pub fn is_supported_content_type(content_type: &str) -> bool {
    content_type.starts_with(IMAGE_CONTENT_PREFIX) || content_type == PDF_CONTENT_TYPE
}

/// Guess a content type from a file name's extension.
pub fn content_type_for_name(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => PDF_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}

/// An uploaded file: name, content type, and its bytes.
///
/// The bytes are shared between every snapshot that contains the document.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes: Arc::from(bytes),
        }
    }

    /// Read a file from disk, guessing its content type from the extension.
    pub fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let content_type = content_type_for_name(&name);
        Ok(Self::new(name, content_type, bytes))
    }
}

/// One loaded file plus its extracted text, annotations and summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub source: SourceFile,
    /// Render-ready preview, owned by this document and revoked on removal.
    pub preview: PreviewHandle,
    pub kind: DocumentKind,
    /// Extracted (and possibly edited) text; empty until extraction completes.
    pub text: String,
    /// True from creation until the first text update.
    pub is_processing: bool,
    /// Annotations in insertion order.
    pub annotations: Vec<Annotation>,
    pub summary: String,
}

impl Document {
    pub(crate) fn new(id: DocumentId, source: SourceFile, preview: PreviewHandle) -> Self {
        let kind = DocumentKind::from_content_type(&source.content_type);
        Self {
            id,
            source,
            preview,
            kind,
            text: String::new(),
            is_processing: true,
            annotations: Vec::new(),
            summary: String::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.source.name
    }

    pub fn is_image(&self) -> bool {
        self.kind == DocumentKind::Image
    }

    /// Replace the text; any text update ends processing.
    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
        self.is_processing = false;
    }

    pub fn annotation(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub(crate) fn remove_annotation(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }
}
