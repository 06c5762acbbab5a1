//! Data models for docmark.

mod annotation;
mod document;
mod snapshot;

pub use annotation::{Annotation, AnnotationDraft, AnnotationId, Rect};
pub use document::{
    Document, DocumentId, DocumentKind, SourceFile, content_type_for_name,
    is_supported_content_type,
};
pub use snapshot::Snapshot;
