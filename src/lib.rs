//! docmark - document annotation workbench core
//!
//! Loads images and PDFs, extracts their text in the background, and keeps
//! every edit (text, summaries, rectangle annotations, adds and removals) in
//! an undo/redo history of immutable snapshots.
//!
//! - [`store::DocumentStore`]: the single mutation surface, with history,
//!   selection, search and change notification
//! - [`workbench::Workbench`]: a store driven by a background
//!   [`worker::ProcessingWorker`] that runs the [`services`]
//! - [`export`]: docx and PDF output

pub mod color_utils;
pub mod config;
pub mod constants;
pub mod export;
pub mod history;
pub mod model;
pub mod preview;
pub mod search;
pub mod services;
pub mod store;
pub mod worker;
pub mod workbench;

pub use config::AppConfig;
pub use model::{Annotation, AnnotationDraft, Document, DocumentId, Rect, Snapshot, SourceFile};
pub use store::{DocumentStore, StoreEvent};
pub use workbench::{Workbench, WorkbenchEvent};
