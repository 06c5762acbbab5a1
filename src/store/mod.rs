//! The document store: the single mutation surface over loaded documents.
//!
//! Every mutation computes a complete next [`Snapshot`] from the present one
//! and commits it to the [`History`], so undo and redo work the same way no
//! matter which collaborator (uploader, text panel, a finished extraction)
//! issued the change. Operations never fail. Mutations that address an
//! unknown document or annotation id are no-ops and commit nothing, which lets
//! late results for removed documents be discarded safely. Mutations on an
//! existing document always commit, even when the content is unchanged.

mod events;
mod selection;


use std::sync::Arc;
use std::sync::mpsc::Receiver;

pub use events::StoreEvent;
pub use selection::Selection;

use crate::history::{History, HistoryConfig};
use crate::model::{
    Annotation, AnnotationDraft, AnnotationId, Document, DocumentId, Snapshot, SourceFile,
};
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::search;
use events::Subscribers;

/// Owns the document collection, its history, the selection and previews.
///
/// Create one per application and pass it by reference to the components
/// that need it. Dropping the store revokes every remaining preview handle.
#[derive(Debug)]
pub struct DocumentStore {
    history: History<Snapshot>,
    selection: Selection,
    previews: PreviewRegistry,
    subscribers: Subscribers,
    next_document_id: u64,
    next_annotation_id: AnnotationId,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// Create an empty store with unbounded history.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            history: History::with_config(Snapshot::default(), config),
            selection: Selection::default(),
            previews: PreviewRegistry::new(),
            subscribers: Subscribers::default(),
            next_document_id: 1,
            next_annotation_id: 1,
        }
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// The present snapshot.
    pub fn snapshot(&self) -> &Snapshot {
        self.history.present()
    }

    pub fn documents(&self) -> &[Document] {
        self.snapshot().documents()
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.snapshot().get(id)
    }

    pub fn current_document_id(&self) -> Option<DocumentId> {
        self.selection.current()
    }

    pub fn current_document(&self) -> Option<&Document> {
        self.selection.current().and_then(|id| self.document(id))
    }

    pub fn search_query(&self) -> &str {
        self.selection.search_query()
    }

    /// Occurrences of the search query in the current document's text.
    pub fn search_matches(&self) -> usize {
        self.current_document()
            .map(|doc| search::count_matches(&doc.text, self.search_query()))
            .unwrap_or(0)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    /// Bytes behind a preview handle, or `None` once it has been revoked.
    pub fn preview(&self, handle: PreviewHandle) -> Option<Arc<[u8]>> {
        self.previews.resolve(handle)
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Current snapshot plus a receiver for all later changes.
    pub fn subscribe(&mut self) -> (Snapshot, Receiver<StoreEvent>) {
        let rx = self.subscribers.subscribe();
        log::debug!("New store subscriber ({} total)", self.subscribers.len());
        (self.snapshot().clone(), rx)
    }

    // ========================================================================
    // Selection and search (not undoable)
    // ========================================================================

    /// Select a document, or clear the selection with `None`.
    ///
    /// Selecting an id that is not in the present snapshot is ignored.
    pub fn select(&mut self, id: Option<DocumentId>) -> bool {
        if let Some(id) = id {
            if !self.snapshot().contains(id) {
                log::debug!("Ignoring selection of unknown document {}", id);
                return false;
            }
        }
        let changed = self.selection.set(id);
        if changed {
            self.publish_selection();
        }
        changed
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        if self.selection.set_search_query(query.into()) {
            self.subscribers
                .publish(StoreEvent::SearchChanged(self.search_query().to_string()));
        }
    }

    // ========================================================================
    // Document mutations
    // ========================================================================

    /// Add one document per file, appended in input order.
    ///
    /// Each new document starts processing with empty text, annotations and
    /// summary. If nothing is selected, the first new document becomes
    /// current. Returns the new ids so callers can start text extraction.
    pub fn add_documents(&mut self, files: Vec<SourceFile>) -> Vec<DocumentId> {
        if files.is_empty() {
            return Vec::new();
        }

        let added: Vec<Document> = files
            .into_iter()
            .map(|source| {
                let id = DocumentId::new(self.next_document_id);
                self.next_document_id += 1;
                let preview = self.previews.create(&source);
                Document::new(id, source, preview)
            })
            .collect();
        let ids: Vec<DocumentId> = added.iter().map(|d| d.id).collect();

        let next = self.snapshot().appended(added);
        self.commit(next, "add documents");
        log::debug!("Added {} document(s): {:?}", ids.len(), ids);

        if self.selection.reconcile_added(ids[0]) {
            self.publish_selection();
        }
        ids
    }

    /// Remove a document and revoke its preview.
    ///
    /// If it was selected, the first remaining document becomes current (or
    /// nothing, when the collection is now empty). The preview revocation is
    /// not undone by [`undo`](Self::undo).
    pub fn remove_document(&mut self, id: DocumentId) -> bool {
        let Some((next, removed)) = self.snapshot().without(id) else {
            log::debug!("Remove ignored: no document {}", id);
            return false;
        };

        self.previews.revoke(removed.preview);
        let reselect = self.selection.reconcile_removed(id, &next);
        self.commit(next, "remove document");
        if reselect {
            self.publish_selection();
        }
        true
    }

    /// Replace a document's text and mark it as no longer processing.
    pub fn update_text(&mut self, id: DocumentId, text: impl Into<String>) -> bool {
        let text = text.into();
        self.update_document(id, "update text", |doc| doc.set_text(text))
    }

    /// Replace a document's summary.
    pub fn update_summary(&mut self, id: DocumentId, summary: impl Into<String>) -> bool {
        let summary = summary.into();
        self.update_document(id, "update summary", |doc| doc.summary = summary)
    }

    /// Append an annotation to a document. Returns the new annotation's id.
    pub fn add_annotation(
        &mut self,
        file_id: DocumentId,
        draft: AnnotationDraft,
    ) -> Option<AnnotationId> {
        if !self.snapshot().contains(file_id) {
            log::debug!("Add annotation ignored: no document {}", file_id);
            return None;
        }

        let annotation_id = self.next_annotation_id;
        self.next_annotation_id += 1;
        let annotation = Annotation::from_draft(annotation_id, draft);
        self.update_document(file_id, "add annotation", |doc| {
            doc.annotations.push(annotation)
        });
        Some(annotation_id)
    }

    /// Remove one annotation from a document.
    pub fn remove_annotation(&mut self, file_id: DocumentId, annotation_id: AnnotationId) -> bool {
        let known = self
            .document(file_id)
            .is_some_and(|doc| doc.annotation(annotation_id).is_some());
        if !known {
            log::debug!(
                "Remove annotation ignored: no annotation {} on {}",
                annotation_id,
                file_id
            );
            return false;
        }

        self.update_document(file_id, "remove annotation", |doc| {
            doc.remove_annotation(annotation_id);
        })
    }

    /// Remove every annotation from a document.
    pub fn clear_annotations(&mut self, file_id: DocumentId) -> bool {
        self.update_document(file_id, "clear annotations", |doc| doc.annotations.clear())
    }

    // ========================================================================
    // Undo / Redo
    // ========================================================================

    /// Restore the previous snapshot. The selection is dropped if the
    /// selected document does not exist there.
    pub fn undo(&mut self) -> bool {
        if !self.history.undo() {
            return false;
        }
        log::debug!("⏪ Undo ({} left)", self.history.undo_count());
        self.after_time_travel();
        true
    }

    /// Re-apply the next undone snapshot. The selection is dropped if the
    /// selected document does not exist there.
    pub fn redo(&mut self) -> bool {
        if !self.history.redo() {
            return false;
        }
        log::debug!("⏩ Redo ({} left)", self.history.redo_count());
        self.after_time_travel();
        true
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn update_document(
        &mut self,
        id: DocumentId,
        what: &str,
        update: impl FnOnce(&mut Document),
    ) -> bool {
        match self.snapshot().updated(id, update) {
            Some(next) => {
                self.commit(next, what);
                true
            }
            None => {
                log::debug!("{} ignored: no document {}", what, id);
                false
            }
        }
    }

    fn commit(&mut self, next: Snapshot, what: &str) {
        self.history.commit(next);
        log::debug!("📝 Committed '{}' ({} in history)", what, self.history.undo_count());
        self.publish_snapshot();
    }

    fn after_time_travel(&mut self) {
        let reselect = self
            .selection
            .reconcile_time_travel(self.history.present());
        self.publish_snapshot();
        if reselect {
            self.publish_selection();
        }
    }

    fn publish_snapshot(&mut self) {
        let snapshot = self.history.present().clone();
        self.subscribers.publish(StoreEvent::SnapshotChanged(snapshot));
    }

    fn publish_selection(&mut self) {
        self.subscribers
            .publish(StoreEvent::SelectionChanged(self.selection.current()));
    }
}

impl Drop for DocumentStore {
    fn drop(&mut self) {
        self.previews.revoke_all();
    }
}
