//! Non-undoable UI state kept consistent with the document collection.

use crate::model::{DocumentId, Snapshot};

/// Current document pointer and search query.
///
/// Neither field is part of undo history. The current document, when set,
/// always refers to a document in the store's present snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    current: Option<DocumentId>,
    search_query: String,
}

impl Selection {
    pub fn current(&self) -> Option<DocumentId> {
        self.current
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    /// Point at `id` (or nothing). Returns whether the selection changed.
    pub(crate) fn set(&mut self, id: Option<DocumentId>) -> bool {
        if self.current == id {
            return false;
        }
        self.current = id;
        true
    }

    pub(crate) fn set_search_query(&mut self, query: String) -> bool {
        if self.search_query == query {
            return false;
        }
        self.search_query = query;
        true
    }

    /// After documents were added: select the first new one if nothing is selected.
    pub(crate) fn reconcile_added(&mut self, first_added: DocumentId) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.set(Some(first_added))
    }

    /// After `removed` left the collection: if it was selected, fall back to
    /// the first remaining document, or to nothing.
    pub(crate) fn reconcile_removed(&mut self, removed: DocumentId, remaining: &Snapshot) -> bool {
        if self.current != Some(removed) {
            return false;
        }
        self.set(remaining.first_id())
    }

    /// After undo or redo: keep the selection only if it still exists.
    ///
    /// Unlike removal this never picks another document; an empty selection is
    /// preferred over jumping to an unrelated one.
    pub(crate) fn reconcile_time_travel(&mut self, present: &Snapshot) -> bool {
        match self.current {
            Some(id) if !present.contains(id) => self.set(None),
            _ => false,
        }
    }
}
