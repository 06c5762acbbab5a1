//! Immutable collection snapshots, the unit of undo/redo history.

use std::sync::Arc;

use super::document::{Document, DocumentId};

/// The whole document collection at one point in time.
///
/// Snapshots are never mutated in place; every change produces a new one, so
/// a reader holding a clone never observes a partial update. Document ids are
/// unique within a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    documents: Arc<[Document]>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Snapshot {
    pub fn new(documents: Vec<Document>) -> Self {
        debug_assert!(
            {
                let mut ids: Vec<_> = documents.iter().map(|d| d.id).collect();
                ids.sort();
                ids.windows(2).all(|w| w[0] != w[1])
            },
            "document ids must be unique within a snapshot"
        );
        Self {
            documents: Arc::from(documents),
        }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Document> {
        self.documents.iter()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.get(id).is_some()
    }

    pub fn first_id(&self) -> Option<DocumentId> {
        self.documents.first().map(|d| d.id)
    }

    /// A new snapshot with `added` appended in order.
    pub(crate) fn appended(&self, added: Vec<Document>) -> Self {
        let mut documents = self.documents.to_vec();
        documents.extend(added);
        Self::new(documents)
    }

    /// A new snapshot without document `id`, plus the removed document.
    /// Returns `None` if the document is not present.
    pub(crate) fn without(&self, id: DocumentId) -> Option<(Self, Document)> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let mut documents = self.documents.to_vec();
        let removed = documents.remove(index);
        Some((Self::new(documents), removed))
    }

    /// A new snapshot with document `id` replaced by the result of `update`.
    /// Returns `None` if the document is not present.
    pub(crate) fn updated(
        &self,
        id: DocumentId,
        update: impl FnOnce(&mut Document),
    ) -> Option<Self> {
        let index = self.documents.iter().position(|d| d.id == id)?;
        let mut documents = self.documents.to_vec();
        update(&mut documents[index]);
        Some(Self::new(documents))
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Document;
    type IntoIter = std::slice::Iter<'a, Document>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
