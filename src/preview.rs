//! Render-ready preview handles for loaded documents.
//!
//! A preview handle is the rendering layer's reference to a document's bytes.
//! Handles are created when a document is added and revoked exactly once, when
//! the document is removed or the store is torn down. Revocation is a resource
//! side effect and is not part of undo history: a document restored by undo
//! after removal keeps its old handle, which no longer resolves.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::model::SourceFile;

/// Reference to a live (or revoked) preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(u64);

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}", self.0)
    }
}

/// Owns the bytes behind every live preview handle.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashMap<PreviewHandle, Arc<[u8]>>,
    next_id: u64,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new handle for a source file.
    pub fn create(&mut self, source: &SourceFile) -> PreviewHandle {
        let handle = PreviewHandle(self.next_id);
        self.next_id += 1;
        self.live.insert(handle, Arc::clone(&source.bytes));
        log::debug!("Created {} for '{}'", handle, source.name);
        handle
    }

    /// Bytes behind a handle, or `None` once it has been revoked.
    pub fn resolve(&self, handle: PreviewHandle) -> Option<Arc<[u8]>> {
        self.live.get(&handle).cloned()
    }

    pub fn is_live(&self, handle: PreviewHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Release a handle. Returns `false` if it was already revoked.
    pub fn revoke(&mut self, handle: PreviewHandle) -> bool {
        let revoked = self.live.remove(&handle).is_some();
        if revoked {
            log::debug!("Revoked {}", handle);
        }
        revoked
    }

    /// Release every live handle.
    pub fn revoke_all(&mut self) -> usize {
        let count = self.live.len();
        self.live.clear();
        if count > 0 {
            log::debug!("Revoked all {} preview handles", count);
        }
        count
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
