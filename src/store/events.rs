//! Change notifications published by the document store.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::model::{DocumentId, Snapshot};

/// A change observed by subscribers of a [`DocumentStore`](super::DocumentStore).
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// The present snapshot was replaced (by a mutation, undo or redo)
    SnapshotChanged(Snapshot),
    /// The current document changed
    SelectionChanged(Option<DocumentId>),
    /// The search query changed
    SearchChanged(String),
}

/// Fan-out of store events to any number of receivers.
#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<Sender<StoreEvent>>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        rx
    }

    /// Send `event` to every subscriber, dropping those whose receiver is gone.
    pub(crate) fn publish(&mut self, event: StoreEvent) {
        let before = self.senders.len();
        self.senders.retain(|tx| tx.send(event.clone()).is_ok());
        let dropped = before - self.senders.len();
        if dropped > 0 {
            log::debug!("Pruned {} closed store subscriber(s)", dropped);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.senders.len()
    }
}
