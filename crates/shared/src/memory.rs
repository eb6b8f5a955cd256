//! In-memory marker store standing in for the remote collection in tests.

use std::cell::{Cell, RefCell};

use crate::models::{LatLng, MarkerDocument, NewMarker, StoredDocument};
use crate::sync::{MarkerRepository, RemoteError};

pub struct InMemoryRepository {
    docs: RefCell<Vec<StoredDocument>>,
    connected: Cell<bool>,
    failing: Cell<bool>,
    seq: Cell<u64>,
}

impl InMemoryRepository {
    pub fn connect() -> Self {
        InMemoryRepository {
            docs: RefCell::new(Vec::new()),
            connected: Cell::new(true),
            failing: Cell::new(false),
            seq: Cell::new(0),
        }
    }

    pub fn disconnect(&self) {
        self.connected.set(false);
    }

    /// While set, every call fails with a transport error and changes nothing.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn len(&self) -> usize {
        self.docs.borrow().len()
    }

    pub fn document(&self, id: &str) -> Option<MarkerDocument> {
        self.docs
            .borrow()
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.document.clone())
    }

    /// Put a document straight into the store, bypassing the client calls.
    pub fn seed(&self, id: &str, position: LatLng, label: &str) {
        let timestamp = self.next_timestamp();
        self.docs.borrow_mut().push(StoredDocument {
            id: id.to_string(),
            document: MarkerDocument {
                lat: position.lat,
                lng: position.lng,
                label_id: label.to_string(),
                timestamp: Some(timestamp),
            },
        });
    }

    pub fn seed_raw(&self, stored: StoredDocument) {
        self.docs.borrow_mut().push(stored);
    }

    fn next_timestamp(&self) -> String {
        let n = self.seq.get() + 1;
        self.seq.set(n);
        format!("2024-01-01T00:00:00.{n:06}Z")
    }

    fn check(&self) -> Result<(), RemoteError> {
        if !self.connected.get() {
            return Err(RemoteError::Disconnected);
        }
        if self.failing.get() {
            return Err(RemoteError::Transport("connection reset".to_string()));
        }
        Ok(())
    }
}

impl MarkerRepository for InMemoryRepository {
    async fn insert(&self, marker: &NewMarker) -> Result<StoredDocument, RemoteError> {
        self.check()?;
        let id = format!("doc-{}", self.seq.get() + 1);
        let stored = StoredDocument {
            id,
            document: marker.to_document(Some(self.next_timestamp())),
        };
        self.docs.borrow_mut().push(stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> Result<bool, RemoteError> {
        self.check()?;
        let mut docs = self.docs.borrow_mut();
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }

    async fn delete_all(&self) -> Result<u64, RemoteError> {
        self.check()?;
        let mut docs = self.docs.borrow_mut();
        let count = docs.len() as u64;
        docs.clear();
        Ok(count)
    }

    async fn update_position(&self, id: &str, position: LatLng) -> Result<(), RemoteError> {
        self.check()?;
        let mut docs = self.docs.borrow_mut();
        let doc = docs
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| RemoteError::Rejected(format!("no document {id}")))?;
        doc.document.lat = position.lat;
        doc.document.lng = position.lng;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, RemoteError> {
        self.check()?;
        Ok(self.docs.borrow().clone())
    }
}
