use markerboard_shared::models::{
    self, LatLng, MarkerDocument, NewMarker, StoredDocument, COLLECTION,
};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Marker documents keyed by document id, stored as JSON.
const MARKERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new(COLLECTION);

pub struct Storage {
    db: Database,
    path: PathBuf,
}

fn decode(id: &str, bytes: &[u8]) -> Result<StoredDocument, String> {
    let document: MarkerDocument = serde_json::from_slice(bytes)
        .map_err(|e| format!("Corrupt document {}: {}", id, e))?;
    Ok(StoredDocument {
        id: id.to_string(),
        document,
    })
}

impl Storage {
    pub fn open(path: &Path) -> Result<Arc<Self>, String> {
        let db = Database::create(path)
            .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;

        // Ensure table exists
        let write_txn = db.begin_write().map_err(|e| e.to_string())?;
        {
            write_txn
                .open_table(MARKERS_TABLE)
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;

        Ok(Arc::new(Storage {
            db,
            path: path.to_path_buf(),
        }))
    }

    /// Insert a new document with a generated id and the current server time.
    pub fn insert_marker(&self, marker: &NewMarker) -> Result<StoredDocument, String> {
        let stored = StoredDocument {
            id: models::new_document_id(),
            document: marker.to_document(Some(chrono::Utc::now().to_rfc3339())),
        };
        self.put(&stored)?;
        Ok(stored)
    }

    fn put(&self, stored: &StoredDocument) -> Result<(), String> {
        let json = serde_json::to_vec(&stored.document).map_err(|e| e.to_string())?;

        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        {
            let mut table = write_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;
            table
                .insert(stored.id.as_str(), json.as_slice())
                .map_err(|e| e.to_string())?;
        }
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn get_marker(&self, id: &str) -> Result<Option<StoredDocument>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;

        match table.get(id).map_err(|e| e.to_string())? {
            Some(value) => decode(id, value.value()).map(Some),
            None => Ok(None),
        }
    }

    /// All documents, oldest first. Documents that fail to decode are skipped.
    pub fn list_markers(&self) -> Result<Vec<StoredDocument>, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;

        let mut docs = Vec::new();
        for entry in table.iter().map_err(|e| e.to_string())? {
            let (key, value) = entry.map_err(|e| e.to_string())?;
            match decode(key.value(), value.value()) {
                Ok(stored) => docs.push(stored),
                Err(e) => tracing::warn!(error = %e, "Skipping unreadable marker document"),
            }
        }
        docs.sort_by(|a, b| a.document.timestamp.cmp(&b.document.timestamp));
        Ok(docs)
    }

    pub fn count_markers(&self) -> Result<u64, String> {
        let read_txn = self.db.begin_read().map_err(|e| e.to_string())?;
        let table = read_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;
        table.len().map_err(|e| e.to_string())
    }

    pub fn db_size_bytes(&self) -> Result<u64, String> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| e.to_string())
    }

    /// Set `lat`/`lng` of one document, leaving every other field alone.
    /// Returns `None` when the document does not exist.
    pub fn update_marker_position(
        &self,
        id: &str,
        position: LatLng,
    ) -> Result<Option<StoredDocument>, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let updated = {
            let mut table = write_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;
            let existing = table
                .get(id)
                .map_err(|e| e.to_string())?
                .map(|v| v.value().to_vec());
            match existing {
                Some(bytes) => {
                    let mut stored = decode(id, &bytes)?;
                    stored.document.lat = position.lat;
                    stored.document.lng = position.lng;
                    let json = serde_json::to_vec(&stored.document).map_err(|e| e.to_string())?;
                    table
                        .insert(id, json.as_slice())
                        .map_err(|e| e.to_string())?;
                    Some(stored)
                }
                None => None,
            }
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(updated)
    }

    pub fn delete_marker(&self, id: &str) -> Result<bool, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let removed = {
            let mut table = write_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;
            let result = table.remove(id).map_err(|e| e.to_string())?;
            result.is_some()
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(removed)
    }

    /// Delete every document in one write transaction. Any error aborts the
    /// transaction, leaving the collection untouched.
    pub fn delete_all_markers(&self) -> Result<u64, String> {
        let write_txn = self.db.begin_write().map_err(|e| e.to_string())?;
        let count = {
            let mut table = write_txn.open_table(MARKERS_TABLE).map_err(|e| e.to_string())?;
            let mut ids = Vec::new();
            for entry in table.iter().map_err(|e| e.to_string())? {
                let (key, _) = entry.map_err(|e| e.to_string())?;
                ids.push(key.value().to_string());
            }
            for id in &ids {
                table.remove(id.as_str()).map_err(|e| e.to_string())?;
            }
            ids.len() as u64
        };
        write_txn.commit().map_err(|e| e.to_string())?;
        Ok(count)
    }
}
