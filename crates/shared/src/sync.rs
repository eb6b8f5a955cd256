//! Remote sync: the client interface to the marker document store, and the
//! executor that turns a [`PendingOp`] into exactly one remote call.
//!
//! There are no retries. A failed call is terminal for its operation and is
//! reported back to the board through [`Board::settle`](crate::board::Board::settle).

use crate::board::PendingOp;
use crate::models::{LatLng, NewMarker, SchemaError, StoredDocument};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
    #[error("invalid document: {0}")]
    Schema(#[from] SchemaError),
    #[error("client is disconnected")]
    Disconnected,
}

/// Client for the remote marker collection.
///
/// Implementations are single-threaded (the widget runs on the browser main
/// thread), so the futures are not required to be `Send`.
#[allow(async_fn_in_trait)]
pub trait MarkerRepository {
    /// Insert one document. The store assigns the id and timestamp.
    async fn insert(&self, marker: &NewMarker) -> Result<StoredDocument, RemoteError>;

    /// Delete one document. Returns whether a document was actually removed.
    async fn delete(&self, id: &str) -> Result<bool, RemoteError>;

    /// Delete every document in the collection as one all-or-nothing batch.
    async fn delete_all(&self) -> Result<u64, RemoteError>;

    /// Update only the `lat`/`lng` fields of one document.
    async fn update_position(&self, id: &str, position: LatLng) -> Result<(), RemoteError>;

    async fn list(&self) -> Result<Vec<StoredDocument>, RemoteError>;
}

/// What the store reported for a successfully executed operation.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    Inserted(StoredDocument),
    Deleted { existed: bool },
    DeletedAll { count: u64 },
    Moved,
    Loaded(Vec<StoredDocument>),
}

/// Run the remote half of `op` against `repo`.
pub async fn execute<R: MarkerRepository>(
    repo: &R,
    op: &PendingOp,
) -> Result<SyncOutcome, RemoteError> {
    match op {
        PendingOp::Add { draft, .. } => repo.insert(draft).await.map(SyncOutcome::Inserted),
        PendingOp::Remove { id } => repo
            .delete(id)
            .await
            .map(|existed| SyncOutcome::Deleted { existed }),
        PendingOp::RemoveAll => repo
            .delete_all()
            .await
            .map(|count| SyncOutcome::DeletedAll { count }),
        PendingOp::Move { id, to, .. } => repo
            .update_position(id, *to)
            .await
            .map(|()| SyncOutcome::Moved),
        PendingOp::Load => repo.list().await.map(SyncOutcome::Loaded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::memory::InMemoryRepository;

    #[tokio::test]
    async fn test_execute_add_inserts_document() {
        let repo = InMemoryRepository::connect();
        let mut board = Board::new();
        let op = board.begin_add(LatLng::new(51.5, -0.1)).unwrap();

        let outcome = execute(&repo, &op).await.unwrap();
        let SyncOutcome::Inserted(stored) = outcome else {
            panic!("expected an insert outcome");
        };
        assert_eq!(stored.document.label_id, "1");
        assert!(stored.document.timestamp.is_some());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_remove_reports_missing_document() {
        let repo = InMemoryRepository::connect();
        let outcome = execute(
            &repo,
            &PendingOp::Remove {
                id: "missing".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(outcome, SyncOutcome::Deleted { existed: false });
    }

    #[tokio::test]
    async fn test_execute_remove_all_counts_documents() {
        let repo = InMemoryRepository::connect();
        repo.seed("a", LatLng::new(1.0, 1.0), "1");
        repo.seed("b", LatLng::new(2.0, 2.0), "2");

        let outcome = execute(&repo, &PendingOp::RemoveAll).await.unwrap();
        assert_eq!(outcome, SyncOutcome::DeletedAll { count: 2 });
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn test_execute_move_updates_only_position() {
        let repo = InMemoryRepository::connect();
        repo.seed("a", LatLng::new(1.0, 1.0), "7");

        let op = PendingOp::Move {
            id: "a".to_string(),
            from: LatLng::new(1.0, 1.0),
            to: LatLng::new(3.0, 4.0),
        };
        assert_eq!(execute(&repo, &op).await.unwrap(), SyncOutcome::Moved);

        let doc = repo.document("a").unwrap();
        assert_eq!(doc.position(), LatLng::new(3.0, 4.0));
        assert_eq!(doc.label_id, "7");
    }

    #[tokio::test]
    async fn test_execute_on_disconnected_client_fails() {
        let repo = InMemoryRepository::connect();
        repo.disconnect();
        let err = execute(&repo, &PendingOp::Load).await.unwrap_err();
        assert_eq!(err, RemoteError::Disconnected);
    }

    #[tokio::test]
    async fn test_execute_passes_through_store_failure() {
        let repo = InMemoryRepository::connect();
        repo.set_failing(true);
        let err = execute(&repo, &PendingOp::RemoveAll).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }
}
