//! The marker board: the in-memory marker store, its selection cursor, the
//! error banner and the status of the last remote operation.
//!
//! Every store operation is split in two. `begin_*` validates the request,
//! applies any optimistic change and returns a [`PendingOp`]; the caller runs
//! it against the remote store (see [`crate::sync::execute`]) and hands the
//! result to [`Board::settle`], which commits it or records the failure.
//! Adds and removes only touch memory once the store has confirmed them.
//! Moves are applied optimistically.
//!
//! An add that is still in flight already holds its location and its label:
//! a second click on the same spot is a duplicate, and the next add gets the
//! label after it. [`Board::status`] reports an operation as pending for as
//! long as any operation is outstanding.
//!
//! Nothing guards against two operations on the same marker racing each
//! other (a drag-end and a delete fired back to back, say). Their relative
//! order is unspecified.

use std::time::Duration;

use crate::labels;
use crate::models::{LatLng, Marker, NewMarker, StoredDocument};
use crate::sync::{RemoteError, SyncOutcome};

/// How long a transient banner stays up.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(3);

pub const MSG_DUPLICATE_LOCATION: &str = "You can't add a marker in the same place!";
pub const MSG_INVALID_COORDINATE: &str = "That location is outside the map.";
pub const MSG_NOT_FOUND: &str = "That marker no longer exists.";
pub const MSG_PERSISTENCE_FAILURE: &str = "Failed to save your change. Try again.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardError {
    #[error("a marker already exists at {0}")]
    DuplicateLocation(LatLng),
    #[error("position {0} is outside the valid range")]
    InvalidCoordinate(LatLng),
    #[error("marker {0} not found")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] RemoteError),
}

impl BoardError {
    pub fn banner_message(&self) -> &'static str {
        match self {
            BoardError::DuplicateLocation(_) => MSG_DUPLICATE_LOCATION,
            BoardError::InvalidCoordinate(_) => MSG_INVALID_COORDINATE,
            BoardError::NotFound(_) => MSG_NOT_FOUND,
            BoardError::PersistenceFailure(_) => MSG_PERSISTENCE_FAILURE,
        }
    }

    /// User-correctable rejections time out; persistence failures stay until
    /// the next successful operation.
    pub fn banner_kind(&self) -> BannerKind {
        match self {
            BoardError::PersistenceFailure(_) => BannerKind::Persistent,
            _ => BannerKind::Transient,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Transient,
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: &'static str,
    pub kind: BannerKind,
    pub generation: u64,
}

impl Banner {
    pub fn auto_clear_after(&self) -> Option<Duration> {
        match self.kind {
            BannerKind::Transient => Some(BANNER_TIMEOUT),
            BannerKind::Persistent => None,
        }
    }
}

/// What to do with an optimistic move the store refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovePolicy {
    /// Leave the marker where the user dropped it. Memory and store diverge
    /// until the next successful write to that marker.
    #[default]
    KeepOptimistic,
    /// Put the marker back where it was, if it still sits at the attempted position.
    RevertOnFailure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Remove,
    RemoveAll,
    Move,
    Load,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpStatus {
    #[default]
    Idle,
    Pending(OpKind),
    Committed(OpKind),
    Failed(OpKind),
}

/// An operation that has begun locally and awaits its remote outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp {
    Add {
        provisional_id: String,
        draft: NewMarker,
    },
    Remove {
        id: String,
    },
    RemoveAll,
    Move {
        id: String,
        from: LatLng,
        to: LatLng,
    },
    Load,
}

impl PendingOp {
    pub fn kind(&self) -> OpKind {
        match self {
            PendingOp::Add { .. } => OpKind::Add,
            PendingOp::Remove { .. } => OpKind::Remove,
            PendingOp::RemoveAll => OpKind::RemoveAll,
            PendingOp::Move { .. } => OpKind::Move,
            PendingOp::Load => OpKind::Load,
        }
    }
}

/// Gestures forwarded by the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    MapClick(LatLng),
    MarkerDragStart { id: String },
    MarkerDragMove { id: String, position: LatLng },
    MarkerDragEnd { id: String, position: LatLng },
    MarkerClick { id: String },
}

/// One marker as the surface should draw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    pub id: String,
    pub position: LatLng,
    /// Empty for the selected marker.
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
struct DragPreview {
    id: String,
    position: LatLng,
}

/// An add the store has not confirmed yet.
#[derive(Debug, Clone, PartialEq)]
struct InFlightAdd {
    provisional_id: String,
    position: LatLng,
    label: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    markers: Vec<Marker>,
    selected: Option<String>,
    /// Counter over live markers only; see [`Board::next_label`].
    next_label: u32,
    banner: Option<Banner>,
    banner_generation: u64,
    /// Status of the last settled operation.
    status: OpStatus,
    in_flight: Vec<OpKind>,
    pending_adds: Vec<InFlightAdd>,
    drag: Option<DragPreview>,
    move_policy: MovePolicy,
    provisional_seq: u64,
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board::with_policy(MovePolicy::default())
    }

    pub fn with_policy(move_policy: MovePolicy) -> Self {
        Board {
            markers: Vec::new(),
            selected: None,
            next_label: 1,
            banner: None,
            banner_generation: 0,
            status: OpStatus::Idle,
            in_flight: Vec::new(),
            pending_adds: Vec::new(),
            drag: None,
            move_policy,
            provisional_seq: 0,
        }
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn marker(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected_marker(&self) -> Option<&Marker> {
        self.selected.as_deref().and_then(|id| self.marker(id))
    }

    /// The label the next added marker will get. Labels held by adds still
    /// in flight are skipped.
    pub fn next_label(&self) -> u32 {
        self.pending_adds
            .iter()
            .map(|p| p.label.saturating_add(1))
            .fold(self.next_label, u32::max)
    }

    pub fn banner(&self) -> Option<&Banner> {
        self.banner.as_ref()
    }

    /// `Pending` while any operation is outstanding (a load takes precedence),
    /// otherwise the outcome of the last one to settle.
    pub fn status(&self) -> OpStatus {
        if self.in_flight.contains(&OpKind::Load) {
            return OpStatus::Pending(OpKind::Load);
        }
        match self.in_flight.last() {
            Some(kind) => OpStatus::Pending(*kind),
            None => self.status,
        }
    }

    /// Number of operations begun but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn move_policy(&self) -> MovePolicy {
        self.move_policy
    }

    // -----------------------------------------------------------------------
    // Begin
    // -----------------------------------------------------------------------

    pub fn begin_add(&mut self, position: LatLng) -> Result<PendingOp, BoardError> {
        if !position.is_valid() {
            return Err(self.reject(BoardError::InvalidCoordinate(position)));
        }
        let occupied = self.markers.iter().any(|m| m.position.same_place(&position))
            || self.pending_adds.iter().any(|p| p.position.same_place(&position));
        if occupied {
            return Err(self.reject(BoardError::DuplicateLocation(position)));
        }
        self.provisional_seq += 1;
        let provisional_id = format!("pending-{}", self.provisional_seq);
        let label = self.next_label();
        self.pending_adds.push(InFlightAdd {
            provisional_id: provisional_id.clone(),
            position,
            label,
        });
        self.in_flight.push(OpKind::Add);
        Ok(PendingOp::Add {
            provisional_id,
            draft: NewMarker {
                position,
                label: labels::format_label(label),
            },
        })
    }

    pub fn begin_remove(&mut self, id: &str) -> Result<PendingOp, BoardError> {
        if self.marker(id).is_none() {
            return Err(self.reject(BoardError::NotFound(id.to_string())));
        }
        self.in_flight.push(OpKind::Remove);
        Ok(PendingOp::Remove { id: id.to_string() })
    }

    /// Remove whichever marker is selected.
    pub fn begin_remove_selected(&mut self) -> Result<PendingOp, BoardError> {
        match self.selected.clone() {
            Some(id) => self.begin_remove(&id),
            None => Err(self.reject(BoardError::NotFound(String::new()))),
        }
    }

    pub fn begin_remove_all(&mut self) -> PendingOp {
        self.in_flight.push(OpKind::RemoveAll);
        PendingOp::RemoveAll
    }

    /// Move a marker. The new position is applied to memory right away.
    pub fn begin_move(&mut self, id: &str, to: LatLng) -> Result<PendingOp, BoardError> {
        if !to.is_valid() {
            return Err(self.reject(BoardError::InvalidCoordinate(to)));
        }
        let Some(marker) = self.markers.iter_mut().find(|m| m.id == id) else {
            return Err(self.reject(BoardError::NotFound(id.to_string())));
        };
        let from = marker.position;
        marker.position = to;
        self.in_flight.push(OpKind::Move);
        Ok(PendingOp::Move {
            id: id.to_string(),
            from,
            to,
        })
    }

    pub fn begin_load(&mut self) -> PendingOp {
        self.in_flight.push(OpKind::Load);
        PendingOp::Load
    }

    /// Toggle the selection cursor. Unknown ids are ignored.
    pub fn select(&mut self, id: &str) {
        if self.marker(id).is_none() {
            return;
        }
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        } else {
            self.selected = Some(id.to_string());
        }
    }

    // -----------------------------------------------------------------------
    // Settle
    // -----------------------------------------------------------------------

    /// Apply the remote outcome of `op`.
    pub fn settle(
        &mut self,
        op: PendingOp,
        result: Result<SyncOutcome, RemoteError>,
    ) -> Result<(), BoardError> {
        let kind = op.kind();
        self.finish(&op);
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fail(op, err)),
        };

        match (op, outcome) {
            (op @ PendingOp::Add { .. }, SyncOutcome::Inserted(stored)) => {
                let marker = match stored.into_marker() {
                    Ok(marker) => marker,
                    Err(err) => return Err(self.fail(op, err.into())),
                };
                let committed = labels::parse_label(&marker.label).saturating_add(1);
                self.next_label = self.next_label.max(committed);
                if self.marker(&marker.id).is_some() {
                    // A load that settled first already brought it in
                    tracing::debug!(id = %marker.id, "Added marker already on the board");
                } else {
                    tracing::debug!(id = %marker.id, label = %marker.label, "Marker added");
                    self.markers.push(marker);
                }
            }
            (PendingOp::Remove { id }, SyncOutcome::Deleted { existed }) => {
                if !existed {
                    tracing::debug!(%id, "Marker was already gone from the store");
                }
                self.markers.retain(|m| m.id != id);
                if self.selected.as_deref() == Some(id.as_str()) {
                    self.selected = None;
                }
                if self.drag.as_ref().is_some_and(|d| d.id == id) {
                    self.drag = None;
                }
                self.recompute_next_label();
            }
            (PendingOp::RemoveAll, SyncOutcome::DeletedAll { count }) => {
                tracing::debug!(count, "All markers removed");
                self.markers.clear();
                self.selected = None;
                self.drag = None;
                self.next_label = 1;
            }
            (PendingOp::Move { .. }, SyncOutcome::Moved) => {}
            (PendingOp::Load, SyncOutcome::Loaded(docs)) => self.hydrate(docs),
            (op, outcome) => {
                let err = RemoteError::Rejected(format!(
                    "unexpected {outcome:?} for {:?}",
                    op.kind()
                ));
                return Err(self.fail(op, err));
            }
        }

        self.status = OpStatus::Committed(kind);
        self.banner = None;
        Ok(())
    }

    /// Dispatch a surface gesture. Returns the operation to run remotely, if any.
    pub fn handle(&mut self, event: SurfaceEvent) -> Result<Option<PendingOp>, BoardError> {
        match event {
            SurfaceEvent::MapClick(position) => self.begin_add(position).map(Some),
            SurfaceEvent::MarkerDragStart { id } => {
                if let Some(marker) = self.marker(&id) {
                    self.drag = Some(DragPreview {
                        position: marker.position,
                        id,
                    });
                }
                Ok(None)
            }
            SurfaceEvent::MarkerDragMove { id, position } => {
                if let Some(drag) = self.drag.as_mut().filter(|d| d.id == id) {
                    drag.position = position;
                }
                Ok(None)
            }
            SurfaceEvent::MarkerDragEnd { id, position } => {
                self.drag = None;
                self.begin_move(&id, position).map(Some)
            }
            SurfaceEvent::MarkerClick { id } => {
                self.select(&id);
                Ok(None)
            }
        }
    }

    /// Marker list for the surface. A marker being dragged shows at its drag position.
    pub fn render(&self) -> Vec<RenderedMarker> {
        self.markers
            .iter()
            .map(|m| {
                let selected = self.selected.as_deref() == Some(m.id.as_str());
                let position = match &self.drag {
                    Some(d) if d.id == m.id => d.position,
                    _ => m.position,
                };
                RenderedMarker {
                    id: m.id.clone(),
                    position,
                    label: if selected { String::new() } else { m.label.clone() },
                    selected,
                }
            })
            .collect()
    }

    /// Clear the banner if it is still the transient one from `generation`.
    /// Returns whether it was cleared.
    pub fn expire_banner(&mut self, generation: u64) -> bool {
        match &self.banner {
            Some(b) if b.generation == generation && b.kind == BannerKind::Transient => {
                self.banner = None;
                true
            }
            _ => false,
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    /// Drop `op` from the in-flight bookkeeping. Safe to call more than once.
    fn finish(&mut self, op: &PendingOp) {
        let kind = op.kind();
        if let Some(at) = self.in_flight.iter().position(|k| *k == kind) {
            self.in_flight.remove(at);
        }
        if let PendingOp::Add { provisional_id, .. } = op {
            self.pending_adds.retain(|p| p.provisional_id != *provisional_id);
        }
    }

    fn raise(&mut self, err: &BoardError) {
        self.banner_generation += 1;
        self.banner = Some(Banner {
            message: err.banner_message(),
            kind: err.banner_kind(),
            generation: self.banner_generation,
        });
    }

    fn reject(&mut self, err: BoardError) -> BoardError {
        tracing::info!(error = %err, "Rejected marker operation");
        self.raise(&err);
        err
    }

    fn fail(&mut self, op: PendingOp, err: RemoteError) -> BoardError {
        let kind = op.kind();
        tracing::error!(?kind, error = %err, "Remote marker operation failed");
        if let (MovePolicy::RevertOnFailure, PendingOp::Move { id, from, to }) =
            (self.move_policy, &op)
        {
            if let Some(marker) = self.markers.iter_mut().find(|m| m.id == *id) {
                if marker.position.same_place(to) {
                    marker.position = *from;
                }
            }
        }
        let err = BoardError::PersistenceFailure(err);
        self.raise(&err);
        self.status = OpStatus::Failed(kind);
        err
    }

    fn recompute_next_label(&mut self) {
        self.next_label = labels::next_label(self.markers.iter().map(|m| m.label.as_str()));
    }

    /// Replace memory with the validated documents, oldest first.
    fn hydrate(&mut self, docs: Vec<StoredDocument>) {
        let mut valid: Vec<Marker> = Vec::with_capacity(docs.len());
        for stored in docs {
            match stored.into_marker() {
                Ok(marker) => valid.push(marker),
                Err(err) => tracing::warn!(error = %err, "Skipping invalid marker document"),
            }
        }
        valid.sort_by(|a, b| {
            (a.created_at.is_none(), &a.created_at).cmp(&(b.created_at.is_none(), &b.created_at))
        });

        // The oldest document wins a shared location
        let mut markers: Vec<Marker> = Vec::with_capacity(valid.len());
        for marker in valid {
            if markers.iter().any(|m| m.position.same_place(&marker.position)) {
                tracing::warn!(id = %marker.id, "Skipping marker document at an occupied location");
                continue;
            }
            markers.push(marker);
        }
        self.markers = markers;
        if self.selected_marker().is_none() {
            self.selected = None;
        }
        self.drag = None;
        self.recompute_next_label();
    }
}
