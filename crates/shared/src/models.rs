use serde::{Deserialize, Serialize};

/// Name of the remote document collection holding marker documents.
pub const COLLECTION: &str = "Quests";

pub const LAT_MIN: f64 = -90.0;
pub const LAT_MAX: f64 = 90.0;
pub const LNG_MIN: f64 = -180.0;
pub const LNG_MAX: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }

    /// Finite and inside the latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (LAT_MIN..=LAT_MAX).contains(&self.lat)
            && (LNG_MIN..=LNG_MAX).contains(&self.lng)
    }

    /// Exact coordinate equality, used for duplicate-location detection.
    pub fn same_place(&self, other: &LatLng) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub position: LatLng,
    pub label: String,
    pub created_at: Option<String>,
}

/// A document in the [`COLLECTION`] collection. The document id is the marker id
/// and is stored alongside, not inside, the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerDocument {
    pub lat: f64,
    pub lng: f64,
    pub label_id: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("document has an empty id")]
    MissingId,
    #[error("document {id} has an empty label")]
    MissingLabel { id: String },
    #[error("document {id} has an invalid position {lat}, {lng}")]
    InvalidPosition { id: String, lat: f64, lng: f64 },
}

impl MarkerDocument {
    pub fn from_marker(marker: &Marker) -> Self {
        MarkerDocument {
            lat: marker.position.lat,
            lng: marker.position.lng,
            label_id: marker.label.clone(),
            timestamp: marker.created_at.clone(),
        }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    /// Validate the document and turn it into a [`Marker`] carrying `id`.
    pub fn into_marker(self, id: impl Into<String>) -> Result<Marker, SchemaError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SchemaError::MissingId);
        }
        if self.label_id.trim().is_empty() {
            return Err(SchemaError::MissingLabel { id });
        }
        let position = self.position();
        if !position.is_valid() {
            return Err(SchemaError::InvalidPosition {
                id,
                lat: self.lat,
                lng: self.lng,
            });
        }
        Ok(Marker {
            id,
            position,
            label: self.label_id,
            created_at: self.timestamp,
        })
    }
}

/// A document together with its id, as returned by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub document: MarkerDocument,
}

impl StoredDocument {
    pub fn into_marker(self) -> Result<Marker, SchemaError> {
        self.document.into_marker(self.id)
    }
}

/// A marker the client wants inserted. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMarker {
    pub position: LatLng,
    pub label: String,
}

impl NewMarker {
    pub fn to_document(&self, timestamp: Option<String>) -> MarkerDocument {
        MarkerDocument {
            lat: self.position.lat,
            lng: self.position.lng,
            label_id: self.label.clone(),
            timestamp,
        }
    }
}

/// Generate a fresh document id for a newly inserted marker.
#[cfg(feature = "uuid-support")]
pub fn new_document_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
