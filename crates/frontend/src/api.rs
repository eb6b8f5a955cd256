use std::cell::Cell;

use dioxus::logger::tracing;
use markerboard_shared::models::{LatLng, MarkerDocument, NewMarker, StoredDocument};
use markerboard_shared::sync::{MarkerRepository, RemoteError};
use serde::{Deserialize, Serialize};

/// Used when the page origin can't be read, e.g. outside a browser.
const FALLBACK_ENDPOINT: &str = "http://localhost:3000/graphql";

const MARKER_FIELDS: &str = "id lat lng labelId timestamp";

/// Build the variables JSON for an insert mutation.
pub fn build_insert_variables(marker: &NewMarker) -> serde_json::Value {
    serde_json::json!({
        "input": {
            "lat": marker.position.lat,
            "lng": marker.position.lng,
            "labelId": marker.label,
        }
    })
}

/// Build the variables JSON for a position update.
pub fn build_position_variables(id: &str, position: LatLng) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "lat": position.lat,
        "lng": position.lng,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl<T> GraphQLResponse<T> {
    /// The first reported error wins; a response with neither data nor errors
    /// is a rejection too.
    fn into_result(self) -> Result<T, RemoteError> {
        if let Some(error) = self.errors.and_then(|errors| errors.into_iter().next()) {
            return Err(RemoteError::Rejected(error.message));
        }
        self.data
            .ok_or_else(|| RemoteError::Rejected("No data returned".to_string()))
    }
}

/// The GraphQL endpoint on the page's own origin.
pub fn default_endpoint() -> String {
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .map(|origin| format!("{}/graphql", origin))
        .unwrap_or_else(|| FALLBACK_ENDPOINT.to_string())
}

// Types mirroring the GraphQL schema

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerData {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub label_id: String,
    pub timestamp: Option<String>,
}

impl From<MarkerData> for StoredDocument {
    fn from(m: MarkerData) -> Self {
        StoredDocument {
            id: m.id,
            document: MarkerDocument {
                lat: m.lat,
                lng: m.lng,
                label_id: m.label_id,
                timestamp: m.timestamp,
            },
        }
    }
}

#[derive(Deserialize)]
pub struct MarkersResponse {
    pub markers: Vec<MarkerData>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertMarkerResponse {
    pub insert_marker: MarkerData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMarkerResponse {
    pub delete_marker: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAllMarkersResponse {
    pub delete_all_markers: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMarkerPositionResponse {
    pub update_marker_position: MarkerData,
}

/// [`MarkerRepository`] backed by the server's GraphQL API.
///
/// Lives for as long as the widget does: created with [`connect`](Self::connect)
/// when the board mounts, shut down with [`disconnect`](Self::disconnect) when it
/// unmounts. Calls after that fail with [`RemoteError::Disconnected`].
pub struct GraphQlRepository {
    client: reqwest::Client,
    endpoint: String,
    connected: Cell<bool>,
}

impl GraphQlRepository {
    pub fn connect(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        tracing::debug!(%endpoint, "Connecting marker repository");
        GraphQlRepository {
            client: reqwest::Client::new(),
            endpoint,
            connected: Cell::new(true),
        }
    }

    pub fn disconnect(&self) {
        if self.connected.replace(false) {
            tracing::debug!(endpoint = %self.endpoint, "Marker repository disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    async fn query<T: for<'de> Deserialize<'de>>(
        &self,
        query_str: &str,
        variables: Option<serde_json::Value>,
    ) -> Result<T, RemoteError> {
        if !self.is_connected() {
            return Err(RemoteError::Disconnected);
        }
        let req = GraphQLRequest {
            query: query_str.to_string(),
            variables,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .json(&req)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let gql_resp: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        gql_resp.into_result()
    }
}

impl MarkerRepository for GraphQlRepository {
    async fn insert(&self, marker: &NewMarker) -> Result<StoredDocument, RemoteError> {
        let resp: InsertMarkerResponse = self
            .query(
                &format!(
                    "mutation InsertMarker($input: InsertMarkerInput!) {{ insertMarker(input: $input) {{ {MARKER_FIELDS} }} }}"
                ),
                Some(build_insert_variables(marker)),
            )
            .await?;
        Ok(resp.insert_marker.into())
    }

    async fn delete(&self, id: &str) -> Result<bool, RemoteError> {
        let resp: DeleteMarkerResponse = self
            .query(
                r#"mutation DeleteMarker($id: ID!) { deleteMarker(id: $id) }"#,
                Some(serde_json::json!({ "id": id })),
            )
            .await?;
        Ok(resp.delete_marker)
    }

    async fn delete_all(&self) -> Result<u64, RemoteError> {
        let resp: DeleteAllMarkersResponse = self
            .query(r#"mutation { deleteAllMarkers }"#, None)
            .await?;
        Ok(resp.delete_all_markers)
    }

    async fn update_position(&self, id: &str, position: LatLng) -> Result<(), RemoteError> {
        let _: UpdateMarkerPositionResponse = self
            .query(
                &format!(
                    "mutation UpdateMarkerPosition($id: ID!, $lat: Float!, $lng: Float!) {{ updateMarkerPosition(id: $id, lat: $lat, lng: $lng) {{ {MARKER_FIELDS} }} }}"
                ),
                Some(build_position_variables(id, position)),
            )
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StoredDocument>, RemoteError> {
        let resp: MarkersResponse = self
            .query(&format!("query {{ markers {{ {MARKER_FIELDS} }} }}"), None)
            .await?;
        Ok(resp.markers.into_iter().map(StoredDocument::from).collect())
    }
}
