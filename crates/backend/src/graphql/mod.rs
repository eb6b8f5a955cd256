use std::sync::Arc;

use async_graphql::{Context, InputObject, Object, SimpleObject, ID};
use markerboard_shared::models::{LatLng, NewMarker, StoredDocument};

use crate::storage::Storage;

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlMarker {
    pub id: ID,
    pub lat: f64,
    pub lng: f64,
    pub label_id: String,
    pub timestamp: Option<String>,
}

impl From<StoredDocument> for GqlMarker {
    fn from(d: StoredDocument) -> Self {
        GqlMarker {
            id: ID(d.id),
            lat: d.document.lat,
            lng: d.document.lng,
            label_id: d.document.label_id,
            timestamp: d.document.timestamp,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlStats {
    pub total_markers: u64,
    pub db_size_bytes: u64,
}

// Input types

#[derive(InputObject)]
pub struct InsertMarkerInput {
    pub lat: f64,
    pub lng: f64,
    pub label_id: String,
}

fn checked_position(lat: f64, lng: f64) -> async_graphql::Result<LatLng> {
    let position = LatLng::new(lat, lng);
    if position.is_valid() {
        Ok(position)
    } else {
        Err(async_graphql::Error::new(format!(
            "Invalid position: {}",
            position
        )))
    }
}

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every marker in the collection, oldest first.
    async fn markers(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<GqlMarker>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let docs = storage.list_markers().map_err(async_graphql::Error::new)?;
        Ok(docs.into_iter().map(GqlMarker::from).collect())
    }

    async fn marker(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<Option<GqlMarker>> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let doc = storage.get_marker(&id).map_err(async_graphql::Error::new)?;
        Ok(doc.map(GqlMarker::from))
    }

    async fn stats(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlStats> {
        let storage = ctx.data::<Arc<Storage>>()?;
        Ok(GqlStats {
            total_markers: storage.count_markers().map_err(async_graphql::Error::new)?,
            db_size_bytes: storage.db_size_bytes().map_err(async_graphql::Error::new)?,
        })
    }
}

// Mutation root

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Insert one marker document. The server assigns id and timestamp.
    async fn insert_marker(
        &self,
        ctx: &Context<'_>,
        input: InsertMarkerInput,
    ) -> async_graphql::Result<GqlMarker> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let position = checked_position(input.lat, input.lng)?;
        if input.label_id.trim().is_empty() {
            return Err(async_graphql::Error::new("Label must not be empty"));
        }

        let stored = storage
            .insert_marker(&NewMarker {
                position,
                label: input.label_id,
            })
            .map_err(async_graphql::Error::new)?;
        tracing::info!(id = %stored.id, label = %stored.document.label_id, "Marker inserted");

        Ok(GqlMarker::from(stored))
    }

    /// Returns false when the marker was already gone.
    async fn delete_marker(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let removed = storage.delete_marker(&id).map_err(async_graphql::Error::new)?;
        tracing::info!(id = %id.as_str(), removed, "Marker deleted");
        Ok(removed)
    }

    /// Delete every marker as one batch. Returns how many were removed.
    async fn delete_all_markers(&self, ctx: &Context<'_>) -> async_graphql::Result<u64> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let count = storage
            .delete_all_markers()
            .map_err(async_graphql::Error::new)?;
        tracing::info!(count, "All markers deleted");
        Ok(count)
    }

    async fn update_marker_position(
        &self,
        ctx: &Context<'_>,
        id: ID,
        lat: f64,
        lng: f64,
    ) -> async_graphql::Result<GqlMarker> {
        let storage = ctx.data::<Arc<Storage>>()?;
        let position = checked_position(lat, lng)?;

        let updated = storage
            .update_marker_position(&id, position)
            .map_err(async_graphql::Error::new)?
            .ok_or_else(|| async_graphql::Error::new("Marker not found"))?;
        tracing::info!(id = %updated.id, %position, "Marker moved");

        Ok(GqlMarker::from(updated))
    }
}

pub type Schema = async_graphql::Schema<QueryRoot, MutationRoot, async_graphql::EmptySubscription>;

pub fn build_schema(storage: Arc<Storage>) -> Schema {
    async_graphql::Schema::build(QueryRoot, MutationRoot, async_graphql::EmptySubscription)
        .data(storage)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_schema() -> (tempfile::TempDir, Schema) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(&dir.path().join("markers.redb")).unwrap();
        (dir, build_schema(storage))
    }

    async fn exec(schema: &Schema, query: &str) -> serde_json::Value {
        let resp = schema.execute(query).await;
        assert!(resp.errors.is_empty(), "unexpected errors: {:?}", resp.errors);
        resp.data.into_json().unwrap()
    }

    async fn insert(schema: &Schema, lat: f64, lng: f64, label: &str) -> String {
        let data = exec(
            schema,
            &format!(
                r#"mutation {{ insertMarker(input: {{ lat: {lat}, lng: {lng}, labelId: "{label}" }}) {{ id }} }}"#
            ),
        )
        .await;
        data["insertMarker"]["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_insert_and_list_markers() {
        let (_dir, schema) = test_schema();
        insert(&schema, 51.5, -0.1, "1").await;
        insert(&schema, 51.6, -0.2, "2").await;

        let data = exec(&schema, "{ markers { id lat lng labelId timestamp } }").await;
        let markers = data["markers"].as_array().unwrap();
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0]["labelId"], "1");
        assert_eq!(markers[0]["lat"], 51.5);
        assert!(markers[0]["timestamp"].is_string());
        assert_eq!(markers[1]["labelId"], "2");
    }

    #[tokio::test]
    async fn test_insert_rejects_invalid_position() {
        let (_dir, schema) = test_schema();
        let resp = schema
            .execute(r#"mutation { insertMarker(input: { lat: 91.0, lng: 0.0, labelId: "1" }) { id } }"#)
            .await;
        assert_eq!(resp.errors.len(), 1);
        assert!(resp.errors[0].message.contains("Invalid position"));
    }

    #[tokio::test]
    async fn test_insert_rejects_empty_label() {
        let (_dir, schema) = test_schema();
        let resp = schema
            .execute(r#"mutation { insertMarker(input: { lat: 1.0, lng: 0.0, labelId: " " }) { id } }"#)
            .await;
        assert_eq!(resp.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_update_marker_position() {
        let (_dir, schema) = test_schema();
        let id = insert(&schema, 1.0, 2.0, "3").await;

        let data = exec(
            &schema,
            &format!(
                r#"mutation {{ updateMarkerPosition(id: "{id}", lat: 10.0, lng: 20.0) {{ lat lng labelId }} }}"#
            ),
        )
        .await;
        assert_eq!(data["updateMarkerPosition"]["lat"], 10.0);
        assert_eq!(data["updateMarkerPosition"]["lng"], 20.0);
        assert_eq!(data["updateMarkerPosition"]["labelId"], "3");
    }

    #[tokio::test]
    async fn test_update_missing_marker_errors() {
        let (_dir, schema) = test_schema();
        let resp = schema
            .execute(r#"mutation { updateMarkerPosition(id: "ghost", lat: 1.0, lng: 1.0) { id } }"#)
            .await;
        assert_eq!(resp.errors[0].message, "Marker not found");
    }

    #[tokio::test]
    async fn test_delete_marker_twice() {
        let (_dir, schema) = test_schema();
        let id = insert(&schema, 1.0, 2.0, "1").await;
        let query = format!(r#"mutation {{ deleteMarker(id: "{id}") }}"#);

        assert_eq!(exec(&schema, &query).await["deleteMarker"], true);
        assert_eq!(exec(&schema, &query).await["deleteMarker"], false);
    }

    #[tokio::test]
    async fn test_delete_all_markers() {
        let (_dir, schema) = test_schema();
        insert(&schema, 1.0, 1.0, "1").await;
        insert(&schema, 2.0, 2.0, "2").await;

        let data = exec(&schema, "mutation { deleteAllMarkers }").await;
        assert_eq!(data["deleteAllMarkers"], 2);

        let data = exec(&schema, "{ markers { id } stats { totalMarkers } }").await;
        assert!(data["markers"].as_array().unwrap().is_empty());
        assert_eq!(data["stats"]["totalMarkers"], 0);
    }

    #[tokio::test]
    async fn test_fetch_single_marker() {
        let (_dir, schema) = test_schema();
        let id = insert(&schema, 1.0, 2.0, "1").await;

        let data = exec(&schema, &format!(r#"{{ marker(id: "{id}") {{ id labelId }} }}"#)).await;
        assert_eq!(data["marker"]["id"], id.as_str());

        let data = exec(&schema, r#"{ marker(id: "ghost") { id } }"#).await;
        assert!(data["marker"].is_null());
    }
}
