/// `GET /v1/places/search?query=` - Kakao keyword search proxy
///
/// Returns `{ "documents": [...] }`, the same shape the provider uses.

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use inyeon_shared::{auth::middleware::AuthContext, models::place::PlaceSearchResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

pub async fn search_places(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<PlaceSearchResponse>> {
    let documents = state.places.search(&query.query).await.map_err(|e| {
        tracing::error!(user_id = %auth.user_id, "Place search failed: {}", e);
        e
    })?;

    Ok(Json(PlaceSearchResponse { documents }))
}
