//! Item echo endpoint

use axum::extract::{Path, Query};
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ItemQuery {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub item_id: i64,
    pub q: Option<String>,
}

/// GET /items/:item_id?q= - echo the id and optional query string
pub async fn read_item(
    Path(item_id): Path<i64>,
    Query(query): Query<ItemQuery>,
) -> Json<ItemResponse> {
    Json(ItemResponse {
        item_id,
        q: query.q,
    })
}
