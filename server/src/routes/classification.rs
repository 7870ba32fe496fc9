//! Fake classification endpoint
//!
//! Not backed by the model: ids above 100 count as a match.

use axum::extract::Path;
use axum::Json;

const MATCH_THRESHOLD: i64 = 100;

/// GET /classification/:picture_id - `true` when `picture_id > 100`
pub async fn classify_picture(Path(picture_id): Path<i64>) -> Json<bool> {
    Json(picture_id > MATCH_THRESHOLD)
}
