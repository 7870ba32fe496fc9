//! Greeting endpoint

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct Greeting {
    #[serde(rename = "Hello")]
    pub hello: String,
}

/// GET / - fixed greeting
pub async fn read_root() -> Json<Greeting> {
    Json(Greeting {
        hello: "World".to_string(),
    })
}
