use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::matchmaking::SharedMatchmaker;

/// GET /health
pub async fn health_check(Extension(matchmaker): Extension<SharedMatchmaker>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "waitingPlayers": matchmaker.waiting_count().await,
    }))
}
