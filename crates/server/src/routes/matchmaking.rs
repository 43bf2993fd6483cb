use axum::{Extension, Json};
use serde_json::{json, Value as JsonValue};

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::matchmaking::{MatchStatus, SharedMatchmaker};

/// POST /api/match/request
pub async fn request_match(
    Extension(matchmaker): Extension<SharedMatchmaker>,
    user: AuthUser,
) -> Result<Json<MatchStatus>, AppError> {
    Ok(Json(matchmaker.request_match(user.id).await?))
}

/// GET /api/match/poll
pub async fn poll_match(
    Extension(matchmaker): Extension<SharedMatchmaker>,
    user: AuthUser,
) -> Json<MatchStatus> {
    Json(matchmaker.poll_match(user.id).await)
}

/// POST /api/match/cancel
pub async fn cancel_match(
    Extension(matchmaker): Extension<SharedMatchmaker>,
    user: AuthUser,
) -> Json<JsonValue> {
    let cancelled = matchmaker.cancel_waiting(user.id).await;
    Json(json!({ "cancelled": cancelled }))
}
