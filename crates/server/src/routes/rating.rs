use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::accounts::{self, RatedPlayer};
use crate::error::AppError;

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize)]
pub struct LeaderboardQuery {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: i64,
    #[serde(flatten)]
    pub player: RatedPlayer,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardPage {
    pub page: i64,
    pub size: i64,
    pub total: i64,
    pub players: Vec<LeaderboardEntry>,
}

/// Zero-based page and clamped size to (limit, offset).
fn page_window(page: Option<i64>, size: Option<i64>) -> (i64, i64, i64) {
    let page = page.unwrap_or(0).max(0);
    let size = size.unwrap_or(20).clamp(1, MAX_PAGE_SIZE);
    (page, size, page.saturating_mul(size))
}

/// GET /api/rating/me
pub async fn my_rating(user: AuthUser) -> Json<RatedPlayer> {
    Json(RatedPlayer {
        id: user.id,
        username: user.username,
        rating: user.rating,
    })
}

/// GET /api/rating/user/{username}
pub async fn user_rating(
    Extension(pool): Extension<PgPool>,
    Path(username): Path<String>,
) -> Result<Json<RatedPlayer>, AppError> {
    let account = accounts::get_account_by_username(&pool, &username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User '{username}' not found")))?;
    Ok(Json(RatedPlayer {
        id: account.id,
        username: account.username,
        rating: account.rating,
    }))
}

/// GET /api/rating/leaderboard
pub async fn leaderboard(
    Extension(pool): Extension<PgPool>,
    Query(q): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardPage>, AppError> {
    let (page, size, offset) = page_window(q.page, q.size);
    let players = accounts::leaderboard(&pool, size, offset).await?;
    let total = accounts::count_accounts(&pool).await?;

    Ok(Json(LeaderboardPage {
        page,
        size,
        total,
        players: players
            .into_iter()
            .zip(offset + 1..)
            .map(|(player, rank)| LeaderboardEntry { rank, player })
            .collect(),
    }))
}
