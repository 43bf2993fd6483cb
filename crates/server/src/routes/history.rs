use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use chess_core::{Color, GameStatus};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;

use crate::auth::middleware::AuthUser;
use crate::db::{matches, moves};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub match_id: i64,
    pub opponent_id: i64,
    pub opponent: String,
    pub my_color: Color,
    pub result: &'static str,
    pub status: String,
    pub moves_played: i32,
    pub created_at: String,
    pub finished_at: Option<String>,
}

/// Result label from one player's side of the board.
fn result_for(status: Option<GameStatus>, color: Color) -> &'static str {
    match status {
        Some(GameStatus::Draw) => "Draw",
        Some(s) if s == GameStatus::won_by(color) => "Win",
        Some(s) if s.is_finished() => "Loss",
        _ => "In Progress",
    }
}

fn history_entry(m: matches::MatchSummary, player_id: i64) -> HistoryEntry {
    let (my_color, opponent_id, opponent) = if m.white_id == player_id {
        (Color::White, m.black_id, m.black_username)
    } else {
        (Color::Black, m.white_id, m.white_username)
    };
    HistoryEntry {
        match_id: m.id,
        opponent_id,
        opponent,
        my_color,
        result: result_for(GameStatus::parse(&m.status), my_color),
        status: m.status,
        moves_played: m.current_ply,
        created_at: m.created_at.to_rfc3339(),
        finished_at: m.finished_at.map(|t| t.to_rfc3339()),
    }
}

/// GET /api/history/my-games
pub async fn my_games(
    Extension(pool): Extension<PgPool>,
    Query(q): Query<HistoryQuery>,
    user: AuthUser,
) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let limit = q.limit.unwrap_or(20).clamp(1, 100);
    let games = matches::list_for_player(&pool, user.id, limit).await?;
    Ok(Json(
        games.into_iter().map(|m| history_entry(m, user.id)).collect(),
    ))
}

/// GET /api/history/match/{match_id}/moves
pub async fn match_moves(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<Vec<moves::MoveRow>>, AppError> {
    if matches::get_match(&pool, match_id).await?.is_none() {
        return Err(AppError::NotFound("Match not found".into()));
    }
    Ok(Json(moves::list_moves(&pool, match_id).await?))
}

/// GET /api/history/match/{match_id}/fen
pub async fn match_fen(
    Extension(pool): Extension<PgPool>,
    Path(match_id): Path<i64>,
    _user: AuthUser,
) -> Result<Json<JsonValue>, AppError> {
    let m = matches::get_match(&pool, match_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Match not found".into()))?;
    Ok(Json(json!({
        "matchId": m.id,
        "fen": m.fen_current,
        "currentPly": m.current_ply,
        "lastMoveUci": m.last_move_uci,
        "status": m.status,
    })))
}
