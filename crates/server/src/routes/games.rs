use axum::{extract::Path, Extension, Json};
use chess_core::{AppliedMove, Board, Color, EloConfig, GameSession, GameStatus, Outcome, UciMove};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::auth::middleware::AuthUser;
use crate::config::Config;
use crate::db::{accounts, matches, moves};
use crate::error::AppError;

#[derive(Deserialize)]
pub struct MoveRequest {
    pub uci: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: i64,
    pub username: String,
    pub rating: i32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: i64,
    pub white: PlayerView,
    pub black: PlayerView,
    pub status: GameStatus,
    pub player_color: Color,
    pub is_my_turn: bool,
    pub current_ply: u32,
    pub fen_current: String,
    pub last_move_uci: Option<String>,
    pub board: Board,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatingDelta {
    pub before: i32,
    pub after: i32,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct RatingChange {
    pub white: RatingDelta,
    pub black: RatingDelta,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub game_id: i64,
    #[serde(flatten)]
    pub applied: AppliedMove,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings: Option<RatingChange>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResignResponse {
    pub game_id: i64,
    pub status: GameStatus,
    pub ratings: Option<RatingChange>,
}

async fn player_view(pool: &PgPool, id: i64) -> Result<PlayerView, AppError> {
    let account = accounts::get_account_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Account {id} referenced by a match is missing")))?;
    Ok(PlayerView {
        id: account.id,
        username: account.username,
        rating: account.rating,
    })
}

/// Apply the Elo update for a finished game. Runs inside the caller's
/// transaction so both ratings and the final position commit together.
async fn settle_ratings(
    conn: &mut PgConnection,
    session: &GameSession,
    elo: &EloConfig,
) -> Result<Option<RatingChange>, AppError> {
    let outcome = match Outcome::try_from(session.status()) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(game_id = session.id(), "rating update skipped: {e}");
            return Ok(None);
        }
    };

    let (white_before, black_before) = accounts::lock_ratings(conn, session.white(), session.black()).await?;
    let (white_after, black_after) = elo.update(white_before, black_before, outcome);
    accounts::set_rating(conn, session.white(), white_after).await?;
    accounts::set_rating(conn, session.black(), black_after).await?;

    tracing::info!(
        game_id = session.id(),
        status = session.status().as_str(),
        white_before,
        white_after,
        black_before,
        black_after,
        "ratings updated"
    );

    Ok(Some(RatingChange {
        white: RatingDelta { before: white_before, after: white_after },
        black: RatingDelta { before: black_before, after: black_after },
    }))
}

/// GET /api/games/{game_id}
pub async fn get_game(
    Extension(pool): Extension<PgPool>,
    Path(game_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<GameView>, AppError> {
    let row = matches::get_match(&pool, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;
    let session = row.to_session()?;
    let player_color = session
        .color_of(user.id)
        .ok_or_else(|| AppError::Forbidden("You are not a player in this game".into()))?;

    Ok(Json(GameView {
        id: session.id(),
        white: player_view(&pool, session.white()).await?,
        black: player_view(&pool, session.black()).await?,
        status: session.status(),
        player_color,
        is_my_turn: !session.status().is_finished() && session.side_to_move() == player_color,
        current_ply: session.ply(),
        fen_current: session.fen(),
        last_move_uci: row.last_move_uci,
        board: *session.board(),
    }))
}

/// POST /api/games/{game_id}/moves
pub async fn submit_move(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Path(game_id): Path<i64>,
    user: AuthUser,
    Json(req): Json<MoveRequest>,
) -> Result<Json<MoveResponse>, AppError> {
    let uci: UciMove = req.uci.trim().parse()?;

    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;
    let row = matches::lock_match(&mut tx, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;
    let mut session = row.to_session()?;

    // A rejected move drops the transaction, leaving the game untouched.
    let applied = session.apply_move(user.id, &uci)?;

    moves::insert_move(&mut tx, game_id, &applied).await?;
    matches::save_session(&mut tx, &session, Some(applied.mv.uci().as_str())).await?;
    let ratings = if session.status().is_finished() {
        settle_ratings(&mut tx, &session, &config.elo()).await?
    } else {
        None
    };
    tx.commit().await.map_err(AppError::Sqlx)?;

    tracing::debug!(game_id, ply = applied.ply, uci = %uci, "move applied");

    Ok(Json(MoveResponse {
        game_id,
        applied,
        ratings,
    }))
}

/// POST /api/games/{game_id}/resign
pub async fn resign(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Path(game_id): Path<i64>,
    user: AuthUser,
) -> Result<Json<ResignResponse>, AppError> {
    let mut tx = pool.begin().await.map_err(AppError::Sqlx)?;
    let row = matches::lock_match(&mut tx, game_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Game not found".into()))?;
    let mut session = row.to_session()?;

    let status = session.resign(user.id)?;
    matches::save_session(&mut tx, &session, None).await?;
    let ratings = settle_ratings(&mut tx, &session, &config.elo()).await?;
    tx.commit().await.map_err(AppError::Sqlx)?;

    tracing::info!(game_id, player = user.id, "player resigned");

    Ok(Json(ResignResponse {
        game_id,
        status,
        ratings,
    }))
}
