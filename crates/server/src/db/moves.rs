use chess_core::AppliedMove;
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRow {
    pub id: i64,
    pub match_id: i64,
    pub ply: i32,
    pub move_number: i32,
    pub color: String,
    pub uci: String,
    pub san: String,
    pub fen_before: String,
    pub fen_after: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Full-move number of a 1-based ply: plies 1 and 2 are move 1.
pub fn move_number(ply: u32) -> i32 {
    ply.div_ceil(2) as i32
}

pub async fn insert_move(conn: &mut PgConnection, match_id: i64, applied: &AppliedMove) -> Result<(), AppError> {
    sqlx::query(
        r#"INSERT INTO moves (match_id, ply, move_number, color, uci, san, fen_before, fen_after)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(match_id)
    .bind(applied.ply as i32)
    .bind(move_number(applied.ply))
    .bind(applied.color.as_str())
    .bind(applied.mv.uci())
    .bind(applied.mv.san())
    .bind(&applied.fen_before)
    .bind(&applied.fen_after)
    .execute(&mut *conn)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

pub async fn list_moves(pool: &PgPool, match_id: i64) -> Result<Vec<MoveRow>, AppError> {
    sqlx::query_as::<_, MoveRow>(
        r#"SELECT id, match_id, ply, move_number, color, uci, san, fen_before, fen_after, created_at
           FROM moves WHERE match_id = $1 ORDER BY ply"#,
    )
    .bind(match_id)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)
}
