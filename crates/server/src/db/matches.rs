use chess_core::{GameSession, GameStatus, SessionId};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MatchRow {
    pub id: i64,
    pub white_id: i64,
    pub black_id: i64,
    pub status: String,
    pub current_ply: i32,
    pub fen_current: String,
    pub last_move_uci: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl MatchRow {
    pub fn status(&self) -> Result<GameStatus, AppError> {
        GameStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Match {} has unknown status {}", self.id, self.status)))
    }

    /// Rebuild the in-memory session from the persisted position.
    pub fn to_session(&self) -> Result<GameSession, AppError> {
        let ply = u32::try_from(self.current_ply)
            .map_err(|_| AppError::Internal(format!("Match {} has negative ply", self.id)))?;
        GameSession::restore(
            self.id,
            self.white_id,
            self.black_id,
            ply,
            &self.fen_current,
            self.status()?,
        )
        .map_err(|e| AppError::Internal(format!("Match {} has corrupt position: {e}", self.id)))
    }
}

/// A match as listed in a player's history.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub id: i64,
    pub white_id: i64,
    pub white_username: String,
    pub black_id: i64,
    pub black_username: String,
    pub status: String,
    pub current_ply: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
}

const MATCH_COLUMNS: &str = "id, white_id, black_id, status, current_ply, fen_current, \
     last_move_uci, created_at, updated_at, finished_at";

/// Insert a fresh match. `Ok(None)` when the players are the same or either
/// account does not exist.
pub async fn create_match(pool: &PgPool, white_id: i64, black_id: i64) -> Result<Option<SessionId>, sqlx::Error> {
    let row: Option<(i64,)> = sqlx::query_as(
        r#"INSERT INTO matches (white_id, black_id, status, current_ply, fen_current)
           SELECT $1, $2, 'IN_PROGRESS', 0, $3
           WHERE $1 <> $2
             AND EXISTS (SELECT 1 FROM accounts WHERE id = $1)
             AND EXISTS (SELECT 1 FROM accounts WHERE id = $2)
           RETURNING id"#,
    )
    .bind(white_id)
    .bind(black_id)
    .bind(START_FEN)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.0))
}

/// Which of the two ids has no account, if any. Black is reported when both
/// ids are equal.
pub async fn missing_player(pool: &PgPool, white_id: i64, black_id: i64) -> Result<Option<i64>, sqlx::Error> {
    if white_id == black_id {
        return Ok(Some(black_id));
    }
    let found: Vec<(i64,)> = sqlx::query_as("SELECT id FROM accounts WHERE id IN ($1, $2)")
        .bind(white_id)
        .bind(black_id)
        .fetch_all(pool)
        .await?;
    Ok([white_id, black_id]
        .into_iter()
        .find(|id| !found.iter().any(|(f,)| f == id)))
}

pub async fn get_match(pool: &PgPool, id: i64) -> Result<Option<MatchRow>, AppError> {
    sqlx::query_as::<_, MatchRow>(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

/// Same as `get_match` but holds a row lock until the transaction ends, so
/// concurrent moves on one game run one after the other.
pub async fn lock_match(conn: &mut PgConnection, id: i64) -> Result<Option<MatchRow>, AppError> {
    sqlx::query_as::<_, MatchRow>(&format!(
        "SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(AppError::Sqlx)
}

/// Persist the session's current position and status.
pub async fn save_session(
    conn: &mut PgConnection,
    session: &GameSession,
    last_move_uci: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"UPDATE matches SET
            current_ply = $2,
            fen_current = $3,
            last_move_uci = COALESCE($4, last_move_uci),
            status = $5,
            updated_at = NOW(),
            finished_at = CASE WHEN $5 <> 'IN_PROGRESS' THEN NOW() ELSE NULL END
        WHERE id = $1"#,
    )
    .bind(session.id())
    .bind(session.ply() as i32)
    .bind(session.fen())
    .bind(last_move_uci)
    .bind(session.status().as_str())
    .execute(&mut *conn)
    .await
    .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Most recent matches the player took part in, newest first.
pub async fn list_for_player(pool: &PgPool, player_id: i64, limit: i64) -> Result<Vec<MatchSummary>, AppError> {
    sqlx::query_as::<_, MatchSummary>(
        r#"SELECT
            m.id, m.white_id, w.username AS white_username,
            m.black_id, b.username AS black_username,
            m.status, m.current_ply, m.created_at, m.finished_at
        FROM matches m
        JOIN accounts w ON w.id = m.white_id
        JOIN accounts b ON b.id = m.black_id
        WHERE m.white_id = $1 OR m.black_id = $1
        ORDER BY m.created_at DESC, m.id DESC
        LIMIT $2"#,
    )
    .bind(player_id)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, ply: i32, fen: &str) -> MatchRow {
        MatchRow {
            id: 3,
            white_id: 1,
            black_id: 2,
            status: status.to_string(),
            current_ply: ply,
            fen_current: fen.to_string(),
            last_move_uci: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn test_start_fen_restores_new_game() {
        let session = row("IN_PROGRESS", 0, START_FEN).to_session().unwrap();
        assert_eq!(session, GameSession::new(3, 1, 2));
        assert_eq!(session.fen(), START_FEN);
    }

    #[test]
    fn test_corrupt_rows_rejected() {
        assert!(row("PAUSED", 0, START_FEN).to_session().is_err());
        assert!(row("IN_PROGRESS", -1, START_FEN).to_session().is_err());
        assert!(row("IN_PROGRESS", 0, "garbage").to_session().is_err());
    }
}
