use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use crate::error::AppError;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub rating: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatedPlayer {
    pub id: i64,
    pub username: String,
    pub rating: i32,
}

const ACCOUNT_COLUMNS: &str = "id, username, email, password_hash, rating, created_at";

pub async fn create_account(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as(
        r#"INSERT INTO accounts (username, email, password_hash)
           VALUES ($1, $2, $3)
           RETURNING id"#,
    )
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.0)
}

pub async fn get_account_by_id(pool: &PgPool, id: i64) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(AppError::Sqlx)
}

pub async fn get_account_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(username) = LOWER($1)"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn get_account_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>, AppError> {
    sqlx::query_as::<_, Account>(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(email) = LOWER($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.0)
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, AppError> {
    let row: (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM accounts WHERE LOWER(username) = LOWER($1))",
    )
    .bind(username)
    .fetch_one(pool)
    .await
    .map_err(AppError::Sqlx)?;

    Ok(row.0)
}

/// Lock both players' rows for the rest of the transaction and return
/// `(white_rating, black_rating)`. Rows are locked in id order.
pub async fn lock_ratings(
    conn: &mut PgConnection,
    white_id: i64,
    black_id: i64,
) -> Result<(i32, i32), AppError> {
    let rows: Vec<(i64, i32)> = sqlx::query_as(
        "SELECT id, rating FROM accounts WHERE id IN ($1, $2) ORDER BY id FOR UPDATE",
    )
    .bind(white_id)
    .bind(black_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(AppError::Sqlx)?;

    let rating_of = |id: i64| {
        rows.iter()
            .find(|(row_id, _)| *row_id == id)
            .map(|(_, rating)| *rating)
            .ok_or_else(|| AppError::Internal(format!("Account {id} missing while rating")))
    };
    Ok((rating_of(white_id)?, rating_of(black_id)?))
}

pub async fn set_rating(conn: &mut PgConnection, account_id: i64, rating: i32) -> Result<(), AppError> {
    sqlx::query("UPDATE accounts SET rating = $2 WHERE id = $1")
        .bind(account_id)
        .bind(rating)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(())
}

/// Highest rating first; ties broken by account id.
pub async fn leaderboard(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<RatedPlayer>, AppError> {
    sqlx::query_as::<_, RatedPlayer>(
        r#"SELECT id, username, rating FROM accounts
           ORDER BY rating DESC, id ASC
           LIMIT $1 OFFSET $2"#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(AppError::Sqlx)
}

pub async fn count_accounts(pool: &PgPool) -> Result<i64, AppError> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
        .fetch_one(pool)
        .await
        .map_err(AppError::Sqlx)?;
    Ok(row.0)
}
