use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;

use crate::auth::jwt;
use crate::config::Config;
use crate::error::AppError;

/// Authenticated player resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub rating: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let pool = parts
            .extensions
            .get::<PgPool>()
            .ok_or(AppError::Internal("Missing database pool".into()))?
            .clone();

        let config = parts
            .extensions
            .get::<Config>()
            .ok_or(AppError::Internal("Missing config".into()))?;

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = jwt::verify_token(token, &config.jwt_secret).ok_or(AppError::Unauthorized)?;

        // Deleted accounts keep valid-looking tokens until expiry.
        sqlx::query_as::<_, AuthUser>(
            "SELECT id, username, email, rating, created_at FROM accounts WHERE id = $1",
        )
        .bind(claims.user_id)
        .fetch_optional(&pool)
        .await
        .map_err(AppError::Sqlx)?
        .ok_or(AppError::Unauthorized)
    }
}
