use std::sync::LazyLock;

use axum::{Extension, Json};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::auth::{jwt, middleware::AuthUser, password};
use crate::config::Config;
use crate::db::accounts;
use crate::error::AppError;

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("username pattern is valid"));

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub rating: i32,
    pub created_at: String,
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

impl From<&accounts::Account> for UserResponse {
    fn from(a: &accounts::Account) -> Self {
        Self {
            id: a.id,
            username: a.username.clone(),
            email: a.email.clone(),
            rating: a.rating,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AppError> {
    if req.username.len() < 3 {
        return Err(AppError::BadRequest("Username must be at least 3 characters".into()));
    }
    if req.username.len() > 20 {
        return Err(AppError::BadRequest("Username must be at most 20 characters".into()));
    }
    if !USERNAME_RE.is_match(&req.username) {
        return Err(AppError::BadRequest(
            "Username can only contain letters, numbers, and underscores".into(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".into()));
    }
    if req.password.len() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".into()));
    }
    Ok(())
}

fn issue_token(config: &Config, account: &accounts::Account) -> Result<String, AppError> {
    jwt::create_token(account.id, &account.username, &config.jwt_secret, config.jwt_expire_hours)
        .map_err(|e| AppError::Internal(format!("Token creation error: {e}")))
}

/// POST /api/auth/register
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    validate_registration(&req)?;

    if accounts::email_exists(&pool, &req.email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if accounts::username_exists(&pool, &req.username).await? {
        return Err(AppError::Conflict("Username already taken".into()));
    }

    let hash = password::hash_password(&req.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let account_id = accounts::create_account(&pool, &req.username, &req.email, &hash).await?;
    let account = accounts::get_account_by_id(&pool, account_id)
        .await?
        .ok_or_else(|| AppError::Internal("Failed to retrieve created account".into()))?;

    tracing::info!(account_id, username = %account.username, "account registered");

    Ok(Json(AuthResponse {
        token: issue_token(&config, &account)?,
        user: UserResponse::from(&account),
    }))
}

/// POST /api/auth/login
pub async fn login(
    Extension(pool): Extension<PgPool>,
    Extension(config): Extension<Config>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let account = accounts::get_account_by_email(&pool, &req.email)
        .await?
        .ok_or(AppError::BadRequest("Invalid email or password".into()))?;

    let valid = password::verify_password(&req.password, &account.password_hash)
        .map_err(|e| AppError::Internal(format!("Password verify error: {e}")))?;
    if !valid {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    Ok(Json(AuthResponse {
        token: issue_token(&config, &account)?,
        user: UserResponse::from(&account),
    }))
}

/// GET /api/auth/me
pub async fn me(user: AuthUser) -> Json<UserResponse> {
    Json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        rating: user.rating,
        created_at: user.created_at.to_rfc3339(),
    })
}
