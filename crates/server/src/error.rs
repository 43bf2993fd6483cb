use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chess_core::{MoveError, NotationError};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Rejected move; the game is left unchanged.
    #[error("{0}")]
    IllegalMove(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl From<MoveError> for AppError {
    fn from(e: MoveError) -> Self {
        match e {
            MoveError::NotAParticipant => AppError::Forbidden(e.to_string()),
            MoveError::GameOver(_) | MoveError::NotYourTurn => AppError::Conflict(e.to_string()),
            MoveError::Illegal(_) | MoveError::ExposesKing(_) | MoveError::InvalidPromotion(_) => {
                AppError::IllegalMove(e.to_string())
            }
        }
    }
}

impl From<NotationError> for AppError {
    fn from(e: NotationError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not authenticated".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::IllegalMove(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::Sqlx(e) => {
                tracing::error!("Database error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Anyhow(e) => {
                tracing::error!("Unexpected error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::GameStatus;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn test_move_errors_map_to_status() {
        assert_eq!(status_of(MoveError::NotAParticipant.into()), StatusCode::FORBIDDEN);
        assert_eq!(status_of(MoveError::NotYourTurn.into()), StatusCode::CONFLICT);
        assert_eq!(
            status_of(MoveError::GameOver(GameStatus::Draw).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(MoveError::Illegal("e2e5".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(MoveError::ExposesKing("e2d3".into()).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_notation_error_is_bad_request() {
        let e: AppError = NotationError::InvalidMove("zz".into()).into();
        assert_eq!(status_of(e), StatusCode::BAD_REQUEST);
    }
}
