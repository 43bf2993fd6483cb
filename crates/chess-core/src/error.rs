use thiserror::Error;

use crate::session::GameStatus;

/// Malformed coordinates, squares, boards or move strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("coordinates ({row}, {col}) are off the board")]
    OutOfRange { row: i32, col: i32 },

    #[error("invalid square '{0}'")]
    InvalidSquare(String),

    #[error("invalid piece '{0}'")]
    InvalidPiece(String),

    #[error("board must be 8 rows of 8 cells")]
    BoardShape,

    #[error("invalid move notation '{0}'")]
    InvalidMove(String),

    #[error("invalid FEN: {0}")]
    InvalidFen(String),
}

/// Reasons a session refuses a move. The session is unchanged after any of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("game is already over ({0:?})")]
    GameOver(GameStatus),

    #[error("player is not part of this game")]
    NotAParticipant,

    #[error("not your turn")]
    NotYourTurn,

    #[error("illegal move {0}")]
    Illegal(String),

    #[error("move {0} leaves own king in check")]
    ExposesKing(String),

    #[error("invalid promotion {0}")]
    InvalidPromotion(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatingError {
    #[error("game has no final result; rating update does not apply")]
    Undecided,
}
