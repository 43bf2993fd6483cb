//! Rules, notation, game sessions and Elo ratings for two-player chess.
//!
//! Everything here is pure computation over owned values; persistence and
//! transport live in the server crate.

pub mod board;
pub mod error;
pub mod moves;
pub mod notation;
pub mod rating;
pub mod rules;
pub mod session;

pub use board::{Board, Color, Piece, PieceKind, Position};
pub use error::{MoveError, NotationError, RatingError};
pub use moves::{Move, MoveFlags};
pub use notation::UciMove;
pub use rating::{update_ratings, EloConfig, Outcome};
pub use session::{AppliedMove, GameSession, GameStatus, PlayerId, SessionId};
