//! A game between two players, advanced only by validated moves.

use serde::{Deserialize, Serialize};

use crate::board::{Board, Color, Piece, PieceKind};
use crate::error::{MoveError, NotationError};
use crate::moves::{Move, MoveFlags};
use crate::notation::{self, UciMove};
use crate::rules;

pub type PlayerId = i64;
pub type SessionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    WhiteWon,
    BlackWon,
    Draw,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::InProgress => "IN_PROGRESS",
            GameStatus::WhiteWon => "WHITE_WON",
            GameStatus::BlackWon => "BLACK_WON",
            GameStatus::Draw => "DRAW",
        }
    }

    pub fn parse(s: &str) -> Option<GameStatus> {
        match s {
            "IN_PROGRESS" => Some(GameStatus::InProgress),
            "WHITE_WON" => Some(GameStatus::WhiteWon),
            "BLACK_WON" => Some(GameStatus::BlackWon),
            "DRAW" => Some(GameStatus::Draw),
            _ => None,
        }
    }

    pub fn is_finished(self) -> bool {
        self != GameStatus::InProgress
    }

    pub fn won_by(color: Color) -> GameStatus {
        match color {
            Color::White => GameStatus::WhiteWon,
            Color::Black => GameStatus::BlackWon,
        }
    }
}

/// Result of a successfully applied move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedMove {
    #[serde(rename = "move")]
    pub mv: Move,
    /// Ply number of this move, starting at 1.
    pub ply: u32,
    pub color: Color,
    pub fen_before: String,
    pub fen_after: String,
    /// Whether the opponent is now in check.
    pub check: bool,
    pub status: GameStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    id: SessionId,
    white: PlayerId,
    black: PlayerId,
    ply: u32,
    board: Board,
    status: GameStatus,
}

impl GameSession {
    /// New game from the standard starting position.
    pub fn new(id: SessionId, white: PlayerId, black: PlayerId) -> Self {
        Self {
            id,
            white,
            black,
            ply: 0,
            board: Board::starting(),
            status: GameStatus::InProgress,
        }
    }

    /// Rebuild a session from its persisted FEN, ply and status.
    pub fn restore(
        id: SessionId,
        white: PlayerId,
        black: PlayerId,
        ply: u32,
        fen: &str,
        status: GameStatus,
    ) -> Result<Self, NotationError> {
        Ok(Self {
            id,
            white,
            black,
            ply,
            board: notation::board_from_fen(fen)?,
            status,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn white(&self) -> PlayerId {
        self.white
    }

    pub fn black(&self) -> PlayerId {
        self.black
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn side_to_move(&self) -> Color {
        Color::to_move_at(self.ply)
    }

    pub fn color_of(&self, player: PlayerId) -> Option<Color> {
        if player == self.white {
            Some(Color::White)
        } else if player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player_of(&self, color: Color) -> PlayerId {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn fen(&self) -> String {
        notation::session_fen(&self.board, self.ply)
    }

    /// Validate and play `uci` for `player`. On error the session is unchanged.
    /// Checkmating the opponent ends the game.
    pub fn apply_move(&mut self, player: PlayerId, uci: &UciMove) -> Result<AppliedMove, MoveError> {
        if self.status.is_finished() {
            return Err(MoveError::GameOver(self.status));
        }
        let color = self.color_of(player).ok_or(MoveError::NotAParticipant)?;
        if color != self.side_to_move() {
            return Err(MoveError::NotYourTurn);
        }

        let (from, to) = (uci.from, uci.to);
        let piece = match self.board.piece_at(from) {
            Some(p) if rules::is_legal_move(&self.board, from, to, color) => p,
            _ => return Err(MoveError::Illegal(uci.to_string())),
        };
        if rules::would_expose_own_king(&self.board, from, to, color) {
            return Err(MoveError::ExposesKing(uci.to_string()));
        }

        if let Some(kind) = uci.promotion {
            let valid = piece.kind == PieceKind::Pawn
                && to.row() == color.promotion_row()
                && !matches!(kind, PieceKind::Pawn | PieceKind::King);
            if !valid {
                return Err(MoveError::InvalidPromotion(uci.to_string()));
            }
        }

        let fen_before = self.fen();
        let captured = self.board.piece_at(to);
        let mut next = self.board.with_move(from, to);
        if let Some(kind) = uci.promotion {
            next = next.with_piece(to, Some(Piece::new(kind, color)));
        }

        self.board = next;
        self.ply += 1;

        let opponent = color.opponent();
        let check = rules::is_king_in_check(&self.board, opponent);
        if check && !rules::has_any_legal_move(&self.board, opponent) {
            self.status = GameStatus::won_by(color);
        }

        Ok(AppliedMove {
            mv: Move {
                from,
                to,
                piece,
                captured,
                flags: MoveFlags {
                    promotion: uci.promotion,
                    ..MoveFlags::default()
                },
            },
            ply: self.ply,
            color,
            fen_before,
            fen_after: self.fen(),
            check,
            status: self.status,
        })
    }

    /// `player` concedes; the opponent wins.
    pub fn resign(&mut self, player: PlayerId) -> Result<GameStatus, MoveError> {
        if self.status.is_finished() {
            return Err(MoveError::GameOver(self.status));
        }
        let color = self.color_of(player).ok_or(MoveError::NotAParticipant)?;
        self.status = GameStatus::won_by(color.opponent());
        Ok(self.status)
    }
}
