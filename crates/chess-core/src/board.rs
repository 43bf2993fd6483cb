//! Board model: an 8x8 grid of optional pieces.
//!
//! Row 0 is rank 8 (Black's back rank) and row 7 is rank 1 (White's back rank).
//! Notation conversion depends on this orientation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::NotationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Side to move at a given ply. Even plies belong to White.
    pub fn to_move_at(ply: u32) -> Color {
        if ply % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// Row delta of a single pawn step.
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    pub fn pawn_start_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Row on which this side's pawns promote (the opponent's back rank).
    pub fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Lowercase letter used in move and board notation.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Rook => 'r',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }

    pub fn from_letter(c: char) -> Option<PieceKind> {
        match c.to_ascii_lowercase() {
            'p' => Some(PieceKind::Pawn),
            'r' => Some(PieceKind::Rook),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    pub const fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Uppercase for White, lowercase for Black.
    pub fn letter(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    pub fn from_letter(c: char) -> Option<Piece> {
        let kind = PieceKind::from_letter(c)?;
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Piece::new(kind, color))
    }
}

impl From<Piece> for String {
    fn from(piece: Piece) -> Self {
        piece.letter().to_string()
    }
}

impl TryFrom<String> for Piece {
    type Error = NotationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Piece::from_letter(c).ok_or(NotationError::InvalidPiece(s)),
            _ => Err(NotationError::InvalidPiece(s)),
        }
    }
}

/// A square on the board. Every value is in range; construction validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Position {
    row: u8,
    col: u8,
}

impl Position {
    pub fn new(row: i32, col: i32) -> Result<Self, NotationError> {
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(NotationError::OutOfRange { row, col })
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// The square `(dr, dc)` away, or `None` past the board edge.
    pub fn offset(self, dr: i8, dc: i8) -> Option<Position> {
        let row = self.row as i8 + dr;
        let col = self.col as i8 + dc;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// All 64 squares, row-major from a8.
    pub fn all() -> impl Iterator<Item = Position> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Position { row, col }))
    }
}

/// 8x8 grid value. `Copy`, so every derived position is a fresh board.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

impl Board {
    pub const fn empty() -> Self {
        Self {
            cells: [[None; 8]; 8],
        }
    }

    /// Standard starting position.
    pub fn starting() -> Self {
        let mut cells = [[None; 8]; 8];
        for (col, kind) in BACK_RANK.iter().enumerate() {
            cells[0][col] = Some(Piece::new(*kind, Color::Black));
            cells[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            cells[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            cells[7][col] = Some(Piece::new(*kind, Color::White));
        }
        Self { cells }
    }

    pub fn piece_at(&self, pos: Position) -> Option<Piece> {
        self.cells[pos.row as usize][pos.col as usize]
    }

    /// Copy of this board with `pos` set to `piece`.
    #[must_use]
    pub fn with_piece(mut self, pos: Position, piece: Option<Piece>) -> Self {
        self.cells[pos.row as usize][pos.col as usize] = piece;
        self
    }

    /// Copy of this board with the piece on `from` moved to `to`, replacing
    /// whatever stood there. An empty `from` yields an identical copy.
    #[must_use]
    pub fn with_move(&self, from: Position, to: Position) -> Self {
        match self.piece_at(from) {
            Some(piece) => self.with_piece(from, None).with_piece(to, Some(piece)),
            None => *self,
        }
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.piece_at(pos).map(|piece| (pos, piece)))
    }

    pub fn find_king(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(pos, _)| pos)
    }

    pub(crate) fn rows(&self) -> &[[Option<Piece>; 8]; 8] {
        &self.cells
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                write!(f, "{}", cell.map_or('.', |p| p.letter()))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board(\n{self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starting_layout() {
        let board = Board::starting();
        let e1 = Position::new(7, 4).unwrap();
        let e8 = Position::new(0, 4).unwrap();
        assert_eq!(board.piece_at(e1), Some(Piece::new(PieceKind::King, Color::White)));
        assert_eq!(board.piece_at(e8), Some(Piece::new(PieceKind::King, Color::Black)));
        assert_eq!(board.pieces().count(), 32);
    }

    #[test]
    fn test_position_bounds() {
        assert!(Position::new(0, 0).is_ok());
        assert!(Position::new(7, 7).is_ok());
        assert_eq!(
            Position::new(8, 0),
            Err(NotationError::OutOfRange { row: 8, col: 0 })
        );
        assert!(Position::new(0, -1).is_err());
        assert_eq!(Position::new(0, 0).unwrap().offset(-1, 0), None);
        assert_eq!(Position::all().count(), 64);
    }

    #[test]
    fn test_with_move_leaves_original() {
        let board = Board::starting();
        let from = Position::new(6, 4).unwrap();
        let to = Position::new(4, 4).unwrap();
        let moved = board.with_move(from, to);
        assert_eq!(board, Board::starting());
        assert_eq!(moved.piece_at(from), None);
        assert_eq!(moved.piece_at(to), Some(Piece::new(PieceKind::Pawn, Color::White)));
    }

    #[test]
    fn test_piece_letters() {
        assert_eq!(Piece::from_letter('Q'), Some(Piece::new(PieceKind::Queen, Color::White)));
        assert_eq!(Piece::from_letter('n'), Some(Piece::new(PieceKind::Knight, Color::Black)));
        assert_eq!(Piece::from_letter('x'), None);
        assert_eq!(Piece::new(PieceKind::Rook, Color::Black).letter(), 'r');
    }

    #[test]
    fn test_turn_parity() {
        assert_eq!(Color::to_move_at(0), Color::White);
        assert_eq!(Color::to_move_at(1), Color::Black);
        assert_eq!(Color::to_move_at(42), Color::White);
    }
}
