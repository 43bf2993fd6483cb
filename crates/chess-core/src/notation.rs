//! Textual formats: algebraic squares, UCI-style move strings, the 8x8 wire
//! board and FEN placement (via shakmaty).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{File, Rank, Role, Square};

use crate::board::{Board, Color, Piece, PieceKind, Position};
use crate::error::NotationError;

pub(crate) fn file_char(col: u8) -> char {
    (b'a' + col) as char
}

impl Position {
    /// Parse a square like `e4`. Rank is `8 - row`.
    pub fn from_algebraic(s: &str) -> Result<Self, NotationError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(NotationError::InvalidSquare(s.to_string()));
        }
        let col = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'0');
        if col > 7 || !(1..=8).contains(&rank) {
            return Err(NotationError::InvalidSquare(s.to_string()));
        }
        Position::new(8 - rank as i32, col as i32)
    }

    pub fn to_algebraic(self) -> String {
        format!("{}{}", file_char(self.col()), 8 - self.row())
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_algebraic())
    }
}

impl FromStr for Position {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Position::from_algebraic(s)
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.to_algebraic()
    }
}

impl TryFrom<String> for Position {
    type Error = NotationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Position::from_algebraic(&s)
    }
}

/// Move string: source square, destination square, optional promotion letter
/// (`e2e4`, `e7e8q`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct UciMove {
    pub from: Position,
    pub to: Position,
    pub promotion: Option<PieceKind>,
}

impl FromStr for UciMove {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || NotationError::InvalidMove(s.to_string());
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }
        let from = Position::from_algebraic(&s[0..2]).map_err(|_| invalid())?;
        let to = Position::from_algebraic(&s[2..4]).map_err(|_| invalid())?;
        let promotion = match s[4..].chars().next() {
            None => None,
            Some(c) if c.is_ascii_lowercase() => Some(PieceKind::from_letter(c).ok_or_else(invalid)?),
            Some(_) => return Err(invalid()),
        };
        Ok(UciMove { from, to, promotion })
    }
}

impl fmt::Display for UciMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.letter())?;
        }
        Ok(())
    }
}

impl From<UciMove> for String {
    fn from(mv: UciMove) -> Self {
        mv.to_string()
    }
}

impl TryFrom<String> for UciMove {
    type Error = NotationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// ---- Wire board: 8x8 array of one-letter strings ----

impl From<Board> for Vec<Vec<String>> {
    fn from(board: Board) -> Self {
        board
            .rows()
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.map(String::from).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}

impl TryFrom<Vec<Vec<String>>> for Board {
    type Error = NotationError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        if rows.len() != 8 || rows.iter().any(|r| r.len() != 8) {
            return Err(NotationError::BoardShape);
        }
        let mut board = Board::empty();
        for (row, cells) in rows.into_iter().enumerate() {
            for (col, cell) in cells.into_iter().enumerate() {
                if cell.is_empty() {
                    continue;
                }
                let piece = Piece::try_from(cell)?;
                board = board.with_piece(Position::new(row as i32, col as i32)?, Some(piece));
            }
        }
        Ok(board)
    }
}

impl Serialize for Board {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        Vec::<Vec<String>>::from(*self).serialize(s)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let rows = Vec::<Vec<String>>::deserialize(d)?;
        Board::try_from(rows).map_err(serde::de::Error::custom)
    }
}

// ---- FEN ----

fn square_of(pos: Position) -> Square {
    Square::from_coords(File::new(pos.col() as u32), Rank::new(7 - pos.row() as u32))
}

fn role_of(kind: PieceKind) -> Role {
    match kind {
        PieceKind::Pawn => Role::Pawn,
        PieceKind::Knight => Role::Knight,
        PieceKind::Bishop => Role::Bishop,
        PieceKind::Rook => Role::Rook,
        PieceKind::Queen => Role::Queen,
        PieceKind::King => Role::King,
    }
}

fn kind_of(role: Role) -> PieceKind {
    match role {
        Role::Pawn => PieceKind::Pawn,
        Role::Knight => PieceKind::Knight,
        Role::Bishop => PieceKind::Bishop,
        Role::Rook => PieceKind::Rook,
        Role::Queen => PieceKind::Queen,
        Role::King => PieceKind::King,
    }
}

fn to_shakmaty(board: &Board) -> shakmaty::Board {
    let mut out = shakmaty::Board::empty();
    for (pos, piece) in board.pieces() {
        let color = match piece.color {
            Color::White => shakmaty::Color::White,
            Color::Black => shakmaty::Color::Black,
        };
        out.set_piece_at(
            square_of(pos),
            shakmaty::Piece {
                color,
                role: role_of(piece.kind),
            },
        );
    }
    out
}

/// Piece placement field of a FEN, e.g. `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR`.
pub fn board_fen(board: &Board) -> String {
    to_shakmaty(board).to_string()
}

/// Read the placement field of a FEN. Any trailing fields are ignored.
pub fn board_from_fen(fen: &str) -> Result<Board, NotationError> {
    let placement = fen
        .split_whitespace()
        .next()
        .ok_or_else(|| NotationError::InvalidFen(fen.to_string()))?;
    let parsed: shakmaty::Board = placement
        .parse()
        .map_err(|e| NotationError::InvalidFen(format!("{placement}: {e}")))?;

    let mut board = Board::empty();
    for pos in Position::all() {
        if let Some(p) = parsed.piece_at(square_of(pos)) {
            let color = match p.color {
                shakmaty::Color::White => Color::White,
                shakmaty::Color::Black => Color::Black,
            };
            board = board.with_piece(pos, Some(Piece::new(kind_of(p.role), color)));
        }
    }
    Ok(board)
}

/// Full FEN for a session position. Castling and en passant are never tracked,
/// so those fields are always `-`.
pub fn session_fen(board: &Board, ply: u32) -> String {
    let side = match Color::to_move_at(ply) {
        Color::White => 'w',
        Color::Black => 'b',
    };
    format!("{} {} - - 0 {}", board_fen(board), side, ply / 2 + 1)
}
