use serde::Serialize;

use crate::board::{Piece, PieceKind, Position};
use crate::notation::UciMove;

/// Flags reserved for special moves. The rules engine never sets `castle` or
/// `en_passant`; they are carried for the move log format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveFlags {
    pub castle: bool,
    pub en_passant: bool,
    #[serde(serialize_with = "serialize_kind")]
    pub promotion: Option<PieceKind>,
}

fn serialize_kind<S: serde::Serializer>(kind: &Option<PieceKind>, s: S) -> Result<S::Ok, S::Error> {
    match kind {
        Some(k) => s.serialize_some(&k.letter().to_string()),
        None => s.serialize_none(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub flags: MoveFlags,
}

impl Move {
    pub fn uci(&self) -> String {
        UciMove {
            from: self.from,
            to: self.to,
            promotion: self.flags.promotion,
        }
        .to_string()
    }

    /// Simplified SAN: piece letter, `x` on capture, destination square.
    /// Pawn captures carry the origin file. No disambiguation or check marks.
    pub fn san(&self) -> String {
        let mut san = String::new();
        if self.piece.kind == PieceKind::Pawn {
            if self.captured.is_some() {
                san.push(crate::notation::file_char(self.from.col()));
                san.push('x');
            }
        } else {
            san.push(self.piece.kind.letter().to_ascii_uppercase());
            if self.captured.is_some() {
                san.push('x');
            }
        }
        san.push_str(&self.to.to_string());
        if let Some(kind) = self.flags.promotion {
            san.push('=');
            san.push(kind.letter().to_ascii_uppercase());
        }
        san
    }
}
