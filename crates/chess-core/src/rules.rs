//! Move legality and check detection.
//!
//! One move generator (`legal_targets`) is the single source of truth: legality
//! checks ask whether a destination is among a piece's targets, and check
//! detection asks whether any enemy piece targets the king. Targets ignore
//! whether the move exposes the mover's own king; `would_expose_own_king` is the
//! separate, explicit test for that. Castling and en passant are not generated.

use crate::board::{Board, Color, PieceKind, Position};

const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Squares the piece on `from` may move to, ignoring own-king safety.
/// Empty squares have no targets.
pub fn legal_targets(board: &Board, from: Position) -> Vec<Position> {
    let Some(piece) = board.piece_at(from) else {
        return Vec::new();
    };
    let mut targets = Vec::new();
    match piece.kind {
        PieceKind::Pawn => pawn_targets(board, from, piece.color, &mut targets),
        PieceKind::Rook => ray_targets(board, from, piece.color, &ORTHOGONAL, &mut targets),
        PieceKind::Bishop => ray_targets(board, from, piece.color, &DIAGONAL, &mut targets),
        PieceKind::Queen => {
            ray_targets(board, from, piece.color, &ORTHOGONAL, &mut targets);
            ray_targets(board, from, piece.color, &DIAGONAL, &mut targets);
        }
        PieceKind::Knight => step_targets(board, from, piece.color, &KNIGHT_OFFSETS, &mut targets),
        PieceKind::King => step_targets(board, from, piece.color, &KING_OFFSETS, &mut targets),
    }
    targets
}

fn pawn_targets(board: &Board, from: Position, color: Color, out: &mut Vec<Position>) {
    let dir = color.forward();

    if let Some(one) = from.offset(dir, 0) {
        if board.piece_at(one).is_none() {
            out.push(one);
            if from.row() == color.pawn_start_row() {
                if let Some(two) = from.offset(2 * dir, 0) {
                    if board.piece_at(two).is_none() {
                        out.push(two);
                    }
                }
            }
        }
    }

    for dc in [-1, 1] {
        if let Some(diag) = from.offset(dir, dc) {
            if board.piece_at(diag).is_some_and(|p| p.color != color) {
                out.push(diag);
            }
        }
    }
}

fn ray_targets(
    board: &Board,
    from: Position,
    color: Color,
    directions: &[(i8, i8)],
    out: &mut Vec<Position>,
) {
    for &(dr, dc) in directions {
        let mut cur = from;
        while let Some(next) = cur.offset(dr, dc) {
            match board.piece_at(next) {
                None => out.push(next),
                Some(p) => {
                    if p.color != color {
                        out.push(next);
                    }
                    break;
                }
            }
            cur = next;
        }
    }
}

fn step_targets(
    board: &Board,
    from: Position,
    color: Color,
    offsets: &[(i8, i8)],
    out: &mut Vec<Position>,
) {
    out.extend(
        offsets
            .iter()
            .filter_map(|&(dr, dc)| from.offset(dr, dc))
            .filter(|&to| board.piece_at(to).map_or(true, |p| p.color != color)),
    );
}

/// Whether `side_to_move` may move the piece on `from` to `to`, ignoring
/// own-king exposure. Compose with [`would_expose_own_king`] for strict legality.
pub fn is_legal_move(board: &Board, from: Position, to: Position, side_to_move: Color) -> bool {
    let Some(piece) = board.piece_at(from) else {
        return false;
    };
    if piece.color != side_to_move {
        return false;
    }
    if board.piece_at(to).is_some_and(|p| p.color == side_to_move) {
        return false;
    }
    legal_targets(board, from).contains(&to)
}

/// True if any piece of color `by` has `square` among its targets.
pub fn is_square_attacked(board: &Board, square: Position, by: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == by)
        .any(|(pos, _)| legal_targets(board, pos).contains(&square))
}

/// Whether the king of `king_color` is attacked. A board without that king is
/// an invariant violation: it is logged and reported as not in check.
pub fn is_king_in_check(board: &Board, king_color: Color) -> bool {
    match board.find_king(king_color) {
        Some(king) => is_square_attacked(board, king, king_color.opponent()),
        None => {
            tracing::warn!(color = king_color.as_str(), "no king on board, check detection skipped");
            false
        }
    }
}

/// Plays `from -> to` on a scratch copy and reports whether `side_to_move`'s
/// king is then in check. `board` itself is never modified.
pub fn would_expose_own_king(
    board: &Board,
    from: Position,
    to: Position,
    side_to_move: Color,
) -> bool {
    let scratch = board.with_move(from, to);
    is_king_in_check(&scratch, side_to_move)
}

/// `is_legal_move` and not `would_expose_own_king`.
pub fn is_strictly_legal(board: &Board, from: Position, to: Position, side_to_move: Color) -> bool {
    is_legal_move(board, from, to, side_to_move)
        && !would_expose_own_king(board, from, to, side_to_move)
}

/// Whether `side` has at least one strictly legal move.
pub fn has_any_legal_move(board: &Board, side: Color) -> bool {
    board
        .pieces()
        .filter(|(_, p)| p.color == side)
        .any(|(from, _)| {
            legal_targets(board, from)
                .into_iter()
                .any(|to| !would_expose_own_king(board, from, to, side))
        })
}

/// In check with no strictly legal reply. Castling and en passant escapes are
/// not generated, so they are not considered.
pub fn is_checkmate(board: &Board, side: Color) -> bool {
    is_king_in_check(board, side) && !has_any_legal_move(board, side)
}
