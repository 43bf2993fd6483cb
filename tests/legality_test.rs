//! Property checks for the move legality engine over many generated boards.
//!
//! Pure engine tests; no server needed.

use chess_core::rules::{is_king_in_check, is_legal_move, legal_targets, would_expose_own_king};
use chess_core::{update_ratings, Board, Color, EloConfig, Outcome, Piece, PieceKind, Position};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn square(index: u8) -> Position {
    Position::new((index / 8) as i32, (index % 8) as i32).unwrap()
}

/// One king per side plus a random scattering of other pieces.
fn random_board(rng: &mut SmallRng) -> Board {
    let white_king = rng.random_range(0..64u8);
    let mut black_king = rng.random_range(0..64u8);
    while black_king == white_king {
        black_king = rng.random_range(0..64u8);
    }
    let mut board = Board::empty()
        .with_piece(square(white_king), Piece::from_letter('K'))
        .with_piece(square(black_king), Piece::from_letter('k'));

    let letters = ['P', 'N', 'B', 'R', 'Q', 'p', 'n', 'b', 'r', 'q'];
    for index in 0..64u8 {
        if index == white_king || index == black_king || rng.random_range(0..4) != 0 {
            continue;
        }
        let letter = letters[rng.random_range(0..letters.len())];
        board = board.with_piece(square(index), Piece::from_letter(letter));
    }
    board
}

fn boards(count: usize) -> Vec<Board> {
    let mut rng = SmallRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
    (0..count).map(|_| random_board(&mut rng)).collect()
}

fn sq(s: &str) -> Position {
    s.parse().unwrap()
}

// ---------------------------------------------------------------------------
// Target generation
// ---------------------------------------------------------------------------

#[test]
fn targets_never_hit_own_pieces_or_leave_the_board() {
    for board in boards(300) {
        for (from, piece) in board.pieces() {
            for to in legal_targets(&board, from) {
                assert!(to.row() < 8 && to.col() < 8);
                assert_ne!(to, from);
                assert!(
                    board.piece_at(to).map_or(true, |p| p.color != piece.color),
                    "{piece:?} on {from} targets own piece on {to}\n{board}"
                );
            }
        }
    }
}

#[test]
fn sliding_rays_stop_at_first_occupied_square() {
    const ORTHOGONAL: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
    const DIAGONAL: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

    for board in boards(300) {
        for (from, piece) in board.pieces() {
            let directions: Vec<(i8, i8)> = match piece.kind {
                PieceKind::Rook => ORTHOGONAL.to_vec(),
                PieceKind::Bishop => DIAGONAL.to_vec(),
                PieceKind::Queen => ORTHOGONAL.iter().chain(DIAGONAL.iter()).copied().collect(),
                _ => continue,
            };

            let mut expected = Vec::new();
            for (dr, dc) in directions {
                let mut cur = from;
                while let Some(next) = cur.offset(dr, dc) {
                    match board.piece_at(next) {
                        None => expected.push(next),
                        Some(p) => {
                            if p.color != piece.color {
                                expected.push(next);
                            }
                            break;
                        }
                    }
                    cur = next;
                }
            }

            let mut actual = legal_targets(&board, from);
            actual.sort_by_key(|p| (p.row(), p.col()));
            expected.sort_by_key(|p| (p.row(), p.col()));
            assert_eq!(actual, expected, "{piece:?} on {from}\n{board}");
        }
    }
}

#[test]
fn knights_and_kings_are_never_blocked() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..200 {
        let from = square(rng.random_range(0..64u8));
        for letter in ['N', 'K'] {
            let alone = Board::empty().with_piece(from, Piece::from_letter(letter));
            let mut crowded = alone;
            // Fill every square the piece does not land on with blockers.
            let reachable = legal_targets(&alone, from);
            for pos in Position::all() {
                if pos != from && !reachable.contains(&pos) {
                    crowded = crowded.with_piece(pos, Piece::from_letter('P'));
                }
            }
            assert_eq!(legal_targets(&crowded, from), reachable, "{letter} on {from}");
        }
    }
}

// ---------------------------------------------------------------------------
// Check detection
// ---------------------------------------------------------------------------

#[test]
fn check_matches_enemy_targets() {
    for board in boards(300) {
        for color in [Color::White, Color::Black] {
            let king = board.find_king(color).unwrap();
            let attacked = board
                .pieces()
                .filter(|(_, p)| p.color == color.opponent())
                .any(|(pos, _)| legal_targets(&board, pos).contains(&king));
            assert_eq!(is_king_in_check(&board, color), attacked, "{color:?}\n{board}");
        }
    }
}

#[test]
fn exposure_test_leaves_board_untouched() {
    for board in boards(100) {
        let snapshot = board;
        for (from, piece) in board.pieces() {
            for to in legal_targets(&board, from) {
                would_expose_own_king(&board, from, to, piece.color);
            }
        }
        assert_eq!(board, snapshot);
    }
}

#[test]
fn king_on_rook_rank_scenario() {
    let board = Board::empty()
        .with_piece(sq("e4"), Piece::from_letter('K'))
        .with_piece(sq("h4"), Piece::from_letter('r'));
    assert_eq!((sq("e4").row(), sq("e4").col()), (4, 4));
    assert_eq!((sq("h4").row(), sq("h4").col()), (4, 7));

    assert!(is_king_in_check(&board, Color::White));
    assert!(is_legal_move(&board, sq("e4"), sq("f4"), Color::White));
    assert!(would_expose_own_king(&board, sq("e4"), sq("f4"), Color::White));
    assert!(!would_expose_own_king(&board, sq("e4"), sq("d5"), Color::White));
}

// ---------------------------------------------------------------------------
// Ratings
// ---------------------------------------------------------------------------

#[test]
fn rating_reference_values() {
    assert_eq!(update_ratings(1200, 1200, Outcome::AWon), (1216, 1184));
    assert_eq!(update_ratings(1200, 1200, Outcome::Draw), (1200, 1200));
}

#[test]
fn rating_never_below_floor() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..1000 {
        let a = rng.random_range(0..4000);
        let b = rng.random_range(0..4000);
        let k = rng.random_range(1..=5000);
        let outcome = [Outcome::AWon, Outcome::BWon, Outcome::Draw][rng.random_range(0..3)];
        let (na, nb) = EloConfig { k_factor: k, floor: 100 }.update(a, b, outcome);
        assert!(na >= 100 && nb >= 100, "{a} vs {b}, k={k}, {outcome:?} -> {na}, {nb}");
    }
}
