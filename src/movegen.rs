//! Move generation: pseudo-legal per-piece geometry, then a legality filter
//! that rejects anything leaving the mover's own king attacked.
//!
//! `legal_moves` is the single legality oracle; the session controller
//! accepts a move only if it is a member of that set.

use crate::board::{
    square_file, square_name, square_rank, Color, Piece, Position, BLACK_KINGSIDE,
    BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Castle {
    None,
    KingSide,
    QueenSide,
}

/// A fully-specified move, meaningful only for the position it was
/// generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: u8,
    pub to: u8,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub promotion: Option<Piece>,
    pub en_passant: bool,
    pub castle: Castle,
}

impl Move {
    pub fn quiet(from: u8, to: u8, piece: Piece) -> Self {
        Self {
            from,
            to,
            piece,
            captured: None,
            promotion: None,
            en_passant: false,
            castle: Castle::None,
        }
    }

    pub fn capture(from: u8, to: u8, piece: Piece, captured: Piece) -> Self {
        Self {
            captured: Some(captured),
            ..Self::quiet(from, to, piece)
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Coordinate notation: `e2e4`, `e7e8q`.
    pub fn coordinate(&self) -> String {
        let mut out = format!("{}{}", square_name(self.from), square_name(self.to));
        if let Some(promotion) = self.promotion {
            out.push(match promotion {
                Piece::Knight => 'n',
                Piece::Bishop => 'b',
                Piece::Rook => 'r',
                Piece::Queen => 'q',
                Piece::Pawn | Piece::King => unreachable!("not a promotion piece"),
            });
        }
        out
    }
}

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

const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

fn shift(sq: u8, dr: i8, df: i8) -> Option<u8> {
    let rank = square_rank(sq) as i8 + dr;
    let file = square_file(sq) as i8 + df;
    if (0..8).contains(&rank) && (0..8).contains(&file) {
        Some((rank * 8 + file) as u8)
    } else {
        None
    }
}

fn enemy_piece_at(pos: &Position, us: Color, sq: u8) -> Option<Piece> {
    let mask = 1u64 << sq;
    Piece::ALL
        .into_iter()
        .find(|p| pos.pieces(us.opposite())[p.index()] & mask != 0)
}

/// All moves the side to move could make by piece geometry alone, ignoring
/// whether they leave the own king in check.
pub fn pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    let mut moves = Vec::with_capacity(48);

    for piece in Piece::ALL {
        let mut bb = pos.pieces(us)[piece.index()];
        while bb != 0 {
            let from = bb.trailing_zeros() as u8;
            bb &= bb - 1;
            match piece {
                Piece::Pawn => pawn_moves(pos, from, &mut moves),
                Piece::Knight => offset_moves(pos, from, piece, &KNIGHT_OFFSETS, &mut moves),
                Piece::Bishop => ray_moves(pos, from, piece, &BISHOP_DIRS, &mut moves),
                Piece::Rook => ray_moves(pos, from, piece, &ROOK_DIRS, &mut moves),
                Piece::Queen => {
                    ray_moves(pos, from, piece, &BISHOP_DIRS, &mut moves);
                    ray_moves(pos, from, piece, &ROOK_DIRS, &mut moves);
                }
                Piece::King => {
                    offset_moves(pos, from, piece, &KING_OFFSETS, &mut moves);
                    castle_moves(pos, &mut moves);
                }
            }
        }
    }

    moves
}

/// The legal-move set: pseudo-legal moves whose application leaves the
/// mover's own king unattacked.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    let us = pos.side_to_move;
    pseudo_legal_moves(pos)
        .into_iter()
        .filter(|&mv| {
            let next = pos.apply(mv);
            match next.king_square(us) {
                Some(king) => !is_attacked(&next, king, us.opposite()),
                None => false,
            }
        })
        .collect()
}

/// Whether `by` attacks `sq`. Pawns attack diagonally only, distinct from
/// their forward move.
pub fn is_attacked(pos: &Position, sq: u8, by: Color) -> bool {
    let attackers = pos.pieces(by);

    // A pawn attacking sq sits one rank toward its own side.
    let pawn_dr: i8 = match by {
        Color::White => -1,
        Color::Black => 1,
    };
    for df in [-1, 1] {
        if let Some(origin) = shift(sq, pawn_dr, df) {
            if attackers[Piece::Pawn.index()] & (1u64 << origin) != 0 {
                return true;
            }
        }
    }

    for &(dr, df) in &KNIGHT_OFFSETS {
        if let Some(origin) = shift(sq, dr, df) {
            if attackers[Piece::Knight.index()] & (1u64 << origin) != 0 {
                return true;
            }
        }
    }

    for &(dr, df) in &KING_OFFSETS {
        if let Some(origin) = shift(sq, dr, df) {
            if attackers[Piece::King.index()] & (1u64 << origin) != 0 {
                return true;
            }
        }
    }

    let occupied = pos.occupied();
    let diagonal = attackers[Piece::Bishop.index()] | attackers[Piece::Queen.index()];
    if ray_hits(sq, &BISHOP_DIRS, occupied, diagonal) {
        return true;
    }
    let straight = attackers[Piece::Rook.index()] | attackers[Piece::Queen.index()];
    ray_hits(sq, &ROOK_DIRS, occupied, straight)
}

pub fn is_in_check(pos: &Position) -> bool {
    match pos.king_square(pos.side_to_move) {
        Some(king) => is_attacked(pos, king, pos.side_to_move.opposite()),
        None => false,
    }
}

fn ray_hits(sq: u8, dirs: &[(i8, i8)], occupied: u64, attackers: u64) -> bool {
    for &(dr, df) in dirs {
        let mut cursor = sq;
        while let Some(next) = shift(cursor, dr, df) {
            let mask = 1u64 << next;
            if occupied & mask != 0 {
                if attackers & mask != 0 {
                    return true;
                }
                break;
            }
            cursor = next;
        }
    }
    false
}

fn offset_moves(
    pos: &Position,
    from: u8,
    piece: Piece,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    let us = pos.side_to_move;
    let own = pos.occupancy(us);
    for &(dr, df) in offsets {
        if let Some(to) = shift(from, dr, df) {
            if own & (1u64 << to) != 0 {
                continue;
            }
            match enemy_piece_at(pos, us, to) {
                Some(captured) => moves.push(Move::capture(from, to, piece, captured)),
                None => moves.push(Move::quiet(from, to, piece)),
            }
        }
    }
}

fn ray_moves(pos: &Position, from: u8, piece: Piece, dirs: &[(i8, i8)], moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let own = pos.occupancy(us);
    for &(dr, df) in dirs {
        let mut cursor = from;
        while let Some(to) = shift(cursor, dr, df) {
            if own & (1u64 << to) != 0 {
                break;
            }
            match enemy_piece_at(pos, us, to) {
                Some(captured) => {
                    moves.push(Move::capture(from, to, piece, captured));
                    break;
                }
                None => {
                    moves.push(Move::quiet(from, to, piece));
                    cursor = to;
                }
            }
        }
    }
}

fn pawn_moves(pos: &Position, from: u8, moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let (dir, start_rank, promo_rank): (i8, u8, u8) = match us {
        Color::White => (1, 1, 7),
        Color::Black => (-1, 6, 0),
    };
    let occupied = pos.occupied();

    // Pushes.
    if let Some(to) = shift(from, dir, 0) {
        if occupied & (1u64 << to) == 0 {
            push_pawn_move(Move::quiet(from, to, Piece::Pawn), promo_rank, moves);
            if square_rank(from) == start_rank {
                if let Some(double) = shift(to, dir, 0) {
                    if occupied & (1u64 << double) == 0 {
                        moves.push(Move::quiet(from, double, Piece::Pawn));
                    }
                }
            }
        }
    }

    // Diagonal captures, including en passant onto the skipped square.
    for df in [-1, 1] {
        if let Some(to) = shift(from, dir, df) {
            if let Some(captured) = enemy_piece_at(pos, us, to) {
                push_pawn_move(
                    Move::capture(from, to, Piece::Pawn, captured),
                    promo_rank,
                    moves,
                );
            } else if pos.en_passant_square == Some(to) {
                moves.push(Move {
                    en_passant: true,
                    ..Move::capture(from, to, Piece::Pawn, Piece::Pawn)
                });
            }
        }
    }
}

// Promotion is forced on the last rank; each choice is a distinct move.
fn push_pawn_move(mv: Move, promo_rank: u8, moves: &mut Vec<Move>) {
    if square_rank(mv.to) == promo_rank {
        for promotion in [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight] {
            moves.push(Move {
                promotion: Some(promotion),
                ..mv
            });
        }
    } else {
        moves.push(mv);
    }
}

fn castle_moves(pos: &Position, moves: &mut Vec<Move>) {
    let us = pos.side_to_move;
    let them = us.opposite();
    let (king_sq, kingside, queenside, kingside_rook, queenside_rook) = match us {
        Color::White => (4u8, WHITE_KINGSIDE, WHITE_QUEENSIDE, 7u8, 0u8),
        Color::Black => (60u8, BLACK_KINGSIDE, BLACK_QUEENSIDE, 63u8, 56u8),
    };
    if pos.king_square(us) != Some(king_sq) {
        return;
    }
    let occupied = pos.occupied();
    let rooks = pos.pieces(us)[Piece::Rook.index()];

    // Kingside: f and g empty, king's square and both transit squares safe.
    if pos.castling_rights & kingside != 0
        && rooks & (1u64 << kingside_rook) != 0
        && occupied & ((1u64 << (king_sq + 1)) | (1u64 << (king_sq + 2))) == 0
        && !is_attacked(pos, king_sq, them)
        && !is_attacked(pos, king_sq + 1, them)
        && !is_attacked(pos, king_sq + 2, them)
    {
        moves.push(Move {
            castle: Castle::KingSide,
            ..Move::quiet(king_sq, king_sq + 2, Piece::King)
        });
    }

    // Queenside: b, c and d empty; the b-file square may stay attacked.
    if pos.castling_rights & queenside != 0
        && rooks & (1u64 << queenside_rook) != 0
        && occupied & ((1u64 << (king_sq - 1)) | (1u64 << (king_sq - 2)) | (1u64 << (king_sq - 3)))
            == 0
        && !is_attacked(pos, king_sq, them)
        && !is_attacked(pos, king_sq - 1, them)
        && !is_attacked(pos, king_sq - 2, them)
    {
        moves.push(Move {
            castle: Castle::QueenSide,
            ..Move::quiet(king_sq, king_sq - 2, Piece::King)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_spells_out_each_promotion_piece() {
        for (piece, expected) in [
            (Piece::Queen, "e7e8q"),
            (Piece::Rook, "e7e8r"),
            (Piece::Bishop, "e7e8b"),
            (Piece::Knight, "e7e8n"),
        ] {
            let mv = Move {
                promotion: Some(piece),
                ..Move::quiet(52, 60, Piece::Pawn)
            };
            assert_eq!(mv.coordinate(), expected);
        }
        assert_eq!(Move::quiet(12, 28, Piece::Pawn).coordinate(), "e2e4");
    }
}
