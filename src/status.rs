//! Terminal-condition detection: classifies a position (plus the repetition
//! history of the game that produced it) as ongoing, decisive or drawn.

use crate::board::{square_file, square_rank, Color, Piece, Position, RepetitionKey};
use crate::movegen::{is_in_check, legal_moves};

/// The exact game-over cause. Callers that only care about win/draw can
/// collapse the three draw variants; the detail is informational.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ongoing,
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl Verdict {
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            Verdict::InsufficientMaterial | Verdict::ThreefoldRepetition | Verdict::FiftyMoveRule
        )
    }
}

/// Classifies `pos`. `history` is the game's repetition keys and must
/// already include `pos` itself.
///
/// Mate and stalemate are checked before any draw condition: a position
/// with no legal moves is never reported as a mere draw.
pub fn classify(pos: &Position, history: &[RepetitionKey]) -> Verdict {
    if legal_moves(pos).is_empty() {
        return if is_in_check(pos) {
            Verdict::Checkmate
        } else {
            Verdict::Stalemate
        };
    }

    if insufficient_material(pos) {
        return Verdict::InsufficientMaterial;
    }

    let key = pos.repetition_key();
    if history.iter().filter(|&&k| k == key).count() >= 3 {
        return Verdict::ThreefoldRepetition;
    }

    // 100 half-moves without a pawn move or capture.
    if pos.halfmove_clock >= 100 {
        return Verdict::FiftyMoveRule;
    }

    Verdict::Ongoing
}

/// Standard material tables: bare kings, king and one minor piece, or
/// same-colored single bishops cannot force mate.
fn insufficient_material(pos: &Position) -> bool {
    for color in [Color::White, Color::Black] {
        let pieces = pos.pieces(color);
        let majors = pieces[Piece::Queen.index()]
            | pieces[Piece::Rook.index()]
            | pieces[Piece::Pawn.index()];
        if majors != 0 {
            return false;
        }
    }

    let minors = |color: Color| {
        let pieces = pos.pieces(color);
        (pieces[Piece::Knight.index()] | pieces[Piece::Bishop.index()]).count_ones()
    };
    let white_minors = minors(Color::White);
    let black_minors = minors(Color::Black);

    // K vs K, or K+minor vs K.
    if white_minors + black_minors <= 1 {
        return true;
    }

    // KB vs KB with both bishops on the same square color.
    let white_bishops = pos.pieces(Color::White)[Piece::Bishop.index()];
    let black_bishops = pos.pieces(Color::Black)[Piece::Bishop.index()];
    if white_minors == 1 && black_minors == 1 && white_bishops != 0 && black_bishops != 0 {
        let white_sq = white_bishops.trailing_zeros() as u8;
        let black_sq = black_bishops.trailing_zeros() as u8;
        let dark = |sq: u8| (square_rank(sq) + square_file(sq)) % 2 == 0;
        return dark(white_sq) == dark(black_sq);
    }

    false
}
