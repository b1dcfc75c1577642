use std::fmt;

use crate::movegen::{Castle, Move};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Piece {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl Piece {
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    pub fn index(self) -> usize {
        match self {
            Piece::Pawn => 0,
            Piece::Knight => 1,
            Piece::Bishop => 2,
            Piece::Rook => 3,
            Piece::Queen => 4,
            Piece::King => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

// Castling-rights bits, KQkq order.
pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

/// Squares are indexed rank-major from white's side: a1 = 0, h1 = 7, a8 = 56.
pub fn square(file: u8, rank: u8) -> u8 {
    rank * 8 + file
}

pub fn square_file(sq: u8) -> u8 {
    sq % 8
}

pub fn square_rank(sq: u8) -> u8 {
    sq / 8
}

pub fn square_from_name(name: &str) -> Option<u8> {
    let mut chars = name.chars();
    let file = chars.next()?;
    let rank = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return None;
    }
    Some(square(file as u8 - b'a', rank as u8 - b'1'))
}

pub fn square_name(sq: u8) -> String {
    let file = (b'a' + square_file(sq)) as char;
    let rank = (b'1' + square_rank(sq)) as char;
    format!("{}{}", file, rank)
}

/// Everything the threefold-repetition rule compares: piece placement, side
/// to move, castling rights and the en-passant target. Clocks are excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RepetitionKey {
    white: [u64; 6],
    black: [u64; 6],
    side_to_move: Color,
    castling_rights: u8,
    en_passant_square: Option<u8>,
}

/// A full chess position. Piece placement is one bitboard per piece kind and
/// color, in `Piece::index` order.
///
/// `apply` returns a new `Position` instead of mutating, so committed game
/// state can be read concurrently while the next move is being worked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub white_pieces: [u64; 6],
    pub black_pieces: [u64; 6],
    pub side_to_move: Color,
    pub castling_rights: u8,
    pub en_passant_square: Option<u8>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Self {
            white_pieces: [
                0x000000000000FF00, // Pawns
                0x0000000000000042, // Knights
                0x0000000000000024, // Bishops
                0x0000000000000081, // Rooks
                0x0000000000000008, // Queen
                0x0000000000000010, // King
            ],
            black_pieces: [
                0x00FF000000000000, // Pawns
                0x4200000000000000, // Knights
                0x2400000000000000, // Bishops
                0x8100000000000000, // Rooks
                0x0800000000000000, // Queen
                0x1000000000000000, // King
            ],
            side_to_move: Color::White,
            castling_rights: WHITE_KINGSIDE | WHITE_QUEENSIDE | BLACK_KINGSIDE | BLACK_QUEENSIDE,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// An empty board with white to move. Only the FEN parser starts here.
    pub(crate) fn empty() -> Self {
        Self {
            white_pieces: [0; 6],
            black_pieces: [0; 6],
            side_to_move: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn pieces(&self, color: Color) -> &[u64; 6] {
        match color {
            Color::White => &self.white_pieces,
            Color::Black => &self.black_pieces,
        }
    }

    pub(crate) fn pieces_mut(&mut self, color: Color) -> &mut [u64; 6] {
        match color {
            Color::White => &mut self.white_pieces,
            Color::Black => &mut self.black_pieces,
        }
    }

    pub fn occupancy(&self, color: Color) -> u64 {
        self.pieces(color).iter().fold(0, |acc, &bb| acc | bb)
    }

    pub fn occupied(&self) -> u64 {
        self.occupancy(Color::White) | self.occupancy(Color::Black)
    }

    pub fn piece_at(&self, sq: u8) -> Option<(Color, Piece)> {
        let mask = 1u64 << sq;
        for color in [Color::White, Color::Black] {
            for piece in Piece::ALL {
                if self.pieces(color)[piece.index()] & mask != 0 {
                    return Some((color, piece));
                }
            }
        }
        None
    }

    pub fn king_square(&self, color: Color) -> Option<u8> {
        let king = self.pieces(color)[Piece::King.index()];
        if king == 0 {
            None
        } else {
            Some(king.trailing_zeros() as u8)
        }
    }

    pub fn repetition_key(&self) -> RepetitionKey {
        RepetitionKey {
            white: self.white_pieces,
            black: self.black_pieces,
            side_to_move: self.side_to_move,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
        }
    }

    /// Applies a fully-specified move and returns the resulting position.
    /// The move must come from `movegen::legal_moves` for this position;
    /// `apply` performs no legality checking of its own.
    pub fn apply(&self, mv: Move) -> Position {
        let mut next = self.clone();
        let us = self.side_to_move;
        let from_mask = 1u64 << mv.from;
        let to_mask = 1u64 << mv.to;

        next.pieces_mut(us)[mv.piece.index()] &= !from_mask;

        if let Some(captured) = mv.captured {
            let captured_sq = if mv.en_passant {
                // The victim sits behind the en-passant target square.
                match us {
                    Color::White => mv.to - 8,
                    Color::Black => mv.to + 8,
                }
            } else {
                mv.to
            };
            next.pieces_mut(us.opposite())[captured.index()] &= !(1u64 << captured_sq);
        }

        let placed = mv.promotion.unwrap_or(mv.piece);
        next.pieces_mut(us)[placed.index()] |= to_mask;

        match mv.castle {
            Castle::None => {}
            Castle::KingSide => {
                let (rook_from, rook_to) = match us {
                    Color::White => (7, 5),   // h1 -> f1
                    Color::Black => (63, 61), // h8 -> f8
                };
                let rooks = &mut next.pieces_mut(us)[Piece::Rook.index()];
                *rooks &= !(1u64 << rook_from);
                *rooks |= 1u64 << rook_to;
            }
            Castle::QueenSide => {
                let (rook_from, rook_to) = match us {
                    Color::White => (0, 3),   // a1 -> d1
                    Color::Black => (56, 59), // a8 -> d8
                };
                let rooks = &mut next.pieces_mut(us)[Piece::Rook.index()];
                *rooks &= !(1u64 << rook_from);
                *rooks |= 1u64 << rook_to;
            }
        }

        // Touching a king or rook home square revokes the matching rights,
        // whether by moving off it or by capturing onto it.
        next.castling_rights = revoke_rights(next.castling_rights, mv.from);
        next.castling_rights = revoke_rights(next.castling_rights, mv.to);

        next.en_passant_square =
            if mv.piece == Piece::Pawn && (mv.to as i8 - mv.from as i8).abs() == 16 {
                Some(match us {
                    Color::White => mv.from + 8,
                    Color::Black => mv.from - 8,
                })
            } else {
                None
            };

        if mv.piece == Piece::Pawn || mv.captured.is_some() {
            next.halfmove_clock = 0;
        } else {
            next.halfmove_clock += 1;
        }
        if us == Color::Black {
            next.fullmove_number += 1;
        }
        next.side_to_move = us.opposite();

        next
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::new()
    }
}

fn revoke_rights(rights: u8, sq: u8) -> u8 {
    match sq {
        0 => rights & !WHITE_QUEENSIDE,
        4 => rights & !(WHITE_KINGSIDE | WHITE_QUEENSIDE),
        7 => rights & !WHITE_KINGSIDE,
        56 => rights & !BLACK_QUEENSIDE,
        60 => rights & !(BLACK_KINGSIDE | BLACK_QUEENSIDE),
        63 => rights & !BLACK_KINGSIDE,
        _ => rights,
    }
}

pub(crate) fn piece_char(color: Color, piece: Piece) -> char {
    let ch = match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    };
    match color {
        Color::White => ch.to_ascii_uppercase(),
        Color::Black => ch,
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                let sq = square(file, rank);
                match self.piece_at(sq) {
                    Some((color, piece)) => write!(f, "{}", piece_char(color, piece))?,
                    None => write!(f, ".")?,
                }
                if file < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_names_round_trip() {
        assert_eq!(square_from_name("a1"), Some(0));
        assert_eq!(square_from_name("h8"), Some(63));
        assert_eq!(square_from_name("e4"), Some(28));
        assert_eq!(square_name(28), "e4");
        assert_eq!(square_from_name("i3"), None);
        assert_eq!(square_from_name("a9"), None);
        assert_eq!(square_from_name("e44"), None);
    }

    #[test]
    fn apply_does_not_mutate_the_source_position() {
        let start = Position::new();
        let mv = Move::quiet(12, 28, Piece::Pawn); // e2e4
        let next = start.apply(mv);
        assert_eq!(start, Position::new());
        assert_eq!(next.side_to_move, Color::Black);
        assert_eq!(next.en_passant_square, square_from_name("e3"));
        assert_eq!(next.halfmove_clock, 0);
        assert_eq!(next.fullmove_number, 1);
    }

    #[test]
    fn fullmove_number_increments_after_black() {
        let start = Position::new();
        let after_white = start.apply(Move::quiet(12, 28, Piece::Pawn)); // e2e4
        let after_black = after_white.apply(Move::quiet(52, 36, Piece::Pawn)); // e7e5
        assert_eq!(after_white.fullmove_number, 1);
        assert_eq!(after_black.fullmove_number, 2);
        assert_eq!(after_black.side_to_move, Color::White);
    }

    #[test]
    fn capturing_a_home_rook_revokes_castling() {
        // White rook takes the h8 rook; black's kingside right must go.
        let mut pos = Position::new();
        pos.black_pieces[Piece::Pawn.index()] &= !(1u64 << 55); // clear h7
        pos.white_pieces[Piece::Rook.index()] |= 1u64 << 55; // white rook on h7
        let mv = Move {
            from: 55,
            to: 63,
            piece: Piece::Rook,
            captured: Some(Piece::Rook),
            promotion: None,
            en_passant: false,
            castle: Castle::None,
        };
        let next = pos.apply(mv);
        assert_eq!(next.castling_rights & BLACK_KINGSIDE, 0);
        assert_ne!(next.castling_rights & BLACK_QUEENSIDE, 0);
    }
}
