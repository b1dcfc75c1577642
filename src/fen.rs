//! Position codec for Forsyth-Edwards Notation, the canonical 6-field text
//! form a position travels in and out of the engine as.
//!
//! `parse_fen` is the trust boundary: anything it accepts satisfies the
//! engine's invariants (exactly one king per color, a plausible en-passant
//! target), so the rest of the crate never re-validates.

use thiserror::Error;

use crate::board::{
    piece_char, square, square_from_name, square_name, square_rank, Color, Piece, Position,
    BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE,
};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected 6 space-separated fields, found {0}")]
    FieldCount(usize),
    #[error("board layout must have 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {0} does not describe exactly 8 files")]
    RankWidth(u8),
    #[error("invalid piece character '{0}' in board layout")]
    BadPiece(char),
    #[error("invalid side-to-move field '{0}'")]
    BadSideToMove(String),
    #[error("invalid castling rights field '{0}'")]
    BadCastling(String),
    #[error("invalid en-passant field '{0}' for the side to move")]
    BadEnPassant(String),
    #[error("invalid halfmove clock '{0}'")]
    BadHalfmoveClock(String),
    #[error("invalid fullmove number '{0}'")]
    BadFullmoveNumber(String),
    #[error("{0} kings of one color; a position needs exactly one each")]
    KingCount(u32),
}

/// Parses the canonical 6-field position string.
pub fn parse_fen(text: &str) -> Result<Position, FenError> {
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(FenError::FieldCount(fields.len()));
    }

    let mut pos = Position::empty();
    parse_board(fields[0], &mut pos)?;

    pos.side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::BadSideToMove(other.to_string())),
    };

    pos.castling_rights = parse_castling(fields[2])?;
    pos.en_passant_square = parse_en_passant(fields[3], pos.side_to_move)?;

    pos.halfmove_clock = fields[4]
        .parse::<u16>()
        .map_err(|_| FenError::BadHalfmoveClock(fields[4].to_string()))?;
    pos.fullmove_number = fields[5]
        .parse::<u16>()
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| FenError::BadFullmoveNumber(fields[5].to_string()))?;

    for color in [Color::White, Color::Black] {
        let kings = pos.pieces(color)[Piece::King.index()].count_ones();
        if kings != 1 {
            return Err(FenError::KingCount(kings));
        }
    }

    Ok(pos)
}

fn parse_board(layout: &str, pos: &mut Position) -> Result<(), FenError> {
    let ranks: Vec<&str> = layout.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }

    // FEN lists rank 8 first.
    for (row, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - row as u8;
        let mut file = 0u8;
        for ch in rank_text.chars() {
            if let Some(run) = ch.to_digit(10) {
                if run == 0 || run == 9 {
                    return Err(FenError::BadPiece(ch));
                }
                file += run as u8;
                if file > 8 {
                    return Err(FenError::RankWidth(rank + 1));
                }
                continue;
            }
            let (color, piece) = piece_from_char(ch).ok_or(FenError::BadPiece(ch))?;
            if file >= 8 {
                return Err(FenError::RankWidth(rank + 1));
            }
            pos.pieces_mut(color)[piece.index()] |= 1u64 << square(file, rank);
            file += 1;
        }
        if file != 8 {
            return Err(FenError::RankWidth(rank + 1));
        }
    }
    Ok(())
}

fn parse_castling(field: &str) -> Result<u8, FenError> {
    if field == "-" {
        return Ok(0);
    }
    let mut rights = 0u8;
    for ch in field.chars() {
        rights |= match ch {
            'K' => WHITE_KINGSIDE,
            'Q' => WHITE_QUEENSIDE,
            'k' => BLACK_KINGSIDE,
            'q' => BLACK_QUEENSIDE,
            _ => return Err(FenError::BadCastling(field.to_string())),
        };
    }
    Ok(rights)
}

fn parse_en_passant(field: &str, side_to_move: Color) -> Result<Option<u8>, FenError> {
    if field == "-" {
        return Ok(None);
    }
    let sq = square_from_name(field).ok_or_else(|| FenError::BadEnPassant(field.to_string()))?;
    // The target sits behind the pawn that just double-pushed, so it is on
    // rank 6 when white is to move and rank 3 when black is.
    let expected_rank = match side_to_move {
        Color::White => 5,
        Color::Black => 2,
    };
    if square_rank(sq) != expected_rank {
        return Err(FenError::BadEnPassant(field.to_string()));
    }
    Ok(Some(sq))
}

fn piece_from_char(ch: char) -> Option<(Color, Piece)> {
    let color = if ch.is_ascii_uppercase() {
        Color::White
    } else {
        Color::Black
    };
    let piece = match ch.to_ascii_lowercase() {
        'p' => Piece::Pawn,
        'n' => Piece::Knight,
        'b' => Piece::Bishop,
        'r' => Piece::Rook,
        'q' => Piece::Queen,
        'k' => Piece::King,
        _ => return None,
    };
    Some((color, piece))
}

/// Serializes a position to its canonical 6-field string. Total: every
/// reachable position has exactly one FEN, and `parse_fen` inverts it.
pub fn to_fen(pos: &Position) -> String {
    let mut out = String::with_capacity(80);

    for rank in (0..8).rev() {
        let mut empty_run = 0u8;
        for file in 0..8 {
            match pos.piece_at(square(file, rank)) {
                Some((color, piece)) => {
                    if empty_run > 0 {
                        out.push((b'0' + empty_run) as char);
                        empty_run = 0;
                    }
                    out.push(piece_char(color, piece));
                }
                None => empty_run += 1,
            }
        }
        if empty_run > 0 {
            out.push((b'0' + empty_run) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match pos.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    if pos.castling_rights == 0 {
        out.push('-');
    } else {
        if pos.castling_rights & WHITE_KINGSIDE != 0 {
            out.push('K');
        }
        if pos.castling_rights & WHITE_QUEENSIDE != 0 {
            out.push('Q');
        }
        if pos.castling_rights & BLACK_KINGSIDE != 0 {
            out.push('k');
        }
        if pos.castling_rights & BLACK_QUEENSIDE != 0 {
            out.push('q');
        }
    }

    out.push(' ');
    match pos.en_passant_square {
        Some(sq) => out.push_str(&square_name(sq)),
        None => out.push('-'),
    }

    out.push_str(&format!(" {} {}", pos.halfmove_clock, pos.fullmove_number));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::legal_moves;

    #[test]
    fn start_position_round_trips() {
        let pos = parse_fen(START_FEN).expect("starting FEN should parse");
        assert_eq!(pos, Position::new());
        assert_eq!(to_fen(&pos), START_FEN);
    }

    #[test]
    fn played_positions_round_trip() {
        // Walk a few plies from the start and round-trip every position,
        // including ones with an en-passant target and reduced rights.
        let mut pos = Position::new();
        for _ in 0..6 {
            let mv = legal_moves(&pos)[0];
            pos = pos.apply(mv);
            let reparsed = parse_fen(&to_fen(&pos)).expect("reachable position must serialize");
            assert_eq!(reparsed, pos);
        }
    }

    #[test]
    fn mid_game_fen_parses_field_by_field() {
        let pos = parse_fen("r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 7 42").unwrap();
        assert_eq!(pos.side_to_move, Color::White);
        assert_eq!(pos.castling_rights, 0b1111);
        assert_eq!(pos.en_passant_square, square_from_name("d6"));
        assert_eq!(pos.halfmove_clock, 7);
        assert_eq!(pos.fullmove_number, 42);
        assert_eq!(
            to_fen(&pos),
            "r3k2r/8/8/3pP3/8/8/8/R3K2R w KQkq d6 7 42"
        );
    }

    #[test]
    fn rejects_wrong_field_count() {
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::FieldCount(5))
        );
    }

    #[test]
    fn rejects_malformed_board() {
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::RankCount(7))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/7/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::RankWidth(_))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBXKBNR w KQkq - 0 1"),
            Err(FenError::BadPiece('X'))
        ));
    }

    #[test]
    fn rejects_ranks_describing_more_than_eight_files() {
        // A digit run past the eighth file must fail cleanly, no matter
        // how long it is.
        let layout = format!("{}/8/8/8/8/8/8/4K2k", "8".repeat(33));
        assert_eq!(
            parse_fen(&format!("{layout} w - - 0 1")),
            Err(FenError::RankWidth(8))
        );
        assert_eq!(
            parse_fen("rnbqkbnrr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::RankWidth(8))
        );
        assert_eq!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR44 w KQkq - 0 1"),
            Err(FenError::RankWidth(1))
        );
    }

    #[test]
    fn rejects_bad_trailing_fields() {
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::BadSideToMove(_))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1"),
            Err(FenError::BadCastling(_))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1"),
            Err(FenError::BadHalfmoveClock(_))
        ));
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 0"),
            Err(FenError::BadFullmoveNumber(_))
        ));
    }

    #[test]
    fn rejects_en_passant_on_the_wrong_rank() {
        // e3 is only a valid target when black is to move.
        assert!(matches!(
            parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e3 0 1"),
            Err(FenError::BadEnPassant(_))
        ));
        assert!(
            parse_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1").is_ok()
        );
    }

    #[test]
    fn rejects_wrong_king_counts() {
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8/KK5k w - - 0 1"),
            Err(FenError::KingCount(2))
        ));
        assert!(matches!(
            parse_fen("8/8/8/8/8/8/8/K7 w - - 0 1"),
            Err(FenError::KingCount(0))
        ));
    }
}
