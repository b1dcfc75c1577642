pub mod board;
pub mod cli;
pub mod fen;
pub mod movegen;
pub mod session;
pub mod status;

pub use board::{Color, Piece, Position};
pub use fen::{parse_fen, to_fen, FenError, START_FEN};
pub use movegen::{is_attacked, is_in_check, legal_moves, pseudo_legal_moves, Castle, Move};
pub use session::{
    GameId, GameSession, GameStatus, MoveError, MoveOutcome, PlayerId, ResignOutcome,
    SessionManager,
};
pub use status::{classify, Verdict};
