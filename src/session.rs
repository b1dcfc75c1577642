//! Game sessions: turn arbitration, move commits and lifecycle status on
//! top of the stateless rules engine.
//!
//! A `SessionManager` owns every live game. Mutations on one game are
//! serialized by that game's own lock and commit atomically: a failed
//! submission changes nothing, a successful one is fully visible to the
//! next caller. The manager performs no I/O; persistence and transport
//! belong to whatever layer drives it.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rand::random;
use thiserror::Error;

use crate::board::{Color, Piece, Position, RepetitionKey};
use crate::fen::to_fen;
use crate::movegen::{legal_moves, Move};
use crate::status::{classify, Verdict};

pub type GameId = u64;
pub type PlayerId = u64;

/// Lifecycle of one game. `Ongoing` accepts moves and resignations; the
/// other four states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate,
    Stalemate,
    Draw,
    Resigned,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        *self != GameStatus::Ongoing
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    #[error("no game with id {0}")]
    UnknownGame(GameId),
    #[error("game is no longer active")]
    GameNotActive,
    #[error("it is not this player's turn")]
    NotYourTurn,
    #[error("move is not legal in the current position")]
    IllegalMove,
}

/// One committed move as recorded in the game log.
#[derive(Debug, Clone)]
pub struct MoveRecord {
    pub move_number: u32,
    pub player: PlayerId,
    pub mv: Move,
    /// FEN of the position the move produced.
    pub fen: String,
}

/// One game between two bound players. Owned by the `SessionManager`;
/// callers only ever see cloned snapshots.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: GameId,
    pub white: PlayerId,
    pub black: PlayerId,
    pub position: Position,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub move_log: Vec<MoveRecord>,
    /// Bumped once per committed mutation; pollers compare it instead of
    /// re-deriving state.
    pub version: u64,
    history: Vec<RepetitionKey>,
}

impl GameSession {
    fn new(id: GameId, white: PlayerId, black: PlayerId) -> Self {
        let position = Position::new();
        let history = vec![position.repetition_key()];
        Self {
            id,
            white,
            black,
            position,
            status: GameStatus::Ongoing,
            winner: None,
            move_log: Vec::new(),
            version: 0,
            history,
        }
    }

    pub fn player_to_move(&self) -> PlayerId {
        match self.position.side_to_move {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }
}

/// What a successful `submit_move` hands back for persistence and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub position: Position,
    pub fen: String,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub version: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResignOutcome {
    pub winner: PlayerId,
}

/// Registry and arbiter for all live games.
pub struct SessionManager {
    games: Mutex<HashMap<GameId, Arc<Mutex<GameSession>>>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            games: Mutex::new(HashMap::new()),
        }
    }

    /// Starts a game from the standard position and returns its snapshot.
    pub fn create_game(&self, white: PlayerId, black: PlayerId) -> GameSession {
        let mut games = self.games.lock().expect("game table lock poisoned");
        loop {
            let id: GameId = random();
            if let Entry::Vacant(slot) = games.entry(id) {
                let session = GameSession::new(id, white, black);
                slot.insert(Arc::new(Mutex::new(session.clone())));
                return session;
            }
        }
    }

    /// Validates and commits one move. All checks run before any state
    /// changes; the commit happens entirely under the game's lock.
    pub fn submit_move(
        &self,
        game: GameId,
        player: PlayerId,
        from: u8,
        to: u8,
        promotion: Option<Piece>,
    ) -> Result<MoveOutcome, MoveError> {
        let session = self.session(game)?;
        let mut session = lock_game(&session);

        if session.status.is_terminal() {
            return Err(MoveError::GameNotActive);
        }
        if player != session.player_to_move() {
            return Err(MoveError::NotYourTurn);
        }

        // Promotion choice is part of the move's identity: a promotion
        // submitted without one matches nothing and is rejected.
        let mv = legal_moves(&session.position)
            .into_iter()
            .find(|m| m.from == from && m.to == to && m.promotion == promotion)
            .ok_or(MoveError::IllegalMove)?;

        let next = session.position.apply(mv);
        let fen = to_fen(&next);

        session.history.push(next.repetition_key());
        let verdict = classify(&next, &session.history);
        match verdict {
            Verdict::Ongoing => {}
            Verdict::Checkmate => {
                session.status = GameStatus::Checkmate;
                session.winner = Some(player);
            }
            Verdict::Stalemate => session.status = GameStatus::Stalemate,
            _ => session.status = GameStatus::Draw,
        }

        let move_number = session.move_log.len() as u32 + 1;
        session.move_log.push(MoveRecord {
            move_number,
            player,
            mv,
            fen: fen.clone(),
        });
        session.position = next.clone();
        session.version += 1;

        Ok(MoveOutcome {
            position: next,
            fen,
            status: session.status,
            winner: session.winner,
            version: session.version,
        })
    }

    /// Ends the game in favor of the opponent.
    pub fn resign(&self, game: GameId, player: PlayerId) -> Result<ResignOutcome, MoveError> {
        let session = self.session(game)?;
        let mut session = lock_game(&session);

        if session.status.is_terminal() {
            return Err(MoveError::GameNotActive);
        }
        let winner = if player == session.white {
            session.black
        } else if player == session.black {
            session.white
        } else {
            return Err(MoveError::NotYourTurn);
        };

        session.status = GameStatus::Resigned;
        session.winner = Some(winner);
        session.version += 1;
        Ok(ResignOutcome { winner })
    }

    /// The committed position, as of the latest completed mutation.
    pub fn position(&self, game: GameId) -> Result<Position, MoveError> {
        Ok(lock_game(&self.session(game)?).position.clone())
    }

    /// Legal moves in the current position, e.g. for move highlighting.
    /// Empty once the game is over.
    pub fn legal_moves_for(&self, game: GameId) -> Result<Vec<Move>, MoveError> {
        let session = self.session(game)?;
        let session = lock_game(&session);
        if session.status.is_terminal() {
            return Ok(Vec::new());
        }
        Ok(legal_moves(&session.position))
    }

    /// Full snapshot of a session.
    pub fn game(&self, game: GameId) -> Result<GameSession, MoveError> {
        Ok(lock_game(&self.session(game)?).clone())
    }

    fn session(&self, game: GameId) -> Result<Arc<Mutex<GameSession>>, MoveError> {
        self.games
            .lock()
            .expect("game table lock poisoned")
            .get(&game)
            .cloned()
            .ok_or(MoveError::UnknownGame(game))
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        SessionManager::new()
    }
}

fn lock_game(session: &Arc<Mutex<GameSession>>) -> MutexGuard<'_, GameSession> {
    session.lock().expect("game lock poisoned")
}
