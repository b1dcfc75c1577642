//! Hotseat console for two local players. Pure glue: every rule decision
//! goes through the session controller, exactly as a network layer would.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::board::{square_from_name, Piece};
use crate::fen::to_fen;
use crate::session::{GameId, GameStatus, PlayerId, SessionManager};

const WHITE_PLAYER: PlayerId = 1;
const BLACK_PLAYER: PlayerId = 2;

pub struct Console {
    manager: SessionManager,
    game: GameId,
}

impl Console {
    pub fn new() -> Self {
        let manager = SessionManager::new();
        let game = manager.create_game(WHITE_PLAYER, BLACK_PLAYER).id;
        Self { manager, game }
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        println!("two-knights hotseat. Moves as e2e4 (e7e8q to promote);");
        println!("commands: moves, fen, board, resign, quit.");
        self.print_board()?;

        for line in stdin.lock().lines() {
            let line = line?;
            match line.trim() {
                "" => {}
                "quit" => break,
                "board" => self.print_board()?,
                "fen" => println!("{}", to_fen(&self.manager.position(self.game)?)),
                "moves" => {
                    let moves = self.manager.legal_moves_for(self.game)?;
                    let list: Vec<String> = moves.iter().map(|m| m.coordinate()).collect();
                    println!("{}", list.join(" "));
                }
                "resign" => {
                    let player = self.player_to_move()?;
                    match self.manager.resign(self.game, player) {
                        Ok(outcome) => {
                            println!("resigned; {} wins", side_name(outcome.winner));
                            break;
                        }
                        Err(e) => println!("error: {}", e),
                    }
                }
                input => {
                    if self.handle_move(input)? {
                        break;
                    }
                }
            }
            stdout.flush()?;
        }
        Ok(())
    }

    /// Submits one coordinate move; returns true once the game is over.
    fn handle_move(&mut self, input: &str) -> Result<bool> {
        let Some((from, to, promotion)) = parse_coordinate(input) else {
            println!("unrecognized input '{}'; expected e.g. e2e4 or e7e8q", input);
            return Ok(false);
        };
        let player = self.player_to_move()?;
        match self.manager.submit_move(self.game, player, from, to, promotion) {
            Ok(outcome) => {
                self.print_board()?;
                match outcome.status {
                    GameStatus::Ongoing => {
                        println!("{} to move", side_name(self.player_to_move()?));
                        Ok(false)
                    }
                    GameStatus::Checkmate => {
                        println!("checkmate; {} wins", side_name(player));
                        Ok(true)
                    }
                    GameStatus::Stalemate => {
                        println!("stalemate");
                        Ok(true)
                    }
                    GameStatus::Draw => {
                        println!("draw");
                        Ok(true)
                    }
                    GameStatus::Resigned => Ok(true),
                }
            }
            Err(e) => {
                println!("error: {}", e);
                Ok(false)
            }
        }
    }

    fn player_to_move(&self) -> Result<PlayerId> {
        Ok(self.manager.game(self.game)?.player_to_move())
    }

    fn print_board(&self) -> Result<()> {
        print!("{}", self.manager.position(self.game)?);
        Ok(())
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::new()
    }
}

fn side_name(player: PlayerId) -> &'static str {
    if player == WHITE_PLAYER {
        "white"
    } else {
        "black"
    }
}

fn parse_coordinate(input: &str) -> Option<(u8, u8, Option<Piece>)> {
    if input.len() != 4 && input.len() != 5 {
        return None;
    }
    let from = square_from_name(input.get(0..2)?)?;
    let to = square_from_name(input.get(2..4)?)?;
    let promotion = match input.get(4..5) {
        None => None,
        Some("q") => Some(Piece::Queen),
        Some("r") => Some(Piece::Rook),
        Some("b") => Some(Piece::Bishop),
        Some("n") => Some(Piece::Knight),
        Some(_) => return None,
    };
    Some((from, to, promotion))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_input() {
        assert_eq!(parse_coordinate("e2e4"), Some((12, 28, None)));
        assert_eq!(parse_coordinate("e7e8q"), Some((52, 60, Some(Piece::Queen))));
        assert_eq!(parse_coordinate("e7e8x"), None);
        assert_eq!(parse_coordinate("e2"), None);
        assert_eq!(parse_coordinate("i2e4"), None);
    }
}
