//! Tic-tac-toe state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::board::{Board, CELLS, Mark, Outcome};
use super::errors::{GameError, GameResult};
use crate::users::UserId;

/// Game ID type
pub type GameId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Waiting for a second player
    Waiting,
    Active,
    Finished,
}

impl GameStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GameStatus::Waiting => "waiting",
            GameStatus::Active => "active",
            GameStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "waiting" => Ok(GameStatus::Waiting),
            "active" => Ok(GameStatus::Active),
            "finished" => Ok(GameStatus::Finished),
            other => Err(format!("unknown game status '{other}'")),
        }
    }
}

/// Result of a single move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveResult {
    /// Game continues, `next` moves
    Continue { next: UserId },
    Won { winner: UserId },
    Draw,
}

/// Two-player tic-tac-toe game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicTacToe {
    pub id: GameId,
    /// Plays X and moves first
    pub player_one: UserId,
    pub player_two: Option<UserId>,
    pub board: Board,
    pub turn: Mark,
    pub status: GameStatus,
    pub outcome: Option<Outcome>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TicTacToe {
    /// New game waiting for an opponent
    pub fn new(id: GameId, player_one: UserId) -> Self {
        Self {
            id,
            player_one,
            player_two: None,
            board: Board::new(),
            turn: Mark::X,
            status: GameStatus::Waiting,
            outcome: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Seat the second player and start the game
    pub fn join(&mut self, player_two: UserId) -> GameResult<()> {
        if self.status != GameStatus::Waiting || player_two == self.player_one {
            return Err(GameError::CannotJoin);
        }

        self.player_two = Some(player_two);
        self.status = GameStatus::Active;
        Ok(())
    }

    /// Mark played by `player`
    pub fn mark_of(&self, player: UserId) -> Option<Mark> {
        if player == self.player_one {
            Some(Mark::X)
        } else if Some(player) == self.player_two {
            Some(Mark::O)
        } else {
            None
        }
    }

    /// Player holding `mark`
    pub fn player_for(&self, mark: Mark) -> Option<UserId> {
        match mark {
            Mark::X => Some(self.player_one),
            Mark::O => self.player_two,
        }
    }

    /// Winning player of a finished game
    pub fn winner(&self) -> Option<UserId> {
        match self.outcome {
            Some(Outcome::Winner(mark)) => self.player_for(mark),
            _ => None,
        }
    }

    /// Place `player`'s mark on `cell` (0..9)
    ///
    /// # Errors
    ///
    /// * `GameError::NotActive` - Game is waiting or finished
    /// * `GameError::NotAPlayer` - User is not seated in this game
    /// * `GameError::NotYourTurn` - The other player moves next
    /// * `GameError::InvalidCell` - Cell outside the board
    /// * `GameError::CellTaken` - Cell already marked
    pub fn play(&mut self, player: UserId, cell: usize) -> GameResult<MoveResult> {
        if self.status != GameStatus::Active {
            return Err(GameError::NotActive);
        }

        let mark = self.mark_of(player).ok_or(GameError::NotAPlayer(player))?;
        if mark != self.turn {
            return Err(GameError::NotYourTurn);
        }
        if cell >= CELLS {
            return Err(GameError::InvalidCell(cell));
        }
        if !self.board.place(cell, mark) {
            return Err(GameError::CellTaken(cell));
        }

        match self.board.outcome() {
            Some(outcome) => {
                self.status = GameStatus::Finished;
                self.outcome = Some(outcome);
                self.finished_at = Some(Utc::now());
                Ok(match outcome {
                    Outcome::Winner(_) => MoveResult::Won { winner: player },
                    Outcome::Draw => MoveResult::Draw,
                })
            }
            None => {
                self.turn = mark.other();
                let next = self
                    .player_for(self.turn)
                    .ok_or_else(|| GameError::CorruptRecord("active game without opponent".into()))?;
                Ok(MoveResult::Continue { next })
            }
        }
    }
}
