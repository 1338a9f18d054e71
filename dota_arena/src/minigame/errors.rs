use thiserror::Error;

use super::game::GameId;
use crate::users::UserId;

/// Mini-game errors
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Game {0} not found")]
    NotFound(GameId),

    #[error("Game is not active")]
    NotActive,

    #[error("Game cannot be joined")]
    CannotJoin,

    #[error("User {0} is not playing this game")]
    NotAPlayer(UserId),

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Cell {0} is out of range")]
    InvalidCell(usize),

    #[error("Cell {0} is already taken")]
    CellTaken(usize),

    #[error("Corrupt game record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl GameError {
    /// Message safe to show to players
    pub fn client_message(&self) -> String {
        match self {
            GameError::Database(_) | GameError::CorruptRecord(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type GameResult<T> = Result<T, GameError>;
