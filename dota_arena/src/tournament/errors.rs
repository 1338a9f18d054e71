//! Tournament error types.

use thiserror::Error;

use super::models::{MatchId, ParticipantId, TournamentId};
use crate::users::{UserError, UserId};

/// Tournament errors
///
/// Everything except `Database` and `CorruptRecord` is a precondition
/// violation reported back to the caller; none of them are retried.
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Tournament is full")]
    Full,

    #[error("User {0} already joined this tournament")]
    AlreadyJoined(UserId),

    #[error("User {0} is not registered in this tournament")]
    NotJoined(UserId),

    #[error("Insufficient participants: need {needed}, have {current}")]
    InsufficientParticipants { needed: usize, current: usize },

    #[error("Tournament already started")]
    AlreadyStarted,

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Participant {winner} did not play in match {match_id}")]
    InvalidWinner {
        match_id: MatchId,
        winner: ParticipantId,
    },

    #[error("Match {0} has already been played")]
    AlreadyPlayed(MatchId),

    #[error("Invalid tournament configuration: {0}")]
    InvalidConfig(String),

    #[error("User directory error: {0}")]
    User(#[from] UserError),

    #[error("Corrupt tournament record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TournamentError {
    /// Message safe to relay to a chat user
    ///
    /// Storage errors are replaced with a generic message so SQL details
    /// never reach the chat.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Database(_) | TournamentError::CorruptRecord(_) => {
                "Internal server error".to_string()
            }
            TournamentError::User(err) => err.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for tournament operations
pub type TournamentResult<T> = Result<T, TournamentError>;
