//! User directory error types.

use thiserror::Error;

use super::models::UserId;

/// User directory errors
#[derive(Debug, Error)]
pub enum UserError {
    /// No account is bound to this chat user
    #[error("User {0} has not bound a game account")]
    UnknownUser(UserId),

    /// Input could not be read as a Steam profile or account id
    #[error("Unrecognized Steam profile: {0}")]
    InvalidAccountRef(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl UserError {
    /// Message safe to relay to a chat user
    pub fn client_message(&self) -> String {
        match self {
            UserError::Database(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for user directory operations
pub type UserResult<T> = Result<T, UserError>;
