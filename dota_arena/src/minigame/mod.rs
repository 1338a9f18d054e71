//! Mini-games played between chat users.
//!
//! Currently a two-player tic-tac-toe: [`TicTacToe`] holds the rules and
//! [`TicTacToeManager`] stores games in PostgreSQL, one transaction per move.

pub mod board;
pub mod errors;
pub mod game;
pub mod manager;

pub use board::{Board, CELLS, Mark, Outcome};
pub use errors::{GameError, GameResult};
pub use game::{GameId, GameStatus, MoveResult, TicTacToe};
pub use manager::TicTacToeManager;
