//! # Dota Arena
//!
//! Gamified side features for a Dota 2 statistics chat bot: single-elimination
//! tournaments, linked player accounts and a tic-tac-toe mini-game, persisted
//! in PostgreSQL.
//!
//! ## Core Modules
//!
//! - [`tournament`]: Registration, bracket generation, result reporting and standings
//! - [`users`]: Chat users and their bound game accounts
//! - [`minigame`]: Two-player tic-tac-toe
//! - [`db`]: Connection pool and schema migrations
//!
//! ## Example
//!
//! ```
//! use dota_arena::tournament::{JoinRequest, MemoryTournamentStore, NewTournament, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = TournamentManager::with_store(Arc::new(MemoryTournamentStore::new()));
//!     let cup = manager
//!         .create_tournament(NewTournament::new("Weekend Cup", 4, 1))
//!         .await?;
//!
//!     manager.join(cup.id, JoinRequest::new(10, "Ceb")).await?;
//!     manager.join(cup.id, JoinRequest::new(11, "N0tail")).await?;
//!
//!     let round_one = manager.generate_bracket(cup.id).await?;
//!     assert_eq!(round_one.len(), 1);
//!     Ok(())
//! }
//! ```

/// Database pool and migrations.
pub mod db;

/// Mini-games.
pub mod minigame;

/// Tournament bracket and match progression.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager, TournamentResult};

/// Chat users and linked accounts.
pub mod users;
pub use users::{UserDirectory, UserError};
