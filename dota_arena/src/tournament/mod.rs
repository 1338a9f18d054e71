//! Single-elimination tournaments for Dota 2 chat communities.
//!
//! This module provides tournament management functionality including:
//! - Tournament creation and listing
//! - Participant registration with a capacity limit
//! - Random bracket generation with byes for odd rounds
//! - Result reporting with automatic round advancement
//! - Standings by points and wins
//!
//! Every mutating operation is one unit of work: the rules in [`registry`],
//! [`bracket`] and [`progression`] turn a locked [`TournamentSnapshot`] into
//! a list of [`Change`]s, and the [`TournamentStore`] applies them atomically.
//!
//! ## Example
//!
//! ```no_run
//! use dota_arena::db::Database;
//! use dota_arena::tournament::{JoinRequest, NewTournament, TournamentManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let tournaments = TournamentManager::new(Arc::new(db.pool().clone()));
//!
//!     // Create an 8-player cup
//!     let cup = tournaments
//!         .create_tournament(NewTournament::new("Friday Mid Wars", 8, 1))
//!         .await?;
//!
//!     tournaments.join(cup.id, JoinRequest::new(42, "Miracle-")).await?;
//!     println!("Created tournament: {}", cup.id);
//!
//!     Ok(())
//! }
//! ```

pub mod bracket;
pub mod errors;
pub mod manager;
pub mod models;
pub mod progression;
pub mod registry;
pub mod snapshot;
pub mod standings;
pub mod store;

pub use errors::{TournamentError, TournamentResult};
pub use manager::TournamentManager;
pub use models::{
    Advancement, DEFAULT_POINTS_PER_WIN, JoinRequest, MIN_PARTICIPANTS, Match, MatchId,
    MatchStatus, NewTournament, Participant, ParticipantId, ReportOutcome, Standing, Tournament,
    TournamentId, TournamentRules, TournamentStatus,
};
pub use snapshot::{Applied, Change, Operation, TournamentSnapshot, unit_of_work};
pub use store::{MemoryTournamentStore, PgTournamentStore, TournamentStore};
