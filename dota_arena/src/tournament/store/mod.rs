//! Persistence seam for tournaments.
//!
//! [`PgTournamentStore`] is the production backend. [`MemoryTournamentStore`]
//! keeps everything in process and is used for embedding and tests.

use async_trait::async_trait;

use super::errors::TournamentResult;
use super::models::{MatchId, NewTournament, Tournament, TournamentId, TournamentStatus};
use super::snapshot::{Applied, Operation, TournamentSnapshot};

pub mod memory;
pub mod postgres;

pub use memory::MemoryTournamentStore;
pub use postgres::PgTournamentStore;

/// Storage operations needed by the tournament manager
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Insert a new tournament in the `upcoming` state
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<Tournament>;

    /// Find a tournament by id
    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>>;

    /// List tournaments having one of `statuses`, by start date then id
    async fn list_tournaments(
        &self,
        statuses: &[TournamentStatus],
    ) -> TournamentResult<Vec<Tournament>>;

    /// Read a tournament with its participants and matches without locking
    async fn snapshot(&self, id: TournamentId) -> TournamentResult<TournamentSnapshot>;

    /// Tournament a match belongs to
    async fn tournament_for_match(&self, match_id: MatchId)
    -> TournamentResult<Option<TournamentId>>;

    /// Run `operation` as one unit of work
    ///
    /// The tournament is locked, the operation decides its changes from the
    /// locked snapshot, and the changes are applied. Either all changes
    /// persist or none do.
    async fn transact(&self, id: TournamentId, operation: Operation) -> TournamentResult<Applied>;
}
