//! Tournament manager for registration, brackets and results.

use sqlx::PgPool;
use std::sync::Arc;

use super::errors::{TournamentError, TournamentResult};
use super::models::{
    Advancement, JoinRequest, Match, MatchId, NewTournament, Participant, ParticipantId,
    ReportOutcome, Standing, Tournament, TournamentId, TournamentRules, TournamentStatus,
};
use super::snapshot::{Applied, Change, unit_of_work};
use super::store::{PgTournamentStore, TournamentStore};
use super::{bracket, progression, registry, standings};
use crate::users::{UserDirectory, UserError, UserId};

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    store: Arc<dyn TournamentStore>,
    rules: TournamentRules,
}

impl TournamentManager {
    /// Create a new tournament manager backed by PostgreSQL
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self::with_store(Arc::new(PgTournamentStore::new(pool)))
    }

    /// Create a tournament manager on top of any store
    pub fn with_store(store: Arc<dyn TournamentStore>) -> Self {
        Self {
            store,
            rules: TournamentRules::default(),
        }
    }

    /// Replace the scoring rules
    pub fn with_rules(mut self, rules: TournamentRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> TournamentRules {
        self.rules
    }

    /// Create a new tournament
    pub async fn create_tournament(&self, new: NewTournament) -> TournamentResult<Tournament> {
        new.validate().map_err(TournamentError::InvalidConfig)?;

        let tournament = self.store.create_tournament(&new).await?;
        log::info!(
            "Created tournament {} '{}' for {} participants",
            tournament.id,
            tournament.name,
            tournament.capacity
        );

        Ok(tournament)
    }

    /// Get tournament information
    pub async fn get_tournament(&self, id: TournamentId) -> TournamentResult<Tournament> {
        self.store
            .find_tournament(id)
            .await?
            .ok_or(TournamentError::NotFound(id))
    }

    /// Tournaments that are upcoming or ongoing, soonest first
    pub async fn active_tournaments(&self) -> TournamentResult<Vec<Tournament>> {
        self.store
            .list_tournaments(&TournamentStatus::active())
            .await
    }

    /// Register a participant
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyStarted` - Bracket already generated
    /// * `TournamentError::Full` - No free slot
    /// * `TournamentError::AlreadyJoined` - User is already registered
    pub async fn join(
        &self,
        id: TournamentId,
        request: JoinRequest,
    ) -> TournamentResult<Participant> {
        let user_id = request.user_id;
        let applied = self
            .store
            .transact(
                id,
                unit_of_work(move |snapshot| registry::join(snapshot, &request)),
            )
            .await?;

        let participant = applied
            .snapshot
            .participant_for_user(user_id)
            .cloned()
            .ok_or_else(|| {
                TournamentError::CorruptRecord(format!("participant for user {user_id} missing"))
            })?;

        log::info!(
            "User {} joined tournament {} ({}/{})",
            user_id,
            id,
            applied.snapshot.tournament.participant_count,
            applied.snapshot.tournament.capacity
        );

        Ok(participant)
    }

    /// Register a user with the name and account bound in `directory`
    pub async fn join_user(
        &self,
        id: TournamentId,
        user_id: UserId,
        directory: &dyn UserDirectory,
    ) -> TournamentResult<Participant> {
        let user = directory
            .find(user_id)
            .await?
            .ok_or(UserError::UnknownUser(user_id))?;

        self.join(
            id,
            JoinRequest {
                user_id,
                account_id: user.account_id,
                display_name: user.display_name,
            },
        )
        .await
    }

    /// Withdraw a participant before the bracket is generated
    pub async fn leave(&self, id: TournamentId, user_id: UserId) -> TournamentResult<()> {
        self.store
            .transact(id, unit_of_work(move |snapshot| registry::leave(snapshot, user_id)))
            .await?;

        log::info!("User {} left tournament {}", user_id, id);
        Ok(())
    }

    /// Participants in join order
    pub async fn list_participants(&self, id: TournamentId) -> TournamentResult<Vec<Participant>> {
        Ok(self.store.snapshot(id).await?.participants)
    }

    /// Generate the round-1 bracket and start the tournament
    ///
    /// # Errors
    ///
    /// * `TournamentError::AlreadyStarted` - A bracket already exists
    /// * `TournamentError::InsufficientParticipants` - Fewer than two participants
    pub async fn generate_bracket(&self, id: TournamentId) -> TournamentResult<Vec<Match>> {
        let applied = self
            .store
            .transact(
                id,
                unit_of_work(|snapshot| bracket::open_bracket(snapshot, &mut rand::rng())),
            )
            .await?;

        let matches: Vec<Match> = applied
            .snapshot
            .round_matches(1)
            .into_iter()
            .cloned()
            .collect();

        log::info!(
            "Generated bracket for tournament {}: {} match(es), {} bye(s)",
            id,
            matches.len(),
            matches.iter().filter(|m| m.is_bye()).count()
        );

        Ok(matches)
    }

    /// Record the winner of a match
    ///
    /// Round advancement happens in the same unit of work: when this was the
    /// last open match of its round, the next round is paired (or the
    /// tournament finishes) before this call returns.
    ///
    /// # Errors
    ///
    /// * `TournamentError::MatchNotFound` - Unknown match
    /// * `TournamentError::AlreadyPlayed` - Match already has a winner (byes included)
    /// * `TournamentError::InvalidWinner` - Winner did not play in the match
    pub async fn report_result(
        &self,
        match_id: MatchId,
        winner: ParticipantId,
    ) -> TournamentResult<ReportOutcome> {
        let id = self
            .store
            .tournament_for_match(match_id)
            .await?
            .ok_or(TournamentError::MatchNotFound(match_id))?;

        let rules = self.rules;
        let applied = self
            .store
            .transact(
                id,
                unit_of_work(move |snapshot| {
                    progression::report(snapshot, match_id, winner, &rules, &mut rand::rng())
                }),
            )
            .await?;

        let played = applied
            .snapshot
            .find_match(match_id)
            .cloned()
            .ok_or(TournamentError::MatchNotFound(match_id))?;
        log::info!(
            "Match {} of tournament {} won by participant {}",
            match_id,
            id,
            winner
        );

        let advancement = advancement(&applied)?;
        log_advancement(id, &advancement);

        Ok(ReportOutcome {
            played,
            advancement,
        })
    }

    /// Re-check the latest round and advance it if complete
    ///
    /// Results already advance eagerly, so this only does work when a round
    /// was completed outside of [`TournamentManager::report_result`].
    pub async fn try_advance(&self, id: TournamentId) -> TournamentResult<Advancement> {
        let applied = self
            .store
            .transact(
                id,
                unit_of_work(|snapshot| Ok(progression::advance(snapshot, &mut rand::rng()))),
            )
            .await?;

        let advancement = advancement(&applied)?;
        if !applied.changes.is_empty() {
            log_advancement(id, &advancement);
        }

        Ok(advancement)
    }

    /// All matches ordered by round
    pub async fn matches(&self, id: TournamentId) -> TournamentResult<Vec<Match>> {
        Ok(self.store.snapshot(id).await?.matches)
    }

    /// Matches of a single round
    pub async fn round(&self, id: TournamentId, round: u32) -> TournamentResult<Vec<Match>> {
        Ok(self
            .store
            .snapshot(id)
            .await?
            .matches
            .into_iter()
            .filter(|m| m.round == round)
            .collect())
    }

    /// Standings table, best first
    pub async fn standings(&self, id: TournamentId) -> TournamentResult<Vec<Standing>> {
        let snapshot = self.store.snapshot(id).await?;
        Ok(standings::rank(&snapshot.participants))
    }

    /// Winner of a finished tournament
    pub async fn champion(&self, id: TournamentId) -> TournamentResult<Option<Participant>> {
        let snapshot = self.store.snapshot(id).await?;
        Ok(snapshot
            .tournament
            .champion
            .and_then(|champion| snapshot.participant(champion).cloned()))
    }
}

/// Describe what a unit of work did to the bracket
fn advancement(applied: &Applied) -> TournamentResult<Advancement> {
    let snapshot = &applied.snapshot;

    for change in &applied.changes {
        match change {
            Change::ScheduleRound { round, .. } => {
                return Ok(Advancement::NextRound {
                    round: *round,
                    matches: snapshot.round_matches(*round).into_iter().cloned().collect(),
                });
            }
            Change::Finish { .. } => break,
            _ => {}
        }
    }

    if snapshot.tournament.status != TournamentStatus::Finished {
        return Ok(Advancement::RoundPending);
    }

    snapshot
        .tournament
        .champion
        .and_then(|champion| snapshot.participant(champion).cloned())
        .map(Advancement::Champion)
        .ok_or_else(|| {
            TournamentError::CorruptRecord(format!(
                "finished tournament {} has no champion",
                snapshot.tournament.id
            ))
        })
}

fn log_advancement(id: TournamentId, advancement: &Advancement) {
    match advancement {
        Advancement::RoundPending => {}
        Advancement::NextRound { round, matches } => {
            log::info!(
                "Tournament {} advanced to round {} with {} match(es)",
                id,
                round,
                matches.len()
            );
        }
        Advancement::Champion(champion) => {
            log::info!(
                "Tournament {} finished, champion {} ({})",
                id,
                champion.display_name,
                champion.id
            );
        }
    }
}
