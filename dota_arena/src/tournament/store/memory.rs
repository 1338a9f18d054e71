//! In-process tournament store.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

use super::TournamentStore;
use crate::tournament::errors::{TournamentError, TournamentResult};
use crate::tournament::models::{
    Match, MatchId, MatchStatus, NewTournament, Participant, ParticipantId, Tournament,
    TournamentId, TournamentStatus,
};
use crate::tournament::snapshot::{Applied, Change, Operation, TournamentSnapshot};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    tournaments: BTreeMap<TournamentId, Tournament>,
    /// All participants in join order
    participants: Vec<Participant>,
    /// All matches in creation order
    matches: Vec<Match>,
    last_id: i64,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn snapshot(&self, id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        let tournament = self
            .tournaments
            .get(&id)
            .cloned()
            .ok_or(TournamentError::NotFound(id))?;

        let participants = self
            .participants
            .iter()
            .filter(|p| p.tournament_id == id)
            .cloned()
            .collect();

        let mut matches: Vec<Match> = self
            .matches
            .iter()
            .filter(|m| m.tournament_id == id)
            .cloned()
            .collect();
        matches.sort_by_key(|m| (m.round, m.id));

        Ok(TournamentSnapshot {
            tournament,
            participants,
            matches,
        })
    }

    fn tournament_mut(&mut self, id: TournamentId) -> TournamentResult<&mut Tournament> {
        self.tournaments
            .get_mut(&id)
            .ok_or(TournamentError::NotFound(id))
    }

    fn participant_mut(
        &mut self,
        tournament_id: TournamentId,
        id: ParticipantId,
    ) -> TournamentResult<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.tournament_id == tournament_id && p.id == id)
            .ok_or_else(|| TournamentError::CorruptRecord(format!("participant {id} not found")))
    }

    fn apply(&mut self, id: TournamentId, change: &Change) -> TournamentResult<()> {
        let now = Utc::now();

        match change {
            Change::AddParticipant {
                user_id,
                account_id,
                display_name,
            } => {
                if self
                    .participants
                    .iter()
                    .any(|p| p.tournament_id == id && p.user_id == *user_id)
                {
                    return Err(TournamentError::AlreadyJoined(*user_id));
                }
                let participant_id = self.next_id();
                self.participants.push(Participant {
                    id: participant_id,
                    tournament_id: id,
                    user_id: *user_id,
                    account_id: *account_id,
                    display_name: display_name.clone(),
                    wins: 0,
                    losses: 0,
                    points: 0,
                    joined_at: now,
                });
            }
            Change::RemoveParticipant { user_id } => {
                self.participants
                    .retain(|p| !(p.tournament_id == id && p.user_id == *user_id));
            }
            Change::SetParticipantCount(count) => {
                let tournament = self.tournament_mut(id)?;
                if *count > tournament.capacity {
                    return Err(TournamentError::Full);
                }
                tournament.participant_count = *count;
            }
            Change::SetStatus(status) => {
                let tournament = self.tournament_mut(id)?;
                check_transition(tournament, *status)?;
                tournament.status = *status;
            }
            Change::Finish { champion } => {
                let tournament = self.tournament_mut(id)?;
                check_transition(tournament, TournamentStatus::Finished)?;
                tournament.status = TournamentStatus::Finished;
                tournament.champion = Some(*champion);
                tournament.end_date = Some(now.date_naive());
            }
            Change::ScheduleRound { round, pairings } => {
                for pairing in pairings {
                    let match_id = self.next_id();
                    let bye = pairing.is_bye();
                    self.matches.push(Match {
                        id: match_id,
                        tournament_id: id,
                        round: *round,
                        first: pairing.first,
                        second: pairing.second,
                        winner: bye.then_some(pairing.first),
                        status: if bye {
                            MatchStatus::Played
                        } else {
                            MatchStatus::Scheduled
                        },
                        scheduled_at: now,
                        played_at: bye.then_some(now),
                    });
                }
            }
            Change::RecordResult { match_id, winner } => {
                let record = self.match_mut(id, *match_id)?;
                if record.is_played() {
                    return Err(TournamentError::AlreadyPlayed(*match_id));
                }
                record.winner = Some(*winner);
                record.status = MatchStatus::Played;
                record.played_at = Some(now);
            }
            Change::CreditWin {
                participant,
                points,
            } => {
                let participant = self.participant_mut(id, *participant)?;
                participant.wins += 1;
                participant.points += points;
            }
            Change::CreditLoss { participant } => {
                self.participant_mut(id, *participant)?.losses += 1;
            }
        }

        Ok(())
    }

    fn match_mut(
        &mut self,
        tournament_id: TournamentId,
        id: MatchId,
    ) -> TournamentResult<&mut Match> {
        self.matches
            .iter_mut()
            .find(|m| m.tournament_id == tournament_id && m.id == id)
            .ok_or(TournamentError::MatchNotFound(id))
    }
}

/// Tournament store kept in process memory
///
/// A single mutex serializes every unit of work. Changes are applied to a
/// copy of the state that only replaces the original once all of them
/// succeeded.
#[derive(Debug, Default)]
pub struct MemoryTournamentStore {
    state: Mutex<MemoryState>,
}

impl MemoryTournamentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TournamentStore for MemoryTournamentStore {
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<Tournament> {
        let mut state = self.state.lock().await;
        let id = state.next_id();

        let tournament = Tournament {
            id,
            name: new.name.clone(),
            description: new.description.clone(),
            capacity: new.capacity,
            participant_count: 0,
            prize: new.prize.clone(),
            status: TournamentStatus::Upcoming,
            start_date: new.start_date,
            end_date: None,
            created_by: new.created_by,
            champion: None,
            created_at: Utc::now(),
        };
        state.tournaments.insert(id, tournament.clone());

        Ok(tournament)
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        Ok(self.state.lock().await.tournaments.get(&id).cloned())
    }

    async fn list_tournaments(
        &self,
        statuses: &[TournamentStatus],
    ) -> TournamentResult<Vec<Tournament>> {
        let state = self.state.lock().await;
        let mut tournaments: Vec<Tournament> = state
            .tournaments
            .values()
            .filter(|t| statuses.contains(&t.status))
            .cloned()
            .collect();
        tournaments.sort_by_key(|t| (t.start_date.is_none(), t.start_date, t.id));

        Ok(tournaments)
    }

    async fn snapshot(&self, id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        self.state.lock().await.snapshot(id)
    }

    async fn tournament_for_match(
        &self,
        match_id: MatchId,
    ) -> TournamentResult<Option<TournamentId>> {
        let state = self.state.lock().await;
        Ok(state
            .matches
            .iter()
            .find(|m| m.id == match_id)
            .map(|m| m.tournament_id))
    }

    async fn transact(&self, id: TournamentId, operation: Operation) -> TournamentResult<Applied> {
        let mut state = self.state.lock().await;
        let before = state.snapshot(id)?;
        let changes = operation(&before)?;

        let mut next = state.clone();
        for change in &changes {
            next.apply(id, change)?;
        }
        *state = next;

        Ok(Applied {
            snapshot: state.snapshot(id)?,
            changes,
        })
    }
}

fn check_transition(tournament: &Tournament, next: TournamentStatus) -> TournamentResult<()> {
    if tournament.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(TournamentError::CorruptRecord(format!(
            "tournament {} cannot move from {} to {next}",
            tournament.id, tournament.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::bracket::Pairing;
    use crate::tournament::snapshot::unit_of_work;

    #[tokio::test]
    async fn test_failed_unit_of_work_leaves_state_untouched() {
        let store = MemoryTournamentStore::new();
        let tournament = store
            .create_tournament(&NewTournament::new("Cup", 2, 1))
            .await
            .unwrap();

        let err = store
            .transact(
                tournament.id,
                unit_of_work(|_| {
                    Ok(vec![
                        Change::AddParticipant {
                            user_id: 7,
                            account_id: None,
                            display_name: "seven".to_string(),
                        },
                        // Over capacity, so the whole unit must roll back.
                        Change::SetParticipantCount(3),
                    ])
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::Full));

        let snapshot = store.snapshot(tournament.id).await.unwrap();
        assert!(snapshot.participants.is_empty());
        assert_eq!(snapshot.tournament.participant_count, 0);
    }

    #[tokio::test]
    async fn test_backwards_status_change_rolls_back() {
        let store = MemoryTournamentStore::new();
        let tournament = store
            .create_tournament(&NewTournament::new("Cup", 4, 1))
            .await
            .unwrap();

        let err = store
            .transact(
                tournament.id,
                unit_of_work(|_| {
                    Ok(vec![
                        Change::SetStatus(TournamentStatus::Ongoing),
                        Change::SetStatus(TournamentStatus::Upcoming),
                    ])
                }),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::CorruptRecord(_)));

        let snapshot = store.snapshot(tournament.id).await.unwrap();
        assert_eq!(snapshot.tournament.status, TournamentStatus::Upcoming);
    }

    #[tokio::test]
    async fn test_finish_requires_ongoing() {
        let store = MemoryTournamentStore::new();
        let tournament = store
            .create_tournament(&NewTournament::new("Cup", 4, 1))
            .await
            .unwrap();

        let err = store
            .transact(
                tournament.id,
                unit_of_work(|_| Ok(vec![Change::Finish { champion: 1 }])),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TournamentError::CorruptRecord(_)));

        let snapshot = store.snapshot(tournament.id).await.unwrap();
        assert_eq!(snapshot.tournament.status, TournamentStatus::Upcoming);
        assert!(snapshot.tournament.champion.is_none());
    }

    #[tokio::test]
    async fn test_schedule_round_stores_byes_as_played() {
        let store = MemoryTournamentStore::new();
        let tournament = store
            .create_tournament(&NewTournament::new("Cup", 4, 1))
            .await
            .unwrap();

        let applied = store
            .transact(
                tournament.id,
                unit_of_work(|_| {
                    Ok(vec![Change::ScheduleRound {
                        round: 1,
                        pairings: vec![
                            Pairing {
                                first: 1,
                                second: Some(2),
                            },
                            Pairing {
                                first: 3,
                                second: None,
                            },
                        ],
                    }])
                }),
            )
            .await
            .unwrap();

        let matches = &applied.snapshot.matches;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].status, MatchStatus::Scheduled);
        assert_eq!(matches[1].status, MatchStatus::Played);
        assert_eq!(matches[1].winner, Some(3));
        assert!(matches[1].played_at.is_some());
        assert_eq!(applied.changes.len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_start_date_with_undated_last() {
        let store = MemoryTournamentStore::new();
        let undated = store
            .create_tournament(&NewTournament::new("Undated", 4, 1))
            .await
            .unwrap();
        let later = store
            .create_tournament(
                &NewTournament::new("Later", 4, 1)
                    .with_start_date(chrono::NaiveDate::from_ymd_opt(2026, 12, 1).unwrap()),
            )
            .await
            .unwrap();
        let sooner = store
            .create_tournament(
                &NewTournament::new("Sooner", 4, 1)
                    .with_start_date(chrono::NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()),
            )
            .await
            .unwrap();

        let listed = store
            .list_tournaments(&TournamentStatus::active())
            .await
            .unwrap();
        let ids: Vec<TournamentId> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id, undated.id]);

        assert!(
            store
                .list_tournaments(&[TournamentStatus::Finished])
                .await
                .unwrap()
                .is_empty()
        );
    }
}
