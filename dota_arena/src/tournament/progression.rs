//! Match results and round advancement.

use rand::Rng;

use super::bracket::pair_round;
use super::errors::{TournamentError, TournamentResult};
use super::models::{MatchId, ParticipantId, TournamentRules, TournamentStatus};
use super::snapshot::{Change, TournamentSnapshot};

/// Decide the writes for a reported result
///
/// Besides recording the winner and crediting both players, this closes the
/// round when the reported match was the last one scheduled in it: the
/// round's winners are paired into the next round, or the tournament
/// finishes when only one winner is left.
pub fn report<R: Rng + ?Sized>(
    snapshot: &TournamentSnapshot,
    match_id: MatchId,
    winner: ParticipantId,
    rules: &TournamentRules,
    rng: &mut R,
) -> TournamentResult<Vec<Change>> {
    let reported = snapshot
        .find_match(match_id)
        .ok_or(TournamentError::MatchNotFound(match_id))?;

    // Byes are created played, so they land here as well.
    if reported.is_played() {
        return Err(TournamentError::AlreadyPlayed(match_id));
    }

    let loser = reported
        .opponent_of(winner)
        .ok_or(TournamentError::InvalidWinner { match_id, winner })?;

    let mut changes = vec![
        Change::RecordResult { match_id, winner },
        Change::CreditWin {
            participant: winner,
            points: rules.points_per_win,
        },
        Change::CreditLoss {
            participant: loser,
        },
    ];

    changes.extend(close_round(snapshot, reported.round, Some((match_id, winner)), rng));

    Ok(changes)
}

/// Re-run the completion check on the latest round
///
/// Returns no changes when the tournament is not running, the round still
/// has scheduled matches, or it has already been advanced.
pub fn advance<R: Rng + ?Sized>(snapshot: &TournamentSnapshot, rng: &mut R) -> Vec<Change> {
    if snapshot.tournament.status != TournamentStatus::Ongoing {
        return Vec::new();
    }

    close_round(snapshot, snapshot.current_round(), None, rng)
}

/// Winners of `round` in match order, or `None` while a match is unplayed
///
/// `pending` is a result being recorded in the same unit of work and not yet
/// visible in the snapshot.
fn round_winners(
    snapshot: &TournamentSnapshot,
    round: u32,
    pending: Option<(MatchId, ParticipantId)>,
) -> Option<Vec<ParticipantId>> {
    snapshot
        .round_matches(round)
        .into_iter()
        .map(|m| match pending {
            Some((id, winner)) if id == m.id => Some(winner),
            _ if m.is_played() => m.winner,
            _ => None,
        })
        .collect()
}

fn close_round<R: Rng + ?Sized>(
    snapshot: &TournamentSnapshot,
    round: u32,
    pending: Option<(MatchId, ParticipantId)>,
    rng: &mut R,
) -> Vec<Change> {
    let Some(winners) = round_winners(snapshot, round, pending) else {
        return Vec::new();
    };

    match winners.as_slice() {
        [] => Vec::new(),
        [champion] => vec![Change::Finish {
            champion: *champion,
        }],
        _ if !snapshot.round_matches(round + 1).is_empty() => Vec::new(),
        _ => vec![Change::ScheduleRound {
            round: round + 1,
            pairings: pair_round(&winners, rng),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Match, MatchStatus, Participant, Tournament};
    use chrono::Utc;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn participant(id: ParticipantId) -> Participant {
        Participant {
            id,
            tournament_id: 1,
            user_id: id * 100,
            account_id: None,
            display_name: format!("p{id}"),
            wins: 0,
            losses: 0,
            points: 0,
            joined_at: Utc::now(),
        }
    }

    fn scheduled(id: MatchId, round: u32, first: ParticipantId, second: ParticipantId) -> Match {
        Match {
            id,
            tournament_id: 1,
            round,
            first,
            second: Some(second),
            winner: None,
            status: MatchStatus::Scheduled,
            scheduled_at: Utc::now(),
            played_at: None,
        }
    }

    fn bye(id: MatchId, round: u32, first: ParticipantId) -> Match {
        Match {
            id,
            tournament_id: 1,
            round,
            first,
            second: None,
            winner: Some(first),
            status: MatchStatus::Played,
            scheduled_at: Utc::now(),
            played_at: Some(Utc::now()),
        }
    }

    fn snapshot(participants: &[ParticipantId], matches: Vec<Match>) -> TournamentSnapshot {
        TournamentSnapshot {
            tournament: Tournament {
                id: 1,
                name: "Cup".to_string(),
                description: None,
                capacity: 8,
                participant_count: participants.len() as u32,
                prize: None,
                status: TournamentStatus::Ongoing,
                start_date: None,
                end_date: None,
                created_by: 1,
                champion: None,
                created_at: Utc::now(),
            },
            participants: participants.iter().copied().map(participant).collect(),
            matches,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(3)
    }

    #[test]
    fn test_report_keeps_round_open_while_matches_pending() {
        let snap = snapshot(&[1, 2, 3, 4], vec![scheduled(1, 1, 1, 2), scheduled(2, 1, 3, 4)]);
        let changes = report(&snap, 1, 2, &TournamentRules::default(), &mut rng()).unwrap();

        assert_eq!(
            changes,
            vec![
                Change::RecordResult {
                    match_id: 1,
                    winner: 2
                },
                Change::CreditWin {
                    participant: 2,
                    points: 10
                },
                Change::CreditLoss { participant: 1 },
            ]
        );
    }

    #[test]
    fn test_report_last_result_pairs_next_round() {
        let mut first = scheduled(1, 1, 1, 2);
        first.winner = Some(1);
        first.status = MatchStatus::Played;
        let snap = snapshot(&[1, 2, 3, 4], vec![first, scheduled(2, 1, 3, 4)]);

        let changes = report(&snap, 2, 4, &TournamentRules::default(), &mut rng()).unwrap();
        let Some(Change::ScheduleRound { round, pairings }) = changes.last() else {
            panic!("expected a new round, got {changes:?}");
        };
        assert_eq!(*round, 2);
        assert_eq!(pairings.len(), 1);
        assert!(pairings[0].first == 1 || pairings[0].first == 4);
        assert!(pairings[0].second == Some(1) || pairings[0].second == Some(4));
    }

    #[test]
    fn test_report_final_finishes_tournament() {
        let snap = snapshot(&[1, 2], vec![scheduled(1, 1, 1, 2)]);
        let changes = report(&snap, 1, 1, &TournamentRules { points_per_win: 3 }, &mut rng())
            .unwrap();

        assert_eq!(changes.last(), Some(&Change::Finish { champion: 1 }));
        assert!(changes.contains(&Change::CreditWin {
            participant: 1,
            points: 3
        }));
    }

    #[test]
    fn test_report_counts_byes_as_advanced() {
        let snap = snapshot(&[1, 2, 3], vec![scheduled(1, 1, 1, 2), bye(2, 1, 3)]);
        let changes = report(&snap, 1, 2, &TournamentRules::default(), &mut rng()).unwrap();

        let Some(Change::ScheduleRound { round, pairings }) = changes.last() else {
            panic!("expected a new round, got {changes:?}");
        };
        assert_eq!(*round, 2);
        assert_eq!(pairings.len(), 1);
        assert!(!pairings[0].is_bye());
    }

    #[test]
    fn test_report_rejects_unknown_match() {
        let snap = snapshot(&[1, 2], vec![scheduled(1, 1, 1, 2)]);
        let err = report(&snap, 9, 1, &TournamentRules::default(), &mut rng()).unwrap_err();
        assert!(matches!(err, TournamentError::MatchNotFound(9)));
    }

    #[test]
    fn test_report_rejects_outsider() {
        let snap = snapshot(&[1, 2, 3], vec![scheduled(1, 1, 1, 2)]);
        let err = report(&snap, 1, 3, &TournamentRules::default(), &mut rng()).unwrap_err();
        assert!(matches!(
            err,
            TournamentError::InvalidWinner {
                match_id: 1,
                winner: 3
            }
        ));
    }

    #[test]
    fn test_report_rejects_bye_and_played() {
        let mut played = scheduled(1, 1, 1, 2);
        played.status = MatchStatus::Played;
        played.winner = Some(1);
        let snap = snapshot(&[1, 2, 3], vec![played, bye(2, 1, 3)]);

        assert!(matches!(
            report(&snap, 1, 2, &TournamentRules::default(), &mut rng()).unwrap_err(),
            TournamentError::AlreadyPlayed(1)
        ));
        assert!(matches!(
            report(&snap, 2, 3, &TournamentRules::default(), &mut rng()).unwrap_err(),
            TournamentError::AlreadyPlayed(2)
        ));
    }

    #[test]
    fn test_advance_is_noop_when_round_pending_or_done() {
        let snap = snapshot(&[1, 2, 3, 4], vec![scheduled(1, 1, 1, 2), scheduled(2, 1, 3, 4)]);
        assert!(advance(&snap, &mut rng()).is_empty());

        let mut finished = snapshot(&[1, 2], vec![bye(1, 1, 1)]);
        finished.tournament.status = TournamentStatus::Finished;
        assert!(advance(&finished, &mut rng()).is_empty());
    }

    #[test]
    fn test_advance_closes_completed_round() {
        let mut a = scheduled(1, 1, 1, 2);
        a.status = MatchStatus::Played;
        a.winner = Some(2);
        let mut b = scheduled(2, 1, 3, 4);
        b.status = MatchStatus::Played;
        b.winner = Some(3);
        let snap = snapshot(&[1, 2, 3, 4], vec![a, b]);

        let changes = advance(&snap, &mut rng());
        assert!(matches!(
            changes.as_slice(),
            [Change::ScheduleRound { round: 2, .. }]
        ));
    }
}
