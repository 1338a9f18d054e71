//! Participant registration rules.

use super::errors::{TournamentError, TournamentResult};
use super::models::{JoinRequest, TournamentStatus};
use super::snapshot::{Change, TournamentSnapshot};
use crate::users::UserId;

/// Decide a join
///
/// Checked in order: the tournament must still be upcoming, must have a free
/// slot, and the user must not already be registered. The insert and the
/// counter increment are emitted together.
pub fn join(snapshot: &TournamentSnapshot, request: &JoinRequest) -> TournamentResult<Vec<Change>> {
    let tournament = &snapshot.tournament;

    if tournament.status != TournamentStatus::Upcoming {
        return Err(TournamentError::AlreadyStarted);
    }

    if tournament.is_full() {
        return Err(TournamentError::Full);
    }

    if snapshot.participant_for_user(request.user_id).is_some() {
        return Err(TournamentError::AlreadyJoined(request.user_id));
    }

    Ok(vec![
        Change::AddParticipant {
            user_id: request.user_id,
            account_id: request.account_id,
            display_name: request.display_name.clone(),
        },
        Change::SetParticipantCount(tournament.participant_count + 1),
    ])
}

/// Decide a withdrawal before the bracket is generated
pub fn leave(snapshot: &TournamentSnapshot, user_id: UserId) -> TournamentResult<Vec<Change>> {
    let tournament = &snapshot.tournament;

    if tournament.status != TournamentStatus::Upcoming {
        return Err(TournamentError::AlreadyStarted);
    }

    if snapshot.participant_for_user(user_id).is_none() {
        return Err(TournamentError::NotJoined(user_id));
    }

    Ok(vec![
        Change::RemoveParticipant { user_id },
        Change::SetParticipantCount(tournament.participant_count.saturating_sub(1)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::models::{Participant, Tournament};
    use chrono::Utc;

    fn snapshot(capacity: u32, users: &[UserId]) -> TournamentSnapshot {
        let participants = users
            .iter()
            .enumerate()
            .map(|(i, &user_id)| Participant {
                id: i as i64 + 1,
                tournament_id: 1,
                user_id,
                account_id: None,
                display_name: format!("player{user_id}"),
                wins: 0,
                losses: 0,
                points: 0,
                joined_at: Utc::now(),
            })
            .collect::<Vec<_>>();

        TournamentSnapshot {
            tournament: Tournament {
                id: 1,
                name: "Cup".to_string(),
                description: None,
                capacity,
                participant_count: participants.len() as u32,
                prize: None,
                status: TournamentStatus::Upcoming,
                start_date: None,
                end_date: None,
                created_by: 1,
                champion: None,
                created_at: Utc::now(),
            },
            participants,
            matches: Vec::new(),
        }
    }

    #[test]
    fn test_join_emits_insert_and_increment() {
        let snap = snapshot(4, &[100]);
        let changes = join(&snap, &JoinRequest::new(200, "Miracle").with_account(105248644))
            .unwrap();

        assert_eq!(
            changes,
            vec![
                Change::AddParticipant {
                    user_id: 200,
                    account_id: Some(105248644),
                    display_name: "Miracle".to_string(),
                },
                Change::SetParticipantCount(2),
            ]
        );
    }

    #[test]
    fn test_join_full_tournament() {
        let snap = snapshot(2, &[100, 200]);
        let err = join(&snap, &JoinRequest::new(300, "late")).unwrap_err();
        assert!(matches!(err, TournamentError::Full));
    }

    #[test]
    fn test_join_full_takes_precedence_over_duplicate() {
        let snap = snapshot(2, &[100, 200]);
        let err = join(&snap, &JoinRequest::new(100, "again")).unwrap_err();
        assert!(matches!(err, TournamentError::Full));
    }

    #[test]
    fn test_join_twice() {
        let snap = snapshot(4, &[100]);
        let err = join(&snap, &JoinRequest::new(100, "again")).unwrap_err();
        assert!(matches!(err, TournamentError::AlreadyJoined(100)));
    }

    #[test]
    fn test_join_after_start() {
        let mut snap = snapshot(4, &[100, 200]);
        snap.tournament.status = TournamentStatus::Ongoing;
        let err = join(&snap, &JoinRequest::new(300, "late")).unwrap_err();
        assert!(matches!(err, TournamentError::AlreadyStarted));
    }

    #[test]
    fn test_leave() {
        let snap = snapshot(4, &[100, 200]);
        let changes = leave(&snap, 200).unwrap();
        assert_eq!(
            changes,
            vec![
                Change::RemoveParticipant { user_id: 200 },
                Change::SetParticipantCount(1),
            ]
        );

        assert!(matches!(
            leave(&snap, 300).unwrap_err(),
            TournamentError::NotJoined(300)
        ));
    }
}
