//! Randomized single-elimination pairing.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::errors::{TournamentError, TournamentResult};
use super::models::{MIN_PARTICIPANTS, ParticipantId, TournamentStatus};
use super::snapshot::{Change, TournamentSnapshot};

/// One pairing of a round, before it is stored as a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing {
    pub first: ParticipantId,
    /// `None` means `first` advances on a bye
    pub second: Option<ParticipantId>,
}

impl Pairing {
    pub fn is_bye(&self) -> bool {
        self.second.is_none()
    }
}

/// Pair entrants for one round
///
/// The entrants are shuffled uniformly (Fisher-Yates) and consecutive
/// elements are paired. With an odd count the last entrant after the
/// shuffle gets a bye.
pub fn pair_round<R: Rng + ?Sized>(entrants: &[ParticipantId], rng: &mut R) -> Vec<Pairing> {
    let mut order = entrants.to_vec();
    order.shuffle(rng);

    order
        .chunks(2)
        .map(|pair| Pairing {
            first: pair[0],
            second: pair.get(1).copied(),
        })
        .collect()
}

/// Decide the opening round for a tournament
///
/// Emits the round-1 matches and the move to `Ongoing`. Fails with
/// `AlreadyStarted` once a bracket exists and with
/// `InsufficientParticipants` below two entrants.
pub fn open_bracket<R: Rng + ?Sized>(
    snapshot: &TournamentSnapshot,
    rng: &mut R,
) -> TournamentResult<Vec<Change>> {
    if snapshot.tournament.status != TournamentStatus::Upcoming || !snapshot.matches.is_empty() {
        return Err(TournamentError::AlreadyStarted);
    }

    let entrants: Vec<ParticipantId> = snapshot.participants.iter().map(|p| p.id).collect();
    if entrants.len() < MIN_PARTICIPANTS {
        return Err(TournamentError::InsufficientParticipants {
            needed: MIN_PARTICIPANTS,
            current: entrants.len(),
        });
    }

    Ok(vec![
        Change::ScheduleRound {
            round: 1,
            pairings: pair_round(&entrants, rng),
        },
        Change::SetStatus(TournamentStatus::Ongoing),
    ])
}
