//! Locked view of one tournament and the writes decided against it.
//!
//! Every mutating tournament operation is a pure function from a
//! [`TournamentSnapshot`] to a list of [`Change`]s. Stores load the snapshot
//! under a lock, run the function and apply its changes in the same unit of
//! work, so precondition checks and writes can never interleave with another
//! caller.

use serde::{Deserialize, Serialize};

use super::bracket::Pairing;
use super::errors::TournamentResult;
use super::models::{
    Match, MatchId, Participant, ParticipantId, Tournament, TournamentStatus,
};
use crate::users::{AccountId, UserId};

/// A tournament with all of its participants and matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentSnapshot {
    pub tournament: Tournament,
    /// Ordered by join time
    pub participants: Vec<Participant>,
    /// Ordered by round, then creation
    pub matches: Vec<Match>,
}

impl TournamentSnapshot {
    pub fn participant(&self, id: ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    pub fn participant_for_user(&self, user_id: UserId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.user_id == user_id)
    }

    pub fn find_match(&self, id: MatchId) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Highest round that has matches, 0 before the bracket exists
    pub fn current_round(&self) -> u32 {
        self.matches.iter().map(|m| m.round).max().unwrap_or(0)
    }

    pub fn round_matches(&self, round: u32) -> Vec<&Match> {
        self.matches.iter().filter(|m| m.round == round).collect()
    }
}

/// A single write decided by the domain code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Change {
    /// Insert a participant with zeroed stats
    AddParticipant {
        user_id: UserId,
        account_id: Option<AccountId>,
        display_name: String,
    },
    /// Delete the participant of `user_id`
    RemoveParticipant { user_id: UserId },
    /// Overwrite the tournament's participant counter
    SetParticipantCount(u32),
    SetStatus(TournamentStatus),
    /// Mark the tournament finished with its champion
    Finish { champion: ParticipantId },
    /// Store the matches of a round; byes are stored already played
    ScheduleRound { round: u32, pairings: Vec<Pairing> },
    /// Set the winner of a scheduled match
    RecordResult {
        match_id: MatchId,
        winner: ParticipantId,
    },
    CreditWin {
        participant: ParticipantId,
        points: u32,
    },
    CreditLoss { participant: ParticipantId },
}

/// Outcome of a committed unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Applied {
    /// State after the changes
    pub snapshot: TournamentSnapshot,
    /// Changes that were applied, in order
    pub changes: Vec<Change>,
}

/// A unit of work run by a store against a locked snapshot
pub type Operation = Box<dyn FnOnce(&TournamentSnapshot) -> TournamentResult<Vec<Change>> + Send>;

/// Box a closure as an [`Operation`]
pub fn unit_of_work<F>(f: F) -> Operation
where
    F: FnOnce(&TournamentSnapshot) -> TournamentResult<Vec<Change>> + Send + 'static,
{
    Box::new(f)
}
