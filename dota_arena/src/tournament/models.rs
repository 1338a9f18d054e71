//! Tournament data models for single-elimination brackets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::users::{AccountId, UserId};

/// Tournament ID type
pub type TournamentId = i64;

/// Participant ID type (one per tournament entry, not per user)
pub type ParticipantId = i64;

/// Match ID type
pub type MatchId = i64;

/// Points credited to the winner of a match unless configured otherwise
pub const DEFAULT_POINTS_PER_WIN: u32 = 10;

/// Minimum number of entrants a bracket can be built from
pub const MIN_PARTICIPANTS: usize = 2;

/// Tournament status
///
/// Transitions only move forward: `Upcoming -> Ongoing -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Accepting participants
    Upcoming,
    /// Bracket generated, matches being played
    Ongoing,
    /// Champion decided
    Finished,
}

impl TournamentStatus {
    /// Database representation
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Finished => "finished",
        }
    }

    /// Whether moving from `self` to `next` respects the forward-only lifecycle
    pub fn can_transition_to(self, next: TournamentStatus) -> bool {
        matches!(
            (self, next),
            (TournamentStatus::Upcoming, TournamentStatus::Ongoing)
                | (TournamentStatus::Ongoing, TournamentStatus::Finished)
        )
    }

    /// Statuses listed as "active" to chat users
    pub fn active() -> [TournamentStatus; 2] {
        [TournamentStatus::Upcoming, TournamentStatus::Ongoing]
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TournamentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "upcoming" => Ok(TournamentStatus::Upcoming),
            "ongoing" => Ok(TournamentStatus::Ongoing),
            "finished" => Ok(TournamentStatus::Finished),
            other => Err(format!("unknown tournament status '{other}'")),
        }
    }
}

/// Match status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Played,
}

impl MatchStatus {
    /// Database representation
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Scheduled => "scheduled",
            MatchStatus::Played => "played",
        }
    }
}

impl FromStr for MatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(MatchStatus::Scheduled),
            "played" => Ok(MatchStatus::Played),
            other => Err(format!("unknown match status '{other}'")),
        }
    }
}

/// Request to create a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTournament {
    /// Display name
    pub name: String,
    /// Free-form description shown in listings
    pub description: Option<String>,
    /// Maximum number of participants
    pub capacity: u32,
    /// Prize description
    pub prize: Option<String>,
    /// Planned start date
    pub start_date: Option<NaiveDate>,
    /// User who created the tournament
    pub created_by: UserId,
}

impl NewTournament {
    /// Create a request with the required fields
    pub fn new(name: impl Into<String>, capacity: u32, created_by: UserId) -> Self {
        Self {
            name: name.into(),
            description: None,
            capacity,
            prize: None,
            start_date: None,
            created_by,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prize(mut self, prize: impl Into<String>) -> Self {
        self.prize = Some(prize.into());
        self
    }

    pub fn with_start_date(mut self, start_date: NaiveDate) -> Self {
        self.start_date = Some(start_date);
        self
    }

    /// Check the request before it reaches storage
    ///
    /// Returns a human readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("tournament name must not be empty".to_string());
        }
        if (self.capacity as usize) < MIN_PARTICIPANTS {
            return Err(format!(
                "capacity must be at least {MIN_PARTICIPANTS}, got {}",
                self.capacity
            ));
        }
        Ok(())
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub name: String,
    pub description: Option<String>,
    /// Maximum participants
    pub capacity: u32,
    /// Current number of participants, never above `capacity`
    pub participant_count: u32,
    pub prize: Option<String>,
    pub status: TournamentStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: UserId,
    /// Winner of the final, set when the tournament finishes
    pub champion: Option<ParticipantId>,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Whether no more participants can join
    pub fn is_full(&self) -> bool {
        self.participant_count >= self.capacity
    }

    /// Free slots left
    pub fn remaining_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.participant_count)
    }
}

/// Request to join a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRequest {
    /// Chat user joining
    pub user_id: UserId,
    /// Linked Dota 2 account, if any
    pub account_id: Option<AccountId>,
    /// Name shown in brackets and standings
    pub display_name: String,
}

impl JoinRequest {
    pub fn new(user_id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            account_id: None,
            display_name: display_name.into(),
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }
}

/// Tournament participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub tournament_id: TournamentId,
    pub user_id: UserId,
    pub account_id: Option<AccountId>,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    pub joined_at: DateTime<Utc>,
}

/// A bracket match
///
/// A match without a second participant is a bye: it is created already
/// played with the first participant as winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub tournament_id: TournamentId,
    /// 1-based round number
    pub round: u32,
    pub first: ParticipantId,
    pub second: Option<ParticipantId>,
    pub winner: Option<ParticipantId>,
    pub status: MatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub played_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn is_bye(&self) -> bool {
        self.second.is_none()
    }

    pub fn is_played(&self) -> bool {
        self.status == MatchStatus::Played
    }

    /// Whether `participant` occupies one of the two slots
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.first == participant || self.second == Some(participant)
    }

    /// The other slot, if `participant` is in this match and it is not a bye
    pub fn opponent_of(&self, participant: ParticipantId) -> Option<ParticipantId> {
        if self.first == participant {
            self.second
        } else if self.second == Some(participant) {
            Some(self.first)
        } else {
            None
        }
    }
}

/// One row of the standings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub wins: u32,
    pub losses: u32,
    pub points: u32,
    /// Percentage of games won, 0 when nothing has been played
    pub winrate: f64,
}

/// Scoring rules applied by match progression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentRules {
    /// Points credited to a match winner
    pub points_per_win: u32,
}

impl Default for TournamentRules {
    fn default() -> Self {
        Self {
            points_per_win: DEFAULT_POINTS_PER_WIN,
        }
    }
}

/// What happened to the bracket after a result was recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Advancement {
    /// Other matches of the round are still scheduled
    RoundPending,
    /// The round closed and the next one was paired
    NextRound { round: u32, matches: Vec<Match> },
    /// Only one participant is left
    Champion(Participant),
}

/// Result of reporting a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOutcome {
    /// The match as stored after the result
    pub played: Match,
    pub advancement: Advancement,
}
