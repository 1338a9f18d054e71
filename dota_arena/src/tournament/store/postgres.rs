//! PostgreSQL tournament store.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};
use std::sync::Arc;

use super::TournamentStore;
use crate::tournament::errors::{TournamentError, TournamentResult};
use crate::tournament::models::{
    Match, MatchId, MatchStatus, NewTournament, Participant, Tournament, TournamentId,
    TournamentStatus,
};
use crate::tournament::snapshot::{Applied, Change, Operation, TournamentSnapshot};

const TOURNAMENT_COLUMNS: &str = "id, name, description, capacity, participant_count, prize, \
     status, start_date, end_date, created_by, champion_id, created_at";

const PARTICIPANT_COLUMNS: &str =
    "id, tournament_id, user_id, account_id, display_name, wins, losses, points, joined_at";

const MATCH_COLUMNS: &str = "id, tournament_id, round_number, first_participant_id, \
     second_participant_id, winner_id, status, scheduled_at, played_at";

/// Stored statuses from which `next` may be entered
fn predecessors(next: TournamentStatus) -> Vec<String> {
    [
        TournamentStatus::Upcoming,
        TournamentStatus::Ongoing,
        TournamentStatus::Finished,
    ]
    .into_iter()
    .filter(|status| status.can_transition_to(next))
    .map(|status| status.as_str().to_string())
    .collect()
}

fn rejected_transition(id: TournamentId, next: TournamentStatus) -> TournamentError {
    TournamentError::CorruptRecord(format!("tournament {id} cannot move to {next}"))
}

/// Tournament store backed by PostgreSQL
///
/// Units of work run in a transaction that starts with
/// `SELECT ... FOR UPDATE` on the tournament row, so concurrent mutators of
/// the same tournament queue behind each other.
#[derive(Clone)]
pub struct PgTournamentStore {
    pool: Arc<PgPool>,
}

impl PgTournamentStore {
    /// Create a new store
    ///
    /// # Arguments
    ///
    /// * `pool` - Database connection pool
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn to_db_int(value: u32, field: &str) -> TournamentResult<i32> {
    i32::try_from(value)
        .map_err(|_| TournamentError::InvalidConfig(format!("{field} out of range: {value}")))
}

fn from_db_int(value: i32, field: &str) -> TournamentResult<u32> {
    u32::try_from(value)
        .map_err(|_| TournamentError::CorruptRecord(format!("negative {field}: {value}")))
}

fn tournament_from_row(row: &PgRow) -> TournamentResult<Tournament> {
    let status: String = row.try_get("status")?;

    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        capacity: from_db_int(row.try_get("capacity")?, "capacity")?,
        participant_count: from_db_int(row.try_get("participant_count")?, "participant_count")?,
        prize: row.try_get("prize")?,
        status: status.parse().map_err(TournamentError::CorruptRecord)?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        created_by: row.try_get("created_by")?,
        champion: row.try_get("champion_id")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
    })
}

fn participant_from_row(row: &PgRow) -> TournamentResult<Participant> {
    Ok(Participant {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        user_id: row.try_get("user_id")?,
        account_id: row.try_get("account_id")?,
        display_name: row.try_get("display_name")?,
        wins: from_db_int(row.try_get("wins")?, "wins")?,
        losses: from_db_int(row.try_get("losses")?, "losses")?,
        points: from_db_int(row.try_get("points")?, "points")?,
        joined_at: row.try_get::<NaiveDateTime, _>("joined_at")?.and_utc(),
    })
}

fn match_from_row(row: &PgRow) -> TournamentResult<Match> {
    let status: String = row.try_get("status")?;

    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        round: from_db_int(row.try_get("round_number")?, "round_number")?,
        first: row.try_get("first_participant_id")?,
        second: row.try_get("second_participant_id")?,
        winner: row.try_get("winner_id")?,
        status: status.parse().map_err(TournamentError::CorruptRecord)?,
        scheduled_at: row.try_get::<NaiveDateTime, _>("scheduled_at")?.and_utc(),
        played_at: row
            .try_get::<Option<NaiveDateTime>, _>("played_at")?
            .map(|dt| dt.and_utc()),
    })
}

/// Load a tournament with its participants and matches
///
/// With `lock` the tournament row is locked until the surrounding
/// transaction ends.
async fn load_snapshot(
    conn: &mut PgConnection,
    id: TournamentId,
    lock: bool,
) -> TournamentResult<TournamentSnapshot> {
    let sql = format!(
        "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1{}",
        if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(TournamentError::NotFound(id))?;
    let tournament = tournament_from_row(&row)?;

    let sql = format!(
        "SELECT {PARTICIPANT_COLUMNS} FROM tournament_participants
         WHERE tournament_id = $1
         ORDER BY joined_at, id"
    );
    let participants = sqlx::query(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(participant_from_row)
        .collect::<TournamentResult<Vec<_>>>()?;

    let sql = format!(
        "SELECT {MATCH_COLUMNS} FROM tournament_matches
         WHERE tournament_id = $1
         ORDER BY round_number, id"
    );
    let matches = sqlx::query(&sql)
        .bind(id)
        .fetch_all(&mut *conn)
        .await?
        .iter()
        .map(match_from_row)
        .collect::<TournamentResult<Vec<_>>>()?;

    Ok(TournamentSnapshot {
        tournament,
        participants,
        matches,
    })
}

async fn apply_change(
    conn: &mut PgConnection,
    id: TournamentId,
    change: &Change,
) -> TournamentResult<()> {
    match change {
        Change::AddParticipant {
            user_id,
            account_id,
            display_name,
        } => {
            sqlx::query(
                r#"
                INSERT INTO tournament_participants (tournament_id, user_id, account_id, display_name)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(user_id)
            .bind(account_id)
            .bind(display_name)
            .execute(&mut *conn)
            .await?;
        }
        Change::RemoveParticipant { user_id } => {
            sqlx::query(
                "DELETE FROM tournament_participants WHERE tournament_id = $1 AND user_id = $2",
            )
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
        }
        Change::SetParticipantCount(count) => {
            sqlx::query("UPDATE tournaments SET participant_count = $1 WHERE id = $2")
                .bind(to_db_int(*count, "participant_count")?)
                .bind(id)
                .execute(&mut *conn)
                .await?;
        }
        Change::SetStatus(status) => {
            let result = sqlx::query(
                "UPDATE tournaments SET status = $1 WHERE id = $2 AND status = ANY($3)",
            )
            .bind(status.as_str())
            .bind(id)
            .bind(predecessors(*status))
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(rejected_transition(id, *status));
            }
        }
        Change::Finish { champion } => {
            let finished = TournamentStatus::Finished;
            let result = sqlx::query(
                r#"
                UPDATE tournaments
                SET status = $1, champion_id = $2, end_date = CURRENT_DATE
                WHERE id = $3 AND status = ANY($4)
                "#,
            )
            .bind(finished.as_str())
            .bind(champion)
            .bind(id)
            .bind(predecessors(finished))
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(rejected_transition(id, finished));
            }
        }
        Change::ScheduleRound { round, pairings } => {
            let round = to_db_int(*round, "round")?;
            for pairing in pairings {
                if pairing.is_bye() {
                    sqlx::query(
                        r#"
                        INSERT INTO tournament_matches
                            (tournament_id, round_number, first_participant_id, winner_id, status, played_at)
                        VALUES ($1, $2, $3, $3, $4, NOW())
                        "#,
                    )
                    .bind(id)
                    .bind(round)
                    .bind(pairing.first)
                    .bind(MatchStatus::Played.as_str())
                    .execute(&mut *conn)
                    .await?;
                } else {
                    sqlx::query(
                        r#"
                        INSERT INTO tournament_matches
                            (tournament_id, round_number, first_participant_id, second_participant_id, status)
                        VALUES ($1, $2, $3, $4, $5)
                        "#,
                    )
                    .bind(id)
                    .bind(round)
                    .bind(pairing.first)
                    .bind(pairing.second)
                    .bind(MatchStatus::Scheduled.as_str())
                    .execute(&mut *conn)
                    .await?;
                }
            }
        }
        Change::RecordResult { match_id, winner } => {
            let result = sqlx::query(
                r#"
                UPDATE tournament_matches
                SET winner_id = $1, status = $2, played_at = NOW()
                WHERE id = $3 AND tournament_id = $4 AND status = $5
                "#,
            )
            .bind(winner)
            .bind(MatchStatus::Played.as_str())
            .bind(match_id)
            .bind(id)
            .bind(MatchStatus::Scheduled.as_str())
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                return Err(TournamentError::AlreadyPlayed(*match_id));
            }
        }
        Change::CreditWin {
            participant,
            points,
        } => {
            sqlx::query(
                r#"
                UPDATE tournament_participants
                SET wins = wins + 1, points = points + $1
                WHERE id = $2 AND tournament_id = $3
                "#,
            )
            .bind(to_db_int(*points, "points")?)
            .bind(participant)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }
        Change::CreditLoss { participant } => {
            sqlx::query(
                "UPDATE tournament_participants SET losses = losses + 1 WHERE id = $1 AND tournament_id = $2",
            )
            .bind(participant)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        }
    }

    Ok(())
}

#[async_trait]
impl TournamentStore for PgTournamentStore {
    async fn create_tournament(&self, new: &NewTournament) -> TournamentResult<Tournament> {
        let sql = format!(
            r#"
            INSERT INTO tournaments (name, description, capacity, prize, status, start_date, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&new.name)
            .bind(&new.description)
            .bind(to_db_int(new.capacity, "capacity")?)
            .bind(&new.prize)
            .bind(TournamentStatus::Upcoming.as_str())
            .bind(new.start_date)
            .bind(new.created_by)
            .fetch_one(self.pool.as_ref())
            .await?;

        tournament_from_row(&row)
    }

    async fn find_tournament(&self, id: TournamentId) -> TournamentResult<Option<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn list_tournaments(
        &self,
        statuses: &[TournamentStatus],
    ) -> TournamentResult<Vec<Tournament>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let sql = format!(
            r#"
            SELECT {TOURNAMENT_COLUMNS} FROM tournaments
            WHERE status = ANY($1)
            ORDER BY start_date ASC NULLS LAST, id ASC
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(statuses)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn snapshot(&self, id: TournamentId) -> TournamentResult<TournamentSnapshot> {
        let mut conn = self.pool.acquire().await?;
        load_snapshot(&mut conn, id, false).await
    }

    async fn tournament_for_match(
        &self,
        match_id: MatchId,
    ) -> TournamentResult<Option<TournamentId>> {
        let row = sqlx::query("SELECT tournament_id FROM tournament_matches WHERE id = $1")
            .bind(match_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row
            .map(|r| r.try_get::<TournamentId, _>("tournament_id"))
            .transpose()?)
    }

    async fn transact(&self, id: TournamentId, operation: Operation) -> TournamentResult<Applied> {
        let mut tx = self.pool.begin().await?;

        let before = load_snapshot(&mut tx, id, true).await?;
        let changes = operation(&before)?;

        for change in &changes {
            apply_change(&mut tx, id, change).await?;
        }

        let after = load_snapshot(&mut tx, id, false).await?;
        tx.commit().await?;

        log::debug!(
            "Applied {} change(s) to tournament {} in one transaction",
            changes.len(),
            id
        );

        Ok(Applied {
            snapshot: after,
            changes,
        })
    }
}
