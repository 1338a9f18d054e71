//! PostgreSQL-backed tic-tac-toe games.

use chrono::NaiveDateTime;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use std::sync::Arc;

use super::board::{Board, Mark, Outcome};
use super::errors::{GameError, GameResult};
use super::game::{GameId, GameStatus, MoveResult, TicTacToe};
use crate::users::UserId;

const GAME_COLUMNS: &str = "id, player_one, player_two, board_state, current_turn, status, \
                            outcome, created_at, finished_at";

/// Tic-tac-toe game manager
#[derive(Clone)]
pub struct TicTacToeManager {
    pool: Arc<PgPool>,
}

impl TicTacToeManager {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Open a game, started immediately when an opponent is given
    pub async fn create_game(
        &self,
        player_one: UserId,
        player_two: Option<UserId>,
    ) -> GameResult<TicTacToe> {
        let mut game = TicTacToe::new(0, player_one);
        if let Some(opponent) = player_two {
            game.join(opponent)?;
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tic_tac_toe_games (player_one, player_two, board_state, current_turn, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GAME_COLUMNS}
            "#
        ))
        .bind(game.player_one)
        .bind(game.player_two)
        .bind(game.board.encode())
        .bind(game.turn.turn_number())
        .bind(game.status.as_str())
        .fetch_one(self.pool.as_ref())
        .await?;

        let game = game_from_row(&row)?;
        log::info!(
            "Created tic-tac-toe game {} for user {}",
            game.id,
            game.player_one
        );

        Ok(game)
    }

    /// Get a game
    pub async fn get_game(&self, id: GameId) -> GameResult<TicTacToe> {
        let mut conn = self.pool.acquire().await?;
        load_game(&mut conn, id, false).await
    }

    /// Take the free seat of a waiting game
    pub async fn join_game(&self, id: GameId, player_two: UserId) -> GameResult<TicTacToe> {
        let mut tx = self.pool.begin().await?;

        let mut game = load_game(&mut tx, id, true).await?;
        game.join(player_two)?;
        save_game(&mut tx, &game).await?;

        tx.commit().await?;

        log::info!("User {} joined tic-tac-toe game {}", player_two, id);
        Ok(game)
    }

    /// Play a move on `cell` (0..9)
    pub async fn play(
        &self,
        id: GameId,
        player: UserId,
        cell: usize,
    ) -> GameResult<(TicTacToe, MoveResult)> {
        let mut tx = self.pool.begin().await?;

        let mut game = load_game(&mut tx, id, true).await?;
        let result = game.play(player, cell)?;
        save_game(&mut tx, &game).await?;

        tx.commit().await?;

        match result {
            MoveResult::Won { winner } => {
                log::info!("Tic-tac-toe game {} won by user {}", id, winner)
            }
            MoveResult::Draw => log::info!("Tic-tac-toe game {} ended in a draw", id),
            MoveResult::Continue { .. } => {}
        }

        Ok((game, result))
    }
}

async fn load_game(conn: &mut PgConnection, id: GameId, lock: bool) -> GameResult<TicTacToe> {
    let lock_clause = if lock { " FOR UPDATE" } else { "" };
    let row = sqlx::query(&format!(
        "SELECT {GAME_COLUMNS} FROM tic_tac_toe_games WHERE id = $1{lock_clause}"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(GameError::NotFound(id))?;

    game_from_row(&row)
}

async fn save_game(conn: &mut PgConnection, game: &TicTacToe) -> GameResult<()> {
    sqlx::query(
        r#"
        UPDATE tic_tac_toe_games
        SET player_two = $1, board_state = $2, current_turn = $3, status = $4,
            outcome = $5, finished_at = $6
        WHERE id = $7
        "#,
    )
    .bind(game.player_two)
    .bind(game.board.encode())
    .bind(game.turn.turn_number())
    .bind(game.status.as_str())
    .bind(game.outcome.map(encode_outcome))
    .bind(game.finished_at.map(|at| at.naive_utc()))
    .bind(game.id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn encode_outcome(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Winner(Mark::X) => "x",
        Outcome::Winner(Mark::O) => "o",
        Outcome::Draw => "draw",
    }
}

fn decode_outcome(outcome: &str) -> Option<Outcome> {
    match outcome {
        "x" => Some(Outcome::Winner(Mark::X)),
        "o" => Some(Outcome::Winner(Mark::O)),
        "draw" => Some(Outcome::Draw),
        _ => None,
    }
}

fn game_from_row(row: &PgRow) -> GameResult<TicTacToe> {
    let id: GameId = row.try_get("id")?;
    let corrupt = |what: &str| GameError::CorruptRecord(format!("game {id}: {what}"));

    let board_state: String = row.try_get("board_state")?;
    let board = Board::decode(&board_state).ok_or_else(|| corrupt("bad board"))?;

    let turn = Mark::from_turn_number(row.try_get("current_turn")?)
        .ok_or_else(|| corrupt("bad turn"))?;

    let status = row
        .try_get::<String, _>("status")?
        .parse::<GameStatus>()
        .map_err(|e| corrupt(&e))?;

    let outcome = match row.try_get::<Option<String>, _>("outcome")? {
        Some(text) => Some(decode_outcome(&text).ok_or_else(|| corrupt("bad outcome"))?),
        None => None,
    };

    Ok(TicTacToe {
        id,
        player_one: row.try_get("player_one")?,
        player_two: row.try_get("player_two")?,
        board,
        turn,
        status,
        outcome,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        finished_at: row
            .try_get::<Option<NaiveDateTime>, _>("finished_at")?
            .map(|at| at.and_utc()),
    })
}
