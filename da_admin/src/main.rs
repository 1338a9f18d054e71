//! Operator command line for Dota Arena.
//!
//! Drives tournaments, account bindings and schema migrations directly
//! against the database.

mod config;
mod logging;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Error, bail};
use chrono::NaiveDate;
use log::info;
use pico_args::Arguments;
use serde::Serialize;

use config::AdminConfig;
use dota_arena::db::Database;
use dota_arena::tournament::{
    Advancement, JoinRequest, Match, NewTournament, Participant, Standing, Tournament,
    TournamentManager,
};
use dota_arena::users::{PgUserDirectory, UserDirectory, UserError, parse_account_ref};

const HELP: &str = "\
Administer Dota Arena tournaments

USAGE:
  da_admin [OPTIONS] <COMMAND> [ARGS]

COMMANDS:
  migrate                                Apply pending schema migrations
  create --name NAME --capacity N --by USER [--description TEXT] [--prize TEXT] [--start YYYY-MM-DD]
  list                                   Upcoming and ongoing tournaments
  show ID                                Tournament details and participants
  join ID --user USER [--name NAME] [--account REF]
                                         Register a user (name and account default to the binding)
  leave ID --user USER                   Withdraw before the bracket is generated
  bracket ID                             Generate round 1 and start the tournament
  matches ID [--round N]                 List matches
  report MATCH --winner PARTICIPANT      Record a match result
  advance ID                             Re-check the current round
  standings ID                           Standings table
  bind --user USER --account REF --name NAME
                                         Bind a chat user to a Steam profile or account id

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --json                   Print results as JSON

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  DB_MAX_CONNECTIONS       Maximum pool size
  ARENA_POINTS_PER_WIN     Points credited for a won match [default: 10]
  RUST_LOG                 Log filter [default: info,sqlx=warn]
  (See .env file for all configuration options)
";

struct Args {
    database_url: Option<String>,
    json: bool,
    command: Command,
}

enum Command {
    Migrate,
    Create(NewTournament),
    List,
    Show(i64),
    Join {
        tournament: i64,
        user: i64,
        name: Option<String>,
        account: Option<String>,
    },
    Leave {
        tournament: i64,
        user: i64,
    },
    Bracket(i64),
    Matches {
        tournament: i64,
        round: Option<u32>,
    },
    Report {
        match_id: i64,
        winner: i64,
    },
    Advance(i64),
    Standings(i64),
    Bind {
        user: i64,
        account: String,
        name: String,
    },
}

fn parse_args() -> Result<Args, Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url = pargs.opt_value_from_str("--db-url")?;
    let json = pargs.contains("--json");

    let Some(name) = pargs.subcommand()? else {
        bail!("missing command, see --help");
    };

    let command = match name.as_str() {
        "migrate" => Command::Migrate,
        "create" => {
            let mut new = NewTournament::new(
                pargs.value_from_str::<_, String>("--name")?,
                pargs.value_from_str("--capacity")?,
                pargs.value_from_str("--by")?,
            );
            if let Some(description) = pargs.opt_value_from_str::<_, String>("--description")? {
                new = new.with_description(description);
            }
            if let Some(prize) = pargs.opt_value_from_str::<_, String>("--prize")? {
                new = new.with_prize(prize);
            }
            if let Some(start) = pargs.opt_value_from_str::<_, NaiveDate>("--start")? {
                new = new.with_start_date(start);
            }
            Command::Create(new)
        }
        "list" => Command::List,
        "show" => Command::Show(pargs.free_from_str()?),
        // Options are taken before the positional id.
        "join" => {
            let user = pargs.value_from_str("--user")?;
            let name = pargs.opt_value_from_str("--name")?;
            let account = pargs.opt_value_from_str("--account")?;
            Command::Join {
                tournament: pargs.free_from_str()?,
                user,
                name,
                account,
            }
        }
        "leave" => {
            let user = pargs.value_from_str("--user")?;
            Command::Leave {
                tournament: pargs.free_from_str()?,
                user,
            }
        }
        "bracket" => Command::Bracket(pargs.free_from_str()?),
        "matches" => {
            let round = pargs.opt_value_from_str("--round")?;
            Command::Matches {
                tournament: pargs.free_from_str()?,
                round,
            }
        }
        "report" => {
            let winner = pargs.value_from_str("--winner")?;
            Command::Report {
                match_id: pargs.free_from_str()?,
                winner,
            }
        }
        "advance" => Command::Advance(pargs.free_from_str()?),
        "standings" => Command::Standings(pargs.free_from_str()?),
        "bind" => Command::Bind {
            user: pargs.value_from_str("--user")?,
            account: pargs.value_from_str("--account")?,
            name: pargs.value_from_str("--name")?,
        },
        other => bail!("unknown command '{other}', see --help"),
    };

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    Ok(Args {
        database_url,
        json,
        command,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let args = parse_args()?;
    logging::init();

    let config = AdminConfig::from_env(args.database_url)?;
    config.validate()?;

    let db = Database::new(&config.database)
        .await
        .context("Failed to connect to database")?;
    db.health_check()
        .await
        .context("Database health check failed")?;
    info!("Database connected successfully");

    let pool = Arc::new(db.pool().clone());
    let tournaments = TournamentManager::new(pool.clone()).with_rules(config.rules);
    let directory = PgUserDirectory::new(pool);
    let out = Output { json: args.json };

    match args.command {
        Command::Migrate => {
            db.migrate().await?;
            out.message("Migrations applied");
        }
        Command::Create(new) => {
            let tournament = tournaments.create_tournament(new).await?;
            out.emit(&tournament, || tournament_line(&tournament));
        }
        Command::List => {
            let list = tournaments.active_tournaments().await?;
            out.emit(&list, || {
                if list.is_empty() {
                    return "No active tournaments".to_string();
                }
                list.iter().map(tournament_line).collect::<Vec<_>>().join("\n")
            });
        }
        Command::Show(id) => {
            let tournament = tournaments.get_tournament(id).await?;
            let participants = tournaments.list_participants(id).await?;
            let view = TournamentView {
                tournament: &tournament,
                participants: &participants,
            };
            out.emit(&view, || show_text(&tournament, &participants));
        }
        Command::Join {
            tournament,
            user,
            name,
            account,
        } => {
            let participant = match name {
                Some(name) => {
                    let mut request = JoinRequest::new(user, name);
                    if let Some(account) = account {
                        request = request.with_account(account_ref(&account)?);
                    }
                    tournaments.join(tournament, request).await?
                }
                None => {
                    if account.is_some() {
                        bail!("--account needs --name, or bind the account first");
                    }
                    tournaments.join_user(tournament, user, &directory).await?
                }
            };
            out.emit(&participant, || {
                format!(
                    "{} joined as participant #{}",
                    participant.display_name, participant.id
                )
            });
        }
        Command::Leave { tournament, user } => {
            tournaments.leave(tournament, user).await?;
            out.message(&format!("User {user} left tournament #{tournament}"));
        }
        Command::Bracket(id) => {
            let matches = tournaments.generate_bracket(id).await?;
            let names = names(&tournaments.list_participants(id).await?);
            out.emit(&matches, || matches_text(&matches, &names));
        }
        Command::Matches { tournament, round } => {
            let matches = match round {
                Some(round) => tournaments.round(tournament, round).await?,
                None => tournaments.matches(tournament).await?,
            };
            let names = names(&tournaments.list_participants(tournament).await?);
            out.emit(&matches, || matches_text(&matches, &names));
        }
        Command::Report { match_id, winner } => {
            let outcome = tournaments.report_result(match_id, winner).await?;
            let names = names(
                &tournaments
                    .list_participants(outcome.played.tournament_id)
                    .await?,
            );
            out.emit(&outcome, || {
                format!(
                    "{}\n{}",
                    match_line(&outcome.played, &names),
                    advancement_text(&outcome.advancement, &names)
                )
            });
        }
        Command::Advance(id) => {
            let advancement = tournaments.try_advance(id).await?;
            let names = names(&tournaments.list_participants(id).await?);
            out.emit(&advancement, || advancement_text(&advancement, &names));
        }
        Command::Standings(id) => {
            let standings = tournaments.standings(id).await?;
            out.emit(&standings, || standings_text(&standings));
        }
        Command::Bind {
            user,
            account,
            name,
        } => {
            let bound = directory
                .bind_account(user, account_ref(&account)?, &name)
                .await?;
            out.emit(&bound, || {
                format!(
                    "User {} ({}) bound to account {}",
                    bound.id,
                    bound.display_name,
                    bound.account_id.unwrap_or_default()
                )
            });
        }
    }

    db.close().await;
    Ok(())
}

/// Prints results as text or JSON
struct Output {
    json: bool,
}

impl Output {
    fn emit<T: Serialize>(&self, value: &T, text: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => log::error!("Failed to serialize output: {e}"),
            }
        } else {
            println!("{}", text());
        }
    }

    fn message(&self, message: &str) {
        self.emit(&serde_json::json!({ "message": message }), || {
            message.to_string()
        });
    }
}

#[derive(Serialize)]
struct TournamentView<'a> {
    tournament: &'a Tournament,
    participants: &'a [Participant],
}

fn account_ref(input: &str) -> Result<i64, UserError> {
    parse_account_ref(input).ok_or_else(|| UserError::InvalidAccountRef(input.to_string()))
}

fn names(participants: &[Participant]) -> HashMap<i64, String> {
    participants
        .iter()
        .map(|p| (p.id, p.display_name.clone()))
        .collect()
}

fn name_of(names: &HashMap<i64, String>, id: i64) -> String {
    names
        .get(&id)
        .cloned()
        .unwrap_or_else(|| format!("#{id}"))
}

fn tournament_line(t: &Tournament) -> String {
    let start = t
        .start_date
        .map(|d| format!(", starts {d}"))
        .unwrap_or_default();
    format!(
        "#{} {} [{}] {}/{} players{}",
        t.id, t.name, t.status, t.participant_count, t.capacity, start
    )
}

fn show_text(t: &Tournament, participants: &[Participant]) -> String {
    let mut lines = vec![tournament_line(t)];
    if let Some(description) = &t.description {
        lines.push(description.clone());
    }
    if let Some(prize) = &t.prize {
        lines.push(format!("Prize: {prize}"));
    }
    for p in participants {
        lines.push(format!("  #{} {} (user {})", p.id, p.display_name, p.user_id));
    }
    lines.join("\n")
}

fn match_line(m: &Match, names: &HashMap<i64, String>) -> String {
    let first = name_of(names, m.first);
    let Some(second) = m.second else {
        return format!("#{} R{}: {} gets a bye", m.id, m.round, first);
    };
    let result = m
        .winner
        .map(|w| format!(" -> {}", name_of(names, w)))
        .unwrap_or_default();
    format!(
        "#{} R{}: {} vs {}{}",
        m.id,
        m.round,
        first,
        name_of(names, second),
        result
    )
}

fn matches_text(matches: &[Match], names: &HashMap<i64, String>) -> String {
    if matches.is_empty() {
        return "No matches".to_string();
    }
    matches
        .iter()
        .map(|m| match_line(m, names))
        .collect::<Vec<_>>()
        .join("\n")
}

fn advancement_text(advancement: &Advancement, names: &HashMap<i64, String>) -> String {
    match advancement {
        Advancement::RoundPending => "Round still in progress".to_string(),
        Advancement::NextRound { round, matches } => {
            format!("Round {round} scheduled:\n{}", matches_text(matches, names))
        }
        Advancement::Champion(champion) => format!("Champion: {}", champion.display_name),
    }
}

fn standings_text(standings: &[Standing]) -> String {
    let mut lines = vec![format!(
        "{:<4}{:<24}{:>4}{:>4}{:>6}{:>8}",
        "#", "Player", "W", "L", "Pts", "Win%"
    )];
    for (place, s) in standings.iter().enumerate() {
        lines.push(format!(
            "{:<4}{:<24}{:>4}{:>4}{:>6}{:>7.1}%",
            place + 1,
            s.display_name,
            s.wins,
            s.losses,
            s.points,
            s.winrate
        ));
    }
    lines.join("\n")
}
