pub mod cli;
pub mod clock;
pub mod config;
pub mod database;
pub mod domain;
pub mod errors;
pub mod rating;
pub mod services;

use std::io;
use std::sync::atomic::AtomicBool;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use cli::Cli;
use colored::Colorize;
use log::info;

use crate::cli::{Command, GameArgs};
use crate::clock::SystemClock;
use crate::config::settings::AppConfig;
use crate::database::{players, ratings, setup, DbConn, SqliteStore};
use crate::domain::GameDraft;
use crate::rating::types::{GameId, PlayerId};
use crate::services::{PredictionService, RecomputeService, Recorded, RecordingService};

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

fn open_connection(config: &AppConfig) -> Result<DbConn> {
    let pool = database::create_pool(&config.database_path)?;
    database::get_connection(&pool)
}

fn prediction_service(config: &AppConfig) -> PredictionService<SystemClock> {
    PredictionService::new(config.rating.clone(), SystemClock)
}

pub fn handle_init() -> Result<()> {
    let config = AppConfig::new()?;
    let mut conn = open_connection(&config)?;
    setup::reset_database(&mut conn)?;
    info!("Initialised database at {}", config.database_path);
    Ok(())
}

pub fn handle_add_player(name: &str) -> Result<()> {
    let config = AppConfig::new()?;
    let mut conn = open_connection(&config)?;
    let player = players::insert_player(&mut conn, name)?;
    println!("Added player {} ({})", player.id, player.name);
    Ok(())
}

pub fn handle_add_game_type(name: &str) -> Result<()> {
    let config = AppConfig::new()?;
    let mut conn = open_connection(&config)?;
    let game_type = database::game_types::insert_game_type(&mut conn, name)?;
    println!("Added game type {} ({})", game_type.id, game_type.name);
    Ok(())
}

pub fn handle_record(game: &GameArgs) -> Result<()> {
    let config = AppConfig::new()?;
    let mut store = SqliteStore::new(open_connection(&config)?);
    let service = RecordingService::new(prediction_service(&config));

    let recorded = service.record(&mut store, &GameDraft::from(game))?;
    print_recorded(&recorded)
}

pub fn handle_amend(game_id: GameId, draft: &GameArgs) -> Result<()> {
    let config = AppConfig::new()?;
    let mut store = SqliteStore::new(open_connection(&config)?);
    let service = RecordingService::new(prediction_service(&config));

    let recorded = service.amend(&mut store, game_id, &GameDraft::from(draft))?;
    print_recorded(&recorded)
}

fn print_recorded(recorded: &Recorded) -> Result<()> {
    match recorded {
        Recorded::Rejected(violations) => {
            for violation in violations {
                eprintln!("  {} {}", "✗".red(), violation);
            }
            anyhow::bail!("Game rejected with {} problem(s)", violations.len())
        }
        Recorded::Saved { game, outcome } => {
            let prediction = &outcome.prediction;
            println!(
                "Game {} (version {}): team one wins with probability {:.3}, predicted {}-{}",
                game.id.to_string().bold(),
                game.version,
                prediction.team_one_win_probability,
                prediction.score.team_one,
                prediction.score.team_two
            );
            for sample in &outcome.samples {
                println!("  player {} → {}", sample.player_id, sample.rating.to_string().green());
            }
            Ok(())
        }
    }
}

pub fn handle_refresh(game_id: GameId) -> Result<()> {
    let config = AppConfig::new()?;
    let mut store = SqliteStore::new(open_connection(&config)?);
    let service = RecordingService::new(prediction_service(&config));

    let outcome = service.refresh(&mut store, game_id)?;
    println!(
        "Game {}: prediction version {}, {} rating samples",
        game_id,
        outcome.prediction.version,
        outcome.samples.len()
    );
    Ok(())
}

pub fn handle_recompute() -> Result<()> {
    let config = AppConfig::new()?;
    let mut store = SqliteStore::new(open_connection(&config)?);
    let service = RecomputeService::new(prediction_service(&config));

    let summary = service.run(&mut store, &AtomicBool::new(false))?;
    println!(
        "Recomputed {}/{} games ({} played, {} scheduled), {} rating samples",
        summary.games_processed,
        summary.total_games,
        summary.played_games,
        summary.scheduled_games,
        summary.rating_samples
    );
    Ok(())
}

pub fn handle_history(player_id: PlayerId, json: bool) -> Result<()> {
    let config = AppConfig::new()?;
    let mut conn = open_connection(&config)?;

    let player = players::find_by_id(&mut conn, player_id)?
        .ok_or_else(|| anyhow::anyhow!("Player {} does not exist", player_id))?;
    let history = ratings::list_by_player(&mut conn, player_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!("{} ({})", player.name.bold(), player.id);
    if history.is_empty() {
        println!("  no rated games, starts at {}", config.rating.initial_rating);
    }
    let mut previous = config.rating.initial_rating;
    for entry in &history {
        let delta = entry.rating - previous;
        let delta = match delta {
            d if d > 0 => format!("+{d}").green(),
            d if d < 0 => d.to_string().red(),
            d => d.to_string().normal(),
        };
        println!(
            "  {}  game {:>5}  {:>5}  {}",
            entry.rated_at.format("%Y-%m-%d %H:%M"),
            entry.game_id,
            entry.rating,
            delta
        );
        previous = entry.rating;
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut io::stdout());
    Ok(())
}
