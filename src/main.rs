use anyhow::Result;

use pickleball_rating::cli::Command;
use pickleball_rating::{
    handle_add_game_type, handle_add_player, handle_amend, handle_completions, handle_history,
    handle_init, handle_recompute, handle_record, handle_refresh, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Init => handle_init(),
        Command::AddPlayer { name } => handle_add_player(name),
        Command::AddGameType { name } => handle_add_game_type(name),
        Command::Record { game } => handle_record(game),
        Command::Amend { game, draft } => handle_amend(*game, draft),
        Command::Refresh { game } => handle_refresh(*game),
        Command::Recompute => handle_recompute(),
        Command::History { player, json } => handle_history(*player, *json),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
