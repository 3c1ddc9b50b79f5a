use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use crate::domain::GameDraft;
use crate::rating::types::{GameId, GameTypeId, PlayerId};

#[derive(Parser, Debug)]
#[command(author, version, about = "pickleball rating and prediction engine")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "kebab-case")]
pub enum Command {
    /// Create a fresh database, dropping any existing data
    Init,
    /// Register a player
    AddPlayer {
        #[arg(short, long)]
        name: String,
    },
    /// Register a game type
    AddGameType {
        #[arg(short, long)]
        name: String,
    },
    /// Record a new game and compute its prediction and ratings
    Record {
        #[command(flatten)]
        game: GameArgs,
    },
    /// Replace a stored game and recompute it
    Amend {
        /// Id of the game to replace
        #[arg(long)]
        game: GameId,
        #[command(flatten)]
        draft: GameArgs,
    },
    /// Recompute the prediction and ratings of one stored game
    Refresh {
        #[arg(short, long)]
        game: GameId,
    },
    /// Rebuild every prediction and rating in played order
    ///
    /// Scheduled games are predicted as of the current time, so their
    /// predictions only repeat exactly between runs for played games.
    Recompute,
    /// Show a player's rating history
    History {
        #[arg(short, long)]
        player: PlayerId,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print shell completions
    Completions {
        #[arg(short, long)]
        shell: Shell,
    },
}

/// Game fields as given on the command line.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct GameArgs {
    #[arg(long)]
    pub game_type: Option<GameTypeId>,
    #[arg(long)]
    pub team_one: Option<PlayerId>,
    /// Team one partner, doubles only
    #[arg(long)]
    pub team_one_partner: Option<PlayerId>,
    #[arg(long)]
    pub team_two: Option<PlayerId>,
    /// Team two partner, doubles only
    #[arg(long)]
    pub team_two_partner: Option<PlayerId>,
    #[arg(long, allow_negative_numbers = true)]
    pub team_one_score: Option<i64>,
    #[arg(long, allow_negative_numbers = true)]
    pub team_two_score: Option<i64>,
    /// When the game was played, RFC 3339 (e.g. 2025-05-01T18:00:00Z)
    #[arg(long)]
    pub played_at: Option<DateTime<Utc>>,
}

impl From<&GameArgs> for GameDraft {
    fn from(args: &GameArgs) -> Self {
        Self {
            game_type_id: args.game_type,
            team_one_first: args.team_one,
            team_one_second: args.team_one_partner,
            team_two_first: args.team_two,
            team_two_second: args.team_two_partner,
            team_one_score: args.team_one_score,
            team_two_score: args.team_two_score,
            played_at: args.played_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn record_flags_become_a_draft() {
        let cli = Cli::parse_from([
            "pickleball-rating",
            "record",
            "--game-type",
            "1",
            "--team-one",
            "3",
            "--team-two",
            "4",
            "--team-one-score",
            "11",
            "--team-two-score",
            "6",
            "--played-at",
            "2025-05-01T18:00:00Z",
        ]);

        let Command::Record { game } = cli.command else {
            panic!("expected record, got {:?}", cli.command);
        };
        let draft = GameDraft::from(&game);
        assert_eq!(draft.team_one_first, Some(3));
        assert_eq!(draft.team_one_second, None);
        assert_eq!(draft.team_two_score, Some(6));
        assert_eq!(draft.played_at, Some(Utc.with_ymd_and_hms(2025, 5, 1, 18, 0, 0).unwrap()));
    }

    #[test]
    fn recompute_help_mentions_scheduled_games_use_current_time() {
        let command = Cli::command();
        let recompute = command.find_subcommand("recompute").unwrap();
        let help = recompute.get_long_about().unwrap().to_string();

        assert!(help.contains("current time"), "got {help}");
        assert_eq!(
            recompute.get_about().unwrap().to_string(),
            "Rebuild every prediction and rating in played order"
        );
    }

    #[test]
    fn history_defaults_to_table_output() {
        let cli = Cli::parse_from(["pickleball-rating", "history", "--player", "7"]);
        assert_eq!(cli.command, Command::History { player: 7, json: false });
    }
}
