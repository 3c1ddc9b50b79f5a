use std::sync::atomic::{AtomicBool, Ordering};

use log::{debug, error, info, warn};

use super::prediction::PredictionService;
use crate::clock::Clock;
use crate::database::store::GameStore;
use crate::domain::Game;
use crate::errors::EngineError;

/// Counts from one bulk recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomputeSummary {
    pub total_games: usize,
    pub games_processed: usize,
    pub played_games: usize,
    pub scheduled_games: usize,
    pub rating_samples: usize,
    pub cancelled: bool,
}

/// Rebuilds every prediction and rating sample from scratch by replaying all
/// games in the order they were played.
pub struct RecomputeService<C: Clock> {
    predictions: PredictionService<C>,
}

impl<C: Clock> RecomputeService<C> {
    pub fn new(predictions: PredictionService<C>) -> Self {
        Self { predictions }
    }

    pub fn run<S: GameStore>(&self, store: &mut S, cancel: &AtomicBool) -> Result<RecomputeSummary, EngineError> {
        info!("=== Starting Rating Recompute ===\n");

        let (predictions, samples) = store.transaction(|store| -> Result<_, EngineError> {
            Ok((store.delete_all_predictions()?, store.delete_all_rating_samples()?))
        })?;
        info!("  → Cleared {} predictions and {} rating samples\n", predictions, samples);

        let mut games = store.list_games()?;
        replay_order(&mut games);

        let mut summary = RecomputeSummary {
            total_games: games.len(),
            ..RecomputeSummary::default()
        };
        info!("  → Replaying {} games", summary.total_games);

        for (idx, game) in games.iter().enumerate() {
            if cancel.load(Ordering::Relaxed) {
                warn!(
                    "Recompute cancelled after {}/{} games",
                    summary.games_processed, summary.total_games
                );
                summary.cancelled = true;
                return Ok(summary);
            }

            let outcome = match self.predictions.process_atomically(store, game) {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!("Failed to process game {}: {}", game.id, e);
                    return Err(e);
                }
            };

            if game.is_played() {
                summary.played_games += 1;
            } else {
                summary.scheduled_games += 1;
            }
            summary.rating_samples += outcome.samples.len();
            summary.games_processed += 1;

            if (idx + 1) % 100 == 0 || idx + 1 == games.len() {
                info!("  Processing game {}/{}", idx + 1, games.len());
            }
            debug!("Game {} produced {} rating samples", game.id, outcome.samples.len());
        }

        info!(
            "  → {} played, {} scheduled, {} rating samples\n",
            summary.played_games, summary.scheduled_games, summary.rating_samples
        );
        info!("=== Recompute Complete ===");
        Ok(summary)
    }
}

/// Played games by play time, ties broken by id, then scheduled games by id.
pub fn replay_order(games: &mut [Game]) {
    games.sort_by_key(|game| (game.played_at().is_none(), game.played_at(), game.id));
}
