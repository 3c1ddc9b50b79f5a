use anyhow::anyhow;
use log::{debug, info, warn};

use super::prediction::{GameOutcome, PredictionService};
use crate::clock::Clock;
use crate::database::store::GameStore;
use crate::domain::{self, Game, GameDraft, GameState, Lineup, Violation};
use crate::errors::EngineError;
use crate::rating::types::{GameId, GameTypeId};

/// Result of recording or amending a game.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Rejected(Vec<Violation>),
    Saved { game: Game, outcome: GameOutcome },
}

/// Entry point for games coming from outside: validates, stores and runs the
/// prediction pipeline in one transaction.
pub struct RecordingService<C: Clock> {
    predictions: PredictionService<C>,
}

impl<C: Clock> RecordingService<C> {
    pub fn new(predictions: PredictionService<C>) -> Self {
        Self { predictions }
    }

    pub fn record<S: GameStore>(&self, store: &mut S, draft: &GameDraft) -> Result<Recorded, EngineError> {
        let violations = domain::validate(draft, self.predictions.clock());
        if !violations.is_empty() {
            return Ok(Recorded::Rejected(violations));
        }

        store.transaction(|store| -> Result<Recorded, EngineError> {
            let violations = domain::validate_references(draft, store)?;
            if !violations.is_empty() {
                return Ok(Recorded::Rejected(violations));
            }

            let (game_type_id, lineup, state) = accepted_parts(draft)?;
            let game = store.insert_game(game_type_id, &lineup, &state)?;
            let outcome = self.predictions.process(store, &game)?;
            info!("Recorded game {}", game.id);

            Ok(Recorded::Saved { game, outcome })
        })
    }

    /// Replaces a stored game with `draft`. Games played after it keep their
    /// ratings until the next recompute.
    pub fn amend<S: GameStore>(
        &self,
        store: &mut S,
        game_id: GameId,
        draft: &GameDraft,
    ) -> Result<Recorded, EngineError> {
        store.transaction(|store| -> Result<Recorded, EngineError> {
            let existing = store
                .get_game(game_id)?
                .ok_or(EngineError::GameNotFound(game_id))?;

            let mut violations = domain::validate(draft, self.predictions.clock());
            violations.extend(domain::validate_transition(&existing, draft));
            if violations.is_empty() {
                violations = domain::validate_references(draft, store)?;
            }
            if !violations.is_empty() {
                return Ok(Recorded::Rejected(violations));
            }

            let (game_type_id, lineup, state) = accepted_parts(draft)?;
            let mut game = Game {
                id: game_id,
                game_type_id,
                lineup,
                state,
                version: existing.version,
            };
            game.version = store
                .update_game(&game)?
                .ok_or(EngineError::Conflict(game_id))?;

            // Samples stamped at the old date would otherwise feed the game's own prediction.
            if existing.played_at() != game.played_at() {
                let removed = store.delete_stale_rating_samples(game_id, &[])?;
                debug!("Game {} moved in time, dropped {} rating samples", game_id, removed);
            }

            let outcome = self.predictions.process(store, &game)?;
            if game.is_played() {
                warn!(
                    "Game {} amended; ratings of later games are not updated until a recompute",
                    game_id
                );
            }

            Ok(Recorded::Saved { game, outcome })
        })
    }

    /// Reruns the pipeline on the stored game.
    pub fn refresh<S: GameStore>(&self, store: &mut S, game_id: GameId) -> Result<GameOutcome, EngineError> {
        let game = store
            .get_game(game_id)?
            .ok_or(EngineError::GameNotFound(game_id))?;
        self.predictions.process_atomically(store, &game)
    }
}

fn accepted_parts(draft: &GameDraft) -> Result<(GameTypeId, Lineup, GameState), EngineError> {
    match (draft.game_type_id, draft.lineup(), draft.state()) {
        (Some(game_type_id), Some(lineup), Some(state)) => Ok((game_type_id, lineup, state)),
        _ => Err(anyhow!("Validated draft does not describe a complete game").into()),
    }
}
