use thiserror::Error;

use crate::rating::types::GameId;

/// Failures of the rating engine.
///
/// Validation problems are not errors; they come back as
/// [`Violation`](crate::domain::Violation) values.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Win probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("Game {0} has no prediction to derive ratings from")]
    MissingPrediction(GameId),

    #[error("Doubles game {0} is missing a partner rating in its prediction")]
    MissingPartnerRating(GameId),

    #[error("Stored prediction for game {0} does not match its lineup")]
    StalePrediction(GameId),

    #[error("Game {0} was modified by another process")]
    Conflict(GameId),

    #[error("Game {0} does not exist")]
    GameNotFound(GameId),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    /// Whether the error signals corrupted or inconsistent derived state
    /// rather than bad input or a storage hiccup.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::MissingPrediction(_)
                | EngineError::MissingPartnerRating(_)
                | EngineError::StalePrediction(_)
        )
    }
}

/// Context message for a failed query on a single game
pub fn game_context(operation: &str, game_id: GameId) -> String {
    format!("Failed to {} for game {}", operation, game_id)
}

/// Context message for a failed query on a single player
pub fn player_context(operation: &str, player_id: i64) -> String {
    format!("Failed to {} for player {}", operation, player_id)
}
