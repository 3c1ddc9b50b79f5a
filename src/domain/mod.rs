pub mod models;
pub mod validation;

pub use models::{FinalScore, Game, GameDraft, GameState, Lineup, Prediction, RatingSample};
pub use validation::{
    validate, validate_players, validate_references, validate_transition, Violation, MAX_SCORE,
};
