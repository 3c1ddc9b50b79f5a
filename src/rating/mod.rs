pub mod adjustment;
pub mod expected;
pub mod score_line;
pub mod types;

pub use adjustment::{actual_outcome_fraction, new_ratings};
pub use expected::expected_outcome;
pub use score_line::{PredictedScore, predict_score};
pub use types::{GameId, GameTypeId, PlayerId, Rating, TeamRatings};
