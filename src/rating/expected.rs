use super::types::TeamRatings;
use crate::config::settings::RatingSettings;

/// Probability that `team` beats `opponent`.
///
/// Both sides are reduced to one effective rating (the mean for doubles) and
/// compared with the logistic curve `1 / (1 + 10^((opp - self) / scale))`.
pub fn expected_outcome(team: TeamRatings, opponent: TeamRatings, settings: &RatingSettings) -> f64 {
    logistic(team.effective(), opponent.effective(), settings.scale_factor)
}

fn logistic(rating: f64, opponent_rating: f64, scale: f64) -> f64 {
    let exponent = (opponent_rating - rating) / scale;
    1.0 / (1.0 + 10f64.powf(exponent))
}
