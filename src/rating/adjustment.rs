use super::types::{Rating, TeamRatings};
use crate::config::settings::RatingSettings;

/// Share of all points scored that went to team one.
///
/// A continuous stand-in for win/loss: an 11-9 win counts for less than 11-2.
pub fn actual_outcome_fraction(team_one_score: u32, team_two_score: u32) -> f64 {
    let total = f64::from(team_one_score) + f64::from(team_two_score);
    if total == 0.0 {
        return 0.5;
    }
    f64::from(team_one_score) / total
}

/// Ratings of one team after a game.
///
/// The team's total change is `k_factor * (actual - predicted)`. For doubles it
/// is split between the partners in proportion to their share of the team's
/// rating. Each new rating is rounded half-to-even and floored independently.
pub fn new_ratings(
    before: TeamRatings,
    predicted: f64,
    actual: f64,
    k_factor: f64,
    settings: &RatingSettings,
) -> TeamRatings {
    let change = k_factor * (actual - predicted);
    let floor = settings.minimum_rating;

    match before {
        TeamRatings::Single(rating) => TeamRatings::Single(apply_change(rating, change, floor)),
        TeamRatings::Pair(first, second) => {
            let total = f64::from(first) + f64::from(second);
            let first_weight = f64::from(first) / total;
            let second_weight = f64::from(second) / total;
            TeamRatings::Pair(
                apply_change(first, change * first_weight, floor),
                apply_change(second, change * second_weight, floor),
            )
        }
    }
}

fn apply_change(rating: Rating, change: f64, floor: Rating) -> Rating {
    let adjusted = (f64::from(rating) + change).round_ties_even();
    (adjusted as Rating).max(floor)
}
