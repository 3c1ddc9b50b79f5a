use serde::{Deserialize, Serialize};

pub type PlayerId = i64;
pub type GameId = i64;
pub type GameTypeId = i64;
pub type Rating = i32;

/// Ratings of one side of a game, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamRatings {
    Single(Rating),
    Pair(Rating, Rating),
}

impl TeamRatings {
    pub fn from_slots(first: Rating, partner: Option<Rating>) -> Self {
        match partner {
            Some(partner) => TeamRatings::Pair(first, partner),
            None => TeamRatings::Single(first),
        }
    }

    /// Team strength fed to the logistic model: the player's rating for
    /// singles, the mean of both partners for doubles.
    pub fn effective(&self) -> f64 {
        match *self {
            TeamRatings::Single(rating) => f64::from(rating),
            TeamRatings::Pair(first, second) => (f64::from(first) + f64::from(second)) / 2.0,
        }
    }

    pub fn first(&self) -> Rating {
        match *self {
            TeamRatings::Single(rating) | TeamRatings::Pair(rating, _) => rating,
        }
    }

    pub fn partner(&self) -> Option<Rating> {
        match *self {
            TeamRatings::Single(_) => None,
            TeamRatings::Pair(_, partner) => Some(partner),
        }
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, TeamRatings::Pair(..))
    }

    pub fn to_vec(&self) -> Vec<Rating> {
        match *self {
            TeamRatings::Single(rating) => vec![rating],
            TeamRatings::Pair(first, second) => vec![first, second],
        }
    }
}
