use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::score_line::PredictedScore;
use crate::rating::types::{GameId, GameTypeId, PlayerId, Rating, TeamRatings};

/// Who played on which side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lineup {
    Singles {
        team_one: PlayerId,
        team_two: PlayerId,
    },
    Doubles {
        team_one: [PlayerId; 2],
        team_two: [PlayerId; 2],
    },
}

impl Lineup {
    /// Builds a lineup from the four storage slots.
    ///
    /// Returns `None` when exactly one team has a second player.
    pub fn from_slots(
        team_one_first: PlayerId,
        team_one_second: Option<PlayerId>,
        team_two_first: PlayerId,
        team_two_second: Option<PlayerId>,
    ) -> Option<Self> {
        match (team_one_second, team_two_second) {
            (None, None) => Some(Lineup::Singles {
                team_one: team_one_first,
                team_two: team_two_first,
            }),
            (Some(team_one_second), Some(team_two_second)) => Some(Lineup::Doubles {
                team_one: [team_one_first, team_one_second],
                team_two: [team_two_first, team_two_second],
            }),
            _ => None,
        }
    }

    /// `(team one first, team one second, team two first, team two second)`
    pub fn slots(&self) -> (PlayerId, Option<PlayerId>, PlayerId, Option<PlayerId>) {
        match *self {
            Lineup::Singles { team_one, team_two } => (team_one, None, team_two, None),
            Lineup::Doubles { team_one, team_two } => {
                (team_one[0], Some(team_one[1]), team_two[0], Some(team_two[1]))
            }
        }
    }

    pub fn team_one(&self) -> Vec<PlayerId> {
        match *self {
            Lineup::Singles { team_one, .. } => vec![team_one],
            Lineup::Doubles { team_one, .. } => team_one.to_vec(),
        }
    }

    pub fn team_two(&self) -> Vec<PlayerId> {
        match *self {
            Lineup::Singles { team_two, .. } => vec![team_two],
            Lineup::Doubles { team_two, .. } => team_two.to_vec(),
        }
    }

    pub fn participants(&self) -> Vec<PlayerId> {
        let mut players = self.team_one();
        players.extend(self.team_two());
        players
    }

    pub fn is_doubles(&self) -> bool {
        matches!(self, Lineup::Doubles { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub team_one: u32,
    pub team_two: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Scheduled,
    Played {
        played_at: DateTime<Utc>,
        score: FinalScore,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub game_type_id: GameTypeId,
    pub lineup: Lineup,
    pub state: GameState,
    /// Optimistic-concurrency stamp, bumped on every amendment
    pub version: i64,
}

impl Game {
    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        match self.state {
            GameState::Scheduled => None,
            GameState::Played { played_at, .. } => Some(played_at),
        }
    }

    pub fn is_played(&self) -> bool {
        matches!(self.state, GameState::Played { .. })
    }
}

/// Pre-game forecast for one game, derived from the ratings as they stood
/// before it was played.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub game_id: GameId,
    pub team_one: TeamRatings,
    pub team_two: TeamRatings,
    pub team_one_win_probability: f64,
    pub score: PredictedScore,
    pub computed_at: DateTime<Utc>,
    pub version: i64,
}

impl Prediction {
    pub fn team_two_win_probability(&self) -> f64 {
        1.0 - self.team_one_win_probability
    }

    /// Compares everything but the version stamp.
    pub fn same_values(&self, other: &Prediction) -> bool {
        self.game_id == other.game_id
            && self.team_one == other.team_one
            && self.team_two == other.team_two
            && self.team_one_win_probability == other.team_one_win_probability
            && self.score == other.score
            && self.computed_at == other.computed_at
    }
}

/// A player's rating right after one played game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSample {
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub rating: Rating,
    pub rated_at: DateTime<Utc>,
}

/// A game as proposed from outside, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDraft {
    pub game_type_id: Option<GameTypeId>,
    pub team_one_first: Option<PlayerId>,
    pub team_one_second: Option<PlayerId>,
    pub team_two_first: Option<PlayerId>,
    pub team_two_second: Option<PlayerId>,
    pub team_one_score: Option<i64>,
    pub team_two_score: Option<i64>,
    pub played_at: Option<DateTime<Utc>>,
}

impl GameDraft {
    pub fn player_ids(&self) -> Vec<PlayerId> {
        [
            self.team_one_first,
            self.team_one_second,
            self.team_two_first,
            self.team_two_second,
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    pub fn lineup(&self) -> Option<Lineup> {
        Lineup::from_slots(
            self.team_one_first?,
            self.team_one_second,
            self.team_two_first?,
            self.team_two_second,
        )
    }

    pub fn state(&self) -> Option<GameState> {
        match (self.played_at, self.team_one_score, self.team_two_score) {
            (None, None, None) => Some(GameState::Scheduled),
            (Some(played_at), Some(team_one), Some(team_two)) => Some(GameState::Played {
                played_at,
                score: FinalScore {
                    team_one: u32::try_from(team_one).ok()?,
                    team_two: u32::try_from(team_two).ok()?,
                },
            }),
            _ => None,
        }
    }

    /// Converts a draft that passed validation into a game.
    pub fn to_game(&self, id: GameId, version: i64) -> Option<Game> {
        Some(Game {
            id,
            game_type_id: self.game_type_id?,
            lineup: self.lineup()?,
            state: self.state()?,
            version,
        })
    }
}

impl From<&Game> for GameDraft {
    fn from(game: &Game) -> Self {
        let (team_one_first, team_one_second, team_two_first, team_two_second) = game.lineup.slots();
        let (played_at, team_one_score, team_two_score) = match game.state {
            GameState::Scheduled => (None, None, None),
            GameState::Played { played_at, score } => (
                Some(played_at),
                Some(i64::from(score.team_one)),
                Some(i64::from(score.team_two)),
            ),
        };
        Self {
            game_type_id: Some(game.game_type_id),
            team_one_first: Some(team_one_first),
            team_one_second,
            team_two_first: Some(team_two_first),
            team_two_second,
            team_one_score,
            team_two_score,
            played_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn half_doubles_lineup_is_unrepresentable() {
        assert!(Lineup::from_slots(1, Some(2), 3, None).is_none());
        assert!(Lineup::from_slots(1, None, 3, Some(4)).is_none());
        assert_eq!(
            Lineup::from_slots(1, None, 3, None),
            Some(Lineup::Singles { team_one: 1, team_two: 3 })
        );
    }

    #[test]
    fn draft_round_trips_through_game() {
        let game = Game {
            id: 7,
            game_type_id: 1,
            lineup: Lineup::Doubles {
                team_one: [1, 2],
                team_two: [3, 4],
            },
            state: GameState::Played {
                played_at: Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap(),
                score: FinalScore { team_one: 11, team_two: 8 },
            },
            version: 3,
        };

        let draft = GameDraft::from(&game);
        assert_eq!(draft.to_game(7, 3), Some(game));
    }

    #[test]
    fn draft_with_scores_but_no_date_has_no_state() {
        let draft = GameDraft {
            team_one_score: Some(11),
            team_two_score: Some(5),
            ..GameDraft::default()
        };
        assert_eq!(draft.state(), None);
    }
}
