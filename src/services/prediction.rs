use chrono::{DateTime, Utc};
use log::{debug, trace, warn};

use crate::clock::Clock;
use crate::config::settings::RatingSettings;
use crate::database::store::{GameStore, RatingLookup};
use crate::domain::{Game, GameState, Lineup, Prediction, RatingSample};
use crate::errors::EngineError;
use crate::rating::types::{GameId, PlayerId, Rating, TeamRatings};
use crate::rating::{actual_outcome_fraction, expected_outcome, new_ratings, predict_score};

/// What processing one game produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    pub prediction: Prediction,
    pub samples: Vec<RatingSample>,
}

/// Runs the per-game pipeline: as-of ratings, win probability, score line,
/// prediction upsert and, for played games, the post-game rating samples.
pub struct PredictionService<C: Clock> {
    settings: RatingSettings,
    clock: C,
}

impl<C: Clock> PredictionService<C> {
    pub fn new(settings: RatingSettings, clock: C) -> Self {
        Self { settings, clock }
    }

    pub fn settings(&self) -> &RatingSettings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// [`process`](Self::process) inside one store transaction, refusing to
    /// write if the game changed since it was read.
    pub fn process_atomically<S: GameStore>(
        &self,
        store: &mut S,
        game: &Game,
    ) -> Result<GameOutcome, EngineError> {
        store.transaction(|store| -> Result<GameOutcome, EngineError> {
            self.ensure_unchanged(store, game)?;
            self.process(store, game)
        })
    }

    pub fn process<S: GameStore>(&self, store: &mut S, game: &Game) -> Result<GameOutcome, EngineError> {
        let prediction = self.predict(store, game)?;
        let samples = if game.is_played() {
            self.refresh_ratings(store, game)?
        } else {
            Vec::new()
        };

        Ok(GameOutcome { prediction, samples })
    }

    fn ensure_unchanged<S: GameStore>(&self, store: &mut S, game: &Game) -> Result<(), EngineError> {
        match store.game_version(game.id)? {
            None => Err(EngineError::GameNotFound(game.id)),
            Some(version) if version != game.version => {
                warn!(
                    "Game {} is at version {} but version {} was read",
                    game.id, version, game.version
                );
                Err(EngineError::Conflict(game.id))
            }
            Some(_) => Ok(()),
        }
    }

    /// Ratings of both teams as they stood strictly before `as_of`.
    pub fn resolve_ratings<L: RatingLookup>(
        &self,
        lookup: &mut L,
        lineup: &Lineup,
        as_of: DateTime<Utc>,
    ) -> Result<(TeamRatings, TeamRatings), EngineError> {
        let ratings = match *lineup {
            Lineup::Singles { team_one, team_two } => (
                TeamRatings::Single(self.rating_of(lookup, team_one, as_of)?),
                TeamRatings::Single(self.rating_of(lookup, team_two, as_of)?),
            ),
            Lineup::Doubles { team_one, team_two } => (
                TeamRatings::Pair(
                    self.rating_of(lookup, team_one[0], as_of)?,
                    self.rating_of(lookup, team_one[1], as_of)?,
                ),
                TeamRatings::Pair(
                    self.rating_of(lookup, team_two[0], as_of)?,
                    self.rating_of(lookup, team_two[1], as_of)?,
                ),
            ),
        };
        Ok(ratings)
    }

    fn rating_of<L: RatingLookup>(
        &self,
        lookup: &mut L,
        player_id: PlayerId,
        as_of: DateTime<Utc>,
    ) -> Result<Rating, EngineError> {
        let rating = lookup
            .rating_as_of(player_id, as_of)?
            .unwrap_or(self.settings.initial_rating);
        trace!("Player {} rated {} before {}", player_id, rating, as_of);
        Ok(rating)
    }

    /// Builds a prediction from already resolved ratings. Pure.
    pub fn compute_prediction(
        &self,
        game_id: GameId,
        team_one: TeamRatings,
        team_two: TeamRatings,
        computed_at: DateTime<Utc>,
    ) -> Result<Prediction, EngineError> {
        let probability = expected_outcome(team_one, team_two, &self.settings);
        let score = predict_score(probability)?;

        Ok(Prediction {
            game_id,
            team_one,
            team_two,
            team_one_win_probability: probability,
            score,
            computed_at,
            version: 1,
        })
    }

    /// Computes and stores the game's prediction. The stored version only
    /// moves when a value changed.
    pub fn predict<S: GameStore>(&self, store: &mut S, game: &Game) -> Result<Prediction, EngineError> {
        let as_of = game.played_at().unwrap_or_else(|| self.clock.now());
        let (team_one, team_two) = self.resolve_ratings(store, &game.lineup, as_of)?;
        let computed = self.compute_prediction(game.id, team_one, team_two, as_of)?;

        let prediction = match store.get_prediction(game.id)? {
            Some(existing) if existing.same_values(&computed) => {
                trace!("Prediction for game {} unchanged", game.id);
                return Ok(existing);
            }
            Some(existing) => Prediction {
                version: existing.version + 1,
                ..computed
            },
            None => computed,
        };

        store.upsert_prediction(&prediction)?;
        debug!(
            "Game {}: team one win probability {:.4}, predicted {}-{}",
            game.id,
            prediction.team_one_win_probability,
            prediction.score.team_one,
            prediction.score.team_two
        );
        Ok(prediction)
    }

    /// Derives and stores the post-game ratings of a played game from its
    /// stored prediction. Scheduled games yield nothing.
    pub fn refresh_ratings<S: GameStore>(
        &self,
        store: &mut S,
        game: &Game,
    ) -> Result<Vec<RatingSample>, EngineError> {
        let GameState::Played { played_at, score } = game.state else {
            return Ok(Vec::new());
        };

        let prediction = store
            .get_prediction(game.id)?
            .ok_or(EngineError::MissingPrediction(game.id))?;
        check_prediction_shape(game, &prediction)?;

        let actual = actual_outcome_fraction(score.team_one, score.team_two);
        let k_factor = self.settings.k_factor_for(prediction.team_one.first());

        let team_one_after = new_ratings(
            prediction.team_one,
            prediction.team_one_win_probability,
            actual,
            k_factor,
            &self.settings,
        );
        let team_two_after = new_ratings(
            prediction.team_two,
            prediction.team_two_win_probability(),
            1.0 - actual,
            k_factor,
            &self.settings,
        );

        let samples: Vec<RatingSample> = game
            .lineup
            .team_one()
            .into_iter()
            .zip(team_one_after.to_vec())
            .chain(game.lineup.team_two().into_iter().zip(team_two_after.to_vec()))
            .map(|(player_id, rating)| RatingSample {
                player_id,
                game_id: game.id,
                rating,
                rated_at: played_at,
            })
            .collect();

        let removed = store.delete_stale_rating_samples(game.id, &game.lineup.participants())?;
        if removed > 0 {
            debug!("Removed {} rating samples of players no longer in game {}", removed, game.id);
        }
        for sample in &samples {
            store.upsert_rating_sample(sample)?;
        }

        Ok(samples)
    }
}

fn check_prediction_shape(game: &Game, prediction: &Prediction) -> Result<(), EngineError> {
    let pairs = (prediction.team_one.is_pair(), prediction.team_two.is_pair());
    match (game.lineup.is_doubles(), pairs) {
        (true, (true, true)) | (false, (false, false)) => Ok(()),
        (true, _) => Err(EngineError::MissingPartnerRating(game.id)),
        (false, _) => Err(EngineError::StalePrediction(game.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::domain::FinalScore;
    use chrono::TimeZone;
    use std::collections::HashMap;

    struct StubLookup {
        ratings: HashMap<PlayerId, Rating>,
        calls: Vec<(PlayerId, DateTime<Utc>)>,
    }

    impl RatingLookup for StubLookup {
        fn rating_as_of(&mut self, player_id: PlayerId, before: DateTime<Utc>) -> anyhow::Result<Option<Rating>> {
            self.calls.push((player_id, before));
            Ok(self.ratings.get(&player_id).copied())
        }
    }

    fn service() -> PredictionService<FixedClock> {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        PredictionService::new(RatingSettings::default(), FixedClock(now))
    }

    #[test]
    fn unrated_players_get_the_initial_rating() {
        let mut lookup = StubLookup {
            ratings: HashMap::from([(2, 300), (3, 400), (4, 500)]),
            calls: Vec::new(),
        };
        let as_of = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let lineup = Lineup::Doubles {
            team_one: [1, 2],
            team_two: [3, 4],
        };

        let (team_one, team_two) = service().resolve_ratings(&mut lookup, &lineup, as_of).unwrap();

        assert_eq!(team_one, TeamRatings::Pair(250, 300));
        assert_eq!(team_two, TeamRatings::Pair(400, 500));
        assert!(lookup.calls.iter().all(|&(_, at)| at == as_of));
        assert_eq!(lookup.calls.len(), 4);
    }

    #[test]
    fn even_singles_prediction() {
        let computed_at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let prediction = service()
            .compute_prediction(9, TeamRatings::Single(250), TeamRatings::Single(250), computed_at)
            .unwrap();

        assert_eq!(prediction.team_one_win_probability, 0.5);
        assert_eq!(prediction.team_two_win_probability(), 0.5);
        assert_eq!((prediction.score.team_one, prediction.score.team_two), (15, 14));
        assert_eq!(prediction.version, 1);
    }

    #[test]
    fn prediction_shape_must_match_lineup() {
        let computed_at = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let game = Game {
            id: 4,
            game_type_id: 1,
            lineup: Lineup::Doubles {
                team_one: [1, 2],
                team_two: [3, 4],
            },
            state: GameState::Played {
                played_at: computed_at,
                score: FinalScore { team_one: 11, team_two: 3 },
            },
            version: 1,
        };
        let singles_prediction = service()
            .compute_prediction(4, TeamRatings::Single(250), TeamRatings::Single(250), computed_at)
            .unwrap();

        assert!(matches!(
            check_prediction_shape(&game, &singles_prediction),
            Err(EngineError::MissingPartnerRating(4))
        ));

        let singles_game = Game {
            lineup: Lineup::Singles { team_one: 1, team_two: 3 },
            ..game
        };
        assert!(check_prediction_shape(&singles_game, &singles_prediction).is_ok());
    }
}
