use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{trace, warn};

use super::connection::DbConn;
use super::{game_types, games, players, predictions, ratings};
use crate::domain::{Game, GameState, Lineup, Prediction, RatingSample};
use crate::rating::types::{GameId, GameTypeId, PlayerId, Rating};

/// Resolves a player's rating as it stood before some instant.
pub trait RatingLookup {
    /// Rating of the latest sample strictly before `before`, if any.
    fn rating_as_of(&mut self, player_id: PlayerId, before: DateTime<Utc>) -> Result<Option<Rating>>;
}

/// Everything the engine reads from and writes to storage.
///
/// Each call is atomic on its own; [`GameStore::transaction`] groups calls
/// that must land together.
pub trait GameStore: RatingLookup {
    fn get_game(&mut self, id: GameId) -> Result<Option<Game>>;
    fn list_games(&mut self) -> Result<Vec<Game>>;
    fn game_version(&mut self, id: GameId) -> Result<Option<i64>>;
    fn insert_game(&mut self, game_type_id: GameTypeId, lineup: &Lineup, state: &GameState) -> Result<Game>;
    /// Returns the new version, or `None` when the stored version no longer
    /// matches `game.version`.
    fn update_game(&mut self, game: &Game) -> Result<Option<i64>>;

    fn get_prediction(&mut self, game_id: GameId) -> Result<Option<Prediction>>;
    fn upsert_prediction(&mut self, prediction: &Prediction) -> Result<()>;
    fn delete_all_predictions(&mut self) -> Result<usize>;

    fn upsert_rating_sample(&mut self, sample: &RatingSample) -> Result<()>;
    fn delete_stale_rating_samples(&mut self, game_id: GameId, keep: &[PlayerId]) -> Result<usize>;
    fn delete_all_rating_samples(&mut self) -> Result<usize>;

    fn player_exists(&mut self, id: PlayerId) -> Result<bool>;
    fn game_type_exists(&mut self, id: GameTypeId) -> Result<bool>;

    /// Runs `f` so that all of its writes commit together or not at all.
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        Self: Sized,
        E: From<anyhow::Error>,
        F: FnOnce(&mut Self) -> Result<T, E>;
}

/// [`GameStore`] over one pooled SQLite connection.
pub struct SqliteStore {
    conn: DbConn,
}

impl SqliteStore {
    pub fn new(conn: DbConn) -> Self {
        Self { conn }
    }

    pub fn conn(&mut self) -> &mut DbConn {
        &mut self.conn
    }

    fn execute_control(&mut self, sql: &str) -> Result<()> {
        self.conn
            .execute_batch(sql)
            .with_context(|| format!("Failed to run {}", sql))
    }
}

impl RatingLookup for SqliteStore {
    fn rating_as_of(&mut self, player_id: PlayerId, before: DateTime<Utc>) -> Result<Option<Rating>> {
        ratings::latest_before(&mut self.conn, player_id, before)
    }
}

impl GameStore for SqliteStore {
    fn get_game(&mut self, id: GameId) -> Result<Option<Game>> {
        games::find_by_id(&mut self.conn, id)
    }

    fn list_games(&mut self) -> Result<Vec<Game>> {
        games::list_all(&mut self.conn)
    }

    fn game_version(&mut self, id: GameId) -> Result<Option<i64>> {
        games::get_version(&mut self.conn, id)
    }

    fn insert_game(&mut self, game_type_id: GameTypeId, lineup: &Lineup, state: &GameState) -> Result<Game> {
        games::insert_game(&mut self.conn, game_type_id, lineup, state)
    }

    fn update_game(&mut self, game: &Game) -> Result<Option<i64>> {
        games::update_game(&mut self.conn, game)
    }

    fn get_prediction(&mut self, game_id: GameId) -> Result<Option<Prediction>> {
        predictions::find_by_game(&mut self.conn, game_id)
    }

    fn upsert_prediction(&mut self, prediction: &Prediction) -> Result<()> {
        predictions::upsert_prediction(&mut self.conn, prediction)
    }

    fn delete_all_predictions(&mut self) -> Result<usize> {
        predictions::delete_all(&mut self.conn)
    }

    fn upsert_rating_sample(&mut self, sample: &RatingSample) -> Result<()> {
        ratings::upsert_sample(&mut self.conn, sample)
    }

    fn delete_stale_rating_samples(&mut self, game_id: GameId, keep: &[PlayerId]) -> Result<usize> {
        ratings::delete_stale(&mut self.conn, game_id, keep)
    }

    fn delete_all_rating_samples(&mut self) -> Result<usize> {
        ratings::delete_all(&mut self.conn)
    }

    fn player_exists(&mut self, id: PlayerId) -> Result<bool> {
        players::exists(&mut self.conn, id)
    }

    fn game_type_exists(&mut self, id: GameTypeId) -> Result<bool> {
        game_types::exists(&mut self.conn, id)
    }

    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        // Write lock is held from the first read.
        self.execute_control("BEGIN IMMEDIATE")?;
        trace!("Transaction started");

        match f(self) {
            Ok(value) => {
                self.execute_control("COMMIT")?;
                trace!("Transaction committed");
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.execute_control("ROLLBACK") {
                    warn!("Rollback failed: {:?}", rollback);
                }
                Err(e)
            }
        }
    }
}
