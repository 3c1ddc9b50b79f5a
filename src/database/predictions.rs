use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use crate::domain::Prediction;
use crate::errors::game_context;
use crate::rating::score_line::PredictedScore;
use crate::rating::types::{GameId, TeamRatings};

const PREDICTION_COLUMNS: &str = "game_id, team_one_first_rating, team_one_second_rating, team_two_first_rating, team_two_second_rating, team_one_win_probability, team_one_score, team_two_score, computed_at, version";

fn parse_prediction_row(row: &rusqlite::Row) -> rusqlite::Result<Prediction> {
    Ok(Prediction {
        game_id: row.get(0)?,
        team_one: TeamRatings::from_slots(row.get(1)?, row.get(2)?),
        team_two: TeamRatings::from_slots(row.get(3)?, row.get(4)?),
        team_one_win_probability: row.get(5)?,
        score: PredictedScore {
            team_one: row.get(6)?,
            team_two: row.get(7)?,
        },
        computed_at: row.get(8)?,
        version: row.get(9)?,
    })
}

pub fn find_by_game(conn: &mut DbConn, game_id: GameId) -> Result<Option<Prediction>> {
    let sql = format!("SELECT {PREDICTION_COLUMNS} FROM predictions WHERE game_id = ?1");

    conn.query_row(&sql, params![game_id], parse_prediction_row)
        .optional()
        .with_context(|| game_context("query prediction", game_id))
}

/// Inserts the prediction, or overwrites the existing one for the same game.
/// The stored version is taken from `prediction.version` as is.
pub fn upsert_prediction(conn: &mut DbConn, prediction: &Prediction) -> Result<()> {
    let sql = format!(
        "INSERT INTO predictions ({PREDICTION_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10) \
         ON CONFLICT(game_id) DO UPDATE SET \
         team_one_first_rating = excluded.team_one_first_rating, \
         team_one_second_rating = excluded.team_one_second_rating, \
         team_two_first_rating = excluded.team_two_first_rating, \
         team_two_second_rating = excluded.team_two_second_rating, \
         team_one_win_probability = excluded.team_one_win_probability, \
         team_one_score = excluded.team_one_score, \
         team_two_score = excluded.team_two_score, \
         computed_at = excluded.computed_at, \
         version = excluded.version"
    );

    conn.execute(
        &sql,
        params![
            prediction.game_id,
            prediction.team_one.first(),
            prediction.team_one.partner(),
            prediction.team_two.first(),
            prediction.team_two.partner(),
            prediction.team_one_win_probability,
            prediction.score.team_one,
            prediction.score.team_two,
            prediction.computed_at,
            prediction.version
        ],
    )
    .with_context(|| game_context("upsert prediction", prediction.game_id))?;

    Ok(())
}

pub fn delete_all(conn: &mut DbConn) -> Result<usize> {
    conn.execute("DELETE FROM predictions", [])
        .context("Failed to delete predictions")
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<Prediction>> {
    let sql = format!("SELECT {PREDICTION_COLUMNS} FROM predictions ORDER BY game_id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_prediction_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}
