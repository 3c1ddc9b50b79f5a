use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};

use super::connection::DbConn;
use super::models::RatingHistoryEntry;
use crate::domain::RatingSample;
use crate::errors::{game_context, player_context};
use crate::rating::types::{GameId, PlayerId, Rating};

/// Inserts the sample, or overwrites the one already recorded for the same
/// player and game. An overwrite keeps the original insertion sequence.
pub fn upsert_sample(conn: &mut DbConn, sample: &RatingSample) -> Result<()> {
    let sql = "INSERT INTO rating_samples (player_id, game_id, rating, rated_at) VALUES (?1, ?2, ?3, ?4) \
               ON CONFLICT(player_id, game_id) DO UPDATE SET rating = excluded.rating, rated_at = excluded.rated_at";

    conn.execute(
        sql,
        params![sample.player_id, sample.game_id, sample.rating, sample.rated_at],
    )
    .with_context(|| player_context("upsert rating sample", sample.player_id))?;

    Ok(())
}

/// Latest rating recorded strictly before `before`.
///
/// Samples sharing a timestamp are ordered by insertion sequence, the most
/// recently inserted winning.
pub fn latest_before(
    conn: &mut DbConn,
    player_id: PlayerId,
    before: DateTime<Utc>,
) -> Result<Option<Rating>> {
    let sql = "SELECT rating FROM rating_samples WHERE player_id = ?1 AND rated_at < ?2 ORDER BY rated_at DESC, id DESC LIMIT 1";

    conn.query_row(sql, params![player_id, before], |row| row.get(0))
        .optional()
        .with_context(|| player_context("get latest rating", player_id))
}

fn parse_history_row(row: &rusqlite::Row) -> rusqlite::Result<RatingHistoryEntry> {
    Ok(RatingHistoryEntry {
        sequence: row.get(0)?,
        player_id: row.get(1)?,
        game_id: row.get(2)?,
        rating: row.get(3)?,
        rated_at: row.get(4)?,
    })
}

pub fn list_by_player(conn: &mut DbConn, player_id: PlayerId) -> Result<Vec<RatingHistoryEntry>> {
    let sql = "SELECT id, player_id, game_id, rating, rated_at FROM rating_samples WHERE player_id = ?1 ORDER BY rated_at, id";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params![player_id], parse_history_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<RatingHistoryEntry>> {
    let sql = "SELECT id, player_id, game_id, rating, rated_at FROM rating_samples ORDER BY id";

    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map([], parse_history_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows)
}

/// Removes the game's samples for players not in `keep`.
pub fn delete_stale(conn: &mut DbConn, game_id: GameId, keep: &[PlayerId]) -> Result<usize> {
    let placeholders = (0..keep.len())
        .map(|idx| format!("?{}", idx + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = if keep.is_empty() {
        "DELETE FROM rating_samples WHERE game_id = ?1".to_string()
    } else {
        format!("DELETE FROM rating_samples WHERE game_id = ?1 AND player_id NOT IN ({placeholders})")
    };

    let values = std::iter::once(game_id).chain(keep.iter().copied());
    conn.execute(&sql, params_from_iter(values))
        .with_context(|| game_context("delete stale rating samples", game_id))
}

pub fn delete_all(conn: &mut DbConn) -> Result<usize> {
    conn.execute("DELETE FROM rating_samples", [])
        .context("Failed to delete rating samples")
}
