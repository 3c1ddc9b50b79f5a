use anyhow::{anyhow, Context, Result};
use rusqlite::{params, OptionalExtension};

use super::connection::DbConn;
use super::models::GameRow;
use crate::domain::{FinalScore, Game, GameState, Lineup};
use crate::errors::game_context;
use crate::rating::types::{GameId, GameTypeId};

const GAME_COLUMNS: &str = "id, game_type_id, team_one_first, team_one_second, team_two_first, team_two_second, team_one_score, team_two_score, played_at, version";

pub fn insert_game(
    conn: &mut DbConn,
    game_type_id: GameTypeId,
    lineup: &Lineup,
    state: &GameState,
) -> Result<Game> {
    let (t1p1, t1p2, t2p1, t2p2) = lineup.slots();
    let (s1, s2, played_at) = state_columns(state);
    let sql = format!(
        "INSERT INTO games (game_type_id, team_one_first, team_one_second, team_two_first, team_two_second, team_one_score, team_two_score, played_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING {GAME_COLUMNS}"
    );

    let row = conn
        .query_row(
            &sql,
            params![game_type_id, t1p1, t1p2, t2p1, t2p2, s1, s2, played_at],
            parse_game_row,
        )
        .context("Failed to insert game")?;
    into_game(row)
}

/// Overwrites a game's fields and bumps its version.
///
/// Only succeeds while the stored version still equals `game.version`;
/// returns the new version, or `None` when someone else got there first.
pub fn update_game(conn: &mut DbConn, game: &Game) -> Result<Option<i64>> {
    let (t1p1, t1p2, t2p1, t2p2) = game.lineup.slots();
    let (s1, s2, played_at) = state_columns(&game.state);
    let sql = "UPDATE games SET game_type_id = ?1, team_one_first = ?2, team_one_second = ?3, team_two_first = ?4, team_two_second = ?5, team_one_score = ?6, team_two_score = ?7, played_at = ?8, version = version + 1 WHERE id = ?9 AND version = ?10 RETURNING version";

    conn.query_row(
        sql,
        params![
            game.game_type_id,
            t1p1,
            t1p2,
            t2p1,
            t2p2,
            s1,
            s2,
            played_at,
            game.id,
            game.version
        ],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| game_context("update game", game.id))
}

fn state_columns(
    state: &GameState,
) -> (Option<u32>, Option<u32>, Option<chrono::DateTime<chrono::Utc>>) {
    match *state {
        GameState::Scheduled => (None, None, None),
        GameState::Played { played_at, score } => {
            (Some(score.team_one), Some(score.team_two), Some(played_at))
        }
    }
}

fn parse_game_row(row: &rusqlite::Row) -> rusqlite::Result<GameRow> {
    Ok(GameRow {
        id: row.get(0)?,
        game_type_id: row.get(1)?,
        team_one_first: row.get(2)?,
        team_one_second: row.get(3)?,
        team_two_first: row.get(4)?,
        team_two_second: row.get(5)?,
        team_one_score: row.get(6)?,
        team_two_score: row.get(7)?,
        played_at: row.get(8)?,
        version: row.get(9)?,
    })
}

fn into_game(row: GameRow) -> Result<Game> {
    let lineup = Lineup::from_slots(
        row.team_one_first,
        row.team_one_second,
        row.team_two_first,
        row.team_two_second,
    )
    .ok_or_else(|| anyhow!("Game {} has a second player on only one team", row.id))?;

    let state = match (row.played_at, row.team_one_score, row.team_two_score) {
        (None, None, None) => GameState::Scheduled,
        (Some(played_at), Some(team_one), Some(team_two)) => GameState::Played {
            played_at,
            score: FinalScore { team_one, team_two },
        },
        _ => return Err(anyhow!("Game {} has a partial result", row.id)),
    };

    Ok(Game {
        id: row.id,
        game_type_id: row.game_type_id,
        lineup,
        state,
        version: row.version,
    })
}

pub fn find_by_id(conn: &mut DbConn, id: GameId) -> Result<Option<Game>> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = ?1");

    let row = conn
        .query_row(&sql, params![id], parse_game_row)
        .optional()
        .with_context(|| game_context("query game", id))?;
    row.map(into_game).transpose()
}

pub fn list_all(conn: &mut DbConn) -> Result<Vec<Game>> {
    let sql = format!("SELECT {GAME_COLUMNS} FROM games ORDER BY id");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], parse_game_row)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to list games")?;

    rows.into_iter().map(into_game).collect()
}

pub fn get_version(conn: &mut DbConn, id: GameId) -> Result<Option<i64>> {
    let sql = "SELECT version FROM games WHERE id = ?1";

    conn.query_row(sql, params![id], |row| row.get(0))
        .optional()
        .with_context(|| game_context("read version", id))
}
