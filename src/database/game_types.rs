use anyhow::{Context, Result};
use rusqlite::params;

use super::connection::DbConn;
use super::models::GameType;
use crate::rating::types::GameTypeId;

pub fn insert_game_type(conn: &mut DbConn, name: &str) -> Result<GameType> {
    let sql = "INSERT INTO game_types (name) VALUES (?1) RETURNING id, name";

    conn.query_row(sql, params![name], |row| {
        Ok(GameType {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })
    .with_context(|| format!("Failed to insert game type {}", name))
}

pub fn exists(conn: &mut DbConn, id: GameTypeId) -> Result<bool> {
    let sql = "SELECT EXISTS(SELECT 1 FROM game_types WHERE id = ?1)";

    conn.query_row(sql, params![id], |row| row.get(0))
        .context("Failed to check game type existence")
}
