use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::rating::types::{GameId, GameTypeId, PlayerId, Rating};

#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone)]
pub struct GameType {
    pub id: GameTypeId,
    pub name: String,
}

/// One row of a player's rating history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RatingHistoryEntry {
    pub sequence: i64,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub rating: Rating,
    pub rated_at: DateTime<Utc>,
}

/// Raw `games` row; slot and score consistency is checked when it becomes a
/// [`Game`](crate::domain::Game).
#[derive(Debug, Clone)]
pub struct GameRow {
    pub id: GameId,
    pub game_type_id: GameTypeId,
    pub team_one_first: PlayerId,
    pub team_one_second: Option<PlayerId>,
    pub team_two_first: PlayerId,
    pub team_two_second: Option<PlayerId>,
    pub team_one_score: Option<u32>,
    pub team_two_score: Option<u32>,
    pub played_at: Option<DateTime<Utc>>,
    pub version: i64,
}
