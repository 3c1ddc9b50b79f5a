#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use pickleball_rating::clock::FixedClock;
use pickleball_rating::config::RatingSettings;
use pickleball_rating::database::{self, players, setup, GameStore, SqliteStore};
use pickleball_rating::domain::{FinalScore, Game, GameDraft, GameState, Lineup};
use pickleball_rating::rating::types::{GameTypeId, PlayerId};
use pickleball_rating::services::{PredictionService, RecomputeService, RecordingService};

pub struct Fixture {
    pub store: SqliteStore,
    pub players: Vec<PlayerId>,
    pub game_type: GameTypeId,
}

/// Fresh in-memory database with `player_count` players and one game type.
pub fn fixture(player_count: usize) -> Fixture {
    let pool = database::create_memory_pool().unwrap();
    let mut conn = database::get_connection(&pool).unwrap();
    setup::reset_database(&mut conn).unwrap();

    let players = (1..=player_count)
        .map(|n| players::insert_player(&mut conn, &format!("Player {n}")).unwrap().id)
        .collect();
    let game_type = database::game_types::insert_game_type(&mut conn, "Open")
        .unwrap()
        .id;

    Fixture {
        store: SqliteStore::new(conn),
        players,
        game_type,
    }
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

/// A moment in May 2025.
pub fn may(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, day, hour, 0, 0).unwrap()
}

pub fn predictions() -> PredictionService<FixedClock> {
    PredictionService::new(RatingSettings::default(), FixedClock(now()))
}

pub fn recorder() -> RecordingService<FixedClock> {
    RecordingService::new(predictions())
}

pub fn recompute() -> RecomputeService<FixedClock> {
    RecomputeService::new(predictions())
}

pub fn played(team_one: u32, team_two: u32, played_at: DateTime<Utc>) -> GameState {
    GameState::Played {
        played_at,
        score: FinalScore { team_one, team_two },
    }
}

/// Stores a game without running the prediction pipeline.
pub fn insert_game(fixture: &mut Fixture, lineup: Lineup, state: GameState) -> Game {
    fixture
        .store
        .insert_game(fixture.game_type, &lineup, &state)
        .unwrap()
}

pub fn singles_draft(fixture: &Fixture, team_one: PlayerId, team_two: PlayerId) -> GameDraft {
    GameDraft {
        game_type_id: Some(fixture.game_type),
        team_one_first: Some(team_one),
        team_two_first: Some(team_two),
        ..GameDraft::default()
    }
}

pub fn with_result(draft: GameDraft, team_one: i64, team_two: i64, played_at: DateTime<Utc>) -> GameDraft {
    GameDraft {
        team_one_score: Some(team_one),
        team_two_score: Some(team_two),
        played_at: Some(played_at),
        ..draft
    }
}
