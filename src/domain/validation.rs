use anyhow::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{Game, GameDraft};
use crate::clock::Clock;
use crate::database::store::GameStore;
use crate::rating::types::{GameTypeId, PlayerId};

/// Highest score a side can be recorded with.
pub const MAX_SCORE: i64 = 99;

/// A rule a proposed game breaks. Expected and user-facing, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("Team one player one is required")]
    MissingTeamOnePlayer,
    #[error("Team two player one is required")]
    MissingTeamTwoPlayer,
    #[error("Both teams need a second player for doubles, or neither for singles")]
    MixedLineup,
    #[error("Player id cannot be 0")]
    ZeroPlayerId,
    #[error("Team one cannot have the same player twice")]
    DuplicateInTeamOne,
    #[error("Team two cannot have the same player twice")]
    DuplicateInTeamTwo,
    #[error("Player {0} cannot be on both teams")]
    PlayerOnBothTeams(PlayerId),
    #[error("Scores cannot be negative")]
    NegativeScore,
    #[error("Score {0} is above the maximum of {}", MAX_SCORE)]
    ScoreOutOfRange(i64),
    #[error("Scores cannot be tied")]
    TiedScore,
    #[error("Both scores must be provided, or neither")]
    PartialScore,
    #[error("Scores require a played date")]
    ScoresWithoutDate,
    #[error("A played date requires both scores")]
    DateWithoutScores,
    #[error("Played date {0} is in the future")]
    PlayedInFuture(DateTime<Utc>),
    #[error("A valid game type must be present")]
    MissingGameType,
    #[error("Player {0} does not exist")]
    UnknownPlayer(PlayerId),
    #[error("Game type {0} does not exist")]
    UnknownGameType(GameTypeId),
    #[error("A played game cannot be turned back into a scheduled one")]
    PlayedGameUnscheduled,
}

/// Structural and business-rule checks on a proposed game.
///
/// Every rule is checked and every failure reported; only a missing first
/// player skips the checks that compare players across teams.
pub fn validate<C: Clock>(draft: &GameDraft, clock: &C) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_lineup(draft, &mut violations);
    check_scores(draft, &mut violations);
    check_played_date(draft, clock.now(), &mut violations);

    if draft.game_type_id.is_none_or(|id| id <= 0) {
        violations.push(Violation::MissingGameType);
    }

    violations
}

fn check_lineup(draft: &GameDraft, violations: &mut Vec<Violation>) {
    if draft.team_one_first.is_none() {
        violations.push(Violation::MissingTeamOnePlayer);
    }
    if draft.team_two_first.is_none() {
        violations.push(Violation::MissingTeamTwoPlayer);
    }
    let (Some(t1p1), Some(t2p1)) = (draft.team_one_first, draft.team_two_first) else {
        return;
    };

    if draft.team_one_second.is_some() != draft.team_two_second.is_some() {
        violations.push(Violation::MixedLineup);
    }
    if draft.player_ids().contains(&0) {
        violations.push(Violation::ZeroPlayerId);
    }

    if draft.team_one_second == Some(t1p1) {
        violations.push(Violation::DuplicateInTeamOne);
    }
    if draft.team_two_second == Some(t2p1) {
        violations.push(Violation::DuplicateInTeamTwo);
    }

    let team_two = [Some(t2p1), draft.team_two_second];
    let mut seen = Vec::new();
    for player in [Some(t1p1), draft.team_one_second].into_iter().flatten() {
        if team_two.contains(&Some(player)) && !seen.contains(&player) {
            seen.push(player);
            violations.push(Violation::PlayerOnBothTeams(player));
        }
    }
}

fn check_scores(draft: &GameDraft, violations: &mut Vec<Violation>) {
    match (draft.team_one_score, draft.team_two_score) {
        (Some(team_one), Some(team_two)) => {
            if team_one < 0 || team_two < 0 {
                violations.push(Violation::NegativeScore);
            }
            for score in [team_one, team_two] {
                if score > MAX_SCORE {
                    violations.push(Violation::ScoreOutOfRange(score));
                }
            }
            if team_one == team_two {
                violations.push(Violation::TiedScore);
            }
        }
        (None, None) => {}
        _ => violations.push(Violation::PartialScore),
    }
}

fn check_played_date(draft: &GameDraft, now: DateTime<Utc>, violations: &mut Vec<Violation>) {
    let has_any_score = draft.team_one_score.is_some() || draft.team_two_score.is_some();
    let has_both_scores = draft.team_one_score.is_some() && draft.team_two_score.is_some();

    match draft.played_at {
        Some(played_at) => {
            if !has_both_scores {
                violations.push(Violation::DateWithoutScores);
            }
            if played_at > now {
                violations.push(Violation::PlayedInFuture(played_at));
            }
        }
        None if has_any_score => violations.push(Violation::ScoresWithoutDate),
        None => {}
    }
}

/// Resolves every referenced player and the game type against the store.
///
/// Kept apart from [`validate`] so a structurally broken draft never costs a
/// lookup.
pub fn validate_references<S: GameStore>(draft: &GameDraft, store: &mut S) -> Result<Vec<Violation>> {
    let mut violations = validate_players(draft, store)?;

    if let Some(game_type_id) = draft.game_type_id {
        if !store.game_type_exists(game_type_id)? {
            violations.push(Violation::UnknownGameType(game_type_id));
        }
    }

    Ok(violations)
}

pub fn validate_players<S: GameStore>(draft: &GameDraft, store: &mut S) -> Result<Vec<Violation>> {
    let mut violations = Vec::new();

    for player_id in draft.player_ids() {
        if player_id == 0 {
            violations.push(Violation::ZeroPlayerId);
        } else if !store.player_exists(player_id)? {
            violations.push(Violation::UnknownPlayer(player_id));
        }
    }

    Ok(violations)
}

/// Rules on replacing `existing` with `draft`.
pub fn validate_transition(existing: &Game, draft: &GameDraft) -> Vec<Violation> {
    if existing.is_played() && draft.played_at.is_none() {
        vec![Violation::PlayedGameUnscheduled]
    } else {
        Vec::new()
    }
}
