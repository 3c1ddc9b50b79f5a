use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

const WINNING_SCORES: [u32; 5] = [11, 12, 13, 14, 15];
const CAPPED_WIN: u32 = 15;
const CAPPED_LOSS: u32 = 14;
const MIN_MARGIN: u32 = 2;

/// Final score of a game as predicted from team one's win probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictedScore {
    pub team_one: u32,
    pub team_two: u32,
}

impl PredictedScore {
    fn assign(team_one_wins: bool, win: u32, loss: u32) -> Self {
        if team_one_wins {
            Self { team_one: win, team_two: loss }
        } else {
            Self { team_one: loss, team_two: win }
        }
    }

    pub fn winner(&self) -> u32 {
        self.team_one.max(self.team_two)
    }

    pub fn loser(&self) -> u32 {
        self.team_one.min(self.team_two)
    }
}

/// Predicts the score line of a race-to-11, win-by-2, capped-at-15 game.
///
/// The loser's score is the one that makes `win / (win + loss)` closest to the
/// favourite's probability, for the smallest legal winning score.
pub fn predict_score(team_one_probability: f64) -> Result<PredictedScore, EngineError> {
    if !(0.0..=1.0).contains(&team_one_probability) {
        return Err(EngineError::ProbabilityOutOfRange(team_one_probability));
    }

    let team_one_wins = team_one_probability >= 0.5;
    let favourite = if team_one_wins {
        team_one_probability
    } else {
        1.0 - team_one_probability
    };

    let (win, loss) = search_score_line(favourite);
    Ok(PredictedScore::assign(team_one_wins, win, loss))
}

fn search_score_line(favourite: f64) -> (u32, u32) {
    let ratio = 1.0 / favourite - 1.0;

    for &win in &WINNING_SCORES {
        let exact = f64::from(win) * ratio;
        let loss = exact.round();
        if (exact - loss).abs() < 0.5 && f64::from(win) - loss >= f64::from(MIN_MARGIN) {
            return (win, loss as u32);
        }
    }

    // Too close to call at any shorter race: it went to the cap.
    let loss = (f64::from(CAPPED_WIN) * ratio).round().min(f64::from(CAPPED_LOSS));
    (CAPPED_WIN, loss as u32)
}
