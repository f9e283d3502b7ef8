//! Pure score calculator.
//!
//! Deterministic: identical inputs always produce the same breakdown. All
//! randomness lives in the generator and the engine; nothing here reads the
//! clock or mutates state.

use crate::domain::{Modifier, ScoreBreakdown};
use crate::tables::DifficultyProfile;

/// Multiplier applied to the flat difficulty term. Keyed by difficulty level,
/// not by game level.
fn level_multiplier(difficulty: u8) -> f64 {
  match difficulty {
    2 => 1.5,
    3 => 2.0,
    _ => 1.0,
  }
}

/// Points granted per remaining second, by difficulty level.
fn speed_multiplier(difficulty: u8) -> i64 {
  match difficulty {
    2 => 4,
    3 => 6,
    _ => 2,
  }
}

/// Compute the scoring breakdown for one answered question.
///
/// `time_left_secs` must already be the ceiling of the remaining time at
/// answer time, clamped to zero. The question index does not enter the
/// formula; it is accepted so callers can pass the full question context.
pub fn calculate_score(
  difficulty: &DifficultyProfile,
  game_level: u8,
  _question_index: u32,
  total_squares: usize,
  time_left_secs: u32,
  modifier: Modifier,
) -> ScoreBreakdown {
  let base = (f64::from(difficulty.level) * 150.0 * level_multiplier(difficulty.level)
    + total_squares as f64 * 8.0
    + f64::from(difficulty.colors) * 20.0
    + f64::from(game_level) * 50.0)
    .floor() as i64;

  let speed_bonus = i64::from(time_left_secs) * speed_multiplier(difficulty.level);
  let modifier_multiplier = modifier.multiplier();
  let total = ((base + speed_bonus) as f64 * modifier_multiplier).floor() as i64;

  ScoreBreakdown {
    base,
    speed_bonus,
    modifier_multiplier,
    total,
  }
}
