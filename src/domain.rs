//! Domain models shared by the engine and the wire protocol: modifiers, task
//! modes, score breakdowns, and the per-question instance.

use serde::{Deserialize, Serialize};

use crate::pattern::Pattern;

/// Per-question visual perturbation. The client animates it; the engine only
/// cares about its score multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
  #[default]
  None,
  Blink,
  Rotate,
}

impl Modifier {
  /// Multiplier applied to `base + speed_bonus` when scoring a question.
  pub fn multiplier(self) -> f64 {
    match self {
      Modifier::None => 1.0,
      Modifier::Blink => 1.5,
      Modifier::Rotate => 1.8,
    }
  }
}

/// Interaction style the client must use to answer a question.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskMode {
  Click,
  Drag,
  Delete,
}

/// Output of the score calculator for one answered question.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
  pub base: i64,
  #[serde(rename = "speedBonus")]
  pub speed_bonus: i64,
  #[serde(rename = "modifierMultiplier")]
  pub modifier_multiplier: f64,
  pub total: i64,
}

/// One round of the game: the rendered pattern set, the target, and everything
/// the client needs to draw and answer it. Created fresh per question and
/// discarded once the question is resolved.
#[derive(Clone, Debug)]
pub struct QuestionInstance {
  /// Pairwise rotation-distinct patterns, the correct one among them.
  pub patterns: Vec<Pattern>,
  pub correct_index: usize,
  /// A rotated copy (0-3 quarter turns) of the pattern at `correct_index`.
  pub target: Pattern,
  pub size: usize,
  pub colors: u8,
  pub modifier: Modifier,
  pub task: TaskMode,
  /// Total rendered pattern count, the correct one included.
  pub total_squares: usize,
  /// Time budget for this question, in seconds.
  pub time_budget: u32,
}
