//! Static difficulty, level, and palette tables.
//!
//! Single source of truth for the engine and the score calculator. The
//! difficulty profile is fixed for a whole session; the level definitions
//! describe the three 6-question blocks every game walks through. Nothing in
//! here mutates.

use crate::domain::{Modifier, TaskMode};

/// Session-wide difficulty profile: grid size range, color count, base time.
#[derive(Debug)]
pub struct DifficultyProfile {
  pub level: u8,
  pub name: &'static str,
  /// Allowed grid sizes; one is sampled uniformly per question.
  pub sizes: &'static [usize],
  pub colors: u8,
  /// Base time budget in seconds, before per-question decay.
  pub base_time: u32,
}

/// One block of 6 questions sharing a task mode.
#[derive(Debug)]
pub struct LevelDefinition {
  pub level: u8,
  pub name: &'static str,
  pub description: &'static str,
  pub task: TaskMode,
  pub questions: u32,
  /// Total squares rendered per question, the correct one included.
  pub progression: [usize; 6],
  pub modifiers: [Modifier; 6],
}

pub static DIFFICULTY_PROFILES: [DifficultyProfile; 3] = [
  DifficultyProfile {
    level: 1,
    name: "Easy",
    sizes: &[3, 4],
    colors: 2,
    base_time: 30,
  },
  DifficultyProfile {
    level: 2,
    name: "Medium",
    sizes: &[4, 5],
    colors: 3,
    base_time: 30,
  },
  DifficultyProfile {
    level: 3,
    name: "Hard",
    sizes: &[5, 6],
    colors: 4,
    base_time: 30,
  },
];

pub static LEVEL_DEFINITIONS: [LevelDefinition; 3] = [
  LevelDefinition {
    level: 1,
    name: "Level 1",
    description: "Click the square that matches the sample.",
    task: TaskMode::Click,
    questions: 6,
    progression: [8, 10, 8, 10, 8, 10],
    modifiers: [
      Modifier::None,
      Modifier::None,
      Modifier::Blink,
      Modifier::Blink,
      Modifier::Rotate,
      Modifier::Rotate,
    ],
  },
  LevelDefinition {
    level: 2,
    name: "Level 2",
    description: "Drag the square into the container under the sample and rotate it with the left/right arrow keys (90 degrees per turn) to match the sample's orientation.",
    task: TaskMode::Drag,
    questions: 6,
    progression: [8, 10, 8, 10, 8, 10],
    modifiers: [
      Modifier::None,
      Modifier::None,
      Modifier::Blink,
      Modifier::Blink,
      Modifier::Rotate,
      Modifier::Rotate,
    ],
  },
  LevelDefinition {
    level: 3,
    name: "Level 3",
    description: "Double-click wrong squares to remove them until only the matching one is left.",
    task: TaskMode::Delete,
    questions: 6,
    progression: [8, 10, 8, 10, 8, 10],
    modifiers: [
      Modifier::None,
      Modifier::None,
      Modifier::Blink,
      Modifier::Blink,
      Modifier::Rotate,
      Modifier::Rotate,
    ],
  },
];

static PALETTE_2: [&str; 2] = ["#af11e9ff", "#fa9cedff"];
static PALETTE_3: [&str; 3] = ["#af11e9ff", "#fa9cedff", "#837ffdff"];
static PALETTE_4: [&str; 4] = ["#af11e9ff", "#fa9cedff", "#837ffdff", "#abcaf8ff"];

/// Fixed palette for the given color count. Unsupported counts fall back to
/// the 2-color palette.
pub fn palette(colors: u8) -> &'static [&'static str] {
  match colors {
    3 => &PALETTE_3,
    4 => &PALETTE_4,
    _ => &PALETTE_2,
  }
}

pub fn difficulty_profile(level: u8) -> Option<&'static DifficultyProfile> {
  DIFFICULTY_PROFILES.iter().find(|d| d.level == level)
}

pub fn level_definition(level: u8) -> Option<&'static LevelDefinition> {
  LEVEL_DEFINITIONS.iter().find(|l| l.level == level)
}
