//! Persistent top-10 score board.
//!
//! The board lives in memory behind `AppState` and is mirrored to a JSON file
//! after every mutation. A missing or unreadable file just means an empty
//! board; persistence failures are logged and never surface to the player.

use std::path::Path;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Entries kept on the board.
pub const BOARD_SIZE: usize = 10;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreEntry {
  pub id: String,
  pub name: String,
  pub score: i64,
  #[serde(rename = "difficultyLevel")]
  pub difficulty_level: u8,
  #[serde(rename = "gameLevel")]
  pub game_level: u8,
  pub date: String,
}

#[derive(Clone, Debug, Default)]
pub struct HighScores {
  entries: Vec<ScoreEntry>,
}

impl HighScores {
  pub fn entries(&self) -> &[ScoreEntry] {
    &self.entries
  }

  /// Insert a finished game. Returns the 1-based rank if the score made the
  /// board, None if it fell off the bottom.
  pub fn add(&mut self, name: &str, score: i64, difficulty_level: u8, game_level: u8) -> Option<usize> {
    let entry = ScoreEntry {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      score,
      difficulty_level,
      game_level,
      date: Local::now().format("%x").to_string(),
    };
    let id = entry.id.clone();

    self.entries.push(entry);
    // Stable sort keeps earlier entries ahead on ties.
    self.entries.sort_by(|a, b| b.score.cmp(&a.score));
    self.entries.truncate(BOARD_SIZE);

    self.entries.iter().position(|e| e.id == id).map(|p| p + 1)
  }

  pub fn clear(&mut self) {
    self.entries.clear();
  }

  /// Load the board from disk. Any IO or parse problem yields an empty board.
  pub fn load(path: &Path) -> Self {
    match std::fs::read_to_string(path) {
      Ok(s) => match serde_json::from_str::<Vec<ScoreEntry>>(&s) {
        Ok(mut entries) => {
          entries.sort_by(|a, b| b.score.cmp(&a.score));
          entries.truncate(BOARD_SIZE);
          info!(target: "square_detective", path = %path.display(), count = entries.len(), "Loaded high scores");
          Self { entries }
        }
        Err(e) => {
          warn!(target: "square_detective", path = %path.display(), error = %e, "Corrupt high score file; starting empty");
          Self::default()
        }
      },
      Err(_) => Self::default(),
    }
  }

  /// Mirror the board to disk. Failures are logged only.
  pub fn save(&self, path: &Path) {
    match serde_json::to_string_pretty(&self.entries) {
      Ok(json) => {
        if let Err(e) = std::fs::write(path, json) {
          error!(target: "square_detective", path = %path.display(), error = %e, "Failed to write high scores");
        }
      }
      Err(e) => {
        error!(target: "square_detective", error = %e, "Failed to serialize high scores");
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn add_returns_the_one_based_rank() {
    let mut board = HighScores::default();
    assert_eq!(board.add("a", 100, 1, 3), Some(1));
    assert_eq!(board.add("b", 300, 2, 3), Some(1));
    assert_eq!(board.add("c", 200, 1, 2), Some(2));
    let scores: Vec<i64> = board.entries().iter().map(|e| e.score).collect();
    assert_eq!(scores, vec![300, 200, 100]);
  }

  #[test]
  fn board_keeps_only_the_top_ten() {
    let mut board = HighScores::default();
    for i in 0..12 {
      board.add("p", i * 10, 1, 3);
    }
    assert_eq!(board.entries().len(), BOARD_SIZE);
    // Scores 110 down to 20 survive; 0 and 10 fall off.
    assert_eq!(board.entries()[0].score, 110);
    assert_eq!(board.entries()[BOARD_SIZE - 1].score, 20);
    assert_eq!(board.add("low", 5, 1, 1), None);
  }

  #[test]
  fn ties_keep_the_earlier_entry_ahead() {
    let mut board = HighScores::default();
    board.add("first", 100, 1, 3);
    assert_eq!(board.add("second", 100, 1, 3), Some(2));
    assert_eq!(board.entries()[0].name, "first");
  }

  #[test]
  fn clear_empties_the_board() {
    let mut board = HighScores::default();
    board.add("a", 50, 1, 1);
    board.clear();
    assert!(board.entries().is_empty());
  }

  #[test]
  fn load_round_trips_through_save() {
    let dir = std::env::temp_dir().join(format!("sqdet-scores-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("scores.json");

    let mut board = HighScores::default();
    board.add("alice", 420, 2, 3);
    board.add("bob", 180, 1, 2);
    board.save(&path);

    let loaded = HighScores::load(&path);
    assert_eq!(loaded.entries().len(), 2);
    assert_eq!(loaded.entries()[0].name, "alice");
    assert_eq!(loaded.entries()[0].score, 420);
    assert_eq!(loaded.entries()[0].difficulty_level, 2);

    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn missing_or_corrupt_files_load_as_empty() {
    let missing = Path::new("/nonexistent/scores.json");
    assert!(HighScores::load(missing).entries().is_empty());

    let dir = std::env::temp_dir().join(format!("sqdet-corrupt-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("scores.json");
    std::fs::write(&path, "not json at all").expect("write");
    assert!(HighScores::load(&path).entries().is_empty());

    std::fs::remove_dir_all(&dir).ok();
  }
}
