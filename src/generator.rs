//! Unique distractor-set generation.
//!
//! Rejection-samples random patterns until `count` pairwise rotation-distinct
//! ones are collected. Small size/color combinations may not contain enough
//! rotation-distinct patterns at all, so the loop is capped and reports
//! [`GenerationExhausted`] instead of spinning forever.

use rand::Rng;

use crate::pattern::{rotation_equal, Pattern};

/// Upper bound on candidate draws for one set.
const MAX_ATTEMPTS: usize = 10_000;

/// A generated question set: the patterns to render, which one is correct,
/// and the rotated target the player has to match.
#[derive(Clone, Debug)]
pub struct UniqueSet {
  pub patterns: Vec<Pattern>,
  pub correct_index: usize,
  pub target: Pattern,
}

/// Not enough rotation-distinct patterns could be drawn for the requested
/// parameters within the attempt cap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationExhausted {
  pub requested: usize,
  pub size: usize,
  pub colors: u8,
  pub attempts: usize,
}

impl std::fmt::Display for GenerationExhausted {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "could not collect {} rotation-distinct {}x{} patterns with {} colors within {} attempts",
      self.requested, self.size, self.size, self.colors, self.attempts
    )
  }
}

impl std::error::Error for GenerationExhausted {}

/// Collect `count` patterns that are pairwise unequal under every rotation,
/// pick a uniformly random correct one, and rotate it 0-3 quarter turns into
/// the target.
pub fn generate_unique_set(
  count: usize,
  size: usize,
  colors: u8,
) -> Result<UniqueSet, GenerationExhausted> {
  let mut rng = rand::thread_rng();
  let mut patterns: Vec<Pattern> = Vec::with_capacity(count);

  let mut attempts = 0;
  while patterns.len() < count {
    if attempts >= MAX_ATTEMPTS {
      return Err(GenerationExhausted {
        requested: count,
        size,
        colors,
        attempts,
      });
    }
    attempts += 1;

    let candidate = Pattern::random(size, colors);
    if patterns.iter().all(|p| !rotation_equal(&candidate, p)) {
      patterns.push(candidate);
    }
  }

  let correct_index = rng.gen_range(0..patterns.len());
  let turns = rng.gen_range(0..4);
  let target = patterns[correct_index].rotated(turns);

  Ok(UniqueSet {
    patterns,
    correct_index,
    target,
  })
}
