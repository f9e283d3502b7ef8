//! N-by-N color-grid patterns and their rotation algebra.
//!
//! Cells hold palette indices rather than resolved colors; the protocol layer
//! maps indices to hex strings when a board goes out. Equality under rotation
//! (0-3 quarter turns, identity included) is what "the same pattern" means
//! everywhere in the game.

use rand::Rng;

use crate::tables;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
  cells: Vec<Vec<u8>>,
}

impl Pattern {
  #[allow(dead_code)]
  pub fn from_cells(cells: Vec<Vec<u8>>) -> Self {
    Self { cells }
  }

  /// Fill a size-by-size grid, each cell drawn independently and uniformly
  /// from the palette for `colors` (unsupported counts fall back to the
  /// 2-color palette, same as the palette table).
  pub fn random(size: usize, colors: u8) -> Self {
    let palette_len = tables::palette(colors).len() as u8;
    let mut rng = rand::thread_rng();
    let cells = (0..size)
      .map(|_| (0..size).map(|_| rng.gen_range(0..palette_len)).collect())
      .collect();
    Self { cells }
  }

  pub fn size(&self) -> usize {
    self.cells.len()
  }

  pub fn rows(&self) -> &[Vec<u8>] {
    &self.cells
  }

  /// Standard 90-degree clockwise rotation: `out[j][n-1-i] = in[i][j]`.
  pub fn rotate_clockwise(&self) -> Self {
    let n = self.cells.len();
    let mut out = vec![vec![0u8; n]; n];
    for (i, row) in self.cells.iter().enumerate() {
      for (j, &cell) in row.iter().enumerate() {
        out[j][n - 1 - i] = cell;
      }
    }
    Self { cells: out }
  }

  /// Rotate by `turns` quarter turns clockwise.
  pub fn rotated(&self, turns: usize) -> Self {
    let mut out = self.clone();
    for _ in 0..turns % 4 {
      out = out.rotate_clockwise();
    }
    out
  }
}

/// Whether `b` equals `a` under any of the 4 rotations (identity included).
/// This equivalence backs distractor uniqueness and rotate-aware answer
/// verification.
pub fn rotation_equal(a: &Pattern, b: &Pattern) -> bool {
  if a.size() != b.size() {
    return false;
  }
  let mut rotated = a.clone();
  for _ in 0..4 {
    if &rotated == b {
      return true;
    }
    rotated = rotated.rotate_clockwise();
  }
  false
}
