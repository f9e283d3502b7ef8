//! Shared application state: server config and the persistent score board.
//!
//! Game sessions are NOT stored here. Each WebSocket connection owns its own
//! engine; the shared state only carries what outlives a connection (the
//! score board and its file path).

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::config::{load_server_config_from_env, ServerConfig};
use crate::highscores::{HighScores, ScoreEntry};

#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    highscores: Arc<RwLock<HighScores>>,
    scores_path: PathBuf,
}

impl AppState {
    /// Build state from env: load config (or defaults) and the score file.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let config = load_server_config_from_env().unwrap_or_default();
        let scores_path = PathBuf::from(&config.scores_path);
        let highscores = HighScores::load(&scores_path);
        info!(
            target: "square_detective",
            scores_path = %scores_path.display(),
            tick_ms = config.tick_ms,
            entries = highscores.entries().len(),
            "Application state ready"
        );
        Self {
            config,
            highscores: Arc::new(RwLock::new(highscores)),
            scores_path,
        }
    }

    /// Record a finished game and persist the board. Returns the 1-based rank
    /// if the score made the top 10.
    #[instrument(level = "info", skip(self), fields(%name, score))]
    pub async fn record_score(
        &self,
        name: &str,
        score: i64,
        difficulty_level: u8,
        game_level: u8,
    ) -> Option<usize> {
        let mut board = self.highscores.write().await;
        let rank = board.add(name, score, difficulty_level, game_level);
        board.save(&self.scores_path);
        info!(target: "square_detective", %name, score, ?rank, "Score recorded");
        rank
    }

    /// Snapshot of the current board, best first.
    pub async fn scores(&self) -> Vec<ScoreEntry> {
        self.highscores.read().await.entries().to_vec()
    }

    /// Wipe the board and persist the empty state.
    #[instrument(level = "info", skip(self))]
    pub async fn clear_scores(&self) {
        let mut board = self.highscores.write().await;
        board.clear();
        board.save(&self.scores_path);
        info!(target: "square_detective", "Score board cleared");
    }
}
