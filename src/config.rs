//! Loading server configuration from TOML.
//!
//! See `ServerConfig` for the expected schema. Everything has a default, so a
//! config file is entirely optional.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
  /// Where the high score board is persisted.
  #[serde(default = "default_scores_path")]
  pub scores_path: String,
  /// Countdown broadcast interval in milliseconds.
  #[serde(default = "default_tick_ms")]
  pub tick_ms: u64,
}

fn default_scores_path() -> String {
  "./scores.json".into()
}

fn default_tick_ms() -> u64 {
  200
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      scores_path: default_scores_path(),
      tick_ms: default_tick_ms(),
    }
  }
}

/// Attempt to load `ServerConfig` from GAME_CONFIG_PATH. On any parsing/IO
/// error, returns None and the caller falls back to defaults.
pub fn load_server_config_from_env() -> Option<ServerConfig> {
  let path = std::env::var("GAME_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<ServerConfig>(&s) {
      Ok(cfg) => {
        info!(target: "square_detective", %path, "Loaded server config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "square_detective", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "square_detective", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
