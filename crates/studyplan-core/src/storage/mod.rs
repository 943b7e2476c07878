mod config;

pub use config::{CacheConfig, CachePolicyKind, Config, DebounceConfig, DisplayConfig};

use std::path::PathBuf;

use crate::error::Result;

/// Directory holding `config.toml`.
///
/// `$STUDYPLAN_CONFIG_DIR` when set, otherwise `~/.config/studyplan[-dev]/`
/// depending on `STUDYPLAN_ENV`. Set STUDYPLAN_ENV=dev to use the
/// development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("STUDYPLAN_CONFIG_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("STUDYPLAN_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("studyplan-dev")
            } else {
                base_dir.join("studyplan")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
