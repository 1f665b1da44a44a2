//! Session configuration loading.

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tickbars_lib::prelude::*;

/// Returns the default config file location.
///
/// Uses the `directories` crate to find the platform config directory,
/// e.g. `~/.config/tickbars/config.json` on Linux.
pub(crate) fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tickbars").map(|dirs| dirs.config_dir().join("config.json"))
}

/// Reads a session config from a JSON file.
pub(crate) fn read_config(path: &Path) -> Result<SessionConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))
}

/// Resolves the session config for a run.
///
/// An explicit file must exist. Otherwise the default file is used when
/// present. `size` overrides the file's bar size and is required when no
/// file is found.
pub(crate) fn load_config(
    explicit: Option<&Path>,
    default: Option<&Path>,
    size: Option<u32>,
) -> Result<SessionConfig> {
    let file = match (explicit, default) {
        (Some(path), _) => Some(path),
        (None, Some(path)) if path.is_file() => Some(path),
        _ => None,
    };

    let mut config = match (file, size) {
        (Some(path), _) => {
            tracing::debug!(path = %path.display(), "loading session config");
            read_config(path)?
        }
        (None, Some(size)) => SessionConfig::new(size),
        (None, None) => bail!("No bar size given; pass --size or a config file"),
    };

    if let Some(size) = size {
        config.size_in_ticks = size;
    }
    Ok(config)
}
