//! Config file location.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Config file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Resolves the config file path.
///
/// Lookup order:
/// 1. `{dir}/config.toml` when `--dir` is given.
/// 2. `$XDG_CONFIG_HOME/sickchill/config.toml` when the variable is set.
/// 3. `~/.config/sickchill/config.toml`.
///
/// # Errors
///
/// Returns an error if neither `--dir`, `XDG_CONFIG_HOME` nor `HOME` is
/// available.
pub fn resolve_config_path(dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(d) = dir {
        return Ok(d.join(CONFIG_FILE));
    }

    let xdg = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty());
    let home = std::env::var_os("HOME").filter(|v| !v.is_empty());
    config_path_from(xdg.as_deref().map(Path::new), home.as_deref().map(Path::new))
}

/// Builds the default path from the XDG and home directories.
fn config_path_from(xdg_config_home: Option<&Path>, home: Option<&Path>) -> Result<PathBuf> {
    let base = match xdg_config_home {
        Some(xdg) => xdg.to_path_buf(),
        None => home
            .context("HOME environment variable is not set")?
            .join(".config"),
    };
    Ok(base.join("sickchill").join(CONFIG_FILE))
}
