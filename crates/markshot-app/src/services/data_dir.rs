// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware data directory resolution.

use std::path::{Path, PathBuf};

use markshot_core::AppConfig;
use markshot_core::error::Result;
use tracing::debug;

/// Name of the optional settings file inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Return the application data directory. Nothing is created here; the
/// artifact store creates its own root when it is opened.
pub fn data_dir() -> PathBuf {
    dirs_fallback(
        std::env::var_os("XDG_DATA_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
    .join("markshot")
}

/// Settings to use when no `--config` flag is given: `config.json` in the
/// data directory if present, else defaults with storage under the data
/// directory.
///
/// Only a missing file falls back to defaults. A settings file that exists
/// but cannot be read or parsed is an error.
pub fn default_config(dir: &Path) -> Result<AppConfig> {
    let path = dir.join(CONFIG_FILE);
    if !path.exists() {
        debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(AppConfig {
            storage_dir: dir.join("screenshots"),
            ..AppConfig::default()
        });
    }
    AppConfig::load(&path)
}

fn dirs_fallback(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    // Try XDG data dir, then fallback to home
    if let Some(xdg) = xdg.filter(|p| !p.as_os_str().is_empty()) {
        return xdg;
    }
    if let Some(home) = home {
        return home.join(".local").join("share");
    }
    // Last resort
    std::env::temp_dir()
}
