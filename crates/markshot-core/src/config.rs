// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding original and display rasters plus the record catalog.
    pub storage_dir: PathBuf,
    /// Preferred scalable font for annotation labels. When unset, well-known
    /// system locations are searched before falling back to the built-in font.
    pub label_font_path: Option<PathBuf>,
    /// Pixel height of label text when a scalable font is available.
    pub label_font_size: f32,
    /// Title used for exports when none is supplied.
    pub default_title: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("screenshots"),
            label_font_path: None,
            label_font_size: 14.0,
            default_title: None,
        }
    }
}

impl AppConfig {
    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(path = %path.display(), "Loaded configuration");
        debug!(?config, "Effective configuration");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "storage_dir": "/var/shots" }"#).unwrap();
        assert_eq!(config.storage_dir, PathBuf::from("/var/shots"));
        assert_eq!(config.label_font_size, 14.0);
        assert!(config.label_font_path.is_none());
    }
}
