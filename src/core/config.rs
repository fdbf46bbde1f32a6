// ─── Configuration ───
// JSON settings file with defaults for every field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{SkinError, SkinResult};

const APP_DIR_NAME: &str = "mcskin";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_SKINS_BASE_URL: &str = "https://skins.minecraft.net/MinecraftSkins/";
pub const DEFAULT_SESSION_BASE_URL: &str =
    "https://sessionserver.mojang.com/session/minecraft/profile/";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SkinConfig {
    /// Per-request timeout in milliseconds.
    pub http_timeout_ms: u64,
    pub skins_base_url: String,
    pub session_base_url: String,
    /// Root of the face/helm image cache.
    pub cache_dir: PathBuf,
    /// How many identifiers a batch resolves at once.
    pub concurrency: usize,
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            http_timeout_ms: 1000,
            skins_base_url: DEFAULT_SKINS_BASE_URL.into(),
            session_base_url: DEFAULT_SESSION_BASE_URL.into(),
            cache_dir: default_cache_dir(),
            concurrency: 8,
        }
    }
}

impl SkinConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    pub fn faces_dir(&self) -> PathBuf {
        self.cache_dir.join("faces")
    }

    pub fn helms_dir(&self) -> PathBuf {
        self.cache_dir.join("helms")
    }

    /// Load settings from `path`. A missing file yields the defaults; a file
    /// that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> SkinResult<Self> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(SkinError::Config {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&raw).map_err(|e| SkinError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> SkinResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| SkinError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|source| SkinError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(CONFIG_FILE)
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
