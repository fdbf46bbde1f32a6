use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the skin backend.
/// Everything outside the outcome enums returns `Result<T, SkinError>`.
#[derive(Debug, Error)]
pub enum SkinError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // ── Profile payloads ────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    // ── Config ──────────────────────────────────────────
    #[error("Config error at {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type SkinResult<T> = Result<T, SkinError>;

impl From<std::io::Error> for SkinError {
    fn from(source: std::io::Error) -> Self {
        SkinError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// Failure raised by a [`SkinExtractor`](crate::core::skins::SkinExtractor).
///
/// Passed through the fetcher untouched, so callers see exactly what the
/// image step reported.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("could not decode skin image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("skin is {width}x{height}, expected at least 64x32")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("could not encode image for {path:?}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("extraction task failed: {0}")]
    Task(String),
}

// ── Serialization for JSON reports ──────────────────────
// Reports printed by the CLI embed errors as their display string.
impl serde::Serialize for SkinError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl serde::Serialize for ExtractionError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
