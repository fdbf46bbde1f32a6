// ─── Outcomes ───
// One explicit variant per terminal state of a lookup or a fetch.

use serde::Serialize;

use crate::core::error::{ExtractionError, SkinError};
use crate::core::http::UnexpectedResponse;

/// Flat discriminant shared by both outcome types, used in reports and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    AlreadyCached,
    NotFound,
    RateLimited,
    TransportError,
    UnknownServerError,
    MalformedProfile,
    ExtractionFailed,
    StorageFailed,
    InvalidSkinUrl,
}

/// Result of resolving an account identifier to a skin URL.
#[derive(Debug)]
pub enum LookupOutcome {
    /// `None` means the account exists but has no skin set.
    Success(Option<String>),
    NotFound,
    RateLimited,
    TransportError(reqwest::Error),
    UnknownServerError(UnexpectedResponse),
    /// The profile endpoint answered 200 with a body that could not be decoded.
    MalformedProfile(SkinError),
}

impl LookupOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            LookupOutcome::Success(_) => OutcomeKind::Success,
            LookupOutcome::NotFound => OutcomeKind::NotFound,
            LookupOutcome::RateLimited => OutcomeKind::RateLimited,
            LookupOutcome::TransportError(_) => OutcomeKind::TransportError,
            LookupOutcome::UnknownServerError(_) => OutcomeKind::UnknownServerError,
            LookupOutcome::MalformedProfile(_) => OutcomeKind::MalformedProfile,
        }
    }

    /// Skin URL of a successful lookup with a skin set.
    pub fn skin_url(&self) -> Option<&str> {
        match self {
            LookupOutcome::Success(url) => url.as_deref(),
            _ => None,
        }
    }

    /// `true` for results the caller should not treat as failures:
    /// a URL, no skin, or no such account.
    pub fn is_settled(&self) -> bool {
        matches!(self, LookupOutcome::Success(_) | LookupOutcome::NotFound)
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            LookupOutcome::TransportError(err) => Some(err.to_string()),
            LookupOutcome::UnknownServerError(resp) => Some(resp.to_string()),
            LookupOutcome::MalformedProfile(err) => Some(err.to_string()),
            _ => None,
        }
    }
}

/// Which extraction step failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStage {
    Face,
    Helm,
}

/// Result of downloading a skin and writing its face and helm images.
#[derive(Debug)]
pub enum FetchOutcome {
    AlreadyCached,
    Success,
    NotFound,
    RateLimited,
    TransportError(reqwest::Error),
    UnknownServerError(UnexpectedResponse),
    FaceExtractionFailed(ExtractionError),
    HelmExtractionFailed(ExtractionError),
    /// Creating the destination directories or moving the images into place failed.
    StorageFailed(SkinError),
    /// The resolved skin URL cannot name a cache entry (unparsable, or no path).
    InvalidSkinUrl(SkinError),
}

impl FetchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::AlreadyCached => OutcomeKind::AlreadyCached,
            FetchOutcome::Success => OutcomeKind::Success,
            FetchOutcome::NotFound => OutcomeKind::NotFound,
            FetchOutcome::RateLimited => OutcomeKind::RateLimited,
            FetchOutcome::TransportError(_) => OutcomeKind::TransportError,
            FetchOutcome::UnknownServerError(_) => OutcomeKind::UnknownServerError,
            FetchOutcome::FaceExtractionFailed(_) | FetchOutcome::HelmExtractionFailed(_) => {
                OutcomeKind::ExtractionFailed
            }
            FetchOutcome::StorageFailed(_) => OutcomeKind::StorageFailed,
            FetchOutcome::InvalidSkinUrl(_) => OutcomeKind::InvalidSkinUrl,
        }
    }

    /// Both images are on disk.
    pub fn is_ready(&self) -> bool {
        matches!(self, FetchOutcome::Success | FetchOutcome::AlreadyCached)
    }

    pub fn extraction_error(&self) -> Option<(ExtractionStage, &ExtractionError)> {
        match self {
            FetchOutcome::FaceExtractionFailed(err) => Some((ExtractionStage::Face, err)),
            FetchOutcome::HelmExtractionFailed(err) => Some((ExtractionStage::Helm, err)),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            FetchOutcome::TransportError(err) => Some(err.to_string()),
            FetchOutcome::UnknownServerError(resp) => Some(resp.to_string()),
            FetchOutcome::FaceExtractionFailed(err) | FetchOutcome::HelmExtractionFailed(err) => {
                Some(err.to_string())
            }
            FetchOutcome::StorageFailed(err) | FetchOutcome::InvalidSkinUrl(err) => {
                Some(err.to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_skin_is_a_settled_success() {
        let outcome = LookupOutcome::Success(None);
        assert_eq!(outcome.kind(), OutcomeKind::Success);
        assert!(outcome.is_settled());
        assert_eq!(outcome.skin_url(), None);
    }

    #[test]
    fn rate_limit_is_not_settled() {
        assert!(!LookupOutcome::RateLimited.is_settled());
        assert!(!FetchOutcome::RateLimited.is_ready());
    }

    #[test]
    fn unknown_server_error_always_has_a_message() {
        let outcome = FetchOutcome::UnknownServerError(UnexpectedResponse {
            url: "http://x/skin.png".into(),
            status: 502,
            body: String::new(),
        });
        assert_eq!(outcome.kind(), OutcomeKind::UnknownServerError);
        assert_eq!(
            outcome.error_message().as_deref(),
            Some("unexpected HTTP 502 from http://x/skin.png")
        );
    }

    #[test]
    fn extraction_failures_report_their_stage() {
        let outcome = FetchOutcome::HelmExtractionFailed(ExtractionError::Task("boom".into()));
        let (stage, err) = outcome.extraction_error().unwrap();
        assert_eq!(stage, ExtractionStage::Helm);
        assert_eq!(err.to_string(), "extraction task failed: boom");
        assert_eq!(outcome.kind(), OutcomeKind::ExtractionFailed);
    }
}
