use std::path::PathBuf;
use std::sync::Arc;

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::core::config::SkinConfig;
use crate::core::error::{SkinError, SkinResult};
use crate::core::fetcher::TextureFetcher;
use crate::core::http::{build_http_client, build_no_redirect_client};
use crate::core::outcome::{FetchOutcome, LookupOutcome};
use crate::core::resolver::SkinResolver;
use crate::core::skins::{ImageSkinExtractor, SkinExtractor};

/// Everything `avatar` learned about one identifier.
#[derive(Debug)]
pub struct AvatarReport {
    pub identifier: String,
    pub lookup: LookupOutcome,
    /// `None` when the lookup produced no skin URL.
    pub fetch: Option<FetchOutcome>,
    pub face_path: Option<PathBuf>,
    pub helm_path: Option<PathBuf>,
}

impl AvatarReport {
    /// The lookup settled and, if there was a skin, both images are on disk.
    pub fn is_ok(&self) -> bool {
        self.lookup.is_settled() && self.fetch.as_ref().map_or(true, FetchOutcome::is_ready)
    }
}

/// Wires config, HTTP clients, resolver and fetcher together.
pub struct AppState {
    pub config: SkinConfig,
    pub resolver: SkinResolver,
    pub fetcher: TextureFetcher,
}

impl AppState {
    pub fn new(config: SkinConfig) -> SkinResult<Self> {
        Self::with_extractor(config, Arc::new(ImageSkinExtractor))
    }

    pub fn with_extractor(
        config: SkinConfig,
        extractor: Arc<dyn SkinExtractor>,
    ) -> SkinResult<Self> {
        let timeout = config.http_timeout();
        let http_client = build_http_client(timeout)?;
        let no_redirect = build_no_redirect_client(timeout)?;

        let resolver = SkinResolver::with_clients(http_client.clone(), no_redirect, &config);
        let fetcher = TextureFetcher::with_client(http_client, extractor);

        debug!(
            "Skin cache at {:?}, timeout {}ms",
            config.cache_dir, config.http_timeout_ms
        );

        Ok(Self {
            config,
            resolver,
            fetcher,
        })
    }

    pub fn face_path(&self, texture_key: &str) -> PathBuf {
        self.config.faces_dir().join(format!("{texture_key}.png"))
    }

    pub fn helm_path(&self, texture_key: &str) -> PathBuf {
        self.config.helms_dir().join(format!("{texture_key}.png"))
    }

    /// Resolve `identifier` and, when it has a skin, make sure its face and
    /// helm images are cached.
    pub async fn avatar(&self, identifier: &str) -> AvatarReport {
        let lookup = self.resolver.resolve(identifier).await;

        let Some(url) = lookup.skin_url().map(str::to_string) else {
            info!("{} lookup finished: {:?}", identifier, lookup.kind());
            return AvatarReport {
                identifier: identifier.to_string(),
                lookup,
                fetch: None,
                face_path: None,
                helm_path: None,
            };
        };

        let key = match texture_key(&url) {
            Ok(key) => key,
            Err(err) => {
                warn!("{} skin url {} is unusable: {}", identifier, url, err);
                return AvatarReport {
                    identifier: identifier.to_string(),
                    lookup,
                    fetch: Some(FetchOutcome::InvalidSkinUrl(err)),
                    face_path: None,
                    helm_path: None,
                }
            }
        };
        let face_path = self.face_path(&key);
        let helm_path = self.helm_path(&key);

        let fetch = self
            .fetcher
            .fetch_and_extract(&url, &face_path, &helm_path)
            .await;
        info!("{} avatar finished: {:?}", identifier, fetch.kind());

        AvatarReport {
            identifier: identifier.to_string(),
            lookup,
            fetch: Some(fetch),
            face_path: Some(face_path),
            helm_path: Some(helm_path),
        }
    }

    /// Run [`AppState::avatar`] for many identifiers, at most
    /// `config.concurrency` at a time. Reports come back in input order.
    pub async fn avatar_batch(&self, identifiers: Vec<String>) -> Vec<AvatarReport> {
        info!(
            "Starting avatar batch: {} identifiers, concurrency={}",
            identifiers.len(),
            self.config.concurrency
        );

        stream::iter(identifiers)
            .map(|identifier| async move { self.avatar(&identifier).await })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}

/// Cache key for a texture URL: its last path segment, which on Mojang's
/// texture server is the content hash.
pub fn texture_key(url: &str) -> SkinResult<String> {
    let parsed = url::Url::parse(url)?;
    let segment = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default();

    let key: String = segment
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    let key = key.trim_end_matches(".png").trim_matches('.').to_string();

    if key.is_empty() {
        return Err(SkinError::Other(format!("no texture key in {url}")));
    }
    Ok(key)
}
