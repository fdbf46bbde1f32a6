// ─── Texture Fetcher ───
// Downloads a skin texture and derives the cached face and helm images.

mod staging;

use std::path::Path;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tracing::{error, info, warn};

use crate::core::config::SkinConfig;
use crate::core::error::SkinResult;
use crate::core::http::{build_http_client, read_body_lossy, unexpected_response};
use crate::core::outcome::FetchOutcome;
use crate::core::skins::{ImageSkinExtractor, SkinExtractor};

pub use staging::StagedPair;

#[derive(Clone)]
pub struct TextureFetcher {
    client: Client,
    extractor: Arc<dyn SkinExtractor>,
}

impl TextureFetcher {
    /// Fetcher using the default `image` based extractor.
    pub fn new(config: &SkinConfig) -> SkinResult<Self> {
        Ok(Self::with_client(
            build_http_client(config.http_timeout())?,
            Arc::new(ImageSkinExtractor),
        ))
    }

    pub fn with_client(client: Client, extractor: Arc<dyn SkinExtractor>) -> Self {
        Self { client, extractor }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn SkinExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Download `url` and write the face and helm images.
    ///
    /// An existing file at `face_path` short-circuits to
    /// [`FetchOutcome::AlreadyCached`] without touching the network. Both
    /// images are staged and only moved into place when both extraction
    /// steps succeed.
    pub async fn fetch_and_extract(
        &self,
        url: &str,
        face_path: &Path,
        helm_path: &Path,
    ) -> FetchOutcome {
        match tokio::fs::try_exists(face_path).await {
            Ok(true) => {
                info!("Images already exist, not downloading.");
                return FetchOutcome::AlreadyCached;
            }
            Ok(false) => {}
            Err(err) => warn!("Could not check cache at {:?}, downloading: {}", face_path, err),
        }

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("Error downloading '{}': {}", url, err);
                return FetchOutcome::TransportError(err);
            }
        };

        match response.status() {
            StatusCode::OK => {
                let skin = match response.bytes().await {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!("Error downloading '{}': {}", url, err);
                        return FetchOutcome::TransportError(err);
                    }
                };
                info!("{} skin downloaded", url);
                self.extract(&skin, face_path, helm_path).await
            }
            StatusCode::NOT_FOUND => {
                warn!("texture not found (404): {}", url);
                FetchOutcome::NotFound
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("too many requests for {}", url);
                warn!("{}", read_body_lossy(response).await);
                FetchOutcome::RateLimited
            }
            _ => FetchOutcome::UnknownServerError(unexpected_response(url, response).await),
        }
    }

    async fn extract(&self, skin: &[u8], face_path: &Path, helm_path: &Path) -> FetchOutcome {
        let staged = match StagedPair::prepare(face_path, helm_path).await {
            Ok(staged) => staged,
            Err(err) => {
                error!("Could not prepare {:?}: {}", face_path, err);
                return FetchOutcome::StorageFailed(err);
            }
        };

        let face = self.extractor.extract_face(skin, &staged.face).await;
        if let Err(err) = face {
            error!("{:?} face extraction failed: {}", face_path, err);
            staged.discard().await;
            return FetchOutcome::FaceExtractionFailed(err);
        }
        info!("{:?} face extracted", face_path);

        let helm = self
            .extractor
            .extract_helm(&staged.face, skin, &staged.helm)
            .await;
        if let Err(err) = helm {
            error!("{:?} helm extraction failed: {}", helm_path, err);
            staged.discard().await;
            return FetchOutcome::HelmExtractionFailed(err);
        }
        info!("{:?} helm extracted.", helm_path);

        let committed = staged.commit().await;
        if let Err(err) = committed {
            error!("Could not store {:?}: {}", face_path, err);
            staged.discard().await;
            return FetchOutcome::StorageFailed(err);
        }
        FetchOutcome::Success
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use httpmock::prelude::*;
    use image::Rgba;

    use crate::core::error::ExtractionError;
    use crate::core::outcome::OutcomeKind;
    use crate::core::skins::tests::skin_png;

    /// Extractor that records calls and can be told to fail either step.
    #[derive(Default)]
    pub(crate) struct RecordingExtractor {
        pub face_calls: AtomicUsize,
        pub helm_calls: AtomicUsize,
        pub fail_face: bool,
        pub fail_helm: bool,
    }

    #[async_trait]
    impl SkinExtractor for RecordingExtractor {
        async fn extract_face(
            &self,
            skin: &[u8],
            face_path: &Path,
        ) -> Result<(), ExtractionError> {
            self.face_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_face {
                return Err(ExtractionError::Task("face refused".into()));
            }
            tokio::fs::write(face_path, skin)
                .await
                .map_err(|source| ExtractionError::Io {
                    path: face_path.to_path_buf(),
                    source,
                })
        }

        async fn extract_helm(
            &self,
            face_path: &Path,
            _skin: &[u8],
            helm_path: &Path,
        ) -> Result<(), ExtractionError> {
            self.helm_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_helm {
                return Err(ExtractionError::Task("helm refused".into()));
            }
            tokio::fs::copy(face_path, helm_path)
                .await
                .map(|_| ())
                .map_err(|source| ExtractionError::Io {
                    path: helm_path.to_path_buf(),
                    source,
                })
        }
    }

    fn fetcher_with(extractor: Arc<RecordingExtractor>) -> TextureFetcher {
        TextureFetcher::new(&SkinConfig::default())
            .unwrap()
            .with_extractor(extractor)
    }

    #[tokio::test]
    async fn existing_face_is_cached_without_network() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(200).body("skin");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        let helm = dir.path().join("helm.png");
        std::fs::write(&face, b"cached").unwrap();

        let fetcher = fetcher_with(Arc::new(RecordingExtractor::default()));
        let url = server.url("/texture/abc");
        for _ in 0..2 {
            let outcome = fetcher.fetch_and_extract(&url, &face, &helm).await;
            assert!(matches!(outcome, FetchOutcome::AlreadyCached));
        }

        mock.assert_hits_async(0).await;
        assert_eq!(std::fs::read(&face).unwrap(), b"cached");
    }

    #[tokio::test]
    async fn successful_fetch_writes_both_images() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(200).body(b"raw skin bytes");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("faces").join("abc.png");
        let helm = dir.path().join("helms").join("abc.png");
        let extractor = Arc::new(RecordingExtractor::default());
        let fetcher = fetcher_with(extractor.clone());
        let url = server.url("/texture/abc");

        let outcome = fetcher.fetch_and_extract(&url, &face, &helm).await;
        assert!(matches!(outcome, FetchOutcome::Success));
        assert_eq!(std::fs::read(&face).unwrap(), b"raw skin bytes");
        assert_eq!(std::fs::read(&helm).unwrap(), b"raw skin bytes");

        let again = fetcher.fetch_and_extract(&url, &face, &helm).await;
        assert!(matches!(again, FetchOutcome::AlreadyCached));
        mock.assert_hits_async(1).await;
        assert_eq!(extractor.face_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn face_failure_skips_helm() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(200).body("skin");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        let helm = dir.path().join("helm.png");
        let extractor = Arc::new(RecordingExtractor {
            fail_face: true,
            ..RecordingExtractor::default()
        });

        let outcome = fetcher_with(extractor.clone())
            .fetch_and_extract(&server.url("/texture/abc"), &face, &helm)
            .await;

        match outcome {
            FetchOutcome::FaceExtractionFailed(ExtractionError::Task(msg)) => {
                assert_eq!(msg, "face refused")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(extractor.face_calls.load(Ordering::SeqCst), 1);
        assert_eq!(extractor.helm_calls.load(Ordering::SeqCst), 0);
        assert!(!face.exists());
    }

    #[tokio::test]
    async fn helm_failure_leaves_no_face_behind() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(200).body("skin");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        let helm = dir.path().join("helm.png");
        let extractor = Arc::new(RecordingExtractor {
            fail_helm: true,
            ..RecordingExtractor::default()
        });

        let outcome = fetcher_with(extractor)
            .fetch_and_extract(&server.url("/texture/abc"), &face, &helm)
            .await;

        assert!(matches!(outcome, FetchOutcome::HelmExtractionFailed(_)));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn upstream_statuses_map_to_outcomes() {
        let server = MockServer::start_async().await;
        let cases = [
            (404, OutcomeKind::NotFound),
            (429, OutcomeKind::RateLimited),
            (500, OutcomeKind::UnknownServerError),
        ];
        let dir = tempfile::tempdir().unwrap();
        let fetcher = fetcher_with(Arc::new(RecordingExtractor::default()));

        for (status, expected) in cases {
            let path = format!("/texture/{status}");
            let mock = server
                .mock_async(|when, then| {
                    when.method(GET).path(path.as_str());
                    then.status(status).body("nope");
                })
                .await;
            let face = dir.path().join(format!("{status}-face.png"));
            let helm = dir.path().join(format!("{status}-helm.png"));

            let outcome = fetcher
                .fetch_and_extract(&server.url(&path), &face, &helm)
                .await;

            assert_eq!(outcome.kind(), expected, "status {status}");
            mock.assert_hits_async(1).await;
            assert!(!face.exists());
        }
    }

    #[tokio::test]
    async fn unknown_status_carries_response() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(418).body("teapot");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();

        let outcome = fetcher_with(Arc::new(RecordingExtractor::default()))
            .fetch_and_extract(
                &server.url("/texture/abc"),
                &dir.path().join("f.png"),
                &dir.path().join("h.png"),
            )
            .await;

        match outcome {
            FetchOutcome::UnknownServerError(resp) => {
                assert_eq!(resp.status, 418);
                assert_eq!(resp.body, "teapot");
                assert!(resp.url.ends_with("/texture/abc"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreadable_cache_location_still_downloads() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/abc");
                then.status(200).body("skin");
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the cache directory should be makes the
        // existence check itself fail.
        let blocker = dir.path().join("faces");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let face = blocker.join("abc.png");
        let helm = dir.path().join("helm.png");

        let outcome = fetcher_with(Arc::new(RecordingExtractor::default()))
            .fetch_and_extract(&server.url("/texture/abc"), &face, &helm)
            .await;

        mock.assert_hits_async(1).await;
        assert_eq!(outcome.kind(), OutcomeKind::StorageFailed);
    }

    #[tokio::test]
    async fn unreachable_texture_host_is_transport_error() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = fetcher_with(Arc::new(RecordingExtractor::default()))
            .fetch_and_extract(
                "http://127.0.0.1:1/texture/abc",
                &dir.path().join("f.png"),
                &dir.path().join("h.png"),
            )
            .await;
        assert!(matches!(outcome, FetchOutcome::TransportError(_)));
    }

    #[tokio::test]
    async fn default_extractor_produces_pngs() {
        let server = MockServer::start_async().await;
        let skin = skin_png(|_, _| Rgba([0, 0, 0, 0]));
        server
            .mock_async(|when, then| {
                when.method(GET).path("/texture/real");
                then.status(200).body(&skin);
            })
            .await;
        let dir = tempfile::tempdir().unwrap();
        let face = dir.path().join("face.png");
        let helm = dir.path().join("helm.png");

        let outcome = TextureFetcher::new(&SkinConfig::default())
            .unwrap()
            .fetch_and_extract(&server.url("/texture/real"), &face, &helm)
            .await;

        assert!(matches!(outcome, FetchOutcome::Success));
        let face_img = image::open(&face).unwrap();
        let helm_img = image::open(&helm).unwrap();
        assert_eq!(face_img.to_rgba8(), helm_img.to_rgba8());
        assert_eq!(face_img.width(), 8);
    }
}
