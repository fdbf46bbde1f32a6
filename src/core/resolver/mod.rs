// ─── Identifier Resolver ───
// Maps a username or UUID to a skin texture URL via one of two Mojang APIs.

use reqwest::header::LOCATION;
use reqwest::{Client, StatusCode};
use tracing::{error, info, warn};

use crate::core::config::SkinConfig;
use crate::core::error::SkinResult;
use crate::core::http::{
    build_http_client, build_no_redirect_client, read_body_lossy, unexpected_response,
};
use crate::core::outcome::LookupOutcome;
use crate::core::profile::GameProfile;

/// Identifiers up to this many characters are usernames; longer ones are UUIDs.
pub const USERNAME_MAX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountIdentifier<'a> {
    Username(&'a str),
    Uuid(&'a str),
}

impl<'a> AccountIdentifier<'a> {
    /// Length is the only discriminant; no format checks are made.
    pub fn classify(raw: &'a str) -> Self {
        if raw.chars().count() <= USERNAME_MAX_LEN {
            AccountIdentifier::Username(raw)
        } else {
            AccountIdentifier::Uuid(raw)
        }
    }

    pub fn as_str(&self) -> &'a str {
        match *self {
            AccountIdentifier::Username(s) | AccountIdentifier::Uuid(s) => s,
        }
    }
}

/// Resolves identifiers against the username skin endpoint or the session
/// server. Each call is a single attempt with no retries.
#[derive(Clone)]
pub struct SkinResolver {
    /// Profile lookups.
    client: Client,
    /// Username lookups; the 301 is the answer.
    no_redirect: Client,
    skins_base_url: String,
    session_base_url: String,
}

impl SkinResolver {
    pub fn new(config: &SkinConfig) -> SkinResult<Self> {
        let timeout = config.http_timeout();
        Ok(Self::with_clients(
            build_http_client(timeout)?,
            build_no_redirect_client(timeout)?,
            config,
        ))
    }

    /// Build from existing clients. `no_redirect` must not follow redirects.
    pub fn with_clients(client: Client, no_redirect: Client, config: &SkinConfig) -> Self {
        Self {
            client,
            no_redirect,
            skins_base_url: config.skins_base_url.clone(),
            session_base_url: config.session_base_url.clone(),
        }
    }

    pub fn username_url(&self, name: &str) -> String {
        format!("{}{}.png", self.skins_base_url, name)
    }

    pub fn profile_url(&self, uuid: &str) -> String {
        format!("{}{}", self.session_base_url, uuid)
    }

    pub async fn resolve(&self, identifier: &str) -> LookupOutcome {
        match AccountIdentifier::classify(identifier) {
            AccountIdentifier::Username(name) => self.resolve_username(name).await,
            AccountIdentifier::Uuid(uuid) => self.resolve_uuid(uuid).await,
        }
    }

    /// The skins endpoint redirects to the texture; the URL is read from
    /// the `Location` header.
    async fn resolve_username(&self, name: &str) -> LookupOutcome {
        let response = match self.no_redirect.get(self.username_url(name)).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("{} skin url request failed: {}", name, err);
                return LookupOutcome::TransportError(err);
            }
        };

        match response.status() {
            StatusCode::MOVED_PERMANENTLY => {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string);
                match location {
                    Some(url) => {
                        info!("{} skin url received", name);
                        LookupOutcome::Success(Some(url))
                    }
                    None => {
                        LookupOutcome::UnknownServerError(unexpected_response(name, response).await)
                    }
                }
            }
            StatusCode::NOT_FOUND => {
                info!("{} has no skin", name);
                LookupOutcome::NotFound
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("{} Too many requests", name);
                warn!("{}", read_body_lossy(response).await);
                LookupOutcome::RateLimited
            }
            _ => LookupOutcome::UnknownServerError(unexpected_response(name, response).await),
        }
    }

    /// The session server returns the full profile; the skin URL is buried
    /// in its base64 `textures` property.
    async fn resolve_uuid(&self, uuid: &str) -> LookupOutcome {
        let response = match self.client.get(self.profile_url(uuid)).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("{} profile request failed: {}", uuid, err);
                return LookupOutcome::TransportError(err);
            }
        };

        match response.status() {
            StatusCode::OK => {
                let body = match response.text().await {
                    Ok(body) => body,
                    Err(err) => {
                        error!("{} profile body could not be read: {}", uuid, err);
                        return LookupOutcome::TransportError(err);
                    }
                };
                info!("{} profile downloaded", uuid);
                match GameProfile::from_json(&body).and_then(|profile| profile.skin_url()) {
                    Ok(url) => LookupOutcome::Success(url),
                    Err(err) => {
                        error!("{} profile could not be decoded: {}", uuid, err);
                        LookupOutcome::MalformedProfile(err)
                    }
                }
            }
            // 204 No Content is what the API sends for an unknown UUID.
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => {
                info!("{} uuid does not exist", uuid);
                LookupOutcome::NotFound
            }
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("{} Too many requests", uuid);
                warn!("{}", read_body_lossy(response).await);
                LookupOutcome::RateLimited
            }
            _ => LookupOutcome::UnknownServerError(unexpected_response(uuid, response).await),
        }
    }
}
