use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde::Serialize;
use tracing::error;

const APP_USER_AGENT: &str = "mcskin/0.1.0";

/// Client used for profile and texture requests. Follows redirects.
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    base_builder(timeout).build()
}

/// Client for the username skin endpoint, which answers with a 301 whose
/// `Location` header is the result itself.
pub fn build_no_redirect_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    base_builder(timeout).redirect(Policy::none()).build()
}

fn base_builder(timeout: Duration) -> reqwest::ClientBuilder {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(timeout)
}

/// Marker carried by every "unknown server error" outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnexpectedResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl std::fmt::Display for UnexpectedResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unexpected HTTP {} from {}", self.status, self.url)
    }
}

/// Consume a response with an unrecognised status, logging everything
/// needed to diagnose it later.
pub async fn unexpected_response(subject: &str, response: Response) -> UnexpectedResponse {
    let url = response.url().to_string();
    let status = response.status();
    let headers = response.headers().clone();
    let body = read_body_lossy(response).await;

    error!("{} Unknown error:", subject);
    error!("HTTP {} from {} headers={:?}", status, url, headers);
    error!("{}", body);

    UnexpectedResponse {
        url,
        status: status.as_u16(),
        body,
    }
}

/// Body text for diagnostics. A body that cannot be read is logged as empty.
pub async fn read_body_lossy(response: Response) -> String {
    response.text().await.unwrap_or_default()
}
