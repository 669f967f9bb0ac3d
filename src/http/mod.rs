//! # HTTP Client
//!
//! [`ApiClient`] talks JSON to the demo REST API and implements both
//! [`CatalogApi`](crate::catalog::CatalogApi) and [`AuthApi`](crate::auth::AuthApi).
//!
//! ## Bearer token
//!
//! The token is read from the store on every request, not cached, so a login or logout
//! through [`AuthSession`](crate::auth::AuthSession) takes effect on the very next call.

mod auth;
mod catalog;

use crate::config::StorefrontConfig;
use crate::storage::{KeyValueStore, TOKEN_KEY};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared HTTP client for the catalog and auth endpoints.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    store: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn from_config(
        config: &StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self, reqwest::Error> {
        Self::new(&config.api_base_url, config.request_timeout, store)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Request");
        self.authorize(self.http.request(method, url))
    }

    /// Like [`request`](Self::request), but percent-encodes each segment so ids and slugs
    /// taken from user input cannot change the path or query.
    fn request_at(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) => url,
            // Left to reqwest, which reports the bad base URL when the request is sent.
            Err(_) => return self.request(method, &format!("/{}", segments.join("/"))),
        };
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        debug!(%method, %url, "Request");
        self.authorize(self.http.request(method, url))
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn token(&self) -> Option<String> {
        match self.store.get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Could not read stored token");
                None
            }
        }
    }

    /// Sends the request and decodes a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiFailure> {
        let response = check_status(builder.send().await?).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiFailure::Decode(e.to_string()))
    }

    /// Sends the request and ignores the body.
    async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiFailure> {
        check_status(builder.send().await?).await?;
        Ok(())
    }
}

/// Transport-level outcome shared by the catalog and auth implementations; each maps it
/// onto its own error type.
#[derive(Debug)]
pub(crate) enum ApiFailure {
    Transport(reqwest::Error),
    Status { status: u16, message: String },
    Decode(String),
}

impl From<reqwest::Error> for ApiFailure {
    fn from(e: reqwest::Error) -> Self {
        ApiFailure::Transport(e)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

async fn check_status(response: Response) -> Result<Response, ApiFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message)
        .unwrap_or_else(|_| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });
    warn!(status = status.as_u16(), %message, "API returned an error");
    Err(ApiFailure::Status {
        status: status.as_u16(),
        message,
    })
}
