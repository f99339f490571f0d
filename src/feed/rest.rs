//! Asynchronous REST client for the venue's snapshot endpoint.

use crate::feed::auth::FeedCredentials;
use crate::feed::error::FeedError;
use crate::orderbook::BookSnapshot;
use crate::orderbook::reconcile::SnapshotSource;
use async_trait::async_trait;
use tracing::debug;

/// Public API endpoint of the venue.
pub const DEFAULT_API_URL: &str = "https://api.exchange.coinbase.com";

/// Thin REST client. Snapshot requests are public, but signed headers
/// are attached when credentials are configured so rate limits apply to
/// the account rather than the source IP.
pub struct RestClient {
    http: reqwest::Client,
    api_url: String,
    credentials: Option<FeedCredentials>,
}

impl RestClient {
    /// Create a client against `api_url`.
    pub fn new(api_url: impl Into<String>, credentials: Option<FeedCredentials>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            credentials,
        }
    }

    /// Client against the venue's public endpoint.
    pub fn public() -> Self {
        Self::new(DEFAULT_API_URL, None)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, FeedError> {
        debug!(path, "GET");
        let mut request = self.http.get(format!("{}{}", self.api_url, path));
        if let Some(credentials) = &self.credentials {
            for (name, value) in credentials.rest_headers("GET", path, "")? {
                request = request.header(name, value);
            }
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SnapshotSource for RestClient {
    async fn level3_snapshot(&self, product_id: &str) -> Result<BookSnapshot, FeedError> {
        self.get_json(&format!("/products/{product_id}/book?level=3"))
            .await
    }
}
