//! Venue request signing and the authenticated subscribe frame.
//!
//! Signatures follow the venue's scheme: the secret key is base64,
//! the message is `timestamp || method || path || body`, and the
//! HMAC-SHA256 digest is base64-encoded back out.

use crate::feed::error::FeedError;
use crate::utils::epoch_seconds;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Path signed for websocket subscriptions, per the venue docs.
const WS_AUTH_PATH: &str = "/users/self";

/// API credentials for the venue's signed endpoints.
#[derive(Debug, Clone)]
pub struct FeedCredentials {
    /// API key identifier.
    pub api_key: String,
    /// Base64-encoded secret key.
    pub secret_key: String,
    /// Account passphrase.
    pub passphrase: String,
}

impl FeedCredentials {
    /// Bundle up a credential set.
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Sign one request. Returns the base64 signature.
    pub fn sign(
        &self,
        timestamp: &str,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<String, FeedError> {
        let key = BASE64.decode(&self.secret_key).map_err(|e| FeedError::Auth {
            message: format!("secret key is not valid base64: {e}"),
        })?;
        let mut mac = HmacSha256::new_from_slice(&key).map_err(|e| FeedError::Auth {
            message: e.to_string(),
        })?;
        mac.update(format!("{timestamp}{method}{path}{body}").as_bytes());
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Signed headers for a REST request.
    pub fn rest_headers(
        &self,
        method: &str,
        path: &str,
        body: &str,
    ) -> Result<Vec<(&'static str, String)>, FeedError> {
        let timestamp = epoch_seconds().to_string();
        let signature = self.sign(&timestamp, method, path, body)?;
        Ok(vec![
            ("CB-ACCESS-SIGN", signature),
            ("CB-ACCESS-TIMESTAMP", timestamp),
            ("CB-ACCESS-KEY", self.api_key.clone()),
            ("CB-ACCESS-PASSPHRASE", self.passphrase.clone()),
        ])
    }

    /// The signed subscribe frame for the full feed.
    pub fn subscribe_frame(&self, product_ids: &[String]) -> Result<String, FeedError> {
        let timestamp = epoch_seconds().to_string();
        let signature = self.sign(&timestamp, "GET", WS_AUTH_PATH, "")?;
        let frame = json!({
            "type": "subscribe",
            "product_ids": product_ids,
            "signature": signature,
            "timestamp": timestamp,
            "key": self.api_key,
            "passphrase": self.passphrase,
        });
        Ok(frame.to_string())
    }
}

/// The unsigned subscribe frame, for venues/feeds that accept it.
pub fn public_subscribe_frame(product_ids: &[String]) -> String {
    json!({
        "type": "subscribe",
        "product_ids": product_ids,
    })
    .to_string()
}
