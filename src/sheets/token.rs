//! OAuth access tokens for a service account (JWT bearer grant).

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Method, Url};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::ServiceAccountKey;
use crate::error::AppError;
use crate::fetch::{BasicClient, send_json};

pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// A cached token is replaced once fewer seconds than this remain.
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    ASSERTION_LIFETIME_SECS
}

struct AccessToken {
    value: String,
    expires_at: i64,
}

impl AccessToken {
    fn is_fresh(&self, now: i64) -> bool {
        self.expires_at - REFRESH_MARGIN_SECS > now
    }
}

/// Hands out access tokens, exchanging a signed assertion only when the
/// cached token is missing or about to expire.
pub struct TokenSource {
    key: ServiceAccountKey,
    signing_key: EncodingKey,
    cached: Mutex<Option<AccessToken>>,
}

impl TokenSource {
    /// Fails with [`AppError::Configuration`] if the private key is not an
    /// RSA PEM key.
    pub fn new(key: ServiceAccountKey) -> Result<Self, AppError> {
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            AppError::Configuration(format!(
                "service account private_key is not an RSA PEM key: {e}"
            ))
        })?;

        Ok(Self {
            key,
            signing_key,
            cached: Mutex::new(None),
        })
    }

    /// Returns a bearer token valid for at least another minute.
    pub async fn access_token(&self, http: &BasicClient) -> Result<String> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now().timestamp();

        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh(now)) {
            return Ok(token.value.clone());
        }

        let token = self.exchange(http, now).await?;
        let value = token.value.clone();
        *cached = Some(token);
        Ok(value)
    }

    fn assertion(&self, now: i64) -> Result<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SPREADSHEETS_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.signing_key)
            .context("Failed to sign token assertion")
    }

    #[tracing::instrument(skip(self, http, now), fields(client_email = %self.key.client_email))]
    async fn exchange(&self, http: &BasicClient, now: i64) -> Result<AccessToken> {
        let assertion = self.assertion(now)?;
        let url = Url::parse(&self.key.token_uri).context("token_uri is not a valid URL")?;

        let req = http
            .request(Method::POST, url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .build()?;

        let resp: TokenResponse = send_json(http, req)
            .await
            .context("Token exchange failed")?;

        debug!(expires_in = resp.expires_in, "Access token obtained");

        Ok(AccessToken {
            value: resp.access_token,
            expires_at: now + resp.expires_in,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_rejects_non_rsa_key() {
        let key = ServiceAccountKey {
            client_email: "grades@example.iam.gserviceaccount.com".into(),
            private_key: "not a pem".into(),
            token_uri: crate::config::DEFAULT_TOKEN_URI.into(),
        };

        let err = TokenSource::new(key).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_token_freshness_margin() {
        let token = AccessToken {
            value: "t".into(),
            expires_at: 1_000,
        };

        assert!(token.is_fresh(900));
        assert!(!token.is_fresh(940));
        assert!(!token.is_fresh(1_000));
    }

    #[test]
    fn test_token_response_defaults_expiry() {
        let resp: TokenResponse = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(resp.access_token, "abc");
        assert_eq!(resp.expires_in, ASSERTION_LIFETIME_SECS);
    }
}
