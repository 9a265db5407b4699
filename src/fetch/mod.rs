mod auth;
mod basic;
mod client;

pub use auth::BearerAuth;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, anyhow};
use serde::de::DeserializeOwned;

/// Sends `req` and decodes a successful JSON response body.
///
/// Non-2xx responses become an error carrying the status and body text.
pub async fn send_json<C: HttpClient, T: DeserializeOwned>(
    client: &C,
    req: reqwest::Request,
) -> Result<T> {
    let path = req.url().path().to_string();

    let resp = client
        .execute(req)
        .await
        .with_context(|| format!("Failed to send request to {path}"))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("API returned status {}: {}", status, body));
    }

    resp.json::<T>()
        .await
        .with_context(|| format!("Failed to parse response from {path}"))
}
