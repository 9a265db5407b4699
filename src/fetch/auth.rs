use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, HeaderValue};

/// An [`HttpClient`] wrapper that sends `Authorization: Bearer <token>` with
/// every request.
///
/// The header value is validated once at construction and marked sensitive
/// so it never shows up in debug output.
pub struct BearerAuth<C> {
    inner: C,
    value: HeaderValue,
}

impl<C> BearerAuth<C> {
    pub fn new(inner: C, token: &str) -> Result<Self> {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .context("access token is not a valid header value")?;
        value.set_sensitive(true);
        Ok(Self { inner, value })
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for BearerAuth<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut().insert(AUTHORIZATION, self.value.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_value_is_prefixed_and_sensitive() {
        let auth = BearerAuth::new((), "ya29.token").unwrap();

        assert_eq!(auth.value.to_str().unwrap(), "Bearer ya29.token");
        assert!(auth.value.is_sensitive());
    }

    #[test]
    fn test_rejects_token_with_newline() {
        assert!(BearerAuth::new((), "bad\ntoken").is_err());
    }
}
