use super::client::HttpClient;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use std::time::Duration;

pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn with_timeouts(timeout: Duration, connect_timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self(client))
    }

    /// Starts a request on the underlying client. Build it with
    /// [`RequestBuilder::build`] and hand the result to [`HttpClient::execute`]
    /// (possibly through an auth wrapper).
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.0.request(method, url)
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
