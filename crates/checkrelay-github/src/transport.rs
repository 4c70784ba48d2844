use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Bounded wait on every outbound call; there is no retry policy, every
/// remote failure is terminal for the invocation.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-over-HTTP seam against the API base URL. Paths are relative
/// (`repos/{owner}/{repo}/check-runs`); callers supply their own headers,
/// including `Authorization`.
pub trait Transport {
    fn get_json(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<(u16, Value), TransportError>;

    fn post_json(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<(u16, Value), TransportError>;
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Blocking reqwest-backed [`Transport`].
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    api_base: String,
}

impl HttpTransport {
    pub fn new(api_base: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("checkrelay/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    fn dispatch(&self, req: reqwest::blocking::RequestBuilder) -> Result<(u16, Value), TransportError> {
        let resp = req.send()?;
        let status = resp.status().as_u16();
        let body: Value = serde_json::from_str(&resp.text()?)?;
        Ok((status, body))
    }
}

impl Transport for HttpTransport {
    fn get_json(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<(u16, Value), TransportError> {
        let url = self.url(path);
        debug!(%url, "GET GitHub API");

        let mut req = self.http.get(&url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.dispatch(req)
    }

    fn post_json(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<(u16, Value), TransportError> {
        let url = self.url(path);
        debug!(%url, "POST GitHub API");

        let mut req = self.http.post(&url).json(body);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        self.dispatch(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let t = HttpTransport::new("https://ghe.example.com/api/v3/").expect("client");
        assert_eq!(
            t.url("repos/o/r/check-runs"),
            "https://ghe.example.com/api/v3/repos/o/r/check-runs"
        );
    }
}
