//! HTTP transport for the control-plane API

use crate::error::PlatformError;
use crate::transport::ControlPlane;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;

/// Control plane reached directly over HTTP with a bearer token
#[derive(Debug, Clone)]
pub struct HttpControlPlane {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpControlPlane {
    /// Create a client for the API at `base_url`
    ///
    /// # Errors
    /// Returns `PlatformError::Transport` if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PlatformError> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PlatformError::transport(base_url.as_str(), e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            // `cf oauth-token` prints the scheme along with the token
            Some(token) => {
                let raw = token
                    .strip_prefix("bearer ")
                    .or_else(|| token.strip_prefix("Bearer "))
                    .unwrap_or(token);
                req.bearer_auth(raw)
            }
            None => req,
        }
    }

    async fn send(&self, path: &str, req: RequestBuilder) -> Result<Response, PlatformError> {
        let response = self
            .authorize(req)
            .send()
            .await
            .map_err(|e| PlatformError::transport(path, e))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(PlatformError::Status {
                path: path.to_string(),
                status,
                body,
            })
        }
    }
}

#[async_trait]
impl ControlPlane for HttpControlPlane {
    async fn get(&self, path: &str) -> Result<Vec<u8>, PlatformError> {
        let response = self.send(path, self.client.get(self.url(path))).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::transport(path, e))?;
        Ok(body.to_vec())
    }

    async fn update(&self, path: &str, payload: &serde_json::Value) -> Result<(), PlatformError> {
        self.send(path, self.client.put(self.url(path)).json(payload))
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let plane =
            HttpControlPlane::new("https://api.example.com/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(plane.url("/v2/apps"), "https://api.example.com/v2/apps");
    }
}
