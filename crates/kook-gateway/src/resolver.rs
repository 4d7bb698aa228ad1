//! Gateway endpoint lookup.

use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Boxed future returned by [`EndpointResolver::resolve`].
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = Result<String, GatewayError>> + Send + 'a>>;

/// Looks up the WebSocket URL to connect to.
pub trait EndpointResolver: Send + Sync {
    /// Resolve the gateway URL, requesting a compressed stream if `compress`.
    fn resolve(&self, compress: bool) -> ResolveFuture<'_>;
}

/// Response envelope of the REST API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    message: String,
    #[serde(default)]
    data: Value,
}

/// Resolves the endpoint through `GET {api_base}/gateway/index`.
#[derive(Debug, Clone)]
pub struct HttpEndpointResolver {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl HttpEndpointResolver {
    /// Create a resolver for `api_base` authenticating with a bot `token`.
    #[must_use]
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Create a resolver from gateway configuration.
    #[must_use]
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(config.api_base.clone(), config.token.clone())
    }

    fn index_url(&self) -> String {
        format!("{}/gateway/index", self.api_base.trim_end_matches('/'))
    }

    async fn fetch(&self, compress: bool) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(self.index_url())
            .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.token))
            .query(&[("compress", if compress { "1" } else { "0" })])
            .send()
            .await
            .map_err(|e| GatewayError::Resolve(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Resolve(format!("HTTP {status}")));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Resolve(format!("invalid response: {e}")))?;

        if body.code != 0 {
            return Err(GatewayError::Resolve(format!(
                "api error {}: {}",
                body.code, body.message
            )));
        }

        body.data
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Resolve("response has no data.url".to_string()))
    }
}

impl EndpointResolver for HttpEndpointResolver {
    fn resolve(&self, compress: bool) -> ResolveFuture<'_> {
        Box::pin(self.fetch(compress))
    }
}

/// Always resolves to the same URL.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    url: String,
}

impl StaticResolver {
    /// Create a resolver returning `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl EndpointResolver for StaticResolver {
    fn resolve(&self, _compress: bool) -> ResolveFuture<'_> {
        let url = self.url.clone();
        Box::pin(async move { Ok(url) })
    }
}
