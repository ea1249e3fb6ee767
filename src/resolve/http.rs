//! Resolver that queries the build-override metadata endpoint over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;

use super::{BuildOverride, OverrideResolver, ResolveError};
use crate::config::ResolverConfig;

/// GETs `<endpoint>?s=<signature>` and decodes the JSON metadata document.
///
/// 400 and 404 mean the signature is not a real override. Any other failure,
/// including timeouts, is an error.
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpResolver {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ResolveError::Client)?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ResolverConfig) -> Result<Self, ResolveError> {
        Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
    }
}

#[async_trait]
impl OverrideResolver for HttpResolver {
    async fn resolve(&self, signature: &str) -> Result<Option<BuildOverride>, ResolveError> {
        let transport = |source| ResolveError::Transport {
            signature: signature.to_string(),
            source,
        };

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("s", signature)])
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            debug!("signature {signature} does not resolve (HTTP {})", status.as_u16());
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ResolveError::Status {
                signature: signature.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        let build_override =
            serde_json::from_slice(&body).map_err(|source| ResolveError::Decode {
                signature: signature.to_string(),
                source,
            })?;
        Ok(Some(build_override))
    }
}
