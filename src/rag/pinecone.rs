// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Pinecone vector index client
//!
//! Talks to the Pinecone REST API directly: the control plane resolves the
//! index host once at connect time, then every query goes to the index's
//! data-plane host.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

use super::errors::IndexError;
use super::index::{IndexMatch, VectorIndex};
use crate::config::KnowledgeBaseConfig;

pub const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";
pub const API_VERSION: &str = "2024-07";
const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Handle to one Pinecone index
pub struct PineconeIndex {
    client: Client,
    api_key: String,
    index_name: String,
    host: String,
    namespace: Option<String>,
}

impl std::fmt::Debug for PineconeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeIndex")
            .field("index_name", &self.index_name)
            .field("host", &self.host)
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl PineconeIndex {
    /// Connects to the index named in `config`
    ///
    /// Uses `index_host` when configured, otherwise asks the control plane
    /// for it.
    pub async fn connect(config: &KnowledgeBaseConfig) -> Result<Self, IndexError> {
        Self::connect_with_control_plane(config, CONTROL_PLANE_URL).await
    }

    /// Same as [`connect`](Self::connect) against a custom control plane URL
    pub async fn connect_with_control_plane(
        config: &KnowledgeBaseConfig,
        control_plane_url: &str,
    ) -> Result<Self, IndexError> {
        let api_key = config.api_key().ok_or_else(|| IndexError::NoApiKey {
            provider: "pinecone".to_string(),
        })?;
        let client = build_client()?;

        let host = match &config.index_host {
            Some(host) => host.clone(),
            None => {
                let description =
                    describe_index(&client, control_plane_url, api_key, &config.index_name)
                        .await?;
                if let Some(region) = description.region() {
                    if region != config.environment {
                        warn!(
                            "Index {} lives in {}, but PINECONE_ENV is {}",
                            config.index_name, region, config.environment
                        );
                    }
                }
                description.host
            }
        };

        let index = Self {
            client,
            api_key: api_key.to_string(),
            index_name: config.index_name.clone(),
            host: normalize_host(&host),
            namespace: config.namespace.clone(),
        };
        info!("Connected to Pinecone Index: {} ({})", index.index_name, index.host);
        Ok(index)
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl VectorIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>, IndexError> {
        if vector.is_empty() {
            return Err(IndexError::InvalidVector("empty query vector".to_string()));
        }

        let body = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let response = check_status(response, &self.index_name).await?;
        let data: QueryResponse = response
            .json()
            .await
            .map_err(|e| IndexError::InvalidResponse(format!("JSON parse error: {}", e)))?;

        Ok(data.matches)
    }

    fn name(&self) -> &str {
        &self.index_name
    }
}

fn build_client() -> Result<Client, IndexError> {
    Client::builder()
        .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
        .build()
        .map_err(|e| IndexError::Connection(e.to_string()))
}

async fn describe_index(
    client: &Client,
    control_plane_url: &str,
    api_key: &str,
    index_name: &str,
) -> Result<IndexDescription, IndexError> {
    let url = format!(
        "{}/indexes/{}",
        control_plane_url.trim_end_matches('/'),
        index_name
    );
    let response = client
        .get(url)
        .header("Api-Key", api_key)
        .header("X-Pinecone-API-Version", API_VERSION)
        .send()
        .await
        .map_err(transport_error)?;

    let response = check_status(response, index_name).await?;
    response
        .json()
        .await
        .map_err(|e| IndexError::InvalidResponse(format!("JSON parse error: {}", e)))
}

fn transport_error(e: reqwest::Error) -> IndexError {
    if e.is_timeout() {
        IndexError::Timeout {
            timeout_ms: REQUEST_TIMEOUT_MS,
        }
    } else {
        IndexError::Connection(e.to_string())
    }
}

async fn check_status(response: Response, index_name: &str) -> Result<Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IndexError::Unauthorized(message),
        StatusCode::NOT_FOUND => IndexError::IndexNotFound(index_name.to_string()),
        StatusCode::TOO_MANY_REQUESTS => IndexError::RateLimited,
        _ => IndexError::ApiError {
            status: status.as_u16(),
            message,
        },
    })
}

/// The control plane reports bare hostnames; tests and proxies may pass full URLs
fn normalize_host(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<IndexMatch>,
}

#[derive(Debug, Deserialize)]
struct IndexDescription {
    host: String,
    #[serde(default)]
    spec: Option<IndexSpec>,
}

impl IndexDescription {
    fn region(&self) -> Option<&str> {
        let spec = self.spec.as_ref()?;
        spec.serverless
            .as_ref()
            .map(|s| s.region.as_str())
            .or_else(|| spec.pod.as_ref().map(|p| p.environment.as_str()))
    }
}

#[derive(Debug, Deserialize)]
struct IndexSpec {
    serverless: Option<ServerlessSpec>,
    pod: Option<PodSpec>,
}

#[derive(Debug, Deserialize)]
struct ServerlessSpec {
    region: String,
}

#[derive(Debug, Deserialize)]
struct PodSpec {
    environment: String,
}
