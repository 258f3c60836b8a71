// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Auth token acquisition for the remote peer.
//!
//! The peer's API issues a token at `POST <api_endpoint>auth`. A previously
//! issued token is presented again as `X-Authorization: Bearer <token>` so the
//! peer can keep the same client identity. The latest response is cached in a
//! JSON file between runs.

use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{DistributionError, DistributionResult};

const API_KEY_HEADER: &str = "X-Api-Key";
const AUTHORIZATION_HEADER: &str = "X-Authorization";
const AUTH_TOKEN_PARAM: &str = "auth_token";

/// Token presented when opening the channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl Credentials {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            client_id: None,
        }
    }

    /// `endpoint` with the token appended as the percent-encoded `auth_token`
    /// query parameter. An endpoint that is not a valid URL is returned as is.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let Some(token) = &self.token else {
            return endpoint.to_string();
        };
        match Url::parse(endpoint) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair(AUTH_TOKEN_PARAM, token);
                url.into()
            }
            Err(e) => {
                warn!("Not adding auth token to invalid endpoint '{}': {}", endpoint, e);
                endpoint.to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CredentialProvider {
    static_token: Option<String>,
    api_endpoint: Option<String>,
    api_key: Option<String>,
    credentials_file: Option<PathBuf>,
    http: reqwest::Client,
}

impl CredentialProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Always use `token`; no HTTP call is made.
    pub fn with_static_token(mut self, token: impl Into<String>) -> Self {
        self.static_token = Some(token.into());
        self
    }

    pub fn with_api(mut self, api_endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        self.api_endpoint = Some(api_endpoint.into());
        self.api_key = api_key;
        self
    }

    pub fn with_credentials_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.credentials_file = Some(path.into());
        self
    }

    pub fn credentials_file(&self) -> Option<&Path> {
        self.credentials_file.as_deref()
    }

    /// Credentials from the last successful exchange, if any were saved.
    pub async fn cached(&self) -> Option<Credentials> {
        let path = self.credentials_file.as_ref()?;
        let content = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str::<Credentials>(&content) {
            Ok(credentials) => Some(credentials),
            Err(e) => {
                warn!("Ignoring unreadable credentials file '{}': {}", path.display(), e);
                None
            }
        }
    }

    /// Resolve the credentials for the next connection.
    ///
    /// Order: static token, then a fresh token from the API, then the cached
    /// token, then anonymous. An unreachable or failing API is logged and
    /// never stops the caller from connecting.
    pub async fn obtain(&self) -> Credentials {
        if let Some(token) = &self.static_token {
            debug!("Using statically configured auth token");
            return Credentials::token(token.clone());
        }

        let cached = self.cached().await;

        let Some(api_endpoint) = &self.api_endpoint else {
            return cached.unwrap_or_else(Credentials::anonymous);
        };

        let previous_token = cached.as_ref().and_then(|c| c.token.as_deref());
        match self.request_token(api_endpoint, previous_token).await {
            Ok(credentials) => {
                self.save(&credentials).await;
                credentials
            }
            Err(e) => {
                warn!(
                    "Token exchange failed, using {} credentials: {}",
                    if cached.is_some() { "cached" } else { "anonymous" },
                    e
                );
                cached.unwrap_or_else(Credentials::anonymous)
            }
        }
    }

    async fn request_token(
        &self,
        api_endpoint: &str,
        previous_token: Option<&str>,
    ) -> DistributionResult<Credentials> {
        let url = format!("{}auth", api_endpoint);

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &self.api_key {
            headers.insert(
                API_KEY_HEADER,
                HeaderValue::from_str(api_key)
                    .map_err(|e| DistributionError::Credentials(format!("invalid api key: {}", e)))?,
            );
        }
        if let Some(token) = previous_token {
            headers.insert(
                AUTHORIZATION_HEADER,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| DistributionError::Credentials(format!("invalid cached token: {}", e)))?,
            );
        }

        let response = self
            .http
            .post(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| DistributionError::Credentials(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| DistributionError::Credentials(e.to_string()))?;
        if !status.is_success() {
            return Err(DistributionError::Credentials(format!(
                "POST {} returned {}: {}",
                url, status, text
            )));
        }

        let credentials: Credentials = serde_json::from_str(&text)
            .map_err(|e| DistributionError::Credentials(format!("invalid auth response: {}", e)))?;
        if credentials.token.is_none() {
            return Err(DistributionError::Credentials(
                "auth response did not contain a token".to_string(),
            ));
        }

        info!("Obtained auth token from {}", url);
        Ok(credentials)
    }

    async fn save(&self, credentials: &Credentials) {
        let Some(path) = &self.credentials_file else {
            return;
        };
        let result = match serde_json::to_string(credentials) {
            Ok(content) => tokio::fs::write(path, content).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(e) = result {
            warn!("Could not cache credentials in '{}': {}", path.display(), e);
        }
    }
}
