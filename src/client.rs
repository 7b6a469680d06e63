// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP client for the NewsClassify API

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::ApiConfig;
use crate::error::CollaboratorError;
use crate::model::{
    AnalysisRequest, AnalysisResult, AuthResponse, HealthStatus, HistoryEntry, LoginRequest,
    PublishedReview, ReviewRequest, SignupRequest,
};
use crate::Result;

type CallResult<T> = std::result::Result<T, CollaboratorError>;

/// The classification collaborator
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> CallResult<AnalysisResult>;
}

/// The feedback collaborator
#[async_trait]
pub trait ReviewBackend: Send + Sync {
    async fn submit_review(&self, token: Option<&str>, review: &ReviewRequest) -> CallResult<()>;
}

/// Error body returned by the API on failure
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

/// NewsClassify API client
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        // Normalize URL
        let base_url = base_url
            .trim_end_matches('/')
            .trim_end_matches("/api/analyze")
            .trim_end_matches("/api")
            .to_string();

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Self::new(&config.base_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the API is reachable
    pub async fn health_check(&self) -> CallResult<HealthStatus> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;
        read_json(response).await
    }

    /// Upload a batch for classification
    pub async fn analyze_files(&self, request: &AnalysisRequest) -> CallResult<AnalysisResult> {
        let url = format!("{}/api/analyze", self.base_url);

        let mut form = Form::new();
        for file in request.files.iter() {
            let data = tokio::fs::read(&file.path)
                .await
                .map_err(|source| CollaboratorError::Upload {
                    file: file.name.clone(),
                    source,
                })?;
            let part = Part::bytes(data)
                .file_name(file.name.clone())
                .mime_str(&file.mime)?;
            form = form.part("files", part);
        }
        form = form.text("language", request.language.as_str());
        if let Some(token) = &request.auth_token {
            form = form.text("token", token.clone());
        }

        info!(
            "Uploading {} file(s) ({} bytes) for analysis in '{}'",
            request.files.len(),
            request.files.total_size(),
            request.language
        );

        let response = self.client.post(&url).multipart(form).send().await?;
        read_json(response).await
    }

    pub async fn login(&self, credentials: &LoginRequest) -> CallResult<AuthResponse> {
        let url = format!("{}/api/auth/login", self.base_url);
        debug!("Logging in as {}", credentials.email);
        let response = self.client.post(&url).json(credentials).send().await?;
        read_json(response).await
    }

    pub async fn signup(&self, form: &SignupRequest) -> CallResult<AuthResponse> {
        let url = format!("{}/api/auth/signup", self.base_url);
        debug!("Signing up {}", form.email);
        let response = self.client.post(&url).json(form).send().await?;
        read_json(response).await
    }

    /// Post a rating and optional comment
    pub async fn post_review(&self, token: Option<&str>, review: &ReviewRequest) -> CallResult<()> {
        let url = format!("{}/api/reviews/", self.base_url);
        let mut builder = self.client.post(&url).json(review);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        let response = builder.send().await?;
        let _: serde_json::Value = read_json(response).await?;
        Ok(())
    }

    /// Latest published reviews
    pub async fn list_reviews(&self) -> CallResult<Vec<PublishedReview>> {
        let url = format!("{}/api/reviews/", self.base_url);
        let response = self.client.get(&url).send().await?;
        read_json(response).await
    }

    /// Past analyses of the signed-in user
    pub async fn history(&self, token: &str) -> CallResult<Vec<HistoryEntry>> {
        let url = format!("{}/api/history", self.base_url);
        let response = self.client.get(&url).bearer_auth(token).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl AnalysisBackend for ApiClient {
    async fn analyze(&self, request: &AnalysisRequest) -> CallResult<AnalysisResult> {
        self.analyze_files(request).await
    }
}

#[async_trait]
impl ReviewBackend for ApiClient {
    async fn submit_review(&self, token: Option<&str>, review: &ReviewRequest) -> CallResult<()> {
        self.post_review(token, review).await
    }
}

/// Decode a success body, or turn a failure status into `Rejected`
async fn read_json<T: DeserializeOwned>(response: Response) -> CallResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        debug!("API returned {}: {}", status, body);
        return Err(CollaboratorError::Rejected {
            status: status.as_u16(),
            detail: detail_from(&body),
        });
    }

    serde_json::from_str(&body).map_err(|e| CollaboratorError::Malformed(e.to_string()))
}

/// FastAPI puts a string in `detail` for handled errors and a list for
/// request validation failures; only the string form is shown to users.
fn detail_from(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.as_str().map(String::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalization() {
        let timeout = Duration::from_secs(5);
        assert_eq!(ApiClient::new("http://host:5000/", timeout).unwrap().base_url(), "http://host:5000");
        assert_eq!(
            ApiClient::new("http://host:5000/api/analyze", timeout).unwrap().base_url(),
            "http://host:5000"
        );
        assert_eq!(ApiClient::new("http://host:5000/api", timeout).unwrap().base_url(), "http://host:5000");
    }

    #[test]
    fn test_detail_extraction() {
        assert_eq!(detail_from(r#"{"detail":"model unavailable"}"#), Some("model unavailable".into()));
        assert_eq!(detail_from(r#"{"detail":[{"loc":["body","rating"]}]}"#), None);
        assert_eq!(detail_from("Internal Server Error"), None);
        assert_eq!(detail_from("{}"), None);
    }
}
