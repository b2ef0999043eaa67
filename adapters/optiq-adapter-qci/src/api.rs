//! QCi optimization REST API client.
//!
//! ## Submission flow
//!
//! 1. `POST /auth/v1/access-tokens` exchanges the refresh token for a
//!    short-lived access token (cached until shortly before expiry)
//! 2. `POST /optimization/v1/files` uploads the problem → `file_id`
//! 3. `POST /optimization/v1/jobs` submits a job on that file → `job_id`
//! 4. Poll `GET /optimization/v1/jobs/{id}/status` until terminal
//! 5. `GET /optimization/v1/jobs/{id}` returns the samples

use std::sync::Arc;

use optiq_hal::CachedToken;
use optiq_hal::auth::REFRESH_BUFFER_SECS;
use optiq_model::SampleSet;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::error::{QciError, QciResult};
use crate::files::FileUpload;

/// Default API base URL.
pub const BASE_URL: &str = "https://api.qci-prod.com";

const AUTH_PATH: &str = "/auth/v1";
const OPTIMIZATION_PATH: &str = "/optimization/v1";

/// Lifetime assumed when the token response carries no expiry.
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;

/// QCi API client.
#[derive(Clone)]
pub struct QciClient {
    /// HTTP client.
    client: Client,
    /// API base URL (default: https://api.qci-prod.com).
    base_url: String,
    /// Long-lived refresh token.
    refresh_token: String,
    /// Short-lived access token shared between clones.
    access: Arc<Mutex<Option<CachedToken>>>,
}

impl std::fmt::Debug for QciClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QciClient")
            .field("base_url", &self.base_url)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

impl QciClient {
    /// Create a new client.
    pub fn new(refresh_token: impl Into<String>) -> QciResult<Self> {
        let refresh_token = refresh_token.into();
        if refresh_token.is_empty() {
            return Err(QciError::MissingToken);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(QciError::Http)?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
            refresh_token,
            access: Arc::new(Mutex::new(None)),
        })
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// The base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, prefix: &str, path: &str) -> String {
        format!("{}{}{}", self.base_url, prefix, path)
    }

    // ─── Authentication ─────────────────────────────────────────────

    /// A valid access token, exchanging the refresh token when needed.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> QciResult<String> {
        if let Some(token) = self.access.lock().await.as_ref() {
            if !token.expires_soon(REFRESH_BUFFER_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let url = self.url(AUTH_PATH, "/access-tokens");
        debug!("Requesting access token from {}", url);

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "refresh_token": self.refresh_token }))
            .send()
            .await?;
        let body: AccessTokenResponse = self.handle_response(response).await?;

        let token = match body.expires {
            Some(Expiry::Unix(at)) => CachedToken {
                access_token: body.access_token,
                expires_at: at,
            },
            Some(Expiry::Timestamp(ts)) => match chrono::DateTime::parse_from_rfc3339(&ts) {
                Ok(at) => CachedToken::expiring_at(body.access_token, at.with_timezone(&chrono::Utc)),
                Err(e) => {
                    warn!("Unparseable token expiry '{}': {}", ts, e);
                    CachedToken::expiring_in(body.access_token, DEFAULT_TOKEN_LIFETIME_SECS)
                }
            },
            None => CachedToken::expiring_in(body.access_token, DEFAULT_TOKEN_LIFETIME_SECS),
        };
        let access_token = token.access_token.clone();
        *self.access.lock().await = Some(token);
        Ok(access_token)
    }

    /// Drop the cached access token.
    pub async fn invalidate_token(&self) {
        *self.access.lock().await = None;
    }

    // ─── Files ──────────────────────────────────────────────────────

    /// Upload a problem file.
    #[instrument(skip(self, file), fields(file_name = %file.file_name))]
    pub async fn upload_file(&self, file: &FileUpload) -> QciResult<UploadResponse> {
        let url = self.url(OPTIMIZATION_PATH, "/files");
        debug!("Uploading file to {}", url);

        let token = self.access_token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(file)
            .send()
            .await?;

        self.handle_response(response).await
    }

    // ─── Jobs ───────────────────────────────────────────────────────

    /// Submit a job descriptor.
    #[instrument(skip(self, body))]
    pub async fn create_job(&self, body: &serde_json::Value) -> QciResult<CreateJobResponse> {
        let url = self.url(OPTIMIZATION_PATH, "/jobs");
        debug!("Creating job at {}", url);

        let token = self.access_token().await?;
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get job status.
    #[instrument(skip(self))]
    pub async fn get_status(&self, job_id: &str) -> QciResult<StatusResponse> {
        let url = self.url(OPTIMIZATION_PATH, &format!("/jobs/{job_id}/status"));
        debug!("Getting job status from {}", url);

        let token = self.access_token().await?;
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        self.handle_response(response).await
    }

    /// Get a job with its results.
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_id: &str) -> QciResult<JobResponse> {
        let url = self.url(OPTIMIZATION_PATH, &format!("/jobs/{job_id}"));
        debug!("Getting job from {}", url);

        let token = self.access_token().await?;
        let response = self.client.get(&url).bearer_auth(token).send().await?;

        self.handle_response(response).await
    }

    /// Cancel a job.
    #[instrument(skip(self))]
    pub async fn cancel_job(&self, job_id: &str) -> QciResult<()> {
        let url = self.url(OPTIMIZATION_PATH, &format!("/jobs/{job_id}"));
        debug!("Cancelling job at {}", url);

        let token = self.access_token().await?;
        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "status": "CANCELLED" }))
            .send()
            .await?;

        let _: serde_json::Value = self.handle_response(response).await?;
        Ok(())
    }

    /// Handle HTTP response, extracting JSON or returning an error.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> QciResult<T> {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            // Empty bodies (e.g. on PATCH) decode as JSON null.
            let body = if text.trim().is_empty() { "null" } else { &text };
            serde_json::from_str(body)
                .map_err(|e| QciError::MalformedResponse(e.to_string()))
        } else {
            let message = response.text().await.unwrap_or_default();

            match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    self.invalidate_token().await;
                    Err(QciError::AuthFailed(message))
                }
                StatusCode::NOT_FOUND => Err(QciError::NotFound(message)),
                _ => Err(QciError::ApiError {
                    status: status.as_u16(),
                    message,
                }),
            }
        }
    }
}

// ─── Response types ─────────────────────────────────────────────────

/// Token exchange response.
#[derive(Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    #[serde(default)]
    expires: Option<Expiry>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Expiry {
    Unix(u64),
    Timestamp(String),
}

/// File upload response.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    /// Identifier to reference in a job.
    pub file_id: String,
}

/// Job submission response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateJobResponse {
    /// Job identifier.
    pub job_id: String,
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    /// QUEUED, SUBMITTED, RUNNING, COMPLETED, ERRORED or CANCELLED.
    pub status: String,
}

/// Wire status values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireStatus {
    /// Waiting in the queue.
    Queued,
    /// Executing.
    Running,
    /// Finished with results.
    Completed,
    /// Finished with an error.
    Errored,
    /// Cancelled by the user.
    Cancelled,
}

impl WireStatus {
    /// Parse a wire status string.
    pub fn parse(status: &str) -> QciResult<Self> {
        match status.to_ascii_uppercase().as_str() {
            "QUEUED" | "SUBMITTED" => Ok(WireStatus::Queued),
            "RUNNING" => Ok(WireStatus::Running),
            "COMPLETED" => Ok(WireStatus::Completed),
            "ERRORED" => Ok(WireStatus::Errored),
            "CANCELLED" => Ok(WireStatus::Cancelled),
            other => Err(QciError::MalformedResponse(format!(
                "unknown job status '{other}'"
            ))),
        }
    }
}

impl StatusResponse {
    /// Parsed status.
    pub fn wire_status(&self) -> QciResult<WireStatus> {
        WireStatus::parse(&self.status)
    }
}

/// Job response with results.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResponse {
    /// Job identifier.
    #[serde(default)]
    pub job_id: Option<String>,
    /// Current status.
    pub status: String,
    /// Sample arrays, present once completed.
    #[serde(default)]
    pub results: Option<JobResults>,
    /// Error detail for errored jobs.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Device that ran the job.
    #[serde(default)]
    pub device_type: Option<String>,
}

impl JobResponse {
    /// Parsed status.
    pub fn wire_status(&self) -> QciResult<WireStatus> {
        WireStatus::parse(&self.status)
    }
}

/// Parallel result arrays.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResults {
    /// Solution vectors.
    pub solutions: Vec<Vec<f64>>,
    /// Energy of each solution.
    pub energies: Vec<f64>,
    /// Occurrences of each solution.
    #[serde(default)]
    pub counts: Option<Vec<u32>>,
}

impl JobResults {
    /// Zip the arrays into a sample set, rejecting inconsistent lengths.
    pub fn into_sample_set(self) -> QciResult<SampleSet> {
        Ok(SampleSet::from_parts(
            self.solutions,
            self.energies,
            self.counts,
        )?)
    }
}
