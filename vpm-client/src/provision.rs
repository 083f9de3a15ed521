//! Session provisioning over the backend's JSON API.
//!
//! These calls run before the window opens and after the series ends, so
//! they block the caller; only trial submission goes through the background
//! reporter.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use vpm_core::{OpaqueId, SessionManifest, Submodality};

const REQUEST_TIMEOUT_S: u64 = 10;

/// Errors from the provisioning endpoints.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The backend returned an error response.
    #[error("backend error (HTTP {status}): {message}")]
    Backend { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The response body did not parse as the expected shape.
    #[error("malformed response: {0}")]
    BadResponse(String),
}

#[derive(Serialize)]
struct SessionRequest<'a> {
    vpm_mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// End-of-session aggregate as computed by the backend. Sessions with no
/// recorded trials come back with `n == 0` and a `message` instead of stats.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionScore {
    #[serde(default)]
    pub n: u64,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub rt_avg_ms: f64,
    #[serde(default)]
    pub rt_median_ms: f64,
    #[serde(default)]
    pub level_reached: u32,
    #[serde(default)]
    pub message: Option<String>,
}

fn blocking_client() -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_S))
        .build()
        .expect("failed to build HTTP client")
}

fn classify(base_url: &str, err: reqwest::Error) -> ProvisionError {
    if err.is_timeout() {
        ProvisionError::Timeout(REQUEST_TIMEOUT_S)
    } else if err.is_connect() {
        ProvisionError::Network(format!("backend not reachable at {base_url}"))
    } else {
        ProvisionError::Network(err.to_string())
    }
}

/// Creates a session and returns its manifest. The provisioned items carry
/// no answer key; scoring stays on the backend.
pub fn fetch_session(
    base_url: &str,
    submodality: Submodality,
    user_id: Option<&str>,
) -> Result<SessionManifest, ProvisionError> {
    let body = SessionRequest {
        vpm_mode: submodality.wire_name(),
        user_id,
    };
    let response = blocking_client()
        .post(format!("{}/api/v1/sessions", base_url.trim_end_matches('/')))
        .json(&body)
        .send()
        .map_err(|e| classify(base_url, e))?;

    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().unwrap_or_default();
        return Err(ProvisionError::Backend { status, message });
    }
    let manifest: SessionManifest = response
        .json()
        .map_err(|e| ProvisionError::BadResponse(e.to_string()))?;
    info!(
        session_id = %manifest.session_id,
        items = manifest.items.len(),
        submodality = %submodality,
        "session provisioned"
    );
    Ok(manifest)
}

/// Fetches the backend's aggregate for a finished session.
pub fn fetch_session_score(
    base_url: &str,
    session_id: &OpaqueId,
) -> Result<SessionScore, ProvisionError> {
    let url = format!(
        "{}/api/v1/score/session/{}",
        base_url.trim_end_matches('/'),
        session_id
    );
    let response = blocking_client()
        .get(url)
        .send()
        .map_err(|e| classify(base_url, e))?;

    let status = response.status().as_u16();
    if status >= 400 {
        let message = response.text().unwrap_or_default();
        return Err(ProvisionError::Backend { status, message });
    }
    response
        .json()
        .map_err(|e| ProvisionError::BadResponse(e.to_string()))
}
