//! Remote content classification client.
//!
//! One POST per analyzed video. Every failure mode maps to an outcome the
//! pipeline can act on; none of them block playback. The guard fails open:
//! when the service is down, slow, or talking nonsense, the user sees a
//! notice at most, never a lock-out.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::config::GuardConfig;

const CONNECT_ERROR_MESSAGE: &str =
    "Could not connect to analysis server. Please try again later.";
const INVALID_RESPONSE_MESSAGE: &str = "Received invalid analysis response from server";
/// Response field carrying the verdict.
const ALIGNMENT_FIELD: &str = "alignsWithFocus";
/// Cap on how much response body an error message may quote.
const BODY_PREVIEW_LIMIT: usize = 100;

/// Payload sent to the classification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub video_title: String,
    pub video_description: String,
    pub preferred_content: Vec<String>,
    pub non_preferred_content: Vec<String>,
}

/// What the pipeline does with a finished analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// The classifier explicitly judged the video off-focus.
    Warn,
    /// Aligned, or anything short of an explicit "does not align".
    Allow,
    /// The round trip failed; surface this message and move on.
    Error { message: String },
}

pub struct AnalysisClient {
    http: Client,
    endpoint: Url,
}

impl AnalysisClient {
    pub fn new(config: &GuardConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .context("failed to build analysis HTTP client")?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Runs one classification round trip. Infallible by signature: every
    /// failure is folded into the returned outcome.
    pub async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let request_id = Uuid::new_v4();
        log::debug!(
            "[classifier] {request_id} analyzing {:?} against {} preferred / {} non-preferred topics",
            request.video_title,
            request.preferred_content.len(),
            request.non_preferred_content.len(),
        );

        let response = match self
            .http
            .post(self.endpoint.clone())
            .header("x-request-id", request_id.to_string())
            .json(request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                log::error!("[classifier] {request_id} request failed: {err}");
                return AnalysisOutcome::Error {
                    message: CONNECT_ERROR_MESSAGE.to_string(),
                };
            }
        };

        // Body first, status second: error payloads carry the diagnostics
        // worth quoting back to the user.
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                log::error!("[classifier] {request_id} failed reading response body: {err}");
                return AnalysisOutcome::Error {
                    message: CONNECT_ERROR_MESSAGE.to_string(),
                };
            }
        };

        if !status.is_success() {
            let message = format!(
                "Server error ({}): {}",
                status.as_u16(),
                truncate(&body, BODY_PREVIEW_LIMIT)
            );
            log::error!("[classifier] {request_id} {message}");
            return AnalysisOutcome::Error { message };
        }

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::error!("[classifier] {request_id} unparseable response: {err}");
                return AnalysisOutcome::Error {
                    message: format!(
                        "Failed to parse server response: {}",
                        truncate(&body, BODY_PREVIEW_LIMIT)
                    ),
                };
            }
        };

        let Some(fields) = parsed.as_object() else {
            log::error!("[classifier] {request_id} response is not an object: {parsed}");
            return AnalysisOutcome::Error {
                message: INVALID_RESPONSE_MESSAGE.to_string(),
            };
        };

        // Only an explicit false warns. A missing or mistyped field means
        // the classifier did not commit to a verdict, and the guard lets
        // the video play.
        match fields.get(ALIGNMENT_FIELD) {
            Some(Value::Bool(false)) => {
                log::debug!("[classifier] {request_id} verdict: does not align");
                AnalysisOutcome::Warn
            }
            other => {
                log::debug!("[classifier] {request_id} verdict: aligns ({other:?})");
                AnalysisOutcome::Allow
            }
        }
    }
}

/// Byte-capped prefix that never splits a UTF-8 character.
fn truncate(text: &str, limit: usize) -> &str {
    if text.len() <= limit {
        return text;
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
