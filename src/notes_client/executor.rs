use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::types::ClientError;

use super::api_types::ErrorBody;

/// Retry budget for a component's first operation of the session.
pub const FIRST_OPERATION_RETRIES: u32 = 3;
/// Retry budget for every operation after the first.
pub const STEADY_STATE_RETRIES: u32 = 2;
/// Retry budget for OCR-assist text extraction.
pub const EXTRACT_RETRIES: u32 = 1;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const BACKOFF_BASE: Duration = Duration::from_millis(1000);
const GATEWAY_COOLDOWN: Duration = Duration::from_millis(3000);

/// Per-operation policy: how many retries, how long each attempt may
/// run, and how long to pause between attempts.
#[derive(Debug, Clone, Copy)]
pub struct RequestPolicy {
    max_retries: u32,
    attempt_timeout: Duration,
    backoff_base: Duration,
    gateway_cooldown: Duration,
}

impl RequestPolicy {
    /// Policy for read-only JSON operations (search, similar lookup).
    pub fn search(max_retries: u32) -> Self {
        Self {
            max_retries,
            attempt_timeout: SEARCH_TIMEOUT,
            backoff_base: BACKOFF_BASE,
            gateway_cooldown: GATEWAY_COOLDOWN,
        }
    }

    /// Policy for multipart submissions that trigger OCR server-side.
    pub fn upload(max_retries: u32) -> Self {
        Self {
            attempt_timeout: UPLOAD_TIMEOUT,
            ..Self::search(max_retries)
        }
    }

    /// Policy for OCR-assist extraction; a single retry, extraction is
    /// expensive for the backend.
    pub fn extract() -> Self {
        Self::search(EXTRACT_RETRIES)
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    pub fn with_gateway_cooldown(mut self, cooldown: Duration) -> Self {
        self.gateway_cooldown = cooldown;
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn attempt_timeout(&self) -> Duration {
        self.attempt_timeout
    }

    pub fn gateway_cooldown(&self) -> Duration {
        self.gateway_cooldown
    }

    /// Exponential backoff delay applied after attempt `attempt` times out.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let shift = attempt.min(20);
        self.backoff_base.saturating_mul(1 << shift)
    }
}

/// Run one logical operation with bounded retries.
///
/// `build` is called once per attempt so that non-reusable bodies
/// (multipart forms) can be rebuilt. Attempts are strictly sequential;
/// at most `max_retries + 1` requests ever go out.
///
/// Retried: per-attempt timeouts (exponential backoff) and 502 (fixed
/// cooldown). Every other failure surfaces immediately.
pub async fn execute<F>(policy: &RequestPolicy, build: F) -> Result<Response, ClientError>
where
    F: Fn() -> RequestBuilder,
{
    let attempts = policy.max_retries.saturating_add(1);
    let mut attempt: u32 = 0;

    loop {
        let outcome = build().timeout(policy.attempt_timeout).send().await;

        match outcome {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let raw = response.text().await.unwrap_or_default();
                let message = error_detail(&raw);

                if status == StatusCode::BAD_GATEWAY {
                    // The upstream is likely mid-restart; always cool
                    // down before retrying or giving up.
                    warn!(attempt, "Backend returned 502 Bad Gateway");
                    sleep(policy.gateway_cooldown).await;
                    if attempt + 1 < attempts {
                        attempt += 1;
                        continue;
                    }
                    return Err(ClientError::Gateway { message });
                }

                return Err(ClientError::Api {
                    status: status.as_u16(),
                    message,
                });
            }
            Err(err) if err.is_timeout() => {
                if attempt + 1 < attempts {
                    let delay = policy.backoff_for_attempt(attempt);
                    debug!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Attempt timed out, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                return Err(ClientError::Timeout { attempts });
            }
            Err(err) => return Err(ClientError::Http(err)),
        }
    }
}

/// Pull a human-readable message out of a non-2xx body: a JSON `detail`
/// field when present, the raw text otherwise, a generic fallback when
/// the body is empty.
fn error_detail(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "request failed".to_string();
    }
    match serde_json::from_str::<ErrorBody>(trimmed) {
        Ok(ErrorBody {
            detail: Some(detail),
        }) if !detail.trim().is_empty() => detail,
        _ => trimmed.to_string(),
    }
}
