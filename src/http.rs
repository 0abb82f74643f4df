//! Shared HTTP plumbing for the embedding and chat providers.

use std::time::Duration;

use crate::error::{AssistError, AssistResult};

/// POST `request` until it succeeds, fails with a non-retryable status, or
/// `max_retries` retries are used up. Returns the parsed JSON body.
pub async fn send_with_retry(
    label: &str,
    request: reqwest::RequestBuilder,
    max_retries: u32,
) -> AssistResult<serde_json::Value> {
    let mut last_err = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            // Exponential backoff: 1s, 2s, 4s, 8s, ...
            let delay = Duration::from_secs(1 << (attempt - 1).min(5));
            tokio::time::sleep(delay).await;
        }

        let req = request
            .try_clone()
            .ok_or_else(|| AssistError::transport("request body cannot be retried"))?;

        match req.send().await {
            Ok(response) => {
                let status = response.status();

                if status.is_success() {
                    return response.json().await.map_err(AssistError::from);
                }

                let body_text = response.text().await.unwrap_or_default();
                let err = AssistError::transport(format!(
                    "{} API error {}: {}",
                    label, status, body_text
                ));

                // Rate limited or server error: retry
                if status.as_u16() == 429 || status.is_server_error() {
                    tracing::warn!(provider = label, %status, attempt, "retryable API error");
                    last_err = Some(err);
                    continue;
                }

                return Err(err);
            }
            Err(e) => {
                tracing::warn!(provider = label, attempt, error = %e, "request failed");
                last_err = Some(e.into());
            }
        }
    }

    Err(last_err.unwrap_or_else(|| AssistError::transport(format!("{} request failed", label))))
}
