use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Build an HTTP client with a per-request timeout
///
/// Every collaborator call is bounded so a hanging provider cannot stall a tick.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|e| AppError::Network(format!("Failed to create HTTP client: {}", e)))
}

/// Send a request and decode a JSON body, mapping failures onto `AppError`
///
/// Request URLs carry credentials (bot token in the path, API tokens in the
/// query), so they are stripped from every transport error.
pub async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| AppError::Network(format!("{} request failed: {}", provider, e.without_url())))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| {
            AppError::Network(format!(
                "Failed to read {} response body: {}",
                provider,
                e.without_url()
            ))
        })?;

    if !status.is_success() {
        return Err(AppError::Provider(format!(
            "{} returned error status {}: {}",
            provider,
            status,
            preview(&body)
        )));
    }

    debug!(provider = provider, bytes = body.len(), "Received response");

    serde_json::from_str(&body).map_err(|e| {
        AppError::Parse(format!(
            "Failed to parse {} response: {} (body: {})",
            provider,
            e,
            preview(&body)
        ))
    })
}

/// First 300 characters of a body for log and error messages
fn preview(body: &str) -> String {
    const LIMIT: usize = 300;
    if body.chars().count() > LIMIT {
        format!("{}... (truncated)", body.chars().take(LIMIT).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let body = "é".repeat(400);
        let shown = preview(&body);
        assert!(shown.ends_with("... (truncated)"));
        assert_eq!(shown.chars().filter(|c| *c == 'é').count(), 300);
        assert_eq!(preview("short"), "short");
    }

    #[tokio::test]
    async fn test_transport_error_hides_credentials() {
        let client = build_http_client(Duration::from_secs(2)).unwrap();
        let request = client
            .get("http://127.0.0.1:9/botSECRET123:tok/getMe")
            .query(&[("auth_token", "cp-secret")]);

        let err = send_json::<serde_json::Value>(request, "Telegram").await.unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AppError::Network(_)));
        assert!(message.contains("Telegram request failed"));
        assert!(!message.contains("SECRET123"), "{}", message);
        assert!(!message.contains("cp-secret"), "{}", message);
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(3)).is_ok());
    }
}
