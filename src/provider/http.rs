//! Shared HTTP client, SSE parsing, and auth utilities.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::ReelError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn builder() -> reqwest::ClientBuilder {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .pool_max_idle_per_host(10)
}

/// Get (or create) the shared reqwest client.
pub fn shared_client() -> Result<&'static reqwest::Client, ReelError> {
    if let Some(client) = SHARED_CLIENT.get() {
        return Ok(client);
    }
    let client = builder().build()?;
    Ok(SHARED_CLIENT.get_or_init(|| client))
}

/// Client for provider traffic, routed through `proxy` when one is set.
pub fn client_for(proxy: Option<&str>) -> Result<reqwest::Client, ReelError> {
    match proxy.filter(|p| !p.trim().is_empty()) {
        Some(proxy) => {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| ReelError::Configuration(format!("invalid proxy {proxy:?}: {e}")))?;
            Ok(builder().proxy(proxy).build()?)
        }
        None => Ok(shared_client()?.clone()),
    }
}

/// Build default headers for a Bearer-token API.
pub fn bearer_headers(api_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(val) = HeaderValue::from_str(&format!("Bearer {api_key}")) {
        headers.insert(AUTHORIZATION, val);
    }
    headers
}

/// Parse an SSE "data:" line, returning None for "[DONE]".
pub fn parse_sse_data(line: &str) -> Option<&str> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return None;
    }
    Some(data)
}

/// Map a non-success HTTP status to an error.
pub fn status_to_error(status: u16, body: &str) -> ReelError {
    match status {
        401 | 403 => ReelError::Authentication(body.to_string()),
        429 => ReelError::RateLimited {
            retry_after_ms: extract_retry_after(body),
        },
        _ => ReelError::api(status, body),
    }
}

fn extract_retry_after(body: &str) -> Option<u64> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("retry_after"))
                .and_then(|r| r.as_f64())
                .map(|s| (s * 1000.0) as u64)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sse_data_lines() {
        assert_eq!(parse_sse_data("data: {\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(parse_sse_data("data:{}"), Some("{}"));
        assert_eq!(parse_sse_data("data: [DONE]"), None);
        assert_eq!(parse_sse_data("event: ping"), None);
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(status_to_error(401, "no"), ReelError::Authentication(_)));
        assert!(matches!(
            status_to_error(429, r#"{"error":{"retry_after":1.5}}"#),
            ReelError::RateLimited { retry_after_ms: Some(1500) }
        ));
        assert!(matches!(status_to_error(500, "x"), ReelError::Api { status: 500, .. }));
    }

    #[test]
    fn invalid_proxy_is_configuration_error() {
        let err = client_for(Some("http://[not-an-ip")).unwrap_err();
        assert!(matches!(err, ReelError::Configuration(_)));
    }
}
