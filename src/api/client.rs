use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::{ACCEPT, HeaderMap};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{Api, ApiError, Method};
use crate::debug::{DebugLog, DebugLogEntry, TraceOutcome};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const QUERY_ID_HEADER: &str = "x-ovh-queryid";

/// Resolve an endpoint alias (`ovh-eu`, `ovh-ca`, `ovh-us`) or pass a URL through.
pub fn endpoint_url(endpoint: &str) -> String {
    match endpoint {
        "ovh-eu" => "https://eu.api.ovh.com".to_string(),
        "ovh-ca" => "https://ca.api.ovh.com".to_string(),
        "ovh-us" => "https://api.us.ovhcloud.com".to_string(),
        url => url.trim_end_matches('/').to_string(),
    }
}

/// `reqwest`-backed [`Api`] that traces every call into the [`DebugLog`].
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    debug_log: Arc<DebugLog>,
    sequence: AtomicU64,
}

impl RestClient {
    pub fn new(
        endpoint: &str,
        access_token: Option<String>,
        debug_log: Arc<DebugLog>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("cloudnav/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url: endpoint_url(endpoint),
            access_token: access_token.filter(|t| !t.is_empty()),
            debug_log,
            sequence: AtomicU64::new(1),
        })
    }

    fn request_id(&self, headers: Option<&HeaderMap>) -> String {
        headers
            .and_then(|h| h.get(QUERY_ID_HEADER))
            .and_then(|v| v.to_str().ok())
            .map_or_else(
                || format!("local-{}", self.sequence.fetch_add(1, Ordering::Relaxed)),
                str::to_string,
            )
    }

    fn trace(&self, method: Method, url: &str, outcome: TraceOutcome, started: Instant, id: String) {
        self.debug_log.add_entry(DebugLogEntry {
            timestamp: Local::now(),
            method: method.to_string(),
            url: url.to_string(),
            outcome,
            duration: started.elapsed(),
            request_id: id,
        });
    }
}

/// Pull the API's `message` field out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

const fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Api for RestClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let Some(token) = &self.access_token else {
            return Err(ApiError::Credentials(
                "set api.access_token or OVH_ACCESS_TOKEN".to_string(),
            ));
        };

        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "API request");

        let mut builder = self
            .http
            .request(to_reqwest(method), &url)
            .header(ACCEPT, "application/json")
            .bearer_auth(token);
        if let Some(body) = &body {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let id = self.request_id(None);
                warn!(%method, %url, error = %e, "API request failed");
                self.trace(method, &url, TraceOutcome::Error(e.to_string()), started, id);
                return Err(ApiError::Network(e.to_string()));
            }
        };

        let status = response.status();
        let id = self.request_id(Some(response.headers()));
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                self.trace(method, &url, TraceOutcome::Error(e.to_string()), started, id);
                return Err(ApiError::Network(format!("failed to read response body: {e}")));
            }
        };
        self.trace(method, &url, TraceOutcome::Status(status.as_u16()), started, id);
        debug!(%method, %url, status = status.as_u16(), "API response");

        if !status.is_success() {
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status: status.as_u16(),
                message: error_message(&text),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Decode {
            path: path.to_string(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_aliases() {
        assert_eq!(endpoint_url("ovh-eu"), "https://eu.api.ovh.com");
        assert_eq!(endpoint_url("ovh-ca"), "https://ca.api.ovh.com");
        assert_eq!(endpoint_url("http://localhost:8080/"), "http://localhost:8080");
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(
            error_message(r#"{"class":"Client::NotFound","message":"Instance not found"}"#),
            "Instance not found"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_missing_token_is_credentials_error() {
        let log = Arc::new(DebugLog::new(10));
        let client = RestClient::new("ovh-eu", Some(String::new()), Arc::clone(&log)).unwrap();
        let err = client.request(Method::Get, "/v1/cloud/project", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Credentials(_)));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure_is_traced() {
        let log = Arc::new(DebugLog::new(10));
        let client =
            RestClient::new("http://127.0.0.1:9", Some("token".into()), Arc::clone(&log)).unwrap();
        let err = client.request(Method::Get, "/v1/cloud/project", None).await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, "GET");
        assert_eq!(entries[0].url, "http://127.0.0.1:9/v1/cloud/project");
        assert!(entries[0].is_error());
        assert!(entries[0].request_id.starts_with("local-"));
    }
}
