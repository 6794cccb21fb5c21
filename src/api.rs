//! HTTP collaborator.
//!
//! The browser only ever needs four verbs against plain string paths. The
//! object-safe [`Api`] trait moves raw JSON; the free functions [`get`],
//! [`post`], [`put`] and [`delete`] decode it into whatever the caller asks
//! for.

mod client;
#[cfg(test)]
pub mod mock;

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

pub use client::RestClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{method} {path} failed (HTTP {status}): {message}")]
    Status {
        method: Method,
        path: String,
        status: u16,
        message: String,
    },

    #[error("unexpected response from {path}: {detail}")]
    Decode { path: String, detail: String },

    #[error("missing API credentials: {0}")]
    Credentials(String),
}

impl ApiError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Raw JSON transport.
#[async_trait]
pub trait Api: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        detail: e.to_string(),
    })
}

pub async fn get<T: DeserializeOwned>(api: &dyn Api, path: &str) -> Result<T, ApiError> {
    let value = api.request(Method::Get, path, None).await?;
    decode(path, value)
}

pub async fn post<T: DeserializeOwned>(
    api: &dyn Api,
    path: &str,
    body: Value,
) -> Result<T, ApiError> {
    let value = api.request(Method::Post, path, Some(body)).await?;
    decode(path, value)
}

#[allow(dead_code)]
pub async fn put<T: DeserializeOwned>(
    api: &dyn Api,
    path: &str,
    body: Value,
) -> Result<T, ApiError> {
    let value = api.request(Method::Put, path, Some(body)).await?;
    decode(path, value)
}

pub async fn delete<T: DeserializeOwned>(api: &dyn Api, path: &str) -> Result<T, ApiError> {
    let value = api.request(Method::Delete, path, None).await?;
    decode(path, value)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::mock::MockApi;
    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Region {
        name: String,
    }

    #[tokio::test]
    async fn test_get_decodes_destination() {
        let api = MockApi::new().on(Method::Get, "/v1/region/GRA", json!({ "name": "GRA" }));
        let region: Region = get(&api, "/v1/region/GRA").await.unwrap();
        assert_eq!(region, Region { name: "GRA".into() });
    }

    #[tokio::test]
    async fn test_decode_error_names_path() {
        let api = MockApi::new().on(Method::Get, "/v1/region", json!(42));
        let err = get::<Vec<String>>(&api, "/v1/region").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/v1/region"));
    }

    #[tokio::test]
    async fn test_put_sends_body() {
        let api = MockApi::new().on(Method::Put, "/v1/region/GRA", json!({ "name": "GRA" }));
        let region: Region = put(&api, "/v1/region/GRA", json!({ "name": "GRA" }))
            .await
            .unwrap();
        assert_eq!(region.name, "GRA");
        assert_eq!(api.calls(), vec![(Method::Put, "/v1/region/GRA".to_string())]);
    }

    #[tokio::test]
    async fn test_delete_into_unit_value() {
        let api = MockApi::new().on(Method::Delete, "/v1/thing/1", Value::Null);
        let out: Value = delete(&api, "/v1/thing/1").await.unwrap();
        assert_eq!(out, Value::Null);
        assert_eq!(api.calls(), vec![(Method::Delete, "/v1/thing/1".to_string())]);
    }

    #[test]
    fn test_status_accessor() {
        let err = ApiError::Status {
            method: Method::Post,
            path: "/v1/x".into(),
            status: 409,
            message: "conflict".into(),
        };
        assert_eq!(err.status(), Some(409));
        assert_eq!(err.to_string(), "POST /v1/x failed (HTTP 409): conflict");
        assert_eq!(ApiError::Network("down".into()).status(), None);
    }
}
