use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{Api, ApiError, Method};

type Reply = Result<Value, ApiError>;

/// Scripted [`Api`] for tests.
///
/// Replies are queued per `(method, path)`; the last queued reply keeps being
/// returned once the queue is drained. Unscripted calls fail with HTTP 404.
#[derive(Default)]
pub struct MockApi {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<(Method, String, Option<Value>)>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, value: Value) -> Self {
        self.push(method, path, Ok(value))
    }

    pub fn fail(self, method: Method, path: &str, status: u16) -> Self {
        let err = ApiError::Status {
            method,
            path: path.to_string(),
            status,
            message: format!("scripted failure {status}"),
        };
        self.push(method, path, Err(err))
    }

    fn push(self, method: Method, path: &str, reply: Reply) -> Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn calls(&self) -> Vec<(Method, String)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(m, p, _)| (*m, p.clone()))
            .collect()
    }

    pub fn body_of(&self, method: Method, path: &str) -> Option<Value> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .find(|(m, p, _)| *m == method && p == path)
            .and_then(|(_, _, body)| body.clone())
    }
}

#[async_trait]
impl Api for MockApi {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((method, path.to_string(), body));

        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(&(method, path.to_string())) else {
            return Err(ApiError::Status {
                method,
                path: path.to_string(),
                status: 404,
                message: "not scripted".to_string(),
            });
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}
