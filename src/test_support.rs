//! Scripted network used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, StatusCode};

use crate::error::{ProxyError, Result};
use crate::proxy::{Network, ProxyRequest, ProxyResponse, ResponseSource};

#[derive(Clone)]
enum Reply {
    Respond(StatusCode, Bytes),
    Fail,
}

/// Answers fetches from a URL table. Unknown URLs get a 404, and the whole
/// network can be switched offline.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, status: StatusCode, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Reply::Respond(status, Bytes::from(body.to_string())));
    }

    pub fn fail(&self, url: &str) {
        self.routes.lock().unwrap().insert(url.to_string(), Reply::Fail);
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Every fetch seen so far as `METHOD url`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &ProxyRequest) -> Result<ProxyResponse> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", request.method, request.url));

        if self.offline.load(Ordering::SeqCst) {
            return Err(ProxyError::Network(format!("{}: offline", request.url)));
        }

        let reply = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Respond(status, body)) => Ok(ProxyResponse::new(
                status,
                HeaderMap::new(),
                body,
                ResponseSource::Network,
            )),
            Some(Reply::Fail) => Err(ProxyError::Network(format!("{}: connection reset", request.url))),
            None => Ok(ProxyResponse::new(
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                Bytes::new(),
                ResponseSource::Network,
            )),
        }
    }
}
