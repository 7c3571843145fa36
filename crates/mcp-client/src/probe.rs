//! Endpoint discovery for remote servers that do not agree on a request path
//!
//! Each candidate suffix is appended to the base URL and tried in order. The
//! first one answering with valid JSON wins and is pinned for later calls.
//! Errors from a pinned endpoint are returned as they are; only when it stops
//! serving requests on consecutive calls is the pin dropped and probing
//! started over.

use crate::error::{ClientError, Result};
use crate::transport::RemoteTransport;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// URL suffixes tried against the base URL, in order
pub const ENDPOINT_CANDIDATES: &[&str] = &["", "tools", "api", "v1", "mcp", "json-rpc"];

/// Consecutive endpoint misses after which a pinned endpoint is dropped
pub const PIN_FAILURE_LIMIT: u32 = 2;

/// Build `base/suffix/` with exactly one slash between parts and one at the end
pub fn candidate_url(base_url: &str, suffix: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    let suffix = suffix.trim_matches('/');
    if !suffix.is_empty() {
        url.push('/');
        url.push_str(suffix);
    }
    url.push('/');
    url
}

#[derive(Debug, Clone, Copy)]
struct Pin {
    index: usize,
    misses: u32,
}

pub struct EndpointProbe {
    transport: Arc<dyn RemoteTransport>,
    base_url: String,
    candidates: Vec<String>,
    pinned: Mutex<Option<Pin>>,
}

impl EndpointProbe {
    pub fn new(transport: Arc<dyn RemoteTransport>, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            candidates: ENDPOINT_CANDIDATES.iter().map(|s| s.to_string()).collect(),
            pinned: Mutex::new(None),
        }
    }

    /// Fixed-URL variant: every call goes to the base URL
    pub fn direct(transport: Arc<dyn RemoteTransport>, base_url: impl Into<String>) -> Self {
        Self::new(transport, base_url).with_candidates(vec![String::new()])
    }

    pub fn with_candidates(mut self, candidates: Vec<String>) -> Self {
        self.candidates = candidates;
        self
    }

    pub fn candidate_urls(&self) -> Vec<String> {
        self.candidates
            .iter()
            .map(|suffix| candidate_url(&self.base_url, suffix))
            .collect()
    }

    /// URL currently pinned by a previous successful call, if any
    pub async fn pinned_url(&self) -> Option<String> {
        let pinned = *self.pinned.lock().await;
        pinned.map(|pin| candidate_url(&self.base_url, &self.candidates[pin.index]))
    }

    /// Send `payload` for `method`, probing candidates until one answers with JSON
    pub async fn call(&self, method: &str, payload: &Value) -> Result<Value> {
        let pinned = *self.pinned.lock().await;

        let Some(pin) = pinned else {
            return self.search_candidates(method, payload, None, None).await;
        };

        let url = candidate_url(&self.base_url, &self.candidates[pin.index]);
        debug!("Sending {} to pinned endpoint {}", method, url);

        match self.transport.post_json(&url, payload).await {
            Ok(body) => {
                if pin.misses > 0 {
                    *self.pinned.lock().await = Some(Pin { misses: 0, ..pin });
                }
                Ok(body)
            }
            Err(e) if !e.is_endpoint_miss() => {
                debug!("Pinned endpoint {} answered with an error: {}", url, e);
                Err(e)
            }
            Err(e) => {
                let misses = pin.misses + 1;
                if misses < PIN_FAILURE_LIMIT {
                    warn!(
                        "Pinned endpoint {} failed ({}/{}): {}",
                        url, misses, PIN_FAILURE_LIMIT, e
                    );
                    *self.pinned.lock().await = Some(Pin { misses, ..pin });
                    return Err(e);
                }

                warn!("Pinned endpoint {} keeps failing: {}, searching candidates again", url, e);
                *self.pinned.lock().await = None;
                self.search_candidates(method, payload, Some(pin.index), Some(e)).await
            }
        }
    }

    /// Try every candidate except `skip`; a credential rejection ends the search
    async fn search_candidates(
        &self,
        method: &str,
        payload: &Value,
        skip: Option<usize>,
        mut best_error: Option<ClientError>,
    ) -> Result<Value> {
        for (idx, suffix) in self.candidates.iter().enumerate() {
            if skip == Some(idx) {
                continue;
            }

            let url = candidate_url(&self.base_url, suffix);
            debug!("Probing {} for {}", url, method);

            match self.transport.post_json(&url, payload).await {
                Ok(body) => {
                    info!("Remote endpoint resolved to {}", url);
                    *self.pinned.lock().await = Some(Pin {
                        index: idx,
                        misses: 0,
                    });
                    return Ok(body);
                }
                Err(e) if e.is_auth_failure() => {
                    warn!("{} rejected the credential: {}", url, e);
                    return Err(e);
                }
                Err(e) => {
                    debug!("Candidate {} failed: {}", url, e);
                    let keep_previous = best_error
                        .as_ref()
                        .map(|best| best.failure_rank() > e.failure_rank())
                        .unwrap_or(false);
                    if !keep_previous {
                        best_error = Some(e);
                    }
                }
            }
        }

        Err(best_error.unwrap_or_else(|| {
            ClientError::Connection(format!("No endpoint candidates left for {}", self.base_url))
        }))
    }
}
