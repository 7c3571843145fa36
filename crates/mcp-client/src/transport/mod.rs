//! Transport seam between endpoint probing and the wire
//!
//! `EndpointProbe` only needs "POST this JSON to that URL and give me JSON
//! back", so the HTTP client sits behind a small trait that tests can fake.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

pub mod http;

pub use http::HttpTransport;

#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// POST `payload` to `url` and return the parsed JSON body of a 2xx response
    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value>;
}
