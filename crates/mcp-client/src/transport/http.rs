use crate::credentials::API_KEY_HEADER;
use crate::error::{ClientError, Result};
use crate::transport::RemoteTransport;
use crate::ClientConfig;
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT},
    Client,
};
use serde_json::Value;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Single-shot HTTPS POST client for the remote tool server
pub struct HttpTransport {
    client: Client,
    headers: HeaderMap,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Connection(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            headers: build_headers(config)?,
            timeout: config.timeout,
        })
    }

    async fn send_http_request(&self, url: &str, payload: &Value) -> Result<Value> {
        let body = serde_json::to_vec(payload)?;
        debug!("Sending HTTP request to {}: {}", url, payload);

        let response = self
            .client
            .post(url)
            .headers(self.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;

        let status = response.status();
        let is_event_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("text/event-stream"))
            .unwrap_or(false);

        let response_text = response
            .text()
            .await
            .map_err(|e| ClientError::from_reqwest(e, self.timeout))?;

        if !status.is_success() {
            let body = response_text.trim();
            return Err(ClientError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                body: (!body.is_empty()).then(|| body.to_string()),
            });
        }

        debug!("Received HTTP response (status {}): {}", status, response_text);

        let json_text = if is_event_stream || response_text.starts_with("event:") {
            debug!("Detected SSE response, parsing data field");
            parse_sse_response(&response_text)
        } else {
            response_text
        };

        if json_text.trim().is_empty() {
            return Err(ClientError::InvalidJson("empty response body".to_string()));
        }

        serde_json::from_str(&json_text).map_err(|e| ClientError::InvalidJson(e.to_string()))
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn post_json(&self, url: &str, payload: &Value) -> Result<Value> {
        self.send_http_request(url, payload).await
    }
}

fn build_headers(config: &ClientConfig) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/event-stream"),
    );

    for (key, value) in &config.headers {
        headers.insert(
            HeaderName::from_str(key).map_err(|e| {
                ClientError::InvalidHeader(format!("Invalid header name '{}': {}", key, e))
            })?,
            HeaderValue::from_str(value).map_err(|e| {
                ClientError::InvalidHeader(format!("Invalid header value for '{}': {}", key, e))
            })?,
        );
    }

    if let Some(api_key) = &config.api_key {
        let mut value = HeaderValue::from_str(api_key)
            .map_err(|e| ClientError::InvalidHeader(format!("Invalid API key: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(API_KEY_HEADER, value);
    }

    if let Some(user_agent) = &config.user_agent {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(user_agent)
                .map_err(|e| ClientError::InvalidHeader(format!("Invalid user agent: {}", e)))?,
        );
    }

    Ok(headers)
}

/// Data of the last complete event in an SSE body.
///
/// Streamable-HTTP servers may send notifications ahead of the response on the
/// same stream, so earlier events are discarded. The `data:` lines of one
/// event are joined with newlines.
fn parse_sse_response(sse_text: &str) -> String {
    let mut last_event = String::new();
    let mut current: Vec<&str> = Vec::new();

    for line in sse_text.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                last_event = current.join("\n");
                current.clear();
            }
        } else if let Some(data) = line.strip_prefix("data:") {
            current.push(data.trim());
        }
    }

    if !current.is_empty() {
        last_event = current.join("\n");
    }

    last_event
}
