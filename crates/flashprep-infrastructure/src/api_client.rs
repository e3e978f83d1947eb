//! Single-attempt JSON request execution against the backend API.
//!
//! All four verbs go through [`ApiClient::execute`], which owns bearer
//! injection and error normalization.

use flashprep_core::config::ApiConfig;
use flashprep_core::error::{FlashprepError, GENERIC_REQUEST_FAILURE, Result};
use reqwest::{Client, Method, StatusCode, header};
use serde::Serialize;
use serde_json::Value;

/// HTTP client bound to one base URL.
///
/// No retry or backoff happens here; callers layer that on if they need it.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Creates a client for `config`, applying its request timeout if set.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FlashprepError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<Value> {
        self.execute::<Value>(Method::GET, path, None, token).await
    }

    pub async fn post<B>(&self, path: &str, body: Option<&B>, token: Option<&str>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, path, body, token).await
    }

    pub async fn put<B>(&self, path: &str, body: Option<&B>, token: Option<&str>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::PUT, path, body, token).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<Value> {
        self.execute::<Value>(Method::DELETE, path, None, token).await
    }

    /// Sends one request and returns the parsed JSON body.
    ///
    /// An empty success body parses as `Value::Null`. A non-success status
    /// becomes [`FlashprepError::Request`] with the body's `message` field, or
    /// the generic message when the body is missing, not JSON, or has no
    /// usable `message`.
    pub async fn execute<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = self.config.url(path);
        tracing::debug!("[ApiClient] {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!("[ApiClient] {} {} failed to send: {}", method, path, e);
            FlashprepError::transport(format!("{} {}: {}", method, path, e))
        })?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| {
            FlashprepError::transport(format!("{} {}: failed to read body: {}", method, path, e))
        })?;

        if !status.is_success() {
            let message = extract_error_message(&bytes);
            tracing::warn!(
                "[ApiClient] {} {} returned {}: {}",
                method,
                path,
                status,
                message
            );
            return Err(FlashprepError::request(status.as_u16(), message));
        }

        parse_success_body(status, &bytes)
    }
}

fn parse_success_body(status: StatusCode, bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| FlashprepError::Serialization {
        format: "JSON".to_string(),
        message: format!("invalid response body for status {}: {}", status, e),
    })
}

/// Reads `message` from an error body, falling back to the generic message.
///
/// Parse failures are swallowed here so they never replace the original
/// request failure.
fn extract_error_message(bytes: &[u8]) -> String {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(|body| {
            body.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| GENERIC_REQUEST_FAILURE.to_string())
}
