use crate::error::AppError;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Decoded upstream JSON-RPC response plus the session cookie, if any.
#[derive(Debug)]
pub struct RpcResponse {
    pub body: Value,
    pub session_token: Option<String>,
}

/// Issues single JSON-RPC calls to the Odoo server over a pooled,
/// reusable HTTP connection. The client's cookie jar carries the
/// `session_id` cookie from login to every later call.
#[derive(Debug)]
pub struct RpcTransport {
    client: Client,
    base_url: String,
}

impl RpcTransport {
    /// Build the transport. In API-key mode the key rides on every
    /// outbound request as an `api-key` header.
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key).map_err(|_| {
                AppError::Configuration("ODOO_API_KEY contains invalid header characters".to_string())
            })?;
            headers.insert("api-key", value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// POST one JSON payload to `path` and decode the JSON response.
    /// Network failures and non-2xx statuses surface as `AppError::Transport`.
    pub async fn call(&self, path: &str, payload: &Value) -> Result<RpcResponse, AppError> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Request to {} failed: {}", path, e)))?;

        let session_token = response
            .cookies()
            .find(|c| c.name() == "session_id")
            .map(|c| c.value().to_string());

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Transport(format!(
                "Odoo returned {} for {}: {}",
                status, path, text
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Transport(format!("Invalid JSON from {}: {}", path, e)))?;

        Ok(RpcResponse {
            body,
            session_token,
        })
    }
}
