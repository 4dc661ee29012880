//! HTTP JSON-RPC 2.0 transport
//!
//! Sends a single request and classifies failures into the retry taxonomy.
//! This layer never retries; that is the retry wrapper's job.
use crate::errors::{ConfigError, RpcCallError, RpcResult};
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// Seam between the probing components and the wire. Implemented by
/// [`HttpTransport`] in production and by scripted mocks in tests.
#[async_trait]
pub trait EthRpc: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> RpcResult<Value>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    request_id: AtomicU64,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ConfigError> {
        let endpoint = Url::parse(endpoint).map_err(|e| ConfigError::InvalidUrl {
            url: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ConfigError::InvalidField {
                field: "request_timeout_ms",
                reason: format!("failed to build http client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            request_id: AtomicU64::new(1),
        })
    }

    fn classify_send_error(&self, err: reqwest::Error) -> RpcCallError {
        if err.is_timeout() {
            RpcCallError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else if err.is_connect() {
            RpcCallError::ConnectionReset(err.to_string())
        } else {
            RpcCallError::Http(err.to_string())
        }
    }
}

/// Map a well-formed JSON-RPC error payload onto the taxonomy. Reverts and
/// provider-side rate limits arrive through this path on some providers.
fn classify_rpc_error(error: &Value) -> RpcCallError {
    let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
    let message = error
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown rpc error")
        .to_string();

    let lowered = message.to_ascii_lowercase();
    if lowered.contains("revert") {
        RpcCallError::ContractRevert(message)
    } else if code == -32005 || lowered.contains("rate limit") || lowered.contains("too many requests") {
        RpcCallError::RateLimited
    } else {
        RpcCallError::Rpc { code, message }
    }
}

#[async_trait]
impl EthRpc for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.request_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!("rpc -> {} (id {})", method, id);

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.classify_send_error(e))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(RpcCallError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RpcCallError::Http(format!("HTTP {}: {}", status, body)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| RpcCallError::MalformedResponse(e.to_string()))?;

        if let Some(error) = payload.get("error") {
            if !error.is_null() {
                return Err(classify_rpc_error(error));
            }
        }

        payload
            .get("result")
            .filter(|r| !r.is_null())
            .cloned()
            .ok_or_else(|| {
                RpcCallError::MalformedResponse("response carries neither result nor error".to_string())
            })
    }
}
