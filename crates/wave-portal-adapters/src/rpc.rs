use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use wave_portal_core::PortError;

/// EIP-1193 code for "user rejected the request".
pub const USER_REJECTED_CODE: i64 = 4001;

/// Blocking JSON-RPC 2.0 client shared by the wallet and contract adapters.
#[derive(Debug, Clone)]
pub struct JsonRpcTransport {
    url: String,
    client: reqwest::blocking::Client,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcTransport {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, PortError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build rpc client: {e}")))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .map_err(|e| PortError::Transport(format!("{method} json decode failed: {e}")))?;
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "{method} status {}: {}",
                status, body
            )));
        }
        if let Some(err) = body.get("error") {
            return Err(rpc_error(method, err));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Transport(format!("{method} response missing result")))
    }
}

fn rpc_error(method: &str, err: &Value) -> PortError {
    let message = err
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("unknown error")
        .to_owned();
    match err.get("code").and_then(Value::as_i64) {
        Some(USER_REJECTED_CODE) => PortError::Rejected(message),
        Some(code) => PortError::Transport(format!("{method} returned error {code}: {message}")),
        None => PortError::Transport(format!("{method} returned error: {message}")),
    }
}

pub(crate) fn parse_quantity(value: &Value) -> Result<u64, PortError> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    let raw = value
        .as_str()
        .ok_or_else(|| PortError::Validation("quantity must be string or number".to_owned()))?;
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)
            .map_err(|e| PortError::Validation(format!("invalid hex quantity {raw}: {e}"))),
        None => raw
            .parse()
            .map_err(|e| PortError::Validation(format!("invalid quantity {raw}: {e}"))),
    }
}

pub(crate) fn quantity(n: u64) -> String {
    format!("{n:#x}")
}
