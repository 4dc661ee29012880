//! JSON-RPC plumbing: transport trait, HTTP implementation, retry wrapper
//!
//! The transport is deliberately dumb (one request, classified errors, no
//! retries) so the retry policy lives in exactly one place and tests can
//! swap in a scripted transport.
pub mod retry;
pub mod testing;
pub mod transport;

pub use retry::with_retry;
pub use transport::{EthRpc, HttpTransport};

use crate::abi;
use crate::address::ContractAddress;
use crate::errors::{RpcCallError, RpcResult};
use crate::rate_gate::RateGate;
use serde_json::json;
use std::sync::Arc;

/// `eth_call` against `contract` with prebuilt call data, returning the raw
/// hex result string.
pub async fn eth_call(rpc: &dyn EthRpc, contract: &ContractAddress, data: &str) -> RpcResult<String> {
    let params = json!([{ "to": contract.as_str(), "data": data }, "latest"]);
    let result = rpc.call("eth_call", params).await?;
    result
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| RpcCallError::MalformedResponse("eth_call result is not a string".to_string()))
}

/// Current block height, used as a connectivity preflight.
pub async fn eth_block_number(rpc: &dyn EthRpc) -> RpcResult<u64> {
    let result = rpc.call("eth_blockNumber", json!([])).await?;
    let raw = result
        .as_str()
        .ok_or_else(|| RpcCallError::MalformedResponse("eth_blockNumber result is not a string".to_string()))?;
    abi::decode_uint(raw)
}

/// Block header (and optionally bodies) at a given height. Only the header
/// fields are consumed here.
pub async fn eth_get_block_by_number(rpc: &dyn EthRpc, number: u64) -> RpcResult<serde_json::Value> {
    let params = json!([format!("0x{:x}", number), false]);
    rpc.call("eth_getBlockByNumber", params).await
}

/// Transport + rate gate + retry policy bundled for the probing components.
///
/// Each attempt (including retries) re-acquires the gate, so retried calls
/// consume rate budget like any other call.
#[derive(Clone)]
pub struct GatedRpc {
    transport: Arc<dyn EthRpc>,
    gate: Arc<RateGate>,
    max_attempts: u32,
}

impl GatedRpc {
    pub fn new(transport: Arc<dyn EthRpc>, gate: Arc<RateGate>, max_attempts: u32) -> Self {
        Self {
            transport,
            gate,
            max_attempts,
        }
    }

    pub async fn eth_call(&self, contract: &ContractAddress, data: &str) -> RpcResult<String> {
        with_retry(self.max_attempts, || {
            let transport = Arc::clone(&self.transport);
            let gate = Arc::clone(&self.gate);
            let contract = contract.clone();
            let data = data.to_string();
            async move {
                let _guard = gate.acquire().await;
                eth_call(&*transport, &contract, &data).await
            }
        })
        .await
    }

    pub async fn block_number(&self) -> RpcResult<u64> {
        with_retry(self.max_attempts, || {
            let transport = Arc::clone(&self.transport);
            let gate = Arc::clone(&self.gate);
            async move {
                let _guard = gate.acquire().await;
                eth_block_number(&*transport).await
            }
        })
        .await
    }

    pub async fn block_by_number(&self, number: u64) -> RpcResult<serde_json::Value> {
        with_retry(self.max_attempts, || {
            let transport = Arc::clone(&self.transport);
            let gate = Arc::clone(&self.gate);
            async move {
                let _guard = gate.acquire().await;
                eth_get_block_by_number(&*transport, number).await
            }
        })
        .await
    }
}
