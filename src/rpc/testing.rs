//! Scripted transport for tests
//!
//! Lets unit and integration tests drive the checker with deterministic
//! responses while recording every call that reached the wire layer.
use crate::abi;
use crate::errors::{RpcCallError, RpcResult};
use crate::rpc::transport::EthRpc;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
}

impl RecordedCall {
    /// `data` field of an `eth_call`, empty for other methods.
    pub fn call_data(&self) -> &str {
        self.params
            .get(0)
            .and_then(|p| p.get("data"))
            .and_then(Value::as_str)
            .unwrap_or("")
    }
}

type Handler = dyn Fn(usize, &str, &Value) -> RpcResult<Value> + Send + Sync;

/// Transport whose behavior is a closure of (sequence number, method,
/// params). Errors are constructed fresh per call since they are not Clone.
pub struct MockTransport {
    handler: Box<Handler>,
    log: Mutex<Vec<RecordedCall>>,
    seq: AtomicUsize,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(usize, &str, &Value) -> RpcResult<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            log: Mutex::new(Vec::new()),
            seq: AtomicUsize::new(0),
        }
    }

    /// Transport that fails every call the same way.
    pub fn always_failing<F>(make_err: F) -> Self
    where
        F: Fn() -> RpcCallError + Send + Sync + 'static,
    {
        Self::new(move |_, _, _| Err(make_err()))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.log.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log.lock().unwrap().len()
    }

    /// Number of recorded `eth_call`s whose data starts with the given
    /// 4-byte selector.
    pub fn calls_with_selector(&self, selector: &str) -> usize {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.method == "eth_call" && abi::is_call_for(c.call_data(), selector))
            .count()
    }
}

#[async_trait]
impl EthRpc for MockTransport {
    async fn call(&self, method: &str, params: Value) -> RpcResult<Value> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(RecordedCall {
            method: method.to_string(),
            params: params.clone(),
        });
        (self.handler)(seq, method, &params)
    }
}
