//! Structured error handling for the holdings checker
//!
//! The RPC taxonomy drives the retry policy: transient errors (429, timeout,
//! connection reset) are retried with backoff, everything else fails the
//! individual probe immediately. Probe-level failures are swallowed by the
//! callers as "no signal"; only a round where every signal is absent
//! escalates to an `Unknown` verdict.
use thiserror::Error;

/// Classified failure of a single JSON-RPC call.
#[derive(Debug, Error)]
pub enum RpcCallError {
    /// Provider rejected the request with HTTP 429 or a rate-limit payload.
    #[error("rate limited by provider")]
    RateLimited,

    /// Request did not complete within the configured timeout.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Connection dropped or could not be established.
    #[error("connection reset: {0}")]
    ConnectionReset(String),

    /// Well-formed JSON-RPC error response from the provider.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The contract reverted the call (e.g. `ownerOf` on a burned token).
    #[error("execution reverted: {0}")]
    ContractRevert(String),

    /// Response was not valid JSON-RPC or carried an unusable result.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Any other HTTP-level failure.
    #[error("http error: {0}")]
    Http(String),
}

impl RpcCallError {
    /// Whether the retry wrapper should try this call again.
    ///
    /// Retrying a logical error (revert, malformed call) wastes rate budget
    /// and delays the caller without benefit, so only network-shaped
    /// failures qualify.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcCallError::RateLimited
                | RpcCallError::Timeout { .. }
                | RpcCallError::ConnectionReset(_)
        )
    }
}

pub type RpcResult<T> = Result<T, RpcCallError>;

/// Boundary validation errors: malformed addresses, bad endpoint URLs,
/// unreadable config files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid rpc url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("missing config field '{0}'")]
    MissingField(&'static str),

    #[error("invalid config field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("failed to read config file '{path}': {reason}")]
    FileRead { path: String, reason: String },

    #[error("failed to parse config file '{path}': {reason}")]
    FileParse { path: String, reason: String },
}
