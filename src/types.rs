//! Shared value types for the holdings checker
//!
//! These are the types that cross component boundaries: the detected token
//! standard, probe results and the tri-state ownership verdict the pass
//! resolver hands back to callers.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Token standard implemented by a contract, probed via ERC-165.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStandard {
    Unknown,
    Erc721,
    Erc1155,
}

impl std::fmt::Display for TokenStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenStandard::Unknown => write!(f, "unknown"),
            TokenStandard::Erc721 => write!(f, "ERC-721"),
            TokenStandard::Erc1155 => write!(f, "ERC-1155"),
        }
    }
}

/// Outcome of a balance probe for a (wallet, contract) pair.
///
/// `success == false` means no RPC call for this pair returned a usable
/// result; `count` is then meaningless and must never be cached as a
/// definitive zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceResult {
    pub count: u64,
    pub standard_used: TokenStandard,
    pub success: bool,
}

impl BalanceResult {
    pub fn failed() -> Self {
        Self {
            count: 0,
            standard_used: TokenStandard::Unknown,
            success: false,
        }
    }
}

/// Tri-state ownership verdict.
///
/// `Unknown` is returned only when every RPC attempt failed. It tells the
/// caller to preserve prior externally-visible state (a granted role, for
/// example) rather than to treat the wallet as confirmed empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipVerdict {
    Owned,
    NotOwned,
    Unknown,
}

impl std::fmt::Display for OwnershipVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnershipVerdict::Owned => write!(f, "owned"),
            OwnershipVerdict::NotOwned => write!(f, "not owned"),
            OwnershipVerdict::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-call options accepted by the top-level checker entry points.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Skip cache reads for this call. The fresh result is still written
    /// back, refreshing the TTL window.
    pub bypass_cache: bool,
    /// Additionally ignore the deep-scan TTL gate, forcing the expensive
    /// scan to run again when it would otherwise be skipped.
    pub force_refresh: bool,
    /// Allow the per-token-ID deep scan to run when the cheap aggregate
    /// probe finds nothing. Expensive; see the scanner docs.
    pub allow_deep_scan: bool,
    /// Specific token ID the caller is interested in. Prepended to the
    /// ERC-1155 probe ID set and part of the holdings cache key.
    pub token_id: Option<u64>,
}

/// Cache-aware token count for an aggregate-balance collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionCount {
    pub count: u64,
    pub standard_used: TokenStandard,
    pub success: bool,
}

/// Pass-collection verdict plus enough metadata for the caller to act.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStatus {
    pub verdict: OwnershipVerdict,
    pub checked_at: DateTime<Utc>,
}

impl PassStatus {
    pub fn new(verdict: OwnershipVerdict) -> Self {
        Self {
            verdict,
            checked_at: Utc::now(),
        }
    }
}
