//! Validated Ethereum address value types
//!
//! Wallet and contract addresses are normalized once at the boundary
//! (lower-case, `0x`-prefixed, 20 bytes) so every cache key and every
//! case-insensitive owner comparison downstream can use plain string
//! equality.
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

fn normalize(input: &str) -> Result<String, ConfigError> {
    let trimmed = input.trim();
    let hex = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| ConfigError::InvalidAddress {
            address: input.to_string(),
            reason: "missing 0x prefix".to_string(),
        })?;

    if hex.len() != 40 {
        return Err(ConfigError::InvalidAddress {
            address: input.to_string(),
            reason: format!("expected 40 hex chars, got {}", hex.len()),
        });
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ConfigError::InvalidAddress {
            address: input.to_string(),
            reason: "non-hex character".to_string(),
        });
    }

    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

/// Normalized wallet address. Construct through [`WalletAddress::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        normalize(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalized token contract address. Same shape as [`WalletAddress`] but
/// kept as a distinct type so the two cannot be swapped at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractAddress(String);

impl ContractAddress {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        normalize(input).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
