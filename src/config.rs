//! Runtime configuration
//!
//! Loadable from a TOML file, with every field overridable through
//! `NFTGATE_*` environment variables. Defaults are deliberately below the
//! provider's documented ceilings.
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON-RPC endpoint of an Ethereum-compatible node.
    pub rpc_url: String,
    /// Contract of the non-enumerable pass collection checked by
    /// `get_pass_status`.
    pub pass_contract: String,

    /// Maximum simultaneously in-flight RPC calls.
    pub concurrency: usize,
    /// RPC calls admitted per rolling one-second window.
    pub rate_per_second: u32,
    /// Per-request HTTP timeout.
    pub request_timeout_ms: u64,
    /// Attempts per call for transient failures (1 = no retries).
    pub max_attempts: u32,

    /// Wallets per batch in `check_wallets`.
    pub batch_size: usize,
    /// Pause between batches, smoothing account-level load beyond the raw
    /// request rate.
    pub batch_delay_ms: u64,

    pub holdings_ttl_secs: u64,
    pub pass_status_ttl_secs: u64,
    pub deep_scan_ttl_secs: u64,
    pub standard_ttl_secs: u64,

    /// Highest token ID walked by the deep scanner. Empirically chosen for
    /// the known pass collection, not derived from contract metadata;
    /// ownership detection is only complete up to this cap.
    pub deep_scan_max_token_id: u64,
    /// Candidate IDs for the ERC-1155 aggregate probe.
    pub erc1155_probe_ids: Vec<u64>,
    /// ID range for the scanner's last-resort ERC-1155 probe.
    pub erc1155_fallback_id_range: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            pass_contract: String::new(),
            concurrency: 5,
            rate_per_second: 20,
            request_timeout_ms: 15_000,
            max_attempts: 3,
            batch_size: 50,
            batch_delay_ms: 1_200,
            holdings_ttl_secs: 86_400,
            pass_status_ttl_secs: 86_400,
            deep_scan_ttl_secs: 86_400,
            standard_ttl_secs: 604_800,
            deep_scan_max_token_id: 777,
            erc1155_probe_ids: vec![0, 1, 2, 3, 4],
            erc1155_fallback_id_range: 32,
        }
    }
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = env::var(key) {
        if let Ok(value) = raw.parse::<T>() {
            *target = value;
        }
    }
}

impl Config {
    /// Parse a TOML config file, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config: Config = toml::from_str(&raw).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn apply_env(&mut self) {
        env_override("NFTGATE_RPC_URL", &mut self.rpc_url);
        env_override("NFTGATE_PASS_CONTRACT", &mut self.pass_contract);
        env_override("NFTGATE_CONCURRENCY", &mut self.concurrency);
        env_override("NFTGATE_RATE_PER_SECOND", &mut self.rate_per_second);
        env_override("NFTGATE_REQUEST_TIMEOUT_MS", &mut self.request_timeout_ms);
        env_override("NFTGATE_MAX_ATTEMPTS", &mut self.max_attempts);
        env_override("NFTGATE_BATCH_SIZE", &mut self.batch_size);
        env_override("NFTGATE_BATCH_DELAY_MS", &mut self.batch_delay_ms);
        env_override("NFTGATE_HOLDINGS_TTL_SECS", &mut self.holdings_ttl_secs);
        env_override("NFTGATE_PASS_STATUS_TTL_SECS", &mut self.pass_status_ttl_secs);
        env_override("NFTGATE_DEEP_SCAN_TTL_SECS", &mut self.deep_scan_ttl_secs);
        env_override("NFTGATE_STANDARD_TTL_SECS", &mut self.standard_ttl_secs);
        env_override(
            "NFTGATE_DEEP_SCAN_MAX_TOKEN_ID",
            &mut self.deep_scan_max_token_id,
        );
        env_override(
            "NFTGATE_ERC1155_FALLBACK_ID_RANGE",
            &mut self.erc1155_fallback_id_range,
        );
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.is_empty() {
            return Err(ConfigError::MissingField("rpc_url"));
        }
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidField {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.rate_per_second == 0 {
            return Err(ConfigError::InvalidField {
                field: "rate_per_second",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidField {
                field: "max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
