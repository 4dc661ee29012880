//! nftgate: direct JSON-RPC NFT ownership checks
//!
//! Determines whether a wallet owns tokens in one or more on-chain
//! collections by talking to an Ethereum JSON-RPC endpoint directly, no
//! third-party indexer. Built around three constraints:
//! - the provider enforces a hard requests-per-second ceiling (shared rate
//!   gate with bounded concurrency)
//! - the token standard of a contract is not known up front (ERC-165
//!   detection with multi-strategy probe fallback)
//! - one "pass" collection has no cheap enumeration and may need a bounded
//!   per-token-ID scan, too expensive to repeat often (TTL-gated deep scan)
//!
//! Entry point is [`HoldingsChecker`]; everything else is plumbing it
//! composes.

pub mod abi;
pub mod address;
pub mod cache;
pub mod checker;
pub mod config;
pub mod detector;
pub mod errors;
pub mod logger;
pub mod prober;
pub mod rate_gate;
pub mod rpc;
pub mod scanner;
pub mod types;

pub use address::{ContractAddress, WalletAddress};
pub use checker::HoldingsChecker;
pub use config::Config;
pub use errors::{ConfigError, RpcCallError};
pub use types::{
    BalanceResult, CheckOptions, CollectionCount, OwnershipVerdict, PassStatus, TokenStandard,
};
