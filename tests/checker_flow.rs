//! End-to-end checker flows against a scripted transport.

use nftgate::abi;
use nftgate::rpc::testing::MockTransport;
use nftgate::{
    CheckOptions, Config, ContractAddress, HoldingsChecker, OwnershipVerdict, RpcCallError,
    TokenStandard, WalletAddress,
};
use serde_json::Value;
use std::sync::Arc;

const WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const CONTRACT: &str = "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const OTHER_OWNER: &str = "0xcccccccccccccccccccccccccccccccccccccccc";

fn test_config() -> Config {
    Config {
        pass_contract: CONTRACT.to_string(),
        rate_per_second: 1000,
        deep_scan_max_token_id: 20,
        erc1155_fallback_id_range: 4,
        batch_size: 2,
        ..Config::default()
    }
}

fn wallet() -> WalletAddress {
    WalletAddress::parse(WALLET).unwrap()
}

fn contract() -> ContractAddress {
    ContractAddress::parse(CONTRACT).unwrap()
}

fn uint(v: u64) -> Value {
    Value::String(abi::uint_word(v))
}

fn owner(addr: &str) -> Value {
    Value::String(abi::address_word(addr))
}

fn call_data(params: &Value) -> String {
    params
        .get(0)
        .and_then(|p| p.get("data"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn supports_interface_id(data: &str) -> &str {
    // selector is 8 hex chars after "0x"; the bytes4 argument follows
    &data[10..18]
}

fn token_id_arg(data: &str) -> u64 {
    u64::from_str_radix(&data[data.len() - 16..], 16).unwrap()
}

#[tokio::test]
async fn test_end_to_end_erc721_count_cache_and_bypass() {
    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else if abi::is_call_for(&data, abi::SEL_BALANCE_OF) {
            Ok(uint(3))
        } else {
            Err(RpcCallError::ContractRevert("unexpected call".to_string()))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport.clone()).unwrap();
    let opts = CheckOptions::default();

    // fresh check: one supportsInterface + one balanceOf
    let result = checker
        .get_collection_count(&wallet(), &contract(), opts)
        .await;
    assert_eq!(result.count, 3);
    assert_eq!(result.standard_used, TokenStandard::Erc721);
    assert!(result.success);
    assert_eq!(transport.call_count(), 2);

    // within the TTL window: identical value, zero new RPC calls
    let cached = checker
        .get_collection_count(&wallet(), &contract(), opts)
        .await;
    assert_eq!(cached, result);
    assert_eq!(transport.call_count(), 2);

    // bypass: exactly one fresh balanceOf (detection is cached separately)
    let fresh = checker
        .get_collection_count(
            &wallet(),
            &contract(),
            CheckOptions {
                bypass_cache: true,
                ..Default::default()
            },
        )
        .await;
    assert_eq!(fresh.count, 3);
    assert_eq!(transport.call_count(), 3);
    assert_eq!(transport.calls_with_selector(abi::SEL_BALANCE_OF), 2);
}

#[tokio::test(start_paused = true)]
async fn test_anti_flapping_unknown_on_total_failure() {
    let transport = Arc::new(MockTransport::always_failing(|| RpcCallError::Timeout {
        timeout_ms: 15_000,
    }));

    let mut config = test_config();
    config.deep_scan_max_token_id = 5;
    config.max_attempts = 2;
    let checker = HoldingsChecker::with_transport(config, transport).unwrap();

    let status = checker
        .get_pass_status(
            &wallet(),
            Some(true),
            CheckOptions {
                allow_deep_scan: true,
                ..Default::default()
            },
        )
        .await;

    // never NotOwned on a dead transport: the caller keeps current state
    assert_eq!(status.verdict, OwnershipVerdict::Unknown);
}

#[tokio::test(start_paused = true)]
async fn test_previous_verdict_survives_outage() {
    // Succeed for the first round (detection + balance), then go dark.
    let transport = Arc::new(MockTransport::new(|seq, _, params| {
        if seq >= 2 {
            return Err(RpcCallError::ConnectionReset("gone".to_string()));
        }
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else {
            Ok(uint(1))
        }
    }));

    let mut config = test_config();
    config.pass_status_ttl_secs = 0; // every entry is immediately stale
    config.max_attempts = 2;
    let checker = HoldingsChecker::with_transport(config, transport).unwrap();
    let opts = CheckOptions::default();

    let first = checker.get_pass_status(&wallet(), None, opts).await;
    assert_eq!(first.verdict, OwnershipVerdict::Owned);

    // Cache entry has expired and the transport is down; the previous
    // externally-known verdict is preserved instead of flapping.
    let second = checker.get_pass_status(&wallet(), None, opts).await;
    assert_eq!(second.verdict, OwnershipVerdict::Owned);
}

#[tokio::test]
async fn test_unknown_standard_falls_back_to_erc1155_probe() {
    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_BALANCE_OF_ID) {
            Ok(uint(2))
        } else {
            // supportsInterface and balanceOf(address) both revert
            Err(RpcCallError::ContractRevert("no such function".to_string()))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport.clone()).unwrap();
    let result = checker
        .get_collection_count(&wallet(), &contract(), CheckOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.count, 2);
    assert_eq!(result.standard_used, TokenStandard::Erc1155);
    // first candidate ID already answered nonzero
    assert_eq!(transport.calls_with_selector(abi::SEL_BALANCE_OF_ID), 1);
}

#[tokio::test]
async fn test_deep_scan_short_circuits_on_first_match() {
    const MATCH_ID: u64 = 7;

    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            Ok(uint(0))
        } else if abi::is_call_for(&data, abi::SEL_BALANCE_OF) {
            // aggregate probe finds nothing, forcing the scan
            Ok(uint(0))
        } else if abi::is_call_for(&data, abi::SEL_OWNER_OF) {
            if token_id_arg(&data) == MATCH_ID {
                Ok(owner(WALLET))
            } else {
                Ok(owner(OTHER_OWNER))
            }
        } else {
            Err(RpcCallError::ContractRevert("unexpected call".to_string()))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport.clone()).unwrap();
    let status = checker
        .get_pass_status(
            &wallet(),
            None,
            CheckOptions {
                allow_deep_scan: true,
                ..Default::default()
            },
        )
        .await;

    assert_eq!(status.verdict, OwnershipVerdict::Owned);
    // ascending scan stops at the match: exactly MATCH_ID + 1 ownerOf calls
    assert_eq!(
        transport.calls_with_selector(abi::SEL_OWNER_OF) as u64,
        MATCH_ID + 1
    );
}

#[tokio::test]
async fn test_deep_scan_result_is_ttl_gated() {
    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_OWNER_OF) {
            Ok(owner(OTHER_OWNER))
        } else {
            // standard detection fails, aggregate probe sees zero
            Ok(uint(0))
        }
    }));

    let mut config = test_config();
    config.pass_status_ttl_secs = 0; // force re-resolution each round
    let checker = HoldingsChecker::with_transport(config, transport.clone()).unwrap();
    let opts = CheckOptions {
        allow_deep_scan: true,
        ..Default::default()
    };

    let first = checker.get_pass_status(&wallet(), None, opts).await;
    assert_eq!(first.verdict, OwnershipVerdict::NotOwned);
    let scans_after_first = transport.calls_with_selector(abi::SEL_OWNER_OF);
    assert_eq!(scans_after_first as u64, 21); // full 0..=20 range

    // second round repeats the cheap probe but reuses the scan verdict
    let second = checker.get_pass_status(&wallet(), None, opts).await;
    assert_eq!(second.verdict, OwnershipVerdict::NotOwned);
    assert_eq!(
        transport.calls_with_selector(abi::SEL_OWNER_OF),
        scans_after_first
    );
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_through_the_stack() {
    // First two wire calls are rate-limited, everything after succeeds.
    let transport = Arc::new(MockTransport::new(|seq, _, params| {
        if seq < 2 {
            return Err(RpcCallError::RateLimited);
        }
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else {
            Ok(uint(5))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport.clone()).unwrap();
    let result = checker
        .get_collection_count(&wallet(), &contract(), CheckOptions::default())
        .await;

    assert!(result.success);
    assert_eq!(result.count, 5);
    // 2 failed attempts + successful supportsInterface + balanceOf
    assert_eq!(transport.call_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_batch_checks_cover_all_wallets() {
    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else {
            Ok(uint(1))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport).unwrap();

    let wallets: Vec<WalletAddress> = (0..5)
        .map(|i| WalletAddress::parse(&format!("0x{:040x}", 0xd000 + i)).unwrap())
        .collect();

    let results = checker
        .check_wallets(&wallets, CheckOptions::default())
        .await;

    assert_eq!(results.len(), 5);
    assert!(results
        .iter()
        .all(|s| s.verdict == OwnershipVerdict::Owned));
}

#[tokio::test]
async fn test_pass_status_cache_hit_returns_same_answer() {
    let transport = Arc::new(MockTransport::new(|_, _, params| {
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else {
            Ok(uint(1))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport.clone()).unwrap();
    let opts = CheckOptions::default();

    let first = checker.get_pass_status(&wallet(), None, opts).await;
    let calls = transport.call_count();

    let second = checker.get_pass_status(&wallet(), None, opts).await;
    assert_eq!(second, first);
    assert_eq!(transport.call_count(), calls);
}

#[tokio::test]
async fn test_failed_probe_is_not_cached_as_zero() {
    let transport = Arc::new(MockTransport::new(|seq, _, params| {
        // Whole first round errors logically (no retries); later rounds
        // answer properly.
        if seq < 8 {
            return Err(RpcCallError::ContractRevert("broken".to_string()));
        }
        let data = call_data(params);
        if abi::is_call_for(&data, abi::SEL_SUPPORTS_INTERFACE) {
            let yes = supports_interface_id(&data) == abi::ERC721_INTERFACE_ID;
            Ok(uint(yes as u64))
        } else {
            Ok(uint(4))
        }
    }));

    let checker = HoldingsChecker::with_transport(test_config(), transport).unwrap();
    let opts = CheckOptions::default();

    let failed = checker
        .get_collection_count(&wallet(), &contract(), opts)
        .await;
    assert!(!failed.success);

    // The failure was not cached: the next call reaches the transport and
    // gets the real answer.
    let ok = checker
        .get_collection_count(&wallet(), &contract(), opts)
        .await;
    assert!(ok.success);
    assert_eq!(ok.count, 4);
}
