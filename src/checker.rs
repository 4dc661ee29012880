//! Top-level holdings checker and pass status resolver
//!
//! Ties the cache, detector, prober and scanner together behind the two
//! calls external collaborators use: `get_collection_count` for
//! aggregate-balance collections and `get_pass_status` for the
//! non-enumerable pass collection. Neither call returns an error for RPC
//! degradation; total failure degrades to the cached previous value or an
//! `Unknown` verdict so the caller (a bot command, a scheduled job) stays
//! responsive while the chain RPC is down.
use crate::address::{ContractAddress, WalletAddress};
use crate::cache::{CacheConfig, TtlCache};
use crate::config::Config;
use crate::detector::StandardDetector;
use crate::errors::{ConfigError, RpcResult};
use crate::prober::BalanceProber;
use crate::rate_gate::RateGate;
use crate::rpc::{EthRpc, GatedRpc, HttpTransport};
use crate::scanner::DeepScanner;
use crate::types::{CheckOptions, CollectionCount, OwnershipVerdict, PassStatus};
use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

type HoldingsKey = (WalletAddress, ContractAddress, Option<u64>);

pub struct HoldingsChecker {
    rpc: GatedRpc,
    detector: StandardDetector,
    prober: BalanceProber,
    scanner: DeepScanner,
    pass_contract: Option<ContractAddress>,
    batch_size: usize,
    batch_delay: Duration,
    holdings_cache: TtlCache<HoldingsKey, CollectionCount>,
    pass_cache: TtlCache<WalletAddress, PassStatus>,
    deep_scan_cache: TtlCache<WalletAddress, OwnershipVerdict>,
}

impl HoldingsChecker {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(
            &config.rpc_url,
            Duration::from_millis(config.request_timeout_ms),
        )?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Construct around an injected transport. This is how tests drive the
    /// checker with a scripted mock; every other component is built from
    /// the config exactly as in production.
    pub fn with_transport(
        config: Config,
        transport: Arc<dyn EthRpc>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let pass_contract = if config.pass_contract.is_empty() {
            None
        } else {
            Some(ContractAddress::parse(&config.pass_contract)?)
        };

        let gate = Arc::new(RateGate::new(config.concurrency, config.rate_per_second));
        let rpc = GatedRpc::new(transport, gate, config.max_attempts);

        Ok(Self {
            rpc,
            detector: StandardDetector::new(CacheConfig::standard(config.standard_ttl_secs)),
            prober: BalanceProber::new(config.erc1155_probe_ids.clone()),
            scanner: DeepScanner::new(
                config.deep_scan_max_token_id,
                config.erc1155_fallback_id_range,
            ),
            pass_contract,
            batch_size: config.batch_size.max(1),
            batch_delay: Duration::from_millis(config.batch_delay_ms),
            holdings_cache: TtlCache::new(CacheConfig::holdings(config.holdings_ttl_secs)),
            pass_cache: TtlCache::new(CacheConfig::pass_status(config.pass_status_ttl_secs)),
            deep_scan_cache: TtlCache::new(CacheConfig::deep_scan(config.deep_scan_ttl_secs)),
        })
    }

    /// Connectivity preflight: resolve the head block number and log its
    /// timestamp so a stalled node is visible early.
    pub async fn preflight(&self) -> RpcResult<u64> {
        let head = self.rpc.block_number().await?;
        if let Ok(block) = self.rpc.block_by_number(head).await {
            let timestamp = block
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(|raw| crate::abi::decode_uint(raw).ok());
            if let Some(ts) = timestamp {
                debug!("head block {} has timestamp {}", head, ts);
            }
        }
        Ok(head)
    }

    /// Best-effort, cache-aware token count for an aggregate-balance
    /// collection. Failed probes are never cached as a definitive zero.
    pub async fn get_collection_count(
        &self,
        wallet: &WalletAddress,
        contract: &ContractAddress,
        opts: CheckOptions,
    ) -> CollectionCount {
        let key = (wallet.clone(), contract.clone(), opts.token_id);

        if !opts.bypass_cache {
            if let Some(hit) = self.holdings_cache.get(&key) {
                debug!("holdings cache hit for {} on {}", wallet, contract);
                return hit;
            }
        }

        let standard = self.detector.detect(&self.rpc, contract).await;
        let probe = self
            .prober
            .probe(&self.rpc, wallet, contract, standard, opts.token_id)
            .await;

        let result = CollectionCount {
            count: probe.count,
            standard_used: probe.standard_used,
            success: probe.success,
        };

        if result.success {
            self.holdings_cache.insert(key, result.clone());
        } else {
            warn!(
                "no usable balance result for {} on {}, not caching",
                wallet, contract
            );
        }

        result
    }

    /// Tri-state pass-collection verdict.
    ///
    /// `prior_state` is the caller's authoritative knowledge (e.g. a
    /// currently-granted role); it only matters when every RPC attempt
    /// failed and no previous verdict is cached, in which case the caller
    /// is told `Unknown` and must keep its current state.
    pub async fn get_pass_status(
        &self,
        wallet: &WalletAddress,
        prior_state: Option<bool>,
        opts: CheckOptions,
    ) -> PassStatus {
        let Some(contract) = self.pass_contract.clone() else {
            warn!("pass_contract not configured, pass status is unknown");
            return PassStatus::new(OwnershipVerdict::Unknown);
        };

        // Snapshot the previous externally-known verdict before get() can
        // lazily evict an expired entry.
        let previous = self.pass_cache.get_stale(wallet).map(|p| p.verdict);

        if !opts.bypass_cache {
            if let Some(hit) = self.pass_cache.get(wallet) {
                debug!("pass status cache hit for {}", wallet);
                return hit;
            }
        }

        let standard = self.detector.detect(&self.rpc, &contract).await;
        let probe = self
            .prober
            .probe(&self.rpc, wallet, &contract, standard, None)
            .await;

        let mut verdict = match (probe.success, probe.count) {
            (true, 0) => OwnershipVerdict::NotOwned,
            (true, _) => OwnershipVerdict::Owned,
            (false, _) => OwnershipVerdict::Unknown,
        };

        // The cheap probe found nothing; the deep scan may still turn up a
        // token, unless one ran recently enough.
        if verdict != OwnershipVerdict::Owned && opts.allow_deep_scan {
            let cached_scan = if opts.bypass_cache || opts.force_refresh {
                None
            } else {
                self.deep_scan_cache.get(wallet)
            };

            let scan_verdict = match cached_scan {
                Some(v) => {
                    debug!("deep scan cache hit for {}: {}", wallet, v);
                    v
                }
                None => {
                    let v = self.scanner.deep_scan(&self.rpc, wallet, &contract).await;
                    if v != OwnershipVerdict::Unknown {
                        self.deep_scan_cache.insert(wallet.clone(), v);
                    }
                    v
                }
            };

            match scan_verdict {
                OwnershipVerdict::Owned => verdict = OwnershipVerdict::Owned,
                OwnershipVerdict::NotOwned => {
                    if verdict == OwnershipVerdict::Unknown {
                        verdict = OwnershipVerdict::NotOwned;
                    }
                }
                OwnershipVerdict::Unknown => {}
            }
        }

        if verdict == OwnershipVerdict::Unknown {
            // Anti-flapping: a transient outage must never look like a
            // confirmed absence. Keep the previous externally-known state
            // when one exists; otherwise report Unknown and let the caller
            // hold its ground.
            if let Some(prev) = previous {
                warn!(
                    "all rpc attempts failed for {}, keeping previous verdict '{}'",
                    wallet, prev
                );
                return PassStatus::new(prev);
            }
            if prior_state == Some(true) {
                warn!(
                    "all rpc attempts failed for {} which currently holds the role; caller should keep it",
                    wallet
                );
            }
            return PassStatus::new(OwnershipVerdict::Unknown);
        }

        let status = PassStatus::new(verdict);
        self.pass_cache.insert(wallet.clone(), status.clone());
        info!("pass status for {}: {}", wallet, verdict);
        status
    }

    /// Pass-status check for many wallets, pausing between batches to
    /// smooth account-level load on the provider beyond the raw request
    /// rate. Wallets within a batch run concurrently; the rate gate bounds
    /// actual dispatch.
    pub async fn check_wallets(
        &self,
        wallets: &[WalletAddress],
        opts: CheckOptions,
    ) -> Vec<PassStatus> {
        let mut results = Vec::with_capacity(wallets.len());

        for (i, batch) in wallets.chunks(self.batch_size).enumerate() {
            if i > 0 {
                debug!("batch {} done, pausing {:?}", i, self.batch_delay);
                tokio::time::sleep(self.batch_delay).await;
            }
            let batch_results =
                join_all(batch.iter().map(|w| self.get_pass_status(w, None, opts))).await;
            results.extend(batch_results);
        }

        results
    }

    pub fn pass_contract(&self) -> Option<&ContractAddress> {
        self.pass_contract.as_ref()
    }
}
