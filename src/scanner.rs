//! Deep per-token-ID ownership scan
//!
//! Used only for the pass collection, which has no aggregate balance call,
//! and only when the cheap probe found nothing. Walks `ownerOf(tokenId)`
//! in ascending order up to the configured cap, short-circuiting on the
//! first token owned by the target wallet, so the lowest matching token ID
//! wins deterministically.
//!
//! Every call passes the rate gate like any other, so a full scan is
//! bounded by gate throughput (roughly 40 seconds for ~800 IDs at 20/s).
//! Callers must treat this as a long-running operation.
use crate::abi;
use crate::address::{ContractAddress, WalletAddress};
use crate::rpc::GatedRpc;
use crate::types::OwnershipVerdict;
use log::{debug, info, warn};

pub struct DeepScanner {
    max_token_id: u64,
    fallback_id_range: u64,
}

impl DeepScanner {
    pub fn new(max_token_id: u64, fallback_id_range: u64) -> Self {
        Self {
            max_token_id,
            fallback_id_range,
        }
    }

    /// Scan token IDs `0..=max_token_id` for one owned by `wallet`.
    ///
    /// Returns `Owned` on the first match, `NotOwned` when the full range
    /// completed with at least one successful call and no match, and
    /// `Unknown` only when every call failed (after the ERC-1155 fallback
    /// probe also came up empty-handed).
    pub async fn deep_scan(
        &self,
        rpc: &GatedRpc,
        wallet: &WalletAddress,
        contract: &ContractAddress,
    ) -> OwnershipVerdict {
        info!(
            "deep scan of {} for {} (token ids 0..={})",
            contract, wallet, self.max_token_id
        );

        let mut any_success = false;
        for token_id in 0..=self.max_token_id {
            match rpc.eth_call(contract, &abi::encode_owner_of(token_id)).await {
                Ok(raw) => {
                    any_success = true;
                    match abi::decode_address(&raw) {
                        Ok(owner) if owner == wallet.as_str() => {
                            info!("deep scan match: token {} owned by {}", token_id, wallet);
                            return OwnershipVerdict::Owned;
                        }
                        Ok(_) => {}
                        Err(err) => debug!("unusable ownerOf({}) result: {}", token_id, err),
                    }
                }
                Err(err) => debug!("ownerOf({}) failed: {}", token_id, err),
            }
        }

        if any_success {
            debug!("deep scan of {} complete, no match for {}", contract, wallet);
            return OwnershipVerdict::NotOwned;
        }

        // ownerOf answered nothing at all; the contract may be a pure
        // ERC-1155. Probe a small ID range via balanceOf(address,id) as a
        // last resort before conceding.
        warn!(
            "ownerOf unsupported on {}, falling back to ERC-1155 id probe",
            contract
        );
        self.erc1155_fallback(rpc, wallet, contract).await
    }

    async fn erc1155_fallback(
        &self,
        rpc: &GatedRpc,
        wallet: &WalletAddress,
        contract: &ContractAddress,
    ) -> OwnershipVerdict {
        let mut any_success = false;
        for token_id in 0..self.fallback_id_range {
            let data = abi::encode_balance_of_id(wallet, token_id);
            match rpc.eth_call(contract, &data).await {
                Ok(raw) => {
                    if let Ok(count) = abi::decode_uint(&raw) {
                        any_success = true;
                        if count > 0 {
                            return OwnershipVerdict::Owned;
                        }
                    }
                }
                Err(err) => debug!("fallback balanceOf(address,{}) failed: {}", token_id, err),
            }
        }

        if any_success {
            OwnershipVerdict::NotOwned
        } else {
            OwnershipVerdict::Unknown
        }
    }
}
