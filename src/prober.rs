//! Balance probing with multi-strategy fallback
//!
//! ERC-721 exposes a wallet-level `balanceOf(address)`; ERC-1155 has no
//! aggregate call, so a small fixed set of candidate token IDs is probed
//! with `balanceOf(address,uint256)`, short-circuiting on the first nonzero
//! balance. When the standard is unknown the ERC-721 path is attempted
//! first with the ERC-1155 probe as fallback.
//!
//! A single probe erroring (e.g. execution reverted) contributes no signal
//! but is not fatal; only exhaustion of every candidate constitutes failure.
use crate::abi;
use crate::address::{ContractAddress, WalletAddress};
use crate::errors::RpcResult;
use crate::rpc::GatedRpc;
use crate::types::{BalanceResult, TokenStandard};
use log::debug;

pub struct BalanceProber {
    probe_ids: Vec<u64>,
}

impl BalanceProber {
    pub fn new(probe_ids: Vec<u64>) -> Self {
        Self { probe_ids }
    }

    /// Owned-token count for a wallet/contract pair using the detected
    /// standard. Never returns an error: total failure is expressed as
    /// `success == false`.
    pub async fn probe(
        &self,
        rpc: &GatedRpc,
        wallet: &WalletAddress,
        contract: &ContractAddress,
        standard: TokenStandard,
        asked_id: Option<u64>,
    ) -> BalanceResult {
        match standard {
            TokenStandard::Erc721 => match self.erc721_balance(rpc, wallet, contract).await {
                Ok(count) => BalanceResult {
                    count,
                    standard_used: TokenStandard::Erc721,
                    success: true,
                },
                Err(err) => {
                    debug!("balanceOf(address) failed on {}: {}", contract, err);
                    BalanceResult::failed()
                }
            },
            TokenStandard::Erc1155 => self.erc1155_probe(rpc, wallet, contract, asked_id).await,
            TokenStandard::Unknown => {
                // Try the ERC-721 shape first; fall back to the ERC-1155
                // multi-ID probe if it yields nothing usable.
                if let Ok(count) = self.erc721_balance(rpc, wallet, contract).await {
                    return BalanceResult {
                        count,
                        standard_used: TokenStandard::Erc721,
                        success: true,
                    };
                }
                debug!(
                    "{} did not answer balanceOf(address), trying ERC-1155 probe",
                    contract
                );
                self.erc1155_probe(rpc, wallet, contract, asked_id).await
            }
        }
    }

    async fn erc721_balance(
        &self,
        rpc: &GatedRpc,
        wallet: &WalletAddress,
        contract: &ContractAddress,
    ) -> RpcResult<u64> {
        let raw = rpc.eth_call(contract, &abi::encode_balance_of(wallet)).await?;
        abi::decode_uint(&raw)
    }

    /// Probe `{asked_id, 0, 1, 2, 3, 4}` (deduplicated, configured set),
    /// returning the first nonzero balance found.
    async fn erc1155_probe(
        &self,
        rpc: &GatedRpc,
        wallet: &WalletAddress,
        contract: &ContractAddress,
        asked_id: Option<u64>,
    ) -> BalanceResult {
        let mut ids: Vec<u64> = Vec::with_capacity(self.probe_ids.len() + 1);
        if let Some(id) = asked_id {
            ids.push(id);
        }
        for &id in &self.probe_ids {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        let mut any_success = false;
        for id in ids {
            let data = abi::encode_balance_of_id(wallet, id);
            match rpc.eth_call(contract, &data).await {
                Ok(raw) => match abi::decode_uint(&raw) {
                    Ok(count) => {
                        any_success = true;
                        if count > 0 {
                            return BalanceResult {
                                count,
                                standard_used: TokenStandard::Erc1155,
                                success: true,
                            };
                        }
                    }
                    Err(err) => debug!("unusable balanceOf(address,{}) result: {}", id, err),
                },
                Err(err) => debug!("balanceOf(address,{}) failed on {}: {}", id, contract, err),
            }
        }

        if any_success {
            BalanceResult {
                count: 0,
                standard_used: TokenStandard::Erc1155,
                success: true,
            }
        } else {
            BalanceResult::failed()
        }
    }
}
