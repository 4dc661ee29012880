//! Token standard detection via ERC-165 `supportsInterface`
//!
//! ERC-721 is probed first, then ERC-1155. Results are cached per contract
//! (not per wallet) with a long TTL since a contract's standard never
//! changes; avoiding repeat detector calls materially reduces RPC volume.
//! Inconclusive rounds are not cached, so a transient outage cannot pin a
//! contract to `Unknown` for days.
use crate::abi;
use crate::address::ContractAddress;
use crate::cache::{CacheConfig, TtlCache};
use crate::rpc::GatedRpc;
use crate::types::TokenStandard;
use log::{debug, info};

pub struct StandardDetector {
    cache: TtlCache<ContractAddress, TokenStandard>,
}

impl StandardDetector {
    pub fn new(cache_config: CacheConfig) -> Self {
        Self {
            cache: TtlCache::new(cache_config),
        }
    }

    pub async fn detect(&self, rpc: &GatedRpc, contract: &ContractAddress) -> TokenStandard {
        if let Some(standard) = self.cache.get(contract) {
            return standard;
        }

        let standard = self.probe(rpc, contract).await;
        if standard != TokenStandard::Unknown {
            info!("{} detected as {}", contract, standard);
            self.cache.insert(contract.clone(), standard);
        } else {
            debug!("{} standard inconclusive, callers fall back to multi-strategy probe", contract);
        }
        standard
    }

    async fn probe(&self, rpc: &GatedRpc, contract: &ContractAddress) -> TokenStandard {
        if self
            .supports(rpc, contract, abi::ERC721_INTERFACE_ID)
            .await
        {
            return TokenStandard::Erc721;
        }
        if self
            .supports(rpc, contract, abi::ERC1155_INTERFACE_ID)
            .await
        {
            return TokenStandard::Erc1155;
        }
        TokenStandard::Unknown
    }

    /// A failed or false/zero response both mean "not this standard": many
    /// older contracts simply do not implement ERC-165 and revert.
    async fn supports(&self, rpc: &GatedRpc, contract: &ContractAddress, interface_id: &str) -> bool {
        let data = abi::encode_supports_interface(interface_id);
        match rpc.eth_call(contract, &data).await {
            Ok(raw) => abi::decode_bool(&raw).unwrap_or(false),
            Err(err) => {
                debug!(
                    "supportsInterface(0x{}) failed on {}: {}",
                    interface_id, contract, err
                );
                false
            }
        }
    }
}
