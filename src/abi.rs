//! Minimal ABI encoding/decoding for the four calls this crate makes
//!
//! Call data is a 4-byte function selector followed by 32-byte-aligned
//! arguments, hex-encoded with a `0x` prefix. Results are 32-byte words:
//! unsigned integers big-endian, addresses right-aligned in the word.
use crate::address::WalletAddress;
use crate::errors::RpcCallError;

// keccak256 selectors of the probed functions
pub const SEL_BALANCE_OF: &str = "70a08231"; // balanceOf(address)
pub const SEL_BALANCE_OF_ID: &str = "00fdd58e"; // balanceOf(address,uint256)
pub const SEL_OWNER_OF: &str = "6352211e"; // ownerOf(uint256)
pub const SEL_SUPPORTS_INTERFACE: &str = "01ffc9a7"; // supportsInterface(bytes4)

// ERC-165 interface IDs
pub const ERC721_INTERFACE_ID: &str = "80ac58cd";
pub const ERC1155_INTERFACE_ID: &str = "d9b67a26";

fn encode_address_arg(hex_addr: &str) -> String {
    // left-pad the 20-byte address to a 32-byte word
    format!("{:0>64}", hex_addr.trim_start_matches("0x"))
}

fn encode_uint_arg(value: u64) -> String {
    format!("{:064x}", value)
}

/// `balanceOf(address)` call data (ERC-721 / ERC-20 shape).
pub fn encode_balance_of(owner: &WalletAddress) -> String {
    format!("0x{}{}", SEL_BALANCE_OF, encode_address_arg(owner.as_str()))
}

/// `balanceOf(address,uint256)` call data (ERC-1155).
pub fn encode_balance_of_id(owner: &WalletAddress, token_id: u64) -> String {
    format!(
        "0x{}{}{}",
        SEL_BALANCE_OF_ID,
        encode_address_arg(owner.as_str()),
        encode_uint_arg(token_id)
    )
}

/// `ownerOf(uint256)` call data (ERC-721).
pub fn encode_owner_of(token_id: u64) -> String {
    format!("0x{}{}", SEL_OWNER_OF, encode_uint_arg(token_id))
}

/// `supportsInterface(bytes4)` call data (ERC-165). `bytes4` arguments are
/// left-aligned in their word.
pub fn encode_supports_interface(interface_id: &str) -> String {
    format!("0x{}{:0<64}", SEL_SUPPORTS_INTERFACE, interface_id)
}

/// Decode a 32-byte big-endian word as an unsigned integer.
///
/// Balances are assumed to fit u64; a wider value is reported as malformed
/// rather than silently truncated.
pub fn decode_uint(raw: &str) -> Result<u64, RpcCallError> {
    let hex = raw.trim_start_matches("0x");
    if hex.is_empty() {
        return Err(RpcCallError::MalformedResponse(
            "empty eth_call result".to_string(),
        ));
    }

    let significant = hex.trim_start_matches('0');
    if significant.len() > 16 {
        return Err(RpcCallError::MalformedResponse(format!(
            "integer result wider than u64: 0x{}",
            hex
        )));
    }
    if significant.is_empty() {
        return Ok(0);
    }

    u64::from_str_radix(significant, 16).map_err(|e| {
        RpcCallError::MalformedResponse(format!("bad integer result 0x{}: {}", hex, e))
    })
}

/// Decode a 32-byte boolean word (nonzero means true).
pub fn decode_bool(raw: &str) -> Result<bool, RpcCallError> {
    decode_uint(raw).map(|v| v != 0)
}

/// Decode an address result word: the owner is the last 20 bytes, returned
/// normalized (lower-case, `0x`-prefixed) for direct comparison against
/// [`WalletAddress::as_str`].
pub fn decode_address(raw: &str) -> Result<String, RpcCallError> {
    let hex = raw.trim_start_matches("0x");
    if hex.len() < 40 {
        return Err(RpcCallError::MalformedResponse(format!(
            "address result too short: 0x{}",
            hex
        )));
    }
    let tail = &hex[hex.len() - 40..];
    if !tail.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(RpcCallError::MalformedResponse(format!(
            "non-hex address result: 0x{}",
            hex
        )));
    }
    Ok(format!("0x{}", tail.to_ascii_lowercase()))
}

/// Hex-encode a u64 result word the way a node returns it. Test helper
/// shape, but also used by the mock transport.
pub fn uint_word(value: u64) -> String {
    format!("0x{:064x}", value)
}

/// Build an address result word from a normalized address.
pub fn address_word(addr: &str) -> String {
    format!("0x{:0>64}", addr.trim_start_matches("0x"))
}

pub fn is_call_for(data: &str, selector: &str) -> bool {
    data.strip_prefix("0x")
        .map(|d| d.starts_with(selector))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::parse("0xAbCdEF0123456789abcdef0123456789ABCDEF01").unwrap()
    }

    #[test]
    fn test_encode_balance_of() {
        let data = encode_balance_of(&wallet());
        assert_eq!(
            data,
            "0x70a08231000000000000000000000000abcdef0123456789abcdef0123456789abcdef01"
        );
    }

    #[test]
    fn test_encode_balance_of_id() {
        let data = encode_balance_of_id(&wallet(), 777);
        assert!(data.starts_with("0x00fdd58e000000000000000000000000abcdef"));
        assert!(data.ends_with(&format!("{:064x}", 777)));
        assert_eq!(data.len(), 2 + 8 + 64 + 64);
    }

    #[test]
    fn test_encode_supports_interface_right_pads() {
        let data = encode_supports_interface(ERC721_INTERFACE_ID);
        assert_eq!(
            data,
            "0x01ffc9a780ac58cd00000000000000000000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_decode_uint() {
        assert_eq!(decode_uint(&uint_word(3)).unwrap(), 3);
        assert_eq!(decode_uint("0x03").unwrap(), 3);
        assert_eq!(decode_uint(&uint_word(0)).unwrap(), 0);
        assert!(decode_uint("0x").is_err());
        // 2^64 does not fit
        assert!(decode_uint("0x10000000000000000").is_err());
    }

    #[test]
    fn test_decode_address_takes_last_20_bytes() {
        let owner = decode_address(&address_word("0xABCDEF0123456789abcdef0123456789abcdef01"))
            .unwrap();
        assert_eq!(owner, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert!(decode_address("0x1234").is_err());
    }
}
