//! Identity resolution.
//!
//! Derives the string key for every entity from event fields. These are pure functions:
//! replaying the same events must yield byte-identical identities on every instance, so the
//! renderings here are fixed (lower-case hex, decimal) and never locale- or
//! checksum-dependent.

use alloy_primitives::{Address, B256, U256};

/// Key for an address-scoped entity: `0x`-prefixed lower-case hex. No checksum validation
/// is performed; addresses are assumed valid upstream.
pub fn address_key(address: &Address) -> String {
    format!("{address:#x}")
}

/// Key for a transaction-scoped record: transaction hash and log index joined with a dash.
/// Unique even when one transaction emits multiple records.
pub fn attempt_key(tx_hash: &B256, log_index: u32) -> String {
    format!("{tx_hash:#x}-{log_index}")
}

/// Key for a randomness request: the request identifier in decimal. The identifier space is
/// globally unique by construction of the upstream randomness service.
pub fn request_key(request_id: &U256) -> String {
    request_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_key_is_lowercase_hex() {
        let address = Address::repeat_byte(0xAB);
        assert_eq!(
            address_key(&address),
            "0xabababababababababababababababababababab"
        );
    }

    #[test]
    fn zero_address_key() {
        assert_eq!(
            address_key(&Address::ZERO),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn attempt_key_joins_hash_and_log_index() {
        let tx = B256::repeat_byte(0x01);
        assert_eq!(
            attempt_key(&tx, 7),
            format!("0x{}-7", "01".repeat(32))
        );
        // Distinct log indices within one transaction stay distinct.
        assert_ne!(attempt_key(&tx, 0), attempt_key(&tx, 1));
    }

    #[test]
    fn request_key_is_decimal() {
        assert_eq!(request_key(&U256::from(42u64)), "42");
        assert_eq!(
            request_key(&U256::from(18_446_744_073_709_551_616_u128)),
            "18446744073709551616"
        );
    }
}
