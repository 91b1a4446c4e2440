//! Durable store representation.
//!
//! Projected state is a keyed table: [`Key`] names one entity instance and [`Value`] is
//! its current state. The tag byte makes keys unique across entity kinds even when two
//! kinds share an identity string (a player, a vault, and a stake record all keyed by
//! the same address are three distinct rows).
//!
//! [`Key`] derives `Ord` so change sets can be flushed in a stable order; the derived
//! ordering agrees with the lexicographic ordering of encoded keys.

use alloy_primitives::{Address, B256, U256};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};

use crate::codec::{read_address, read_b256, read_u256, write_address, write_b256, write_u256, ADDRESS_LEN, WORD_LEN};
use crate::entity::{Player, RandomnessRequest, StakeRecord, UpgradeAttempt, Vault, VrfAuthorization};
use crate::identity::{address_key, attempt_key, request_key};

#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Debug)]
pub enum Key {
    // Address-keyed entities (tags 0-2)
    Player(Address),
    Vault(Address),
    Stake(Address),

    // VRF keys (tags 3-4)
    Request(U256),
    Authorization(Address),

    // Altar key (tag 5)
    Attempt { tx_hash: B256, log_index: u32 },
}

impl Key {
    /// Identity string of the row within its entity kind.
    ///
    /// Addresses render as lowercase `0x` hex, request ids as decimal, and upgrade
    /// attempts as `{tx_hash:#x}-{log_index}`. Uniqueness holds per kind, not across
    /// kinds; use the full [`Key`] when a single namespace is needed.
    pub fn identity(&self) -> String {
        match self {
            Self::Player(address)
            | Self::Vault(address)
            | Self::Stake(address)
            | Self::Authorization(address) => address_key(address),
            Self::Request(request_id) => request_key(request_id),
            Self::Attempt { tx_hash, log_index } => attempt_key(tx_hash, *log_index),
        }
    }
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Address-keyed entities (tags 0-2)
            Self::Player(address) => {
                0u8.write(writer);
                write_address(address, writer);
            }
            Self::Vault(address) => {
                1u8.write(writer);
                write_address(address, writer);
            }
            Self::Stake(address) => {
                2u8.write(writer);
                write_address(address, writer);
            }

            // VRF keys (tags 3-4)
            Self::Request(request_id) => {
                3u8.write(writer);
                write_u256(request_id, writer);
            }
            Self::Authorization(address) => {
                4u8.write(writer);
                write_address(address, writer);
            }

            // Altar key (tag 5)
            Self::Attempt { tx_hash, log_index } => {
                5u8.write(writer);
                write_b256(tx_hash, writer);
                log_index.write(writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match reader.get_u8() {
            // Address-keyed entities (tags 0-2)
            0 => Self::Player(read_address(reader)?),
            1 => Self::Vault(read_address(reader)?),
            2 => Self::Stake(read_address(reader)?),

            // VRF keys (tags 3-4)
            3 => Self::Request(read_u256(reader)?),
            4 => Self::Authorization(read_address(reader)?),

            // Altar key (tag 5)
            5 => Self::Attempt {
                tx_hash: read_b256(reader)?,
                log_index: u32::read(reader)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                // Address-keyed entities
                Self::Player(_) | Self::Vault(_) | Self::Stake(_) => ADDRESS_LEN,

                // VRF keys
                Self::Request(_) => WORD_LEN,
                Self::Authorization(_) => ADDRESS_LEN,

                // Altar key
                Self::Attempt { .. } => WORD_LEN + u32::SIZE,
            }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Value {
    // Address-keyed entities (tags 0-2)
    Player(Player),
    Vault(Vault),
    Stake(StakeRecord),

    // VRF values (tags 3-4)
    Request(RandomnessRequest),
    Authorization(VrfAuthorization),

    // Altar value (tag 5)
    Attempt(UpgradeAttempt),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Address-keyed entities (tags 0-2)
            Self::Player(player) => {
                0u8.write(writer);
                player.write(writer);
            }
            Self::Vault(vault) => {
                1u8.write(writer);
                vault.write(writer);
            }
            Self::Stake(stake) => {
                2u8.write(writer);
                stake.write(writer);
            }

            // VRF values (tags 3-4)
            Self::Request(request) => {
                3u8.write(writer);
                request.write(writer);
            }
            Self::Authorization(authorization) => {
                4u8.write(writer);
                authorization.write(writer);
            }

            // Altar value (tag 5)
            Self::Attempt(attempt) => {
                5u8.write(writer);
                attempt.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match reader.get_u8() {
            // Address-keyed entities (tags 0-2)
            0 => Self::Player(Player::read(reader)?),
            1 => Self::Vault(Vault::read(reader)?),
            2 => Self::Stake(StakeRecord::read(reader)?),

            // VRF values (tags 3-4)
            3 => Self::Request(RandomnessRequest::read(reader)?),
            4 => Self::Authorization(VrfAuthorization::read(reader)?),

            // Altar value (tag 5)
            5 => Self::Attempt(UpgradeAttempt::read(reader)?),

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        u8::SIZE
            + match self {
                // Address-keyed entities
                Self::Player(player) => player.encode_size(),
                Self::Vault(vault) => vault.encode_size(),
                Self::Stake(stake) => stake.encode_size(),

                // VRF values
                Self::Request(request) => request.encode_size(),
                Self::Authorization(authorization) => authorization.encode_size(),

                // Altar value
                Self::Attempt(attempt) => attempt.encode_size(),
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::Encode;
    use proptest::prelude::*;

    fn all_keys() -> Vec<Key> {
        let address = Address::repeat_byte(0xab);
        vec![
            Key::Player(address),
            Key::Vault(address),
            Key::Stake(address),
            Key::Request(U256::from(42u64)),
            Key::Authorization(address),
            Key::Attempt {
                tx_hash: B256::repeat_byte(0xcd),
                log_index: 3,
            },
        ]
    }

    #[test]
    fn every_key_roundtrips() {
        for key in all_keys() {
            let encoded = key.encode();
            assert_eq!(encoded.len(), key.encode_size());

            let mut reader = encoded.as_ref();
            assert_eq!(Key::read(&mut reader).unwrap(), key);
        }
    }

    #[test]
    fn every_value_roundtrips() {
        let address = Address::repeat_byte(0xab);
        let values = vec![
            Value::Player(Player::new(address)),
            Value::Vault(Vault::new(100)),
            Value::Stake(StakeRecord::new(address, 100)),
            Value::Request(RandomnessRequest::new(
                address,
                B256::repeat_byte(0xcd),
                100,
            )),
            Value::Authorization(VrfAuthorization {
                authorized: true,
                updated_at: 100,
            }),
            Value::Attempt(UpgradeAttempt::new(address, address, 3, 0, 100, 7)),
        ];

        for value in values {
            let encoded = value.encode();
            assert_eq!(encoded.len(), value.encode_size());

            let mut reader = encoded.as_ref();
            assert_eq!(Value::read(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn identity_strings_follow_the_contract() {
        let address = Address::repeat_byte(0xab);
        let rendered = address_key(&address);
        assert_eq!(Key::Player(address).identity(), rendered);
        assert_eq!(Key::Vault(address).identity(), rendered);
        assert_eq!(Key::Stake(address).identity(), rendered);
        assert_eq!(Key::Authorization(address).identity(), rendered);

        assert_eq!(Key::Request(U256::from(42u64)).identity(), "42");

        let tx_hash = B256::repeat_byte(0xcd);
        assert_eq!(
            Key::Attempt {
                tx_hash,
                log_index: 3
            }
            .identity(),
            attempt_key(&tx_hash, 3),
        );
    }

    #[test]
    fn unknown_key_tag_is_rejected() {
        let buf = [9u8];
        let mut reader = buf.as_ref();
        let err = Key::read(&mut reader).expect_err("should reject tag 9");
        assert!(matches!(err, Error::InvalidEnum(9)));
    }

    #[test]
    fn unknown_value_tag_is_rejected() {
        let buf = [9u8];
        let mut reader = buf.as_ref();
        let err = Value::read(&mut reader).expect_err("should reject tag 9");
        assert!(matches!(err, Error::InvalidEnum(9)));
    }

    fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    fn arb_b256() -> impl Strategy<Value = B256> {
        any::<[u8; 32]>().prop_map(B256::from)
    }

    fn arb_u256() -> impl Strategy<Value = U256> {
        any::<[u8; 32]>().prop_map(U256::from_be_bytes)
    }

    fn arb_key() -> impl Strategy<Value = Key> {
        prop_oneof![
            arb_address().prop_map(Key::Player),
            arb_address().prop_map(Key::Vault),
            arb_address().prop_map(Key::Stake),
            arb_u256().prop_map(Key::Request),
            arb_address().prop_map(Key::Authorization),
            (arb_b256(), any::<u32>())
                .prop_map(|(tx_hash, log_index)| Key::Attempt { tx_hash, log_index }),
        ]
    }

    proptest! {
        #[test]
        fn prop_key_roundtrip(key in arb_key()) {
            let encoded = key.encode();
            prop_assert_eq!(encoded.len(), key.encode_size());

            let mut reader = encoded.as_ref();
            prop_assert_eq!(Key::read(&mut reader).unwrap(), key);
        }

        /// Flush order is the derived `Ord`; replayed stores compare encoded dumps.
        /// The two orderings must agree or the comparison would be representation
        /// dependent.
        #[test]
        fn prop_key_order_matches_encoded_order(k1 in arb_key(), k2 in arb_key()) {
            let e1 = k1.encode();
            let e2 = k2.encode();
            prop_assert_eq!(k1.cmp(&k2), e1.as_ref().cmp(e2.as_ref()));
        }
    }
}
