//! Chain event model.
//!
//! Events arrive in blockchain order (ascending block number, then ascending log index)
//! and are immutable. [`EventPayload`] is a closed union over the kinds the projector
//! understands plus [`EventPayload::Unrecognized`] for kinds that appear before the
//! projector learns them; transport adapters map unknown log topics into that variant
//! instead of failing.

use alloy_primitives::{Address, B256, U256};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::codec::{
    bytes_encode_size, read_address, read_b256, read_bytes, read_u256, read_words,
    write_address, write_b256, write_bytes, write_u256, write_words, words_encode_size,
    ADDRESS_LEN, WORD_LEN,
};
use crate::constants::{MAX_RANDOM_WORDS, MAX_RAW_EVENT_BYTES};

/// Block and transaction provenance shared by every event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventMeta {
    pub tx_hash: B256,
    pub log_index: u32,
    pub block: u64,
    /// Block timestamp in seconds.
    pub timestamp: u64,
}

impl Write for EventMeta {
    fn write(&self, writer: &mut impl BufMut) {
        write_b256(&self.tx_hash, writer);
        self.log_index.write(writer);
        self.block.write(writer);
        self.timestamp.write(writer);
    }
}

impl Read for EventMeta {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            tx_hash: read_b256(reader)?,
            log_index: u32::read(reader)?,
            block: u64::read(reader)?,
            timestamp: u64::read(reader)?,
        })
    }
}

impl EncodeSize for EventMeta {
    fn encode_size(&self) -> usize {
        WORD_LEN
            + self.log_index.encode_size()
            + self.block.encode_size()
            + self.timestamp.encode_size()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventPayload {
    // Vault events (tags 0-2)
    /// Tokens deposited into a player's vault.
    /// Binary: [0] [player:20] [amount:32 BE]
    Deposit { player: Address, amount: U256 },

    /// Tokens withdrawn from a player's vault.
    /// Binary: [1] [player:20] [amount:32 BE]
    Withdrawal { player: Address, amount: U256 },

    /// Referral commission paid out. The credited vault is the referrer's, not the payer's.
    /// Binary: [2] [referrer:20] [player:20] [amount:32 BE]
    CommissionPaid {
        referrer: Address,
        player: Address,
        amount: U256,
    },

    // Staking events (tags 10-12)
    /// Tokens staked against an account's SBT.
    /// Binary: [10] [user:20] [tokenId:u64 BE] [amount:32 BE]
    Staked {
        user: Address,
        token_id: u64,
        amount: U256,
    },

    /// Unstake claim completed. Projected as a pass-through today.
    /// Binary: [11] [user:20] [amount:32 BE]
    UnstakeClaimed { user: Address, amount: U256 },

    /// SBT transfer. Only mints (`from` == zero address) affect the projection.
    /// Binary: [12] [from:20] [to:20] [tokenId:u64 BE]
    VipTransfer {
        from: Address,
        to: Address,
        token_id: u64,
    },

    // Altar events (tag 20)
    /// Upgrade attempt resolved. A zero result rarity means the attempt failed.
    /// Binary: [20] [player:20] [tokenContract:20] [targetRarity:u8] [resultRarity:u8]
    UpgradeProcessed {
        player: Address,
        token_contract: Address,
        target_rarity: u8,
        result_rarity: u8,
    },

    // VRF events (tags 30-32)
    /// Randomness requested from the VRF coordinator.
    /// Binary: [30] [requestId:32 BE] [requester:20]
    RequestSent { request_id: U256, requester: Address },

    /// Randomness delivered for an earlier request.
    /// Binary: [31] [requestId:32 BE] [wordCount:u32 BE] [word:32 BE]...
    RequestFulfilled {
        request_id: U256,
        random_words: Vec<U256>,
    },

    /// Consumer contract authorization toggled. Last write wins.
    /// Binary: [32] [contract:20] [authorized:u8]
    AuthorizationChanged { contract: Address, authorized: bool },

    // Forward compatibility (tag 250)
    /// Event kind this projector does not understand yet. The dispatcher logs and skips
    /// these; the raw topic and data are retained for later reprocessing.
    /// Binary: [250] [topic:32] [dataLen:u32 BE] [data...]
    Unrecognized { topic: B256, data: Vec<u8> },
}

impl EventPayload {
    /// Stable lower-case name for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdrawal { .. } => "withdrawal",
            Self::CommissionPaid { .. } => "commission_paid",
            Self::Staked { .. } => "staked",
            Self::UnstakeClaimed { .. } => "unstake_claimed",
            Self::VipTransfer { .. } => "vip_transfer",
            Self::UpgradeProcessed { .. } => "upgrade_processed",
            Self::RequestSent { .. } => "request_sent",
            Self::RequestFulfilled { .. } => "request_fulfilled",
            Self::AuthorizationChanged { .. } => "authorization_changed",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }
}

impl Write for EventPayload {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            // Vault events (tags 0-2)
            Self::Deposit { player, amount } => {
                0u8.write(writer);
                write_address(player, writer);
                write_u256(amount, writer);
            }
            Self::Withdrawal { player, amount } => {
                1u8.write(writer);
                write_address(player, writer);
                write_u256(amount, writer);
            }
            Self::CommissionPaid {
                referrer,
                player,
                amount,
            } => {
                2u8.write(writer);
                write_address(referrer, writer);
                write_address(player, writer);
                write_u256(amount, writer);
            }

            // Staking events (tags 10-12)
            Self::Staked {
                user,
                token_id,
                amount,
            } => {
                10u8.write(writer);
                write_address(user, writer);
                token_id.write(writer);
                write_u256(amount, writer);
            }
            Self::UnstakeClaimed { user, amount } => {
                11u8.write(writer);
                write_address(user, writer);
                write_u256(amount, writer);
            }
            Self::VipTransfer {
                from,
                to,
                token_id,
            } => {
                12u8.write(writer);
                write_address(from, writer);
                write_address(to, writer);
                token_id.write(writer);
            }

            // Altar events (tag 20)
            Self::UpgradeProcessed {
                player,
                token_contract,
                target_rarity,
                result_rarity,
            } => {
                20u8.write(writer);
                write_address(player, writer);
                write_address(token_contract, writer);
                target_rarity.write(writer);
                result_rarity.write(writer);
            }

            // VRF events (tags 30-32)
            Self::RequestSent {
                request_id,
                requester,
            } => {
                30u8.write(writer);
                write_u256(request_id, writer);
                write_address(requester, writer);
            }
            Self::RequestFulfilled {
                request_id,
                random_words,
            } => {
                31u8.write(writer);
                write_u256(request_id, writer);
                write_words(random_words, writer);
            }
            Self::AuthorizationChanged {
                contract,
                authorized,
            } => {
                32u8.write(writer);
                write_address(contract, writer);
                authorized.write(writer);
            }

            // Forward compatibility (tag 250)
            Self::Unrecognized { topic, data } => {
                250u8.write(writer);
                write_b256(topic, writer);
                write_bytes(data, writer);
            }
        }
    }
}

impl Read for EventPayload {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let payload = match reader.get_u8() {
            // Vault events (tags 0-2)
            0 => Self::Deposit {
                player: read_address(reader)?,
                amount: read_u256(reader)?,
            },
            1 => Self::Withdrawal {
                player: read_address(reader)?,
                amount: read_u256(reader)?,
            },
            2 => Self::CommissionPaid {
                referrer: read_address(reader)?,
                player: read_address(reader)?,
                amount: read_u256(reader)?,
            },

            // Staking events (tags 10-12)
            10 => Self::Staked {
                user: read_address(reader)?,
                token_id: u64::read(reader)?,
                amount: read_u256(reader)?,
            },
            11 => Self::UnstakeClaimed {
                user: read_address(reader)?,
                amount: read_u256(reader)?,
            },
            12 => Self::VipTransfer {
                from: read_address(reader)?,
                to: read_address(reader)?,
                token_id: u64::read(reader)?,
            },

            // Altar events (tag 20)
            20 => Self::UpgradeProcessed {
                player: read_address(reader)?,
                token_contract: read_address(reader)?,
                target_rarity: u8::read(reader)?,
                result_rarity: u8::read(reader)?,
            },

            // VRF events (tags 30-32)
            30 => Self::RequestSent {
                request_id: read_u256(reader)?,
                requester: read_address(reader)?,
            },
            31 => Self::RequestFulfilled {
                request_id: read_u256(reader)?,
                random_words: read_words(reader, MAX_RANDOM_WORDS)?,
            },
            32 => Self::AuthorizationChanged {
                contract: read_address(reader)?,
                authorized: bool::read(reader)?,
            },

            // Forward compatibility (tag 250)
            250 => Self::Unrecognized {
                topic: read_b256(reader)?,
                data: read_bytes(reader, MAX_RAW_EVENT_BYTES)?,
            },

            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(payload)
    }
}

impl EncodeSize for EventPayload {
    fn encode_size(&self) -> usize {
        1 + match self {
            // Vault events
            Self::Deposit { .. } | Self::Withdrawal { .. } => ADDRESS_LEN + WORD_LEN,
            Self::CommissionPaid { .. } => ADDRESS_LEN + ADDRESS_LEN + WORD_LEN,

            // Staking events
            Self::Staked { token_id, .. } => ADDRESS_LEN + token_id.encode_size() + WORD_LEN,
            Self::UnstakeClaimed { .. } => ADDRESS_LEN + WORD_LEN,
            Self::VipTransfer { token_id, .. } => {
                ADDRESS_LEN + ADDRESS_LEN + token_id.encode_size()
            }

            // Altar events
            Self::UpgradeProcessed {
                target_rarity,
                result_rarity,
                ..
            } => ADDRESS_LEN + ADDRESS_LEN + target_rarity.encode_size() + result_rarity.encode_size(),

            // VRF events
            Self::RequestSent { .. } => WORD_LEN + ADDRESS_LEN,
            Self::RequestFulfilled { random_words, .. } => {
                WORD_LEN + words_encode_size(random_words)
            }
            Self::AuthorizationChanged { authorized, .. } => {
                ADDRESS_LEN + authorized.encode_size()
            }

            // Forward compatibility
            Self::Unrecognized { data, .. } => WORD_LEN + bytes_encode_size(data),
        }
    }
}

/// One entry of the ordered event log: provenance plus the typed payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainEvent {
    pub meta: EventMeta,
    pub payload: EventPayload,
}

impl ChainEvent {
    pub fn new(meta: EventMeta, payload: EventPayload) -> Self {
        Self { meta, payload }
    }

    /// Identity whose entities this event may write.
    ///
    /// Events sharing a routing identity must be applied in arrival order. Events with
    /// distinct identities may proceed in parallel: the only entity they can both
    /// write is the player anchor, which carries the same bytes no matter which event
    /// creates it.
    pub fn routing_identity(&self) -> Vec<u8> {
        match &self.payload {
            EventPayload::Deposit { player, .. } | EventPayload::Withdrawal { player, .. } => {
                player.as_slice().to_vec()
            }
            EventPayload::CommissionPaid { referrer, .. } => referrer.as_slice().to_vec(),
            EventPayload::Staked { user, .. } | EventPayload::UnstakeClaimed { user, .. } => {
                user.as_slice().to_vec()
            }
            EventPayload::VipTransfer { to, .. } => to.as_slice().to_vec(),
            EventPayload::UpgradeProcessed { .. } => {
                let mut identity = self.meta.tx_hash.as_slice().to_vec();
                identity.extend_from_slice(&self.meta.log_index.to_be_bytes());
                identity
            }
            EventPayload::RequestSent { request_id, .. }
            | EventPayload::RequestFulfilled { request_id, .. } => {
                request_id.to_be_bytes::<WORD_LEN>().to_vec()
            }
            EventPayload::AuthorizationChanged { contract, .. } => contract.as_slice().to_vec(),
            EventPayload::Unrecognized { .. } => self.meta.tx_hash.as_slice().to_vec(),
        }
    }
}

impl Write for ChainEvent {
    fn write(&self, writer: &mut impl BufMut) {
        self.meta.write(writer);
        self.payload.write(writer);
    }
}

impl Read for ChainEvent {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            meta: EventMeta::read(reader)?,
            payload: EventPayload::read(reader)?,
        })
    }
}

impl EncodeSize for ChainEvent {
    fn encode_size(&self) -> usize {
        self.meta.encode_size() + self.payload.encode_size()
    }
}
