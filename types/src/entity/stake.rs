use alloy_primitives::{Address, U256};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::codec::{read_address, read_u256, write_address, write_u256, ADDRESS_LEN, WORD_LEN};

/// Soul-bound staking record for a single account.
///
/// Created on first stake or first SBT mint. `player` is re-linked on every update so a
/// record that lost its back-reference is repaired by the next event that touches it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StakeRecord {
    /// Back-reference to the owning [`crate::entity::Player`].
    pub player: Address,
    pub staked_amount: U256,
    /// Token id of the associated staking SBT, once one is minted.
    pub token_id: Option<u64>,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl StakeRecord {
    /// Empty record for `player` created at the given block timestamp.
    pub fn new(player: Address, created_at: u64) -> Self {
        Self {
            player,
            staked_amount: U256::ZERO,
            token_id: None,
            created_at,
            last_updated_at: created_at,
        }
    }
}

impl Write for StakeRecord {
    fn write(&self, writer: &mut impl BufMut) {
        write_address(&self.player, writer);
        write_u256(&self.staked_amount, writer);
        self.token_id.write(writer);
        self.created_at.write(writer);
        self.last_updated_at.write(writer);
    }
}

impl Read for StakeRecord {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: read_address(reader)?,
            staked_amount: read_u256(reader)?,
            token_id: Option::<u64>::read(reader)?,
            created_at: u64::read(reader)?,
            last_updated_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for StakeRecord {
    fn encode_size(&self) -> usize {
        ADDRESS_LEN
            + WORD_LEN
            + self.token_id.encode_size()
            + self.created_at.encode_size()
            + self.last_updated_at.encode_size()
    }
}
