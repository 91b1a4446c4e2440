use alloy_primitives::Address;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::codec::{read_address, write_address, ADDRESS_LEN};

/// Outcome of a single upgrade attempt.
///
/// Keyed by transaction hash and log index, so several attempts inside one transaction
/// stay distinct. Immutable once created: the projection engine never updates or deletes
/// an existing record, and treats a key collision as an integrity defect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeAttempt {
    pub player: Address,
    pub token_contract: Address,
    pub target_rarity: u8,
    pub result_rarity: u8,
    /// Derived at creation: a zero result rarity means the attempt failed.
    pub success: bool,
    pub timestamp: u64,
    pub block: u64,
}

impl UpgradeAttempt {
    pub fn new(
        player: Address,
        token_contract: Address,
        target_rarity: u8,
        result_rarity: u8,
        timestamp: u64,
        block: u64,
    ) -> Self {
        Self {
            player,
            token_contract,
            target_rarity,
            result_rarity,
            success: result_rarity > 0,
            timestamp,
            block,
        }
    }
}

impl Write for UpgradeAttempt {
    fn write(&self, writer: &mut impl BufMut) {
        write_address(&self.player, writer);
        write_address(&self.token_contract, writer);
        self.target_rarity.write(writer);
        self.result_rarity.write(writer);
        self.success.write(writer);
        self.timestamp.write(writer);
        self.block.write(writer);
    }
}

impl Read for UpgradeAttempt {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            player: read_address(reader)?,
            token_contract: read_address(reader)?,
            target_rarity: u8::read(reader)?,
            result_rarity: u8::read(reader)?,
            success: bool::read(reader)?,
            timestamp: u64::read(reader)?,
            block: u64::read(reader)?,
        })
    }
}

impl EncodeSize for UpgradeAttempt {
    fn encode_size(&self) -> usize {
        ADDRESS_LEN
            + ADDRESS_LEN
            + self.target_rarity.encode_size()
            + self.result_rarity.encode_size()
            + self.success.encode_size()
            + self.timestamp.encode_size()
            + self.block.encode_size()
    }
}
