use alloy_primitives::U256;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::codec::{read_u256, write_u256, WORD_LEN};

/// Withdrawal vault for a single account.
///
/// `withdrawable_balance` must never go below zero and `total_commission_paid` only grows;
/// both rules are enforced by the projection engine's consistency guard before commit.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Vault {
    pub withdrawable_balance: U256,
    pub total_commission_paid: U256,
    pub created_at: u64,
    pub last_updated_at: u64,
}

impl Vault {
    /// Empty vault created at the given block timestamp.
    pub fn new(created_at: u64) -> Self {
        Self {
            withdrawable_balance: U256::ZERO,
            total_commission_paid: U256::ZERO,
            created_at,
            last_updated_at: created_at,
        }
    }
}

impl Write for Vault {
    fn write(&self, writer: &mut impl BufMut) {
        write_u256(&self.withdrawable_balance, writer);
        write_u256(&self.total_commission_paid, writer);
        self.created_at.write(writer);
        self.last_updated_at.write(writer);
    }
}

impl Read for Vault {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            withdrawable_balance: read_u256(reader)?,
            total_commission_paid: read_u256(reader)?,
            created_at: u64::read(reader)?,
            last_updated_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Vault {
    fn encode_size(&self) -> usize {
        WORD_LEN + WORD_LEN + self.created_at.encode_size() + self.last_updated_at.encode_size()
    }
}
