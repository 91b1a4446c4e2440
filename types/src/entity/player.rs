use alloy_primitives::Address;
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, Write};

use crate::codec::{read_address, write_address, ADDRESS_LEN};

/// Anchor record for an account.
///
/// Created the first time any event references the address and never deleted. Carries no
/// state of its own; other entities point back at it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub address: Address,
}

impl Player {
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

impl Write for Player {
    fn write(&self, writer: &mut impl BufMut) {
        write_address(&self.address, writer);
    }
}

impl Read for Player {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            address: read_address(reader)?,
        })
    }
}

impl EncodeSize for Player {
    fn encode_size(&self) -> usize {
        ADDRESS_LEN
    }
}
