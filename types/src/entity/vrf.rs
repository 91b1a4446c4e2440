use alloy_primitives::{Address, B256, U256};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use thiserror::Error as ThisError;

use crate::codec::{
    read_address, read_b256, read_words, write_address, write_b256, write_words,
    words_encode_size, ADDRESS_LEN, WORD_LEN,
};
use crate::constants::MAX_RANDOM_WORDS;

#[derive(Debug, ThisError, PartialEq, Eq)]
pub enum RequestInvariantError {
    #[error("unfulfilled request carries random words (words={words})")]
    UnfulfilledWithWords { words: usize },
    #[error("too many random words (len={len}, max={max})")]
    TooManyWords { len: usize, max: usize },
    #[error("fulfilled request missing fulfillment timestamp")]
    FulfilledWithoutTimestamp,
}

/// Domain action a randomness request was issued for.
///
/// The request-sent event does not carry this; it stays [`RequestType::Unknown`] unless a
/// correlating collaborator back-fills it. The other variants exist so such a collaborator
/// has somewhere to write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum RequestType {
    #[default]
    Unknown = 0,
    Mint = 1,
    Upgrade = 2,
    Expedition = 3,
}

impl Write for RequestType {
    fn write(&self, writer: &mut impl BufMut) {
        (*self as u8).write(writer);
    }
}

impl Read for RequestType {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Mint),
            2 => Ok(Self::Upgrade),
            3 => Ok(Self::Expedition),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for RequestType {
    fn encode_size(&self) -> usize {
        1
    }
}

/// Randomness request tracked from send to fulfillment.
///
/// Created on request-sent and mutated exactly once: `fulfilled` flips to true when the
/// matching fulfillment arrives. The transition is one-way; the consistency guard rejects
/// any write that would flip it back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RandomnessRequest {
    pub requester: Address,
    pub request_type: RequestType,
    pub fulfilled: bool,
    /// Empty until fulfilled.
    pub random_words: Vec<U256>,
    /// Hash of the transaction that sent the request.
    pub request_tx: B256,
    pub created_at: u64,
    pub fulfilled_at: Option<u64>,
}

impl RandomnessRequest {
    /// Unfulfilled request recorded at the given block timestamp.
    pub fn new(requester: Address, request_tx: B256, created_at: u64) -> Self {
        Self {
            requester,
            request_type: RequestType::Unknown,
            fulfilled: false,
            random_words: Vec::new(),
            request_tx,
            created_at,
            fulfilled_at: None,
        }
    }

    pub fn validate_invariants(&self) -> Result<(), RequestInvariantError> {
        if !self.fulfilled && !self.random_words.is_empty() {
            return Err(RequestInvariantError::UnfulfilledWithWords {
                words: self.random_words.len(),
            });
        }
        if self.random_words.len() > MAX_RANDOM_WORDS {
            return Err(RequestInvariantError::TooManyWords {
                len: self.random_words.len(),
                max: MAX_RANDOM_WORDS,
            });
        }
        if self.fulfilled && self.fulfilled_at.is_none() {
            return Err(RequestInvariantError::FulfilledWithoutTimestamp);
        }
        Ok(())
    }
}

impl Write for RandomnessRequest {
    fn write(&self, writer: &mut impl BufMut) {
        write_address(&self.requester, writer);
        self.request_type.write(writer);
        self.fulfilled.write(writer);
        write_words(&self.random_words, writer);
        write_b256(&self.request_tx, writer);
        self.created_at.write(writer);
        self.fulfilled_at.write(writer);
    }
}

impl Read for RandomnessRequest {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            requester: read_address(reader)?,
            request_type: RequestType::read(reader)?,
            fulfilled: bool::read(reader)?,
            random_words: read_words(reader, MAX_RANDOM_WORDS)?,
            request_tx: read_b256(reader)?,
            created_at: u64::read(reader)?,
            fulfilled_at: Option::<u64>::read(reader)?,
        })
    }
}

impl EncodeSize for RandomnessRequest {
    fn encode_size(&self) -> usize {
        ADDRESS_LEN
            + self.request_type.encode_size()
            + self.fulfilled.encode_size()
            + words_encode_size(&self.random_words)
            + WORD_LEN
            + self.created_at.encode_size()
            + self.fulfilled_at.encode_size()
    }
}

/// Whether a contract is authorized to consume randomness. Last write wins.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct VrfAuthorization {
    pub authorized: bool,
    pub updated_at: u64,
}

impl Write for VrfAuthorization {
    fn write(&self, writer: &mut impl BufMut) {
        self.authorized.write(writer);
        self.updated_at.write(writer);
    }
}

impl Read for VrfAuthorization {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            authorized: bool::read(reader)?,
            updated_at: u64::read(reader)?,
        })
    }
}

impl EncodeSize for VrfAuthorization {
    fn encode_size(&self) -> usize {
        self.authorized.encode_size() + self.updated_at.encode_size()
    }
}
