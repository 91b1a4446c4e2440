//! Codec helpers for EVM primitive types.
//!
//! The `commonware-codec` traits cannot be implemented for the foreign `alloy-primitives`
//! types, so event and entity codecs route through these helpers instead.

use alloy_primitives::{Address, B256, U256};
use bytes::{Buf, BufMut};
use commonware_codec::{Error, ReadExt, Write};

/// Encoded length of an address.
pub const ADDRESS_LEN: usize = 20;

/// Encoded length of a 256-bit hash or amount.
pub const WORD_LEN: usize = 32;

/// Helper to write an address as raw bytes.
pub fn write_address(address: &Address, writer: &mut impl BufMut) {
    writer.put_slice(address.as_slice());
}

/// Helper to read an address from raw bytes.
pub fn read_address(reader: &mut impl Buf) -> Result<Address, Error> {
    if reader.remaining() < ADDRESS_LEN {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; ADDRESS_LEN];
    reader.copy_to_slice(&mut bytes);
    Ok(Address::from(bytes))
}

/// Helper to write a 256-bit hash as raw bytes.
pub fn write_b256(hash: &B256, writer: &mut impl BufMut) {
    writer.put_slice(hash.as_slice());
}

/// Helper to read a 256-bit hash from raw bytes.
pub fn read_b256(reader: &mut impl Buf) -> Result<B256, Error> {
    if reader.remaining() < WORD_LEN {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; WORD_LEN];
    reader.copy_to_slice(&mut bytes);
    Ok(B256::from(bytes))
}

/// Helper to write a 256-bit amount as big-endian bytes.
pub fn write_u256(amount: &U256, writer: &mut impl BufMut) {
    writer.put_slice(&amount.to_be_bytes::<WORD_LEN>());
}

/// Helper to read a 256-bit amount from big-endian bytes.
pub fn read_u256(reader: &mut impl Buf) -> Result<U256, Error> {
    if reader.remaining() < WORD_LEN {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = [0u8; WORD_LEN];
    reader.copy_to_slice(&mut bytes);
    Ok(U256::from_be_bytes(bytes))
}

/// Helper to write a word list as a length-prefixed sequence.
pub fn write_words(words: &[U256], writer: &mut impl BufMut) {
    (words.len() as u32).write(writer);
    for word in words {
        write_u256(word, writer);
    }
}

/// Helper to read a word list, rejecting lists longer than `max_len`.
pub fn read_words(reader: &mut impl Buf, max_len: usize) -> Result<Vec<U256>, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("Words", "too many"));
    }
    if reader.remaining() < len * WORD_LEN {
        return Err(Error::EndOfBuffer);
    }
    let mut words = Vec::with_capacity(len);
    for _ in 0..len {
        words.push(read_u256(reader)?);
    }
    Ok(words)
}

/// Helper to get encode size of a word list.
pub fn words_encode_size(words: &[U256]) -> usize {
    4 + words.len() * WORD_LEN
}

/// Helper to write raw bytes as a length-prefixed slice.
pub fn write_bytes(bytes: &[u8], writer: &mut impl BufMut) {
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Helper to read length-prefixed raw bytes, rejecting slices longer than `max_len`.
pub fn read_bytes(reader: &mut impl Buf, max_len: usize) -> Result<Vec<u8>, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("Bytes", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    Ok(bytes)
}

/// Helper to get encode size of length-prefixed raw bytes.
pub fn bytes_encode_size(bytes: &[u8]) -> usize {
    4 + bytes.len()
}
