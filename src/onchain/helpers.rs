use super::hasher::SlotHasher;
use super::value::MappingKey;
use crate::constants::WORD_SIZE;
use alloy_primitives::{B256, U256};

/// 32-byte big-endian encoding of a slot index.
pub fn slot_to_word(slot: U256) -> B256 {
    B256::from(slot.to_be_bytes::<32>())
}

/// Interpret a word (e.g. a hash digest) as a slot index.
pub fn word_to_slot(word: B256) -> U256 {
    U256::from_be_bytes(word.0)
}

/// Compute the slot of element 0 of a dynamic array.
///
/// For `uint256[] arr` at slot 1002:
///   base = keccak256(abi.encode(1002))
///   arr[0] lives at base + 0
///   arr[1] lives at base + 1
///   etc.
pub fn dynamic_array_data_slot(hasher: &impl SlotHasher, array_slot: U256) -> U256 {
    word_to_slot(hasher.hash(slot_to_word(array_slot).as_slice()))
}

/// Compute the slot holding `mapping[key]` for a mapping declared at `mapping_slot`.
///
///   slot = keccak256(pad32(key) ++ abi.encode(mapping_slot))
pub fn mapping_value_slot(hasher: &impl SlotHasher, key: &MappingKey, mapping_slot: U256) -> U256 {
    let mut input = [0u8; 2 * WORD_SIZE];
    input[..WORD_SIZE].copy_from_slice(key.as_word().as_slice());
    input[WORD_SIZE..].copy_from_slice(slot_to_word(mapping_slot).as_slice());
    word_to_slot(hasher.hash(&input))
}

/// Bytes `[byte_offset, byte_offset + width)` of a word, counted from the low-order end.
///
/// Callers guarantee `byte_offset + width <= 32`.
pub fn scalar_bytes(word: &B256, byte_offset: usize, width: usize) -> &[u8] {
    let end = WORD_SIZE - byte_offset;
    &word[end - width..end]
}

/// Write `bytes` into a word so that its last byte sits at `byte_offset` from the right.
///
/// The rest of the word is left untouched, so several packed values can be written
/// into the same word one after the other.
pub fn insert_scalar_bytes(word: B256, byte_offset: usize, bytes: &[u8]) -> B256 {
    let mut out = word;
    let end = WORD_SIZE - byte_offset;
    out[end - bytes.len()..end].copy_from_slice(bytes);
    out
}

/// Storage word holding `value` as a uint (test fixtures).
#[cfg(test)]
pub(crate) fn encode_u64(value: u64) -> B256 {
    slot_to_word(U256::from(value))
}

/// Storage word holding `addr` in its low 20 bytes (test fixtures).
#[cfg(test)]
pub(crate) fn encode_address(addr: alloy_primitives::Address) -> B256 {
    addr.into_word()
}
