//! On-chain storage resolution.
//!
//! Computes the storage slots of declared fields and decodes the words found there.
//!
//! Architecture:
//!   LayoutDescriptor (declared fields)
//!   ↓
//!   plan::plan_field      pure: slots + decoding for one field (hash injected)
//!   ↓
//!   StorageResolver       reads planned words through a StorageReader, decodes them
//!   ↓
//!   ResolvedFields        field name → DecodedValue
//!
//! Slot derivation must match the EVM: keccak256 over 32-byte big-endian words.

pub mod hasher;
pub mod helpers;
pub mod plan;
pub mod providers;
pub mod resolver;
pub mod value;

// Re-export the StorageReader trait companions and key types at module level
pub use hasher::{Keccak, SlotHasher};
pub use helpers::{dynamic_array_data_slot, mapping_value_slot, slot_to_word, word_to_slot};
pub use plan::SlotPlan;
pub use providers::{GenesisStorageReader, MemoryStorage};
pub use resolver::{MappingKeys, ResolvedFields, ResolverConfig, StorageResolver};
pub use value::{DecodedValue, MappingKey, ResolvedValue};

use crate::errors::ProviderError;
use alloy_primitives::{Address, B256, U256};

/// Trait for reading contract storage slots.
///
/// This is the resolver's only I/O boundary. Implementations decide about
/// retries, timeouts and caching; the resolver propagates their errors as-is.
/// Slots that were never written must read as [`B256::ZERO`].
pub trait StorageReader {
    /// Read the word stored at `slot` of the contract at `address`.
    fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError>;
}

impl<R: StorageReader + ?Sized> StorageReader for std::sync::Arc<R> {
    fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
        (**self).read_storage(address, slot)
    }
}
