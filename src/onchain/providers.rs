use super::StorageReader;
use crate::errors::ProviderError;
use crate::layout::ScalarType;
use crate::onchain::value::DecodedValue;
use alloy_primitives::{Address, B256, U256};
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory storage, keyed by `(address, slot)`.
///
/// Unset slots read as zero, like EVM storage. Handy for tests and for
/// replaying storage dumps.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    storage: BTreeMap<(Address, U256), B256>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the raw word at `slot`.
    pub fn set(&mut self, address: Address, slot: U256, value: B256) {
        self.storage.insert((address, slot), value);
    }

    /// Builder-style [`MemoryStorage::set`].
    pub fn with_entry(mut self, address: Address, slot: U256, value: B256) -> Self {
        self.set(address, slot, value);
        self
    }

    /// Pack a scalar into the word at `slot`, keeping the word's other bytes.
    ///
    /// Returns `false` (and leaves storage untouched) if `value` does not fit `ty`.
    pub fn set_scalar(
        &mut self,
        address: Address,
        slot: U256,
        ty: ScalarType,
        byte_offset: usize,
        value: &DecodedValue,
    ) -> bool {
        let current = self.storage.get(&(address, slot)).copied().unwrap_or(B256::ZERO);
        match value.encode_into(current, ty, byte_offset) {
            Some(word) => {
                self.set(address, slot, word);
                true
            }
            None => false,
        }
    }

    /// Number of stored (non-default) entries.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

impl StorageReader for MemoryStorage {
    fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
        Ok(self.storage.get(&(address, slot)).copied().unwrap_or(B256::ZERO))
    }
}

/// A StorageReader that reads from a genesis configuration's alloc.
///
/// Lets the resolver inspect pre-populated contract storage without a running node.
/// Reads of accounts missing from the alloc fail with [`ProviderError::UnknownContract`];
/// unset slots of known accounts read as zero.
#[derive(Debug, Clone)]
pub struct GenesisStorageReader {
    /// The genesis alloc to read from
    alloc: BTreeMap<Address, alloy_genesis::GenesisAccount>,
}

impl GenesisStorageReader {
    /// Create a reader from a genesis configuration.
    pub fn from_genesis(genesis: &alloy_genesis::Genesis) -> Self {
        Self { alloc: genesis.alloc.clone() }
    }

    /// Load a genesis JSON file (geth format) and read from its alloc.
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let load_err =
            |reason: String| ProviderError::GenesisLoad { path: path.to_path_buf(), reason };
        let json = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let genesis: alloy_genesis::Genesis =
            serde_json::from_str(&json).map_err(|e| load_err(e.to_string()))?;
        Ok(Self::from_genesis(&genesis))
    }

    /// Addresses with an alloc entry.
    pub fn accounts(&self) -> impl Iterator<Item = &Address> {
        self.alloc.keys()
    }
}

impl StorageReader for GenesisStorageReader {
    fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
        let account = self
            .alloc
            .get(&address)
            .ok_or(ProviderError::UnknownContract(address))?;
        let slot_key = B256::from(slot.to_be_bytes::<32>());
        Ok(account
            .storage
            .as_ref()
            .and_then(|storage| storage.get(&slot_key).copied())
            .unwrap_or(B256::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::onchain::helpers::encode_u64;
    use alloy_genesis::{Genesis, GenesisAccount};
    use std::io::Write;

    fn contract() -> Address {
        Address::repeat_byte(0xc0)
    }

    #[test]
    fn test_memory_storage_read_write() {
        let mut mock = MemoryStorage::new();
        mock.set(contract(), U256::from(1), encode_u64(42));
        assert_eq!(mock.read_storage(contract(), U256::from(1)).unwrap(), encode_u64(42));
        assert_eq!(mock.len(), 1);
    }

    #[test]
    fn test_memory_storage_missing_reads_zero() {
        let mock = MemoryStorage::new();
        assert_eq!(mock.read_storage(contract(), U256::from(999)).unwrap(), B256::ZERO);
    }

    #[test]
    fn test_memory_storage_packs_scalars() {
        let mut mock = MemoryStorage::new();
        let owner = Address::repeat_byte(0x11);
        assert!(mock.set_scalar(contract(), U256::ZERO, ScalarType::Address, 0, &owner.into()));
        assert!(mock.set_scalar(contract(), U256::ZERO, ScalarType::Bool, 20, &true.into()));
        assert!(!mock.set_scalar(
            contract(),
            U256::ZERO,
            ScalarType::Uint(1),
            21,
            &DecodedValue::from(300u64)
        ));

        let word = mock.read_storage(contract(), U256::ZERO).unwrap();
        assert_eq!(&word[12..32], owner.as_slice());
        assert_eq!(word[11], 1);
        assert_eq!(word[10], 0);
    }

    fn genesis_with_storage() -> Genesis {
        let mut storage = BTreeMap::new();
        storage.insert(B256::from(U256::from(0).to_be_bytes::<32>()), encode_u64(25));
        let mut genesis = Genesis::default();
        genesis.alloc.insert(
            contract(),
            GenesisAccount {
                balance: U256::ZERO,
                nonce: Some(1),
                code: None,
                storage: Some(storage),
                private_key: None,
            },
        );
        genesis
    }

    #[test]
    fn test_genesis_reader() {
        let reader = GenesisStorageReader::from_genesis(&genesis_with_storage());
        assert_eq!(reader.read_storage(contract(), U256::ZERO).unwrap(), encode_u64(25));
        assert_eq!(reader.read_storage(contract(), U256::from(5)).unwrap(), B256::ZERO);
        assert!(matches!(
            reader.read_storage(Address::ZERO, U256::ZERO),
            Err(ProviderError::UnknownContract(_))
        ));
        assert_eq!(reader.accounts().count(), 1);
    }

    #[test]
    fn test_genesis_reader_from_file() {
        let json = serde_json::to_string(&genesis_with_storage()).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let reader = GenesisStorageReader::load(file.path()).unwrap();
        assert_eq!(reader.read_storage(contract(), U256::ZERO).unwrap(), encode_u64(25));
    }

    #[test]
    fn test_genesis_load_errors_are_provider_errors() {
        let missing = Path::new("/nonexistent/genesis.json");
        match GenesisStorageReader::load(missing) {
            Err(ProviderError::GenesisLoad { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected genesis load error, got {other:?}"),
        }

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[1, 2").unwrap();
        assert!(matches!(
            GenesisStorageReader::load(file.path()),
            Err(ProviderError::GenesisLoad { .. })
        ));
    }
}
