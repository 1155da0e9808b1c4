use super::hasher::{Keccak, SlotHasher};
use super::plan::{check_fixed_lengths, plan_dynamic_element, plan_field, SlotPlan};
use super::value::{DecodedValue, MappingKey, ResolvedValue};
use super::StorageReader;
use crate::constants::DEFAULT_MAX_ARRAY_LENGTH;
use crate::errors::ResolveError;
use crate::layout::{LayoutDescriptor, LayoutField};
use alloy_primitives::{Address, U256};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, trace};

/// Mapping key paths, per field name.
///
/// A field that is (or contains) a mapping needs one key per mapping level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingKeys {
    keys: HashMap<String, Vec<MappingKey>>,
}

impl MappingKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `key` to the key path of `field`.
    pub fn with(mut self, field: impl Into<String>, key: impl Into<MappingKey>) -> Self {
        self.push(field, key);
        self
    }

    /// Append `key` to the key path of `field`.
    pub fn push(&mut self, field: impl Into<String>, key: impl Into<MappingKey>) {
        self.keys.entry(field.into()).or_default().push(key.into());
    }

    /// Key path for `field` (empty if none was given).
    pub fn get(&self, field: &str) -> &[MappingKey] {
        self.keys.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a key path was given for `field`.
    pub fn contains(&self, field: &str) -> bool {
        self.keys.contains_key(field)
    }
}

/// Resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Largest dynamic array length the resolver will walk
    pub max_array_length: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_array_length: DEFAULT_MAX_ARRAY_LENGTH }
    }
}

/// Decoded fields in the order they were requested.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    values: Vec<ResolvedValue>,
}

impl ResolvedFields {
    /// Decoded value of `field`, if it was resolved.
    pub fn get(&self, field: &str) -> Option<&DecodedValue> {
        self.values.iter().find(|v| v.field_name == field).map(|v| &v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedValue> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values keyed by field name.
    pub fn into_map(self) -> BTreeMap<String, ResolvedValue> {
        self.values.into_iter().map(|v| (v.field_name.clone(), v)).collect()
    }

    /// JSON object `{ field: value }` in resolution order.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .values
            .iter()
            .map(|v| (v.field_name.clone(), v.value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl IntoIterator for ResolvedFields {
    type Item = ResolvedValue;
    type IntoIter = std::vec::IntoIter<ResolvedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

/// Computes slots for declared fields, reads them and decodes the words.
///
/// The resolver holds no per-call state: every method takes `&self`, and the only
/// shared resource is the caller's [`StorageReader`]. Fields resolve in declaration
/// (or request) order; the first error aborts the call and nothing is returned.
#[derive(Debug, Clone, Default)]
pub struct StorageResolver<H = Keccak> {
    hasher: H,
    config: ResolverConfig,
}

impl StorageResolver<Keccak> {
    /// Resolver using keccak256 and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<H: SlotHasher> StorageResolver<H> {
    /// Resolver with an injected hash function.
    pub fn with_hasher(hasher: H) -> Self {
        Self { hasher, config: ResolverConfig::default() }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Slot plan for one field, without reading storage.
    pub fn plan(
        &self,
        layout: &LayoutDescriptor,
        field: &str,
        keys: &MappingKeys,
    ) -> Result<SlotPlan, ResolveError> {
        let field =
            layout.field(field).map_err(|_| ResolveError::UnknownField(field.to_string()))?;
        self.plan_checked(field, keys)
    }

    /// Resolve every field of `layout`.
    pub fn resolve<R: StorageReader + ?Sized>(
        &self,
        layout: &LayoutDescriptor,
        address: Address,
        reader: &R,
        keys: &MappingKeys,
    ) -> Result<ResolvedFields, ResolveError> {
        let fields: Vec<&LayoutField> = layout.iter().collect();
        self.resolve_all(&fields, address, reader, keys)
    }

    /// Resolve the named fields, in the given order.
    ///
    /// All names are checked before the first read, so an unknown name fails
    /// without touching storage.
    pub fn resolve_fields<R: StorageReader + ?Sized>(
        &self,
        layout: &LayoutDescriptor,
        names: &[&str],
        address: Address,
        reader: &R,
        keys: &MappingKeys,
    ) -> Result<ResolvedFields, ResolveError> {
        let fields = names
            .iter()
            .map(|name| {
                layout.field(name).map_err(|_| ResolveError::UnknownField(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.resolve_all(&fields, address, reader, keys)
    }

    /// Resolve a single field.
    pub fn resolve_field<R: StorageReader + ?Sized>(
        &self,
        layout: &LayoutDescriptor,
        name: &str,
        address: Address,
        reader: &R,
        keys: &MappingKeys,
    ) -> Result<ResolvedValue, ResolveError> {
        let field = layout.field(name).map_err(|_| ResolveError::UnknownField(name.to_string()))?;
        let value = self.resolve_one(field, address, reader, keys)?;
        Ok(ResolvedValue { field_name: field.name.clone(), value })
    }

    fn resolve_all<R: StorageReader + ?Sized>(
        &self,
        fields: &[&LayoutField],
        address: Address,
        reader: &R,
        keys: &MappingKeys,
    ) -> Result<ResolvedFields, ResolveError> {
        let mut values = Vec::with_capacity(fields.len());
        for field in fields {
            let value = self.resolve_one(field, address, reader, keys)?;
            values.push(ResolvedValue { field_name: field.name.clone(), value });
        }
        Ok(ResolvedFields { values })
    }

    fn resolve_one<R: StorageReader + ?Sized>(
        &self,
        field: &LayoutField,
        address: Address,
        reader: &R,
        keys: &MappingKeys,
    ) -> Result<DecodedValue, ResolveError> {
        let plan = self.plan_checked(field, keys)?;
        debug!(
            field = %field.name,
            kind = %field.kind,
            base_slot = %field.base_slot,
            "resolving field"
        );
        self.execute(&field.name, &plan, address, reader)
    }

    /// Plan `field`, refusing fixed arrays above the configured length limit.
    fn plan_checked(
        &self,
        field: &LayoutField,
        keys: &MappingKeys,
    ) -> Result<SlotPlan, ResolveError> {
        check_fixed_lengths(&field.name, &field.kind, self.config.max_array_length)?;
        plan_field(field, keys.get(&field.name), &self.hasher)
    }

    fn execute<R: StorageReader + ?Sized>(
        &self,
        field_name: &str,
        plan: &SlotPlan,
        address: Address,
        reader: &R,
    ) -> Result<DecodedValue, ResolveError> {
        match plan {
            SlotPlan::Word { slot, ty, byte_offset } => {
                trace!(field = field_name, %slot, "reading word");
                let word = reader.read_storage(address, *slot)?;
                Ok(DecodedValue::decode(&word, *ty, *byte_offset))
            }
            SlotPlan::Fixed(items) => items
                .iter()
                .map(|item| self.execute(field_name, item, address, reader))
                .collect::<Result<Vec<_>, _>>()
                .map(DecodedValue::Array),
            SlotPlan::Dynamic { length_slot, data_base, element, keys } => {
                let length = U256::from_be_bytes(reader.read_storage(address, *length_slot)?.0);
                let limit = self.config.max_array_length;
                if length > U256::from(limit) {
                    return Err(ResolveError::ArrayTooLong {
                        field: field_name.to_string(),
                        length,
                        limit,
                    });
                }
                let length = length.to::<u64>();
                debug!(field = field_name, length, %data_base, "reading dynamic array");

                let mut items = Vec::with_capacity(length as usize);
                for i in 0..length {
                    let plan = plan_dynamic_element(
                        field_name,
                        element,
                        *data_base,
                        i,
                        keys,
                        &self.hasher,
                    )?;
                    items.push(self.execute(field_name, &plan, address, reader)?);
                }
                Ok(DecodedValue::Array(items))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ProviderError;
    use crate::layout::{FieldKind, ScalarType};
    use crate::onchain::hasher::stub::StubHasher;
    use crate::onchain::helpers::{
        dynamic_array_data_slot, encode_address, encode_u64, mapping_value_slot,
    };
    use crate::onchain::providers::MemoryStorage;
    use alloy_primitives::B256;
    use std::cell::RefCell;

    // =========================================================================
    // Helper: storage readers for unit tests
    // =========================================================================

    fn contract() -> Address {
        Address::repeat_byte(0xc0)
    }

    /// Records every slot read before delegating.
    struct CountingStorage {
        inner: MemoryStorage,
        reads: RefCell<Vec<U256>>,
    }

    impl CountingStorage {
        fn new(inner: MemoryStorage) -> Self {
            Self { inner, reads: RefCell::new(Vec::new()) }
        }

        fn reads(&self) -> Vec<U256> {
            self.reads.borrow().clone()
        }
    }

    impl StorageReader for CountingStorage {
        fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
            self.reads.borrow_mut().push(slot);
            self.inner.read_storage(address, slot)
        }
    }

    /// Fails every read of one slot.
    struct FailingStorage {
        inner: MemoryStorage,
        bad_slot: U256,
    }

    impl StorageReader for FailingStorage {
        fn read_storage(&self, address: Address, slot: U256) -> Result<B256, ProviderError> {
            if slot == self.bad_slot {
                return Err(ProviderError::ReadFailed {
                    address,
                    slot,
                    reason: "connection reset".into(),
                });
            }
            self.inner.read_storage(address, slot)
        }
    }

    fn uint256() -> FieldKind {
        FieldKind::scalar(ScalarType::Uint(32))
    }

    /// favorite_number @0, fixed_arr @2 (uint256[1]), dyn_arr @1002 (uint256[])
    fn inspection_layout() -> LayoutDescriptor {
        LayoutDescriptor::builder()
            .push_at("favorite_number", U256::ZERO, uint256())
            .push_at("fixed_arr", U256::from(2), FieldKind::fixed_array(uint256(), 1))
            .push_at("dyn_arr", U256::from(1002), FieldKind::dynamic_array(uint256()))
            .build()
            .unwrap()
    }

    fn inspection_storage() -> MemoryStorage {
        MemoryStorage::new()
            .with_entry(contract(), U256::from(0), encode_u64(25))
            .with_entry(contract(), U256::from(2), encode_u64(222))
            .with_entry(contract(), U256::from(1002), encode_u64(1))
            .with_entry(contract(), U256::from(1003), encode_u64(333))
    }

    // =========================================================================
    // End-to-end scenarios
    // =========================================================================

    #[test]
    fn test_end_to_end_with_stub_hash() {
        let resolver = StorageResolver::with_hasher(StubHasher::new().with_slot(1002, 1003));
        let resolved = resolver
            .resolve(&inspection_layout(), contract(), &inspection_storage(), &MappingKeys::new())
            .unwrap();

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.get("favorite_number"), Some(&DecodedValue::from(25u64)));
        assert_eq!(
            resolved.get("fixed_arr"),
            Some(&DecodedValue::Array(vec![DecodedValue::from(222u64)]))
        );
        assert_eq!(
            resolved.get("dyn_arr"),
            Some(&DecodedValue::Array(vec![DecodedValue::from(333u64)]))
        );
        assert_eq!(
            resolved.iter().map(|v| v.field_name.as_str()).collect::<Vec<_>>(),
            vec!["favorite_number", "fixed_arr", "dyn_arr"]
        );
    }

    #[test]
    fn test_dynamic_array_reads_keccak_slot_in_production() {
        let data_base = dynamic_array_data_slot(&Keccak, U256::from(1002));
        let storage = MemoryStorage::new()
            .with_entry(contract(), U256::from(1002), encode_u64(2))
            .with_entry(contract(), data_base, encode_u64(333))
            .with_entry(contract(), data_base + U256::from(1), encode_u64(444));
        let reader = CountingStorage::new(storage);

        let value = StorageResolver::new()
            .resolve_field(
                &inspection_layout(),
                "dyn_arr",
                contract(),
                &reader,
                &MappingKeys::new(),
            )
            .unwrap();

        assert_eq!(
            value.value,
            DecodedValue::Array(vec![DecodedValue::from(333u64), DecodedValue::from(444u64)])
        );
        // length strictly before elements
        assert_eq!(reader.reads(), vec![U256::from(1002), data_base, data_base + U256::from(1)]);
    }

    #[test]
    fn test_empty_dynamic_array_reads_only_length() {
        let reader = CountingStorage::new(MemoryStorage::new());
        let value = StorageResolver::new()
            .resolve_field(
                &inspection_layout(),
                "dyn_arr",
                contract(),
                &reader,
                &MappingKeys::new(),
            )
            .unwrap();
        assert_eq!(value.value, DecodedValue::Array(vec![]));
        assert_eq!(reader.reads(), vec![U256::from(1002)]);
    }

    // =========================================================================
    // Packed scalars
    // =========================================================================

    #[test]
    fn test_packed_scalars_decode_from_shared_word() {
        let layout = LayoutDescriptor::builder()
            .push("owner", FieldKind::scalar(ScalarType::Address))
            .push("paused", FieldKind::scalar(ScalarType::Bool))
            .push("fee", FieldKind::scalar(ScalarType::Uint(2)))
            .push("delta", FieldKind::scalar(ScalarType::Int(4)))
            .build()
            .unwrap();

        let owner = Address::repeat_byte(0x42);
        let mut storage = MemoryStorage::new();
        storage.set_scalar(contract(), U256::ZERO, ScalarType::Address, 0, &owner.into());
        storage.set_scalar(contract(), U256::ZERO, ScalarType::Bool, 20, &true.into());
        storage.set_scalar(contract(), U256::ZERO, ScalarType::Uint(2), 21, &500u64.into());
        storage.set_scalar(
            contract(),
            U256::ZERO,
            ScalarType::Int(4),
            23,
            &DecodedValue::Int(alloy_primitives::I256::try_from(-7i64).unwrap()),
        );
        let reader = CountingStorage::new(storage);

        let resolved = StorageResolver::new()
            .resolve(&layout, contract(), &reader, &MappingKeys::new())
            .unwrap();

        assert_eq!(resolved.get("owner"), Some(&DecodedValue::Address(owner)));
        assert_eq!(resolved.get("paused"), Some(&DecodedValue::Bool(true)));
        assert_eq!(resolved.get("fee"), Some(&DecodedValue::from(500u64)));
        assert_eq!(
            resolved.get("delta"),
            Some(&DecodedValue::Int(alloy_primitives::I256::try_from(-7i64).unwrap()))
        );
        assert!(reader.reads().iter().all(|slot| *slot == U256::ZERO));
    }

    // =========================================================================
    // Mappings
    // =========================================================================

    fn balances_layout() -> LayoutDescriptor {
        LayoutDescriptor::builder()
            .push_at("balances", U256::from(11), FieldKind::mapping(uint256()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_mapping_resolution_is_deterministic() {
        let funder = Address::repeat_byte(0x07);
        let slot = mapping_value_slot(&Keccak, &MappingKey::from(funder), U256::from(11));
        let storage = MemoryStorage::new().with_entry(contract(), slot, encode_u64(5_000));
        let keys = MappingKeys::new().with("balances", funder);
        let resolver = StorageResolver::new();

        let first = resolver
            .resolve_field(&balances_layout(), "balances", contract(), &storage, &keys)
            .unwrap();
        let second = resolver
            .resolve_field(&balances_layout(), "balances", contract(), &storage, &keys)
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.value, DecodedValue::from(5_000u64));
    }

    #[test]
    fn test_mapping_without_key_fails_before_reading() {
        let reader = CountingStorage::new(MemoryStorage::new());
        let err = StorageResolver::new()
            .resolve(&balances_layout(), contract(), &reader, &MappingKeys::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::MissingMappingKey(name) if name == "balances"));
        assert!(reader.reads().is_empty());
    }

    #[test]
    fn test_mapping_of_dynamic_arrays() {
        let layout = LayoutDescriptor::builder()
            .push_at(
                "funders_by_round",
                U256::from(3),
                FieldKind::mapping(FieldKind::dynamic_array(FieldKind::scalar(
                    ScalarType::Address,
                ))),
            )
            .build()
            .unwrap();
        let round = MappingKey::from(1u64);
        let length_slot = mapping_value_slot(&Keccak, &round, U256::from(3));
        let data_base = dynamic_array_data_slot(&Keccak, length_slot);
        let funder = Address::repeat_byte(0x99);
        let storage = MemoryStorage::new()
            .with_entry(contract(), length_slot, encode_u64(1))
            .with_entry(contract(), data_base, encode_address(funder));

        let keys = MappingKeys::new().with("funders_by_round", 1u64);
        let value = StorageResolver::new()
            .resolve_field(&layout, "funders_by_round", contract(), &storage, &keys)
            .unwrap();
        assert_eq!(value.value, DecodedValue::Array(vec![DecodedValue::Address(funder)]));
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn test_unknown_field_performs_no_reads() {
        let reader = CountingStorage::new(inspection_storage());
        let err = StorageResolver::new()
            .resolve_fields(
                &inspection_layout(),
                &["favorite_number", "nope"],
                contract(),
                &reader,
                &MappingKeys::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnknownField(name) if name == "nope"));
        assert!(reader.reads().is_empty());
    }

    #[test]
    fn test_provider_error_propagates_and_aborts() {
        let reader = FailingStorage { inner: inspection_storage(), bad_slot: U256::from(2) };
        let err = StorageResolver::new()
            .resolve(&inspection_layout(), contract(), &reader, &MappingKeys::new())
            .unwrap_err();
        match err {
            ResolveError::Provider(ProviderError::ReadFailed { slot, reason, .. }) => {
                assert_eq!(slot, U256::from(2));
                assert_eq!(reason, "connection reset");
            }
            other => panic!("expected provider error, got {other:?}"),
        }
    }

    #[test]
    fn test_array_length_limit() {
        let storage =
            MemoryStorage::new().with_entry(contract(), U256::from(1002), B256::repeat_byte(0xff));
        let reader = CountingStorage::new(storage);
        let resolver = StorageResolver::with_hasher(Keccak)
            .with_config(ResolverConfig { max_array_length: 16 });

        let err = resolver
            .resolve_field(
                &inspection_layout(),
                "dyn_arr",
                contract(),
                &reader,
                &MappingKeys::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::ArrayTooLong { limit: 16, .. }));
        assert_eq!(reader.reads().len(), 1);
    }

    #[test]
    fn test_fixed_array_over_limit_fails_before_reading() {
        let layout = LayoutDescriptor::builder()
            .push("small", uint256())
            .push("huge", FieldKind::fixed_array(uint256(), 200_000))
            .build()
            .unwrap();
        let reader = CountingStorage::new(MemoryStorage::new());
        let resolver = StorageResolver::new().with_config(ResolverConfig { max_array_length: 16 });

        let err = resolver
            .resolve(&layout, contract(), &reader, &MappingKeys::new())
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ArrayTooLong { ref field, length, limit: 16 }
                if field == "huge" && length == U256::from(200_000)
        ));
        // `small` was read before `huge` failed; no element of `huge` was
        assert_eq!(reader.reads(), vec![U256::ZERO]);

        assert!(matches!(
            resolver.plan(&layout, "huge", &MappingKeys::new()),
            Err(ResolveError::ArrayTooLong { .. })
        ));
    }

    #[test]
    fn test_fixed_array_inside_dynamic_array_is_capped() {
        let layout = LayoutDescriptor::builder()
            .push("rows", FieldKind::dynamic_array(FieldKind::fixed_array(uint256(), 32)))
            .build()
            .unwrap();
        let reader = CountingStorage::new(MemoryStorage::new());
        let resolver = StorageResolver::new().with_config(ResolverConfig { max_array_length: 16 });

        let err = resolver
            .resolve_field(&layout, "rows", contract(), &reader, &MappingKeys::new())
            .unwrap_err();
        assert!(matches!(err, ResolveError::ArrayTooLong { limit: 16, .. }));
        assert!(reader.reads().is_empty());
    }

    #[test]
    fn test_plan_without_reads() {
        let resolver = StorageResolver::new();
        let plan = resolver.plan(&inspection_layout(), "fixed_arr", &MappingKeys::new()).unwrap();
        assert_eq!(plan.static_slots(), vec![U256::from(2)]);
        assert!(matches!(
            resolver.plan(&inspection_layout(), "missing", &MappingKeys::new()),
            Err(ResolveError::UnknownField(_))
        ));
    }

    #[test]
    fn test_resolved_fields_json() {
        let resolver = StorageResolver::with_hasher(StubHasher::new().with_slot(1002, 1003));
        let resolved = resolver
            .resolve(&inspection_layout(), contract(), &inspection_storage(), &MappingKeys::new())
            .unwrap();
        assert_eq!(
            resolved.to_json(),
            serde_json::json!({
                "favorite_number": "25",
                "fixed_arr": ["222"],
                "dyn_arr": ["333"],
            })
        );
    }

    #[test]
    fn test_resolved_fields_into_map() {
        let resolver = StorageResolver::with_hasher(StubHasher::new().with_slot(1002, 1003));
        let map = resolver
            .resolve(&inspection_layout(), contract(), &inspection_storage(), &MappingKeys::new())
            .unwrap()
            .into_map();
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["dyn_arr", "favorite_number", "fixed_arr"]);
        assert_eq!(map["favorite_number"].value, DecodedValue::from(25u64));
    }

    #[test]
    fn test_resolver_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StorageResolver>();
        assert_send_sync::<LayoutDescriptor>();
    }
}
