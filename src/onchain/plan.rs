//! Pure slot planning: which words to read for a field, and how to decode them.
//!
//! Planning never touches storage. The only part that cannot be planned up front is
//! the element list of a dynamic array, whose length lives in storage; the plan
//! records where the length is and where element 0 starts, and the resolver plans
//! the elements once the length is known.

use super::hasher::SlotHasher;
use super::helpers::{dynamic_array_data_slot, mapping_value_slot};
use super::value::MappingKey;
use crate::errors::ResolveError;
use crate::layout::{FieldKind, LayoutField, ScalarType};
use alloy_primitives::U256;

/// Read plan for one field (or one element of it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPlan {
    /// Read one word and decode a scalar from it
    Word {
        slot: U256,
        ty: ScalarType,
        byte_offset: usize,
    },
    /// Fixed-size sequence of element plans
    Fixed(Vec<SlotPlan>),
    /// Read the length at `length_slot`, then plan `element` from `data_base`
    Dynamic {
        length_slot: U256,
        data_base: U256,
        element: FieldKind,
        /// Keys still to be consumed by mappings nested in the element
        keys: Vec<MappingKey>,
    },
}

impl SlotPlan {
    /// Slots known without reading storage, in read order.
    ///
    /// For dynamic arrays this is the length slot only.
    pub fn static_slots(&self) -> Vec<U256> {
        let mut slots = Vec::new();
        self.collect_static_slots(&mut slots);
        slots
    }

    fn collect_static_slots(&self, out: &mut Vec<U256>) {
        match self {
            Self::Word { slot, .. } => out.push(*slot),
            Self::Fixed(items) => items.iter().for_each(|item| item.collect_static_slots(out)),
            Self::Dynamic { length_slot, .. } => out.push(*length_slot),
        }
    }
}

/// Plan a field of a descriptor.
///
/// `keys` is the key path for mappings: the outermost mapping consumes `keys[0]`,
/// a mapping nested in its value consumes `keys[1]`, and so on. Array elements
/// share the key path of their array.
pub fn plan_field<H: SlotHasher + ?Sized>(
    field: &LayoutField,
    keys: &[MappingKey],
    hasher: &H,
) -> Result<SlotPlan, ResolveError> {
    plan_kind(&field.name, &field.kind, field.base_slot, keys, hasher)
}

/// Plan a value of `kind` stored from `base`.
pub fn plan_kind<H: SlotHasher + ?Sized>(
    field_name: &str,
    kind: &FieldKind,
    base: U256,
    keys: &[MappingKey],
    hasher: &H,
) -> Result<SlotPlan, ResolveError> {
    match kind {
        FieldKind::Scalar { ty, byte_offset } => Ok(SlotPlan::Word {
            slot: base,
            ty: *ty,
            byte_offset: *byte_offset as usize,
        }),
        FieldKind::FixedArray { element, length } => {
            let stride = element_stride(element);
            let items = (0..*length)
                .map(|i| {
                    let slot = element_slot(base, i, stride);
                    plan_kind(field_name, element, slot, keys, hasher)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SlotPlan::Fixed(items))
        }
        FieldKind::DynamicArray { element } => Ok(SlotPlan::Dynamic {
            length_slot: base,
            data_base: dynamic_array_data_slot(&hasher, base),
            element: (**element).clone(),
            keys: keys.to_vec(),
        }),
        FieldKind::Mapping { value } => {
            let (key, rest) = keys
                .split_first()
                .ok_or_else(|| ResolveError::MissingMappingKey(field_name.to_string()))?;
            let slot = mapping_value_slot(&hasher, key, base);
            plan_kind(field_name, value, slot, rest, hasher)
        }
    }
}

/// Plan element `index` of a dynamic array whose data starts at `data_base`.
pub fn plan_dynamic_element<H: SlotHasher + ?Sized>(
    field_name: &str,
    element: &FieldKind,
    data_base: U256,
    index: u64,
    keys: &[MappingKey],
    hasher: &H,
) -> Result<SlotPlan, ResolveError> {
    let slot = element_slot(data_base, index, element_stride(element));
    plan_kind(field_name, element, slot, keys, hasher)
}

/// Reject fixed arrays longer than `limit` anywhere inside `kind`.
///
/// Fixed arrays are planned element by element up front, so this has to run before
/// [`plan_field`]; dynamic array lengths are only known, and checked, while reading.
pub fn check_fixed_lengths(
    field_name: &str,
    kind: &FieldKind,
    limit: u64,
) -> Result<(), ResolveError> {
    match kind {
        FieldKind::Scalar { .. } => Ok(()),
        FieldKind::FixedArray { element, length } => {
            if *length > limit {
                return Err(ResolveError::ArrayTooLong {
                    field: field_name.to_string(),
                    length: U256::from(*length),
                    limit,
                });
            }
            check_fixed_lengths(field_name, element, limit)
        }
        FieldKind::DynamicArray { element } => check_fixed_lengths(field_name, element, limit),
        FieldKind::Mapping { value } => check_fixed_lengths(field_name, value, limit),
    }
}

/// Slots between consecutive elements. Validated layouts never overflow here.
fn element_stride(element: &FieldKind) -> U256 {
    element.slot_footprint().unwrap_or(U256::from(1))
}

/// `base + index * stride`, wrapping like EVM slot arithmetic.
fn element_slot(base: U256, index: u64, stride: U256) -> U256 {
    base.wrapping_add(U256::from(index).wrapping_mul(stride))
}
