//! Storage layouts of the contracts shipped with this kit.
//!
//! The descriptors are built from the slot constants below, so both stay in one place.
//! The constants follow declaration order with Solidity-style slot assignment; they are
//! not read from a compiler's storage layout output.

use super::{FieldKind, LayoutBuilder, LayoutDescriptor, ScalarType};
use crate::errors::LayoutError;
use alloy_primitives::U256;

/// BuyMeACoffee contract storage layout.
///
/// Assumes `funders` is the first storage variable (a hash-addressed dynamic array) and
/// `funder_to_amount_funded` the second (a mapping), with `MINIMUM_USD`, `PRICE_FEED` and
/// `OWNER` as constants/immutables that take no slot. Not checked against the compiled
/// contract; declare a layout file instead if the deployed contract differs.
pub mod coffee_slots {
    use alloy_primitives::U256;

    /// slot 0: funders (dynamic array of address, length word)
    pub const FUNDERS: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 1: funder_to_amount_funded (mapping(address => uint256))
    pub const FUNDER_TO_AMOUNT_FUNDED: U256 = U256::from_limbs([1, 0, 0, 0]);
}

/// Storage-inspection demo contract layout.
pub mod inspection_slots {
    use alloy_primitives::U256;

    /// slot 0: favorite_number (uint256)
    pub const FAVORITE_NUMBER: U256 = U256::from_limbs([0, 0, 0, 0]);
    /// slot 1: some_bool (bool)
    pub const SOME_BOOL: U256 = U256::from_limbs([1, 0, 0, 0]);
    /// slots 2..1002: my_fixed_array (uint256[1000])
    pub const MY_FIXED_ARRAY: U256 = U256::from_limbs([2, 0, 0, 0]);
    /// slot 1002: my_dyn_array (uint256[], length word)
    pub const MY_DYN_ARRAY: U256 = U256::from_limbs([1002, 0, 0, 0]);
    /// slot 1003: my_map (mapping(uint256 => uint256))
    pub const MY_MAP: U256 = U256::from_limbs([1003, 0, 0, 0]);

    /// Number of elements in my_fixed_array
    pub const MY_FIXED_ARRAY_LENGTH: u64 = 1000;
}

/// Layout of the BuyMeACoffee contract.
pub fn coffee_layout() -> Result<LayoutDescriptor, LayoutError> {
    LayoutBuilder::new()
        .push_at(
            "funders",
            coffee_slots::FUNDERS,
            FieldKind::dynamic_array(FieldKind::scalar(ScalarType::Address)),
        )
        .push_at(
            "funder_to_amount_funded",
            coffee_slots::FUNDER_TO_AMOUNT_FUNDED,
            FieldKind::mapping(FieldKind::scalar(ScalarType::Uint(32))),
        )
        .build()
}

/// Layout of the storage-inspection demo contract.
pub fn inspection_layout() -> Result<LayoutDescriptor, LayoutError> {
    LayoutBuilder::new()
        .push_at("favorite_number", inspection_slots::FAVORITE_NUMBER, uint256())
        .push_at("some_bool", inspection_slots::SOME_BOOL, FieldKind::scalar(ScalarType::Bool))
        .push_at(
            "my_fixed_array",
            inspection_slots::MY_FIXED_ARRAY,
            FieldKind::fixed_array(uint256(), inspection_slots::MY_FIXED_ARRAY_LENGTH),
        )
        .push_at(
            "my_dyn_array",
            inspection_slots::MY_DYN_ARRAY,
            FieldKind::dynamic_array(uint256()),
        )
        .push_at("my_map", inspection_slots::MY_MAP, FieldKind::mapping(uint256()))
        .build()
}

/// Look up a built-in layout by name (`coffee` or `inspection`).
pub fn by_name(name: &str) -> Option<Result<LayoutDescriptor, LayoutError>> {
    match name {
        "coffee" => Some(coffee_layout()),
        "inspection" => Some(inspection_layout()),
        _ => None,
    }
}

fn uint256() -> FieldKind {
    FieldKind::scalar(ScalarType::Uint(32))
}

/// Slot right after the last one used by the inspection layout's fixed array.
pub fn inspection_fixed_array_end() -> U256 {
    inspection_slots::MY_FIXED_ARRAY + U256::from(inspection_slots::MY_FIXED_ARRAY_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coffee_slot_values() {
        assert_eq!(coffee_slots::FUNDERS, U256::ZERO);
        assert_eq!(coffee_slots::FUNDER_TO_AMOUNT_FUNDED, U256::from(1));
    }

    #[test]
    fn test_inspection_slot_values() {
        assert_eq!(inspection_slots::FAVORITE_NUMBER, U256::ZERO);
        assert_eq!(inspection_slots::SOME_BOOL, U256::from(1));
        assert_eq!(inspection_slots::MY_FIXED_ARRAY, U256::from(2));
        assert_eq!(inspection_slots::MY_DYN_ARRAY, U256::from(1002));
        assert_eq!(inspection_fixed_array_end(), inspection_slots::MY_DYN_ARRAY);
    }

    #[test]
    fn test_builtin_layouts_are_valid() {
        let coffee = coffee_layout().unwrap();
        assert_eq!(coffee.names().collect::<Vec<_>>(), vec!["funders", "funder_to_amount_funded"]);

        let inspection = inspection_layout().unwrap();
        assert_eq!(inspection.len(), 5);
        assert_eq!(inspection.field("my_map").unwrap().base_slot, U256::from(1003));
    }

    #[test]
    fn test_by_name() {
        assert!(by_name("coffee").is_some());
        assert!(by_name("inspection").is_some());
        assert!(by_name("unknown").is_none());
    }
}
