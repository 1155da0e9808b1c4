//! Declared storage layout of a contract.
//!
//! A [`LayoutDescriptor`] is an ordered, immutable list of [`LayoutField`]s. Each field
//! names a base slot and a [`FieldKind`] describing how its data is laid out from there:
//!
//! ```text
//!   Scalar        bytes [offset, offset + width) of the word at base (counted from the right)
//!   FixedArray    element i at base + i * footprint(element)
//!   DynamicArray  length at base, element i at keccak(base) + i * footprint(element)
//!   Mapping       value for key at keccak(pad32(key) ++ base)
//! ```
//!
//! Descriptors are built once per contract (see [`LayoutBuilder`] and [`file::LayoutFile`])
//! and shared read-only with the resolver for every call.

pub mod builder;
pub mod file;
pub mod known;

pub use builder::LayoutBuilder;
pub use file::{FieldSpec, LayoutFile};

use crate::constants::{ADDRESS_LENGTH, WORD_SIZE};
use crate::errors::LayoutError;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Scalar types
// =============================================================================

/// Value type stored inside a single word.
///
/// Widths are in bytes and always in `1..=32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ScalarType {
    /// Unsigned big-endian integer (`uint8` .. `uint256`)
    Uint(u8),
    /// Two's complement signed integer (`int8` .. `int256`)
    Int(u8),
    /// Boolean, one byte, non-zero is true
    Bool,
    /// 20-byte account address
    Address,
    /// Fixed-size byte string (`bytes1` .. `bytes32`)
    FixedBytes(u8),
}

impl ScalarType {
    /// Number of bytes this value occupies inside a word.
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::Uint(w) | Self::Int(w) | Self::FixedBytes(w) => *w as usize,
            Self::Bool => 1,
            Self::Address => ADDRESS_LENGTH,
        }
    }

    fn validate(&self) -> Result<(), LayoutError> {
        let width = self.byte_width();
        if width == 0 || width > WORD_SIZE {
            return Err(LayoutError::InvalidLayout(format!(
                "scalar type {self} has width {width}, expected 1..=32 bytes"
            )));
        }
        Ok(())
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(w) => write!(f, "uint{}", *w as u16 * 8),
            Self::Int(w) => write!(f, "int{}", *w as u16 * 8),
            Self::Bool => f.write_str("bool"),
            Self::Address => f.write_str("address"),
            Self::FixedBytes(w) => write!(f, "bytes{w}"),
        }
    }
}

impl FromStr for ScalarType {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || LayoutError::InvalidScalarType(s.to_string());

        let bits = |digits: &str| -> Result<u8, LayoutError> {
            if digits.is_empty() {
                return Ok(32);
            }
            let bits: u16 = digits.parse().map_err(|_| invalid())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(invalid());
            }
            Ok((bits / 8) as u8)
        };

        match s {
            "bool" => Ok(Self::Bool),
            "address" => Ok(Self::Address),
            _ => {
                if let Some(rest) = s.strip_prefix("uint") {
                    Ok(Self::Uint(bits(rest)?))
                } else if let Some(rest) = s.strip_prefix("int") {
                    Ok(Self::Int(bits(rest)?))
                } else if let Some(rest) = s.strip_prefix("bytes") {
                    let width: u8 = rest.parse().map_err(|_| invalid())?;
                    if width == 0 || width as usize > WORD_SIZE {
                        return Err(invalid());
                    }
                    Ok(Self::FixedBytes(width))
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

impl TryFrom<String> for ScalarType {
    type Error = LayoutError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ScalarType> for String {
    fn from(ty: ScalarType) -> Self {
        ty.to_string()
    }
}

// =============================================================================
// Field kinds
// =============================================================================

/// How a field's data is laid out starting from its base slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum FieldKind {
    /// Value packed into a single word
    Scalar {
        /// Declared value type
        #[serde(rename = "type")]
        ty: ScalarType,
        /// Offset of the value's lowest byte from the right end of the word
        #[serde(default)]
        byte_offset: u8,
    },
    /// `length` consecutive elements, each starting on a fresh slot
    FixedArray {
        /// Element layout
        element: Box<FieldKind>,
        /// Number of elements
        length: u64,
    },
    /// Length at the base slot, elements from `keccak(base)`
    DynamicArray {
        /// Element layout
        element: Box<FieldKind>,
    },
    /// Values addressed by `keccak(pad32(key) ++ base)`
    Mapping {
        /// Value layout
        value: Box<FieldKind>,
    },
}

impl FieldKind {
    /// Scalar at offset 0; the builder assigns the real offset.
    pub fn scalar(ty: ScalarType) -> Self {
        Self::Scalar { ty, byte_offset: 0 }
    }

    /// Scalar at an explicit byte offset within its word.
    pub fn scalar_at(ty: ScalarType, byte_offset: u8) -> Self {
        Self::Scalar { ty, byte_offset }
    }

    pub fn fixed_array(element: FieldKind, length: u64) -> Self {
        Self::FixedArray { element: Box::new(element), length }
    }

    pub fn dynamic_array(element: FieldKind) -> Self {
        Self::DynamicArray { element: Box::new(element) }
    }

    pub fn mapping(value: FieldKind) -> Self {
        Self::Mapping { value: Box::new(value) }
    }

    /// Number of whole slots a value of this kind occupies from its base.
    ///
    /// Returns `None` if the footprint does not fit in 256 bits.
    pub fn slot_footprint(&self) -> Option<U256> {
        match self {
            Self::Scalar { .. } | Self::DynamicArray { .. } | Self::Mapping { .. } => {
                Some(U256::from(1))
            }
            Self::FixedArray { element, length } => {
                element.slot_footprint()?.checked_mul(U256::from(*length))
            }
        }
    }

    /// Validate this kind as a top-level field (scalars may carry an offset).
    fn validate(&self) -> Result<(), LayoutError> {
        match self {
            Self::Scalar { ty, byte_offset } => {
                ty.validate()?;
                if *byte_offset as usize + ty.byte_width() > WORD_SIZE {
                    return Err(LayoutError::InvalidLayout(format!(
                        "{ty} at byte offset {byte_offset} does not fit in a 32-byte word"
                    )));
                }
                Ok(())
            }
            Self::FixedArray { element, length } => {
                if *length == 0 {
                    return Err(LayoutError::InvalidLayout(
                        "fixed array must have at least one element".into(),
                    ));
                }
                element.validate_element()
            }
            Self::DynamicArray { element } => element.validate_element(),
            Self::Mapping { value } => value.validate_element(),
        }
    }

    /// Elements and mapping values always start on a fresh word.
    fn validate_element(&self) -> Result<(), LayoutError> {
        if let Self::Scalar { ty, byte_offset } = self {
            if *byte_offset != 0 {
                return Err(LayoutError::InvalidLayout(format!(
                    "nested {ty} cannot declare a byte offset"
                )));
            }
        }
        self.validate()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar { ty, .. } => write!(f, "{ty}"),
            Self::FixedArray { element, length } => write!(f, "{element}[{length}]"),
            Self::DynamicArray { element } => write!(f, "{element}[]"),
            Self::Mapping { value } => write!(f, "mapping(bytes32 => {value})"),
        }
    }
}

// =============================================================================
// Fields and descriptor
// =============================================================================

/// One named field of a contract's storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutField {
    /// Field name, unique within its descriptor
    pub name: String,
    /// First slot occupied by the field
    pub base_slot: U256,
    /// Layout of the field's data
    pub kind: FieldKind,
}

impl LayoutField {
    pub fn new(name: impl Into<String>, base_slot: U256, kind: FieldKind) -> Self {
        Self { name: name.into(), base_slot, kind }
    }

    fn occupancy(&self) -> Result<Occupancy, LayoutError> {
        match &self.kind {
            FieldKind::Scalar { ty, byte_offset } => {
                let start = *byte_offset as usize;
                Ok(Occupancy::Bytes { slot: self.base_slot, start, end: start + ty.byte_width() })
            }
            kind => {
                let end = kind
                    .slot_footprint()
                    .and_then(|footprint| self.base_slot.checked_add(footprint))
                    .ok_or_else(|| {
                        LayoutError::InvalidLayout(format!(
                            "field `{}` extends past the last storage slot",
                            self.name
                        ))
                    })?;
                Ok(Occupancy::Slots { start: self.base_slot, end })
            }
        }
    }
}

/// Storage footprint used for overlap checks.
#[derive(Debug, Clone, Copy)]
enum Occupancy {
    /// Byte range `[start, end)` of a single slot
    Bytes { slot: U256, start: usize, end: usize },
    /// Whole slots `[start, end)`
    Slots { start: U256, end: U256 },
}

impl Occupancy {
    fn overlaps(&self, other: &Occupancy) -> bool {
        match (*self, *other) {
            (
                Occupancy::Bytes { slot: a, start: a_start, end: a_end },
                Occupancy::Bytes { slot: b, start: b_start, end: b_end },
            ) => a == b && a_start < b_end && b_start < a_end,
            (Occupancy::Bytes { slot, .. }, Occupancy::Slots { start, end })
            | (Occupancy::Slots { start, end }, Occupancy::Bytes { slot, .. }) => {
                slot >= start && slot < end
            }
            (
                Occupancy::Slots { start: a_start, end: a_end },
                Occupancy::Slots { start: b_start, end: b_end },
            ) => a_start < b_end && b_start < a_end,
        }
    }
}

/// Ordered, validated description of a contract's storage fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDescriptor {
    fields: Vec<LayoutField>,
    index: HashMap<String, usize>,
}

impl LayoutDescriptor {
    /// Start a builder that assigns slots automatically in declaration order.
    pub fn builder() -> LayoutBuilder {
        LayoutBuilder::new()
    }

    /// Build a descriptor from fields whose slots are already known.
    ///
    /// Fails with [`LayoutError::InvalidLayout`] on duplicate names, invalid kinds
    /// or overlapping storage ranges.
    pub fn from_fields(fields: Vec<LayoutField>) -> Result<Self, LayoutError> {
        let mut index = HashMap::with_capacity(fields.len());
        let mut occupied: Vec<(usize, Occupancy)> = Vec::with_capacity(fields.len());

        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.name.clone(), i).is_some() {
                return Err(LayoutError::InvalidLayout(format!(
                    "duplicate field name `{}`",
                    field.name
                )));
            }
            field.kind.validate().map_err(|err| match err {
                LayoutError::InvalidLayout(reason) => {
                    LayoutError::InvalidLayout(format!("field `{}`: {reason}", field.name))
                }
                other => other,
            })?;

            let occupancy = field.occupancy()?;
            if let Some((j, _)) = occupied.iter().find(|(_, o)| o.overlaps(&occupancy)) {
                return Err(LayoutError::InvalidLayout(format!(
                    "field `{}` overlaps field `{}`",
                    field.name, fields[*j].name
                )));
            }
            occupied.push((i, occupancy));
        }

        Ok(Self { fields, index })
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Result<&LayoutField, LayoutError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| LayoutError::UnknownField(name.to_string()))
    }

    /// Whether a field with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[LayoutField] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &LayoutField> {
        self.fields.iter()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
