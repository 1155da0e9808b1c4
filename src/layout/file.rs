//! JSON form of a storage layout.
//!
//! ```json
//! {
//!   "contract": "BuyMeACoffee",
//!   "fields": [
//!     { "name": "funders", "kind": { "encoding": "dynamic_array",
//!                                    "element": { "encoding": "scalar", "type": "address" } } },
//!     { "name": "eip1967_impl", "slot": "0x3608...2bbc",
//!       "kind": { "encoding": "scalar", "type": "address" } }
//!   ]
//! }
//! ```
//!
//! Fields without a `slot` are placed by [`LayoutBuilder::push`]; fields with one go
//! through [`LayoutBuilder::push_at`]. Slots may be JSON numbers or decimal/hex strings.

use super::{FieldKind, LayoutBuilder, LayoutDescriptor};
use crate::errors::LayoutError;
use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// A layout file as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutFile {
    /// Optional contract name, informational only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldSpec>,
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Explicit slot; omitted for automatic placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotIndex>,
    pub kind: FieldKind,
}

/// Slot index as written in a layout file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotIndex {
    Number(u64),
    Text(String),
}

impl SlotIndex {
    fn to_u256(&self) -> Result<U256, LayoutError> {
        match self {
            Self::Number(n) => Ok(U256::from(*n)),
            Self::Text(text) => U256::from_str(text.trim()).map_err(|err| {
                LayoutError::InvalidLayout(format!("invalid slot `{text}`: {err}"))
            }),
        }
    }
}

impl LayoutFile {
    /// Parse a layout from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, LayoutError> {
        serde_json::from_str(json)
            .map_err(|err| LayoutError::InvalidLayout(format!("malformed layout JSON: {err}")))
    }

    /// Read and parse a layout file.
    ///
    /// Both I/O and JSON failures come back as [`LayoutError::Load`] naming `path`.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let load_err = |reason: String| LayoutError::Load { path: path.to_path_buf(), reason };
        let json = std::fs::read_to_string(path).map_err(|err| load_err(err.to_string()))?;
        serde_json::from_str(&json).map_err(|err| load_err(err.to_string()))
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, LayoutError> {
        serde_json::to_string_pretty(self).map_err(|err| LayoutError::Serialize(err.to_string()))
    }

    /// Place the fields and validate the resulting descriptor.
    pub fn into_descriptor(self) -> Result<LayoutDescriptor, LayoutError> {
        let mut builder = LayoutBuilder::new();
        for spec in self.fields {
            builder = match spec.slot {
                Some(slot) => builder.push_at(spec.name, slot.to_u256()?, spec.kind),
                None => builder.push(spec.name, spec.kind),
            };
        }
        builder.build()
    }
}

impl From<&LayoutDescriptor> for LayoutFile {
    /// Describe an existing descriptor with every slot written out explicitly.
    fn from(layout: &LayoutDescriptor) -> Self {
        let fields = layout
            .iter()
            .map(|field| FieldSpec {
                name: field.name.clone(),
                slot: Some(SlotIndex::Text(field.base_slot.to_string())),
                kind: field.kind.clone(),
            })
            .collect();
        Self { contract: None, fields }
    }
}
