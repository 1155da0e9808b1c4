use super::helpers::{insert_scalar_bytes, scalar_bytes};
use crate::constants::WORD_SIZE;
use crate::layout::ScalarType;
use alloy_primitives::{hex, Address, B256, I256, U256};
use std::fmt;
use std::str::FromStr;

/// A value decoded from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Uint(U256),
    Int(I256),
    Bool(bool),
    Address(Address),
    /// `bytesN` contents as stored
    Bytes(Vec<u8>),
    /// Elements of a fixed or dynamic array, in index order
    Array(Vec<DecodedValue>),
}

impl DecodedValue {
    /// Decode the scalar of type `ty` stored at `byte_offset` in `word`.
    pub fn decode(word: &B256, ty: ScalarType, byte_offset: usize) -> Self {
        let width = ty.byte_width();
        let bytes = scalar_bytes(word, byte_offset, width);
        match ty {
            ScalarType::Uint(_) => Self::Uint(U256::from_be_slice(bytes)),
            ScalarType::Int(_) => {
                let fill = if bytes[0] & 0x80 != 0 { 0xff } else { 0x00 };
                let mut extended = [fill; WORD_SIZE];
                extended[WORD_SIZE - width..].copy_from_slice(bytes);
                Self::Int(I256::from_raw(U256::from_be_bytes(extended)))
            }
            ScalarType::Bool => Self::Bool(bytes.iter().any(|b| *b != 0)),
            ScalarType::Address => Self::Address(Address::from_slice(bytes)),
            ScalarType::FixedBytes(_) => Self::Bytes(bytes.to_vec()),
        }
    }

    /// Write this value into `word` as a `ty` at `byte_offset`.
    ///
    /// Returns `None` if the value does not match `ty` or does not fit its width.
    pub fn encode_into(&self, word: B256, ty: ScalarType, byte_offset: usize) -> Option<B256> {
        let width = ty.byte_width();
        if width == 0 || byte_offset + width > WORD_SIZE {
            return None;
        }
        let full = match (self, ty) {
            (Self::Uint(v), ScalarType::Uint(_)) => {
                if v.bit_len() > width * 8 {
                    return None;
                }
                v.to_be_bytes::<32>()
            }
            (Self::Int(v), ScalarType::Int(_)) => {
                let full = v.into_raw().to_be_bytes::<32>();
                let fill = if v.is_negative() { 0xff } else { 0x00 };
                let sign_ok = full[WORD_SIZE - width] & 0x80 == fill & 0x80;
                if !sign_ok || full[..WORD_SIZE - width].iter().any(|b| *b != fill) {
                    return None;
                }
                full
            }
            (Self::Bool(v), ScalarType::Bool) => encode_low_bytes(&[u8::from(*v)]),
            (Self::Address(a), ScalarType::Address) => encode_low_bytes(a.as_slice()),
            (Self::Bytes(b), ScalarType::FixedBytes(_)) if b.len() == width => encode_low_bytes(b),
            _ => return None,
        };
        Some(insert_scalar_bytes(word, byte_offset, &full[WORD_SIZE - width..]))
    }

    /// JSON form: integers as decimal strings, bytes as 0x-hex, arrays as arrays.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Uint(v) => Value::String(v.to_string()),
            Self::Int(v) => Value::String(v.to_string()),
            Self::Bool(b) => Value::Bool(*b),
            Self::Address(a) => Value::String(a.to_checksum(None)),
            Self::Bytes(b) => Value::String(hex::encode_prefixed(b)),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

fn encode_low_bytes(bytes: &[u8]) -> [u8; WORD_SIZE] {
    let mut full = [0u8; WORD_SIZE];
    full[WORD_SIZE - bytes.len()..].copy_from_slice(bytes);
    full
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Address(a) => write!(f, "{a}"),
            Self::Bytes(b) => f.write_str(&hex::encode_prefixed(b)),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<U256> for DecodedValue {
    fn from(v: U256) -> Self {
        Self::Uint(v)
    }
}

impl From<u64> for DecodedValue {
    fn from(v: u64) -> Self {
        Self::Uint(U256::from(v))
    }
}

impl From<Address> for DecodedValue {
    fn from(a: Address) -> Self {
        Self::Address(a)
    }
}

impl From<bool> for DecodedValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A decoded field, tagged with the field it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub field_name: String,
    pub value: DecodedValue,
}

/// Mapping key, padded to one 32-byte word as it is hashed.
///
/// Value types (integers, addresses, bools) are left-padded; `bytesN` keys are
/// right-padded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MappingKey(B256);

impl MappingKey {
    /// Right-pad a `bytesN` key. Returns `None` for more than 32 bytes.
    pub fn from_fixed_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > WORD_SIZE {
            return None;
        }
        let mut word = [0u8; WORD_SIZE];
        word[..bytes.len()].copy_from_slice(bytes);
        Some(Self(B256::from(word)))
    }

    /// The padded key word.
    pub const fn as_word(&self) -> &B256 {
        &self.0
    }
}

impl From<U256> for MappingKey {
    fn from(v: U256) -> Self {
        Self(B256::from(v.to_be_bytes::<32>()))
    }
}

impl From<u64> for MappingKey {
    fn from(v: u64) -> Self {
        Self::from(U256::from(v))
    }
}

impl From<Address> for MappingKey {
    fn from(a: Address) -> Self {
        Self(a.into_word())
    }
}

impl From<bool> for MappingKey {
    fn from(b: bool) -> Self {
        Self::from(U256::from(u8::from(b)))
    }
}

impl FromStr for MappingKey {
    type Err = String;

    /// Parses `0x`-prefixed hex (left-padded, up to 32 bytes) or a decimal integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(digits) = s.strip_prefix("0x") {
            let bytes = hex::decode(digits).map_err(|err| format!("invalid hex key `{s}`: {err}"))?;
            if bytes.len() > WORD_SIZE {
                return Err(format!("key `{s}` is longer than 32 bytes"));
            }
            let mut word = [0u8; WORD_SIZE];
            word[WORD_SIZE - bytes.len()..].copy_from_slice(&bytes);
            Ok(Self(B256::from(word)))
        } else {
            U256::from_str_radix(s, 10)
                .map(Self::from)
                .map_err(|err| format!("invalid decimal key `{s}`: {err}"))
        }
    }
}
