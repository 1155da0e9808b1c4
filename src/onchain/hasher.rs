use alloy_primitives::{keccak256, B256};

/// One-way hash used to derive dynamic array and mapping slots.
///
/// Production code uses [`Keccak`]; tests substitute deterministic stubs.
pub trait SlotHasher {
    /// Hash `input` to a 32-byte digest.
    fn hash(&self, input: &[u8]) -> B256;
}

impl<H: SlotHasher + ?Sized> SlotHasher for &H {
    fn hash(&self, input: &[u8]) -> B256 {
        (**self).hash(input)
    }
}

/// keccak256, the hash the EVM uses for storage slot derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keccak;

impl SlotHasher for Keccak {
    fn hash(&self, input: &[u8]) -> B256 {
        keccak256(input)
    }
}


#[cfg(test)]
mod tests {
    use super::stub::StubHasher;
    use super::*;
    use alloy_primitives::U256;

    #[test]
    fn test_keccak_known_vector() {
        // keccak256 of the empty string
        assert_eq!(
            Keccak.hash(&[]),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
                .parse::<B256>()
                .unwrap()
        );
    }

    #[test]
    fn test_keccak_is_deterministic() {
        let input = [7u8; 64];
        assert_eq!(Keccak.hash(&input), Keccak.hash(&input));
        assert_ne!(Keccak.hash(&input), Keccak.hash(&input[..63]));
    }

    #[test]
    fn test_stub_hasher_table_and_fallback() {
        let stub = StubHasher::new().with_slot(1002, 1003);
        let input = B256::from(U256::from(1002).to_be_bytes::<32>());
        assert_eq!(stub.hash(input.as_slice()), B256::from(U256::from(1003).to_be_bytes::<32>()));

        let other = [1u8; 32];
        assert_eq!(stub.hash(&other), Keccak.hash(&other));
    }
}
