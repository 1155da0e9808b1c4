use alloy_primitives::{Address, U256};
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, building or querying a
/// [`LayoutDescriptor`](crate::layout::LayoutDescriptor).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// No field with this name exists in the descriptor
    #[error("Unknown field `{0}`")]
    UnknownField(String),

    /// The declared layout is inconsistent (overlapping ranges, bad widths, duplicates)
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    /// A scalar type spelling could not be parsed
    #[error("Invalid scalar type `{0}`")]
    InvalidScalarType(String),

    /// A layout file could not be read or parsed
    #[error("Cannot load layout {}: {reason}", path.display())]
    Load {
        /// File that was being loaded
        path: PathBuf,
        /// I/O or JSON error text
        reason: String,
    },

    /// A layout could not be written out as JSON
    #[error("Cannot serialize layout: {0}")]
    Serialize(String),
}

/// Failure reported by a [`StorageReader`](crate::onchain::StorageReader).
///
/// The resolver never retries; these are surfaced to the caller verbatim.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The backing store has no view of this contract
    #[error("Contract {0} is not available from this provider")]
    UnknownContract(Address),

    /// The read itself failed (transport, lookup or timeout)
    #[error("Failed to read slot {slot} of {address}: {reason}")]
    ReadFailed {
        /// Contract that was being read
        address: Address,
        /// Slot that was being read
        slot: U256,
        /// Backend-specific description
        reason: String,
    },

    /// A genesis file could not be read or parsed
    #[error("Cannot load genesis {}: {reason}", path.display())]
    GenesisLoad {
        /// File that was being loaded
        path: PathBuf,
        /// I/O or JSON error text
        reason: String,
    },
}

/// Errors that can occur while resolving fields against contract storage.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Requested field is not part of the descriptor
    #[error("Unknown field `{0}`")]
    UnknownField(String),

    /// A mapping field was resolved without a key for one of its levels
    #[error("Mapping field `{0}` needs a key to be resolved")]
    MissingMappingKey(String),

    /// An array is longer than the configured limit
    #[error("Array in `{field}` has length {length}, limit is {limit}")]
    ArrayTooLong {
        /// Field holding the array
        field: String,
        /// Declared (fixed) or stored (dynamic) length
        length: U256,
        /// Configured maximum
        limit: u64,
    },

    /// Layout-level failure (surfaced while resolving)
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Storage provider failure, propagated unchanged
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Errors surfaced by the deployment / withdrawal orchestration.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// No deployment with this name is recorded for the active network
    #[error("No deployment named `{name}` on network `{network}`")]
    MissingDeployment {
        /// Manifest entry that was looked up
        name: String,
        /// Active network
        network: String,
    },

    /// Deployment transaction failed
    #[error("Deployment of {0} failed: {1}")]
    DeployFailed(String, String),

    /// Explorer verification failed or timed out
    #[error("Verification of {0} failed: {1}")]
    VerificationFailed(Address, String),

    /// Any other transaction failure (funding, withdrawal)
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}
