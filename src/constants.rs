/// Size of one storage word (and of one slot's contents) in bytes
pub const WORD_SIZE: usize = 32;
/// Ethereum address length (20 bytes)
pub const ADDRESS_LENGTH: usize = 20;
/// Default cap on dynamic array lengths read from storage
pub const DEFAULT_MAX_ARRAY_LENGTH: u64 = 10_000;
/// Default number of cached `(address, slot)` entries for the CLI reader
pub const DEFAULT_CACHE_ENTRIES: usize = 1_024;

/// Decimals reported by the mock price feed deployed on local networks
pub const STARTING_DECIMALS: u8 = 8;
/// Initial answer of the mock price feed: 2000 USD with 8 decimals
pub const STARTING_PRICE: i128 = 2_000 * 100_000_000;

/// Manifest name of the ETH/USD price feed deployment
pub const PRICE_FEED_MANIFEST: &str = "price_feed";
/// Manifest name of the coffee contract deployment
pub const COFFEE_MANIFEST: &str = "coffee";
