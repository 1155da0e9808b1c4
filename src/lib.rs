//! # Storage Resolver - EVM contract storage layout resolution
//!
//! Given the declared storage layout of a contract (scalars, fixed arrays,
//! dynamic arrays and mappings), computes the slots holding each field and decodes
//! the stored words into typed values, following the EVM slot assignment rules.
//! Also ships the deploy / withdraw flows for the coffee contract behind a
//! [`network::Network`] trait.

pub mod cache;
pub mod cli;
pub mod constants;
pub mod errors;
pub mod layout;
pub mod logging;
pub mod network;
pub mod onchain;
pub mod output;
