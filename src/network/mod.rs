//! Deployment and withdrawal flows for the coffee contract.
//!
//! Everything that talks to a chain (deploying, explorer verification, sending
//! transactions) sits behind the [`Network`] trait. The functions here only decide
//! *what* to do on the active network, which is always passed in explicitly.

use crate::constants::{COFFEE_MANIFEST, PRICE_FEED_MANIFEST, STARTING_DECIMALS, STARTING_PRICE};
use crate::errors::NetworkError;
use alloy_primitives::Address;
use std::fmt;
use tracing::{info, warn};

/// A deployed contract known to a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractHandle {
    /// Manifest / artifact name, e.g. `coffee`
    pub name: String,
    pub address: Address,
}

impl ContractHandle {
    pub fn new(name: impl Into<String>, address: Address) -> Self {
        Self { name: name.into(), address }
    }
}

impl fmt::Display for ContractHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.name, self.address)
    }
}

/// A pending explorer verification.
pub trait Verification {
    /// Block until the explorer accepted (or rejected) the submission.
    fn wait_for_verification(&self) -> Result<(), NetworkError>;
}

/// The active deployment target.
pub trait Network {
    type Verification: Verification;

    fn name(&self) -> &str;

    /// Whether a block explorer accepts source verification on this network.
    fn has_explorer(&self) -> bool;

    /// Local dev chains and forks of live chains.
    fn is_local_or_forked_network(&self) -> bool;

    /// Look up a recorded deployment by manifest name.
    fn manifest_named(&self, name: &str) -> Option<ContractHandle>;

    /// Deploy the mock price feed aggregator.
    ///
    /// A reverted or dropped deployment is [`NetworkError::DeployFailed`].
    fn deploy_price_feed(
        &self,
        decimals: u8,
        initial_answer: i128,
    ) -> Result<ContractHandle, NetworkError>;

    /// Deploy the coffee contract wired to `price_feed`.
    ///
    /// A reverted or dropped deployment is [`NetworkError::DeployFailed`].
    fn deploy_coffee(&self, price_feed: Address) -> Result<ContractHandle, NetworkError>;

    /// Submit `contract` for explorer verification.
    fn verify(&self, contract: &ContractHandle) -> Result<Self::Verification, NetworkError>;

    /// Send the owner-only withdrawal transaction to a coffee contract.
    ///
    /// A reverted withdrawal (e.g. sent by a non-owner) is [`NetworkError::TransactionFailed`].
    fn withdraw(&self, coffee: &ContractHandle) -> Result<(), NetworkError>;
}

/// Deploy the mock price feed with the starting decimals and answer.
pub fn deploy_feed<N: Network>(network: &N) -> Result<ContractHandle, NetworkError> {
    info!(
        network = network.name(),
        decimals = STARTING_DECIMALS,
        answer = %STARTING_PRICE,
        "Deploying mock price feed"
    );
    network.deploy_price_feed(STARTING_DECIMALS, STARTING_PRICE)
}

/// Deploy the coffee contract and verify it where that makes sense.
///
/// Verification only runs on networks with an explorer that are neither local
/// nor forked; everywhere else the deployment is returned as-is.
pub fn deploy_coffee<N: Network>(
    network: &N,
    price_feed: &ContractHandle,
) -> Result<ContractHandle, NetworkError> {
    info!(network = network.name(), price_feed = %price_feed.address, "Deploying coffee contract");
    let coffee = network
        .deploy_coffee(price_feed.address)
        .inspect_err(|e| warn!(network = network.name(), error = %e, "Coffee deployment failed"))?;
    info!(address = %coffee.address, "Coffee contract deployed");

    if network.has_explorer() && !network.is_local_or_forked_network() {
        info!(address = %coffee.address, "Verifying contract on explorer");
        network.verify(&coffee)?.wait_for_verification()?;
    } else {
        warn!(network = network.name(), "Skipping explorer verification");
    }
    Ok(coffee)
}

/// Deploy the coffee contract against the network's recorded price feed.
pub fn deploy<N: Network>(network: &N) -> Result<ContractHandle, NetworkError> {
    let price_feed = lookup(network, PRICE_FEED_MANIFEST)?;
    info!(network = network.name(), price_feed = %price_feed.address, "Using recorded price feed");
    deploy_coffee(network, &price_feed)
}

/// Withdraw the funds of the network's recorded coffee contract.
pub fn withdraw<N: Network>(network: &N) -> Result<ContractHandle, NetworkError> {
    let coffee = lookup(network, COFFEE_MANIFEST)?;
    info!(network = network.name(), address = %coffee.address, "Withdrawing");
    network
        .withdraw(&coffee)
        .inspect_err(|e| warn!(address = %coffee.address, error = %e, "Withdrawal failed"))?;
    info!(address = %coffee.address, "Withdrawal completed");
    Ok(coffee)
}

fn lookup<N: Network>(network: &N, name: &str) -> Result<ContractHandle, NetworkError> {
    network.manifest_named(name).ok_or_else(|| NetworkError::MissingDeployment {
        name: name.to_string(),
        network: network.name().to_string(),
    })
}
