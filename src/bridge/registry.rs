//! Family registry.
//!
//! Built once at startup and read-only afterwards. Callers resolve a bridge
//! by family tag instead of branching on the family themselves.

use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use crate::account::{Account, FamilyTag};
use crate::bridge::chain_bridge::ChainBridge;
use crate::bridge::error::BridgeError;
use crate::bridge::AccountBridge;
use crate::config::SyncConfig;
use crate::families::elrond::{ElrondApi, ElrondFamily};
use crate::families::ethereum::{EthereumApi, EthereumFamily};
use crate::network::{NetworkClient, NetworkError};

/// Errors while building the registry from configuration.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to set up {family}: {source}")]
    Setup {
        family: FamilyTag,
        #[source]
        source: NetworkError,
    },
}

/// Bridges keyed by family.
#[derive(Clone, Default)]
pub struct FamilyRegistry {
    bridges: BTreeMap<FamilyTag, Arc<dyn AccountBridge>>,
}

impl FamilyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `bridge` under its own family, replacing any previous one.
    pub fn with_bridge(mut self, bridge: Arc<dyn AccountBridge>) -> Self {
        self.bridges.insert(bridge.family(), bridge);
        self
    }

    /// Register a bridge for every family with settings in `config`.
    pub fn from_config(config: &SyncConfig, client: NetworkClient) -> Result<Self, RegistryError> {
        let mut registry = Self::new();

        if let Some(elrond) = &config.families.elrond {
            let api = ElrondApi::new(client.clone(), elrond);
            registry = registry.with_bridge(Arc::new(ChainBridge::new(
                ElrondFamily,
                Arc::new(api),
                config.scan.clone(),
            )));
        }

        if let Some(ethereum) = &config.families.ethereum {
            let api = EthereumApi::new(ethereum, client.clone()).map_err(|source| RegistryError::Setup {
                family: FamilyTag::Ethereum,
                source,
            })?;
            registry = registry.with_bridge(Arc::new(ChainBridge::new(
                EthereumFamily,
                Arc::new(api),
                config.scan.clone(),
            )));
        }

        tracing::info!(families = ?registry.families(), "Family registry ready");
        Ok(registry)
    }

    pub fn get(&self, family: FamilyTag) -> Option<Arc<dyn AccountBridge>> {
        self.bridges.get(&family).cloned()
    }

    /// Bridge for `family`, or [`BridgeError::UnsupportedFamily`].
    pub fn bridge(&self, family: FamilyTag) -> Result<Arc<dyn AccountBridge>, BridgeError> {
        self.get(family).ok_or(BridgeError::UnsupportedFamily(family))
    }

    pub fn bridge_for_account(&self, account: &Account) -> Result<Arc<dyn AccountBridge>, BridgeError> {
        self.bridge(account.family)
    }

    pub fn families(&self) -> Vec<FamilyTag> {
        self.bridges.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.bridges.is_empty()
    }
}

impl std::fmt::Debug for FamilyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FamilyRegistry")
            .field("families", &self.families())
            .finish()
    }
}
