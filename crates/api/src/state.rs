//! Shared application state

use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::routing::{HostResolver, VirtualHostRegistry};

/// State handed to every handler and middleware
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
    pub resolver: Arc<HostResolver>,
}

impl AppState {
    /// Build state with the built-in virtual-host resolvers
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        Self::with_registry(config, &VirtualHostRegistry::new())
    }

    /// Build state picking the virtual-host resolver from `registry`
    pub fn with_registry(config: Config, registry: &VirtualHostRegistry) -> Result<Self, ConfigError> {
        let resolver = HostResolver::from_config(&config, registry)?;
        Ok(Self {
            config: Arc::new(config),
            resolver: Arc::new(resolver),
        })
    }
}
