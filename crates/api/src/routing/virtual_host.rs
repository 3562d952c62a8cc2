//! Virtual-host resolution
//!
//! Hosts that are not part of the main domain are handed to a
//! [`VirtualHostResolver`]. Resolvers are picked at startup by name from an
//! explicit [`VirtualHostRegistry`]:
//! - `reject`: every foreign host is refused (the default)
//! - `default`: every foreign host is served with the framework default urlconf
//! - `static`: exact host table from `VIRTUALHOST_URLCONFS`

use std::collections::HashMap;
use std::sync::Arc;

use hostconf_shared::{UrlConf, VirtualHostRoute};

use crate::config::{Config, ConfigError};

/// Registry name of the resolver used when none is configured
pub const DEFAULT_RESOLVER: &str = "reject";

/// Maps a host outside the main domain to a routing decision
pub trait VirtualHostResolver: Send + Sync {
    /// `host` is already lowercased and may carry a `:port` suffix
    fn resolve(&self, host: &str) -> VirtualHostRoute;
}

impl<F> VirtualHostResolver for F
where
    F: Fn(&str) -> VirtualHostRoute + Send + Sync,
{
    fn resolve(&self, host: &str) -> VirtualHostRoute {
        self(host)
    }
}

/// Refuses every host
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectAll;

impl VirtualHostResolver for RejectAll {
    fn resolve(&self, _host: &str) -> VirtualHostRoute {
        VirtualHostRoute::Reject
    }
}

/// Serves every host with the framework default urlconf
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl VirtualHostResolver for AcceptAll {
    fn resolve(&self, _host: &str) -> VirtualHostRoute {
        VirtualHostRoute::Default
    }
}

/// Fixed host -> urlconf table, unknown hosts are refused
#[derive(Debug, Clone, Default)]
pub struct StaticVirtualHosts {
    hosts: HashMap<String, UrlConf>,
}

impl StaticVirtualHosts {
    pub fn new(hosts: HashMap<String, UrlConf>) -> Self {
        let hosts = hosts
            .into_iter()
            .map(|(host, urlconf)| (host.to_lowercase(), urlconf))
            .collect();
        Self { hosts }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl VirtualHostResolver for StaticVirtualHosts {
    fn resolve(&self, host: &str) -> VirtualHostRoute {
        // Table entries never carry a port
        let host = host.split(':').next().unwrap_or(host);
        self.hosts.get(host).cloned().into()
    }
}

type ResolverFactory = Box<dyn Fn(&Config) -> Arc<dyn VirtualHostResolver> + Send + Sync>;

/// Named resolver constructors, consulted once at startup
pub struct VirtualHostRegistry {
    factories: HashMap<String, ResolverFactory>,
}

impl Default for VirtualHostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualHostRegistry {
    /// Registry holding the built-in resolvers
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(DEFAULT_RESOLVER, |_| Arc::new(RejectAll));
        registry.register("default", |_| Arc::new(AcceptAll));
        registry.register("static", |config| {
            let table = StaticVirtualHosts::new(config.virtualhost_urlconfs.clone());
            if table.is_empty() {
                tracing::warn!("VIRTUALHOST_URLCONFS is empty; every virtual host will be rejected");
            } else {
                tracing::info!(hosts = table.len(), "Loaded static virtual hosts");
            }
            Arc::new(table)
        });
        registry
    }

    /// Registry without any resolvers
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register (or replace) a resolver under `name`
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn(&Config) -> Arc<dyn VirtualHostResolver> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Build the resolver registered under `name`
    pub fn build(
        &self,
        name: &str,
        config: &Config,
    ) -> Result<Arc<dyn VirtualHostResolver>, ConfigError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| ConfigError::UnknownResolver(name.to_string()))?;
        Ok(factory(config))
    }
}
