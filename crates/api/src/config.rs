//! Application configuration

use std::collections::HashMap;
use std::env;

use hostconf_shared::UrlConf;

use crate::routing::DEFAULT_RESOLVER;

/// `SUBDOMAIN_URLCONFS` key standing for the bare main domain (no subdomain)
pub const BARE_DOMAIN_KEY: &str = "@";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub bind_address: String,

    // Host routing
    pub main_domain: String, // e.g., "example.com" for *.example.com routing
    pub subdomain_urlconfs: HashMap<Option<String>, UrlConf>,
    pub virtualhost_resolver: String, // registry name, see routing::VirtualHostRegistry
    pub virtualhost_urlconfs: HashMap<String, UrlConf>,
    pub force_vary_on_host: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Server
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),

            // Host routing
            main_domain: {
                let domain = env::var("MAIN_DOMAIN").map_err(|_| ConfigError::Missing("MAIN_DOMAIN"))?;
                let domain = domain.trim().to_lowercase();
                if domain.is_empty() {
                    return Err(ConfigError::Invalid {
                        var: "MAIN_DOMAIN",
                        reason: "must not be empty".to_string(),
                    });
                }
                domain
            },
            subdomain_urlconfs: parse_subdomain_urlconfs(
                &env::var("SUBDOMAIN_URLCONFS").unwrap_or_default(),
            )?,
            virtualhost_resolver: env::var("VIRTUALHOST_URLCONF_RESOLVER")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_RESOLVER.to_string()),
            virtualhost_urlconfs: parse_urlconf_table(
                "VIRTUALHOST_URLCONFS",
                &env::var("VIRTUALHOST_URLCONFS").unwrap_or_default(),
            )?,
            force_vary_on_host: env::var("FORCE_VARY_ON_HOST")
                .map(|raw| parse_flag("FORCE_VARY_ON_HOST", &raw, true))
                .unwrap_or(true),
        })
    }
}

/// Boolean env value, case-insensitive; unrecognized values keep `default`
fn parse_flag(var: &'static str, raw: &str, default: bool) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => true,
        "false" | "0" | "no" | "off" => false,
        _ => {
            tracing::warn!(var, value = %raw, default, "Unrecognized boolean value; using default");
            default
        }
    }
}

/// Parse a JSON object of label -> urlconf; an empty value is an empty table
fn parse_urlconf_table(
    var: &'static str,
    raw: &str,
) -> Result<HashMap<String, UrlConf>, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(HashMap::new());
    }
    serde_json::from_str(raw).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
    })
}

/// Subdomain table with `@` mapped to the bare-domain (`None`) key
fn parse_subdomain_urlconfs(raw: &str) -> Result<HashMap<Option<String>, UrlConf>, ConfigError> {
    let table = parse_urlconf_table("SUBDOMAIN_URLCONFS", raw)?;
    Ok(table
        .into_iter()
        .map(|(label, urlconf)| {
            let label = label.trim().to_lowercase();
            let key = if label == BARE_DOMAIN_KEY { None } else { Some(label) };
            (key, urlconf)
        })
        .collect())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("Unknown virtual host resolver: {0}")]
    UnknownResolver(String),
}
