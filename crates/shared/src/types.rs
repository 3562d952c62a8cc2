//! Common types used across hostconf

use serde::{Deserialize, Serialize};

// =============================================================================
// Routing Configuration Identifier
// =============================================================================

/// Opaque handle naming the set of URL rules the downstream router should use
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlConf(String);

impl UrlConf {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UrlConf {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for UrlConf {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for UrlConf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Per-Request Routing State
// =============================================================================

/// Routing values attached to an in-flight request
///
/// `urlconf == None` means the framework's default rules apply.
/// `host` is only populated for virtual hosts outside the main domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestRouting {
    pub host: Option<String>,
    pub subdomain: Option<String>,
    pub urlconf: Option<UrlConf>,
}

impl RequestRouting {
    /// Routing state preloaded with a framework default urlconf
    pub fn with_urlconf(urlconf: impl Into<UrlConf>) -> Self {
        Self {
            urlconf: Some(urlconf.into()),
            ..Self::default()
        }
    }
}

// =============================================================================
// Resolution Outcomes
// =============================================================================

/// Answer of a virtual-host resolver for a host outside the main domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VirtualHostRoute {
    /// Host is not served; the request must fail with 404
    Reject,
    /// Host is served with the framework default urlconf
    Default,
    /// Host is served with the given urlconf
    UrlConf(UrlConf),
}

impl VirtualHostRoute {
    pub fn is_reject(&self) -> bool {
        matches!(self, Self::Reject)
    }
}

impl From<Option<UrlConf>> for VirtualHostRoute {
    fn from(urlconf: Option<UrlConf>) -> Self {
        match urlconf {
            Some(urlconf) => Self::UrlConf(urlconf),
            None => Self::Reject,
        }
    }
}

/// Change a routing decision makes to a request's urlconf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlConfUpdate {
    /// Leave whatever urlconf the request already carries
    Keep,
    /// Reset to the framework default
    Default,
    /// Route with the given urlconf
    Use(UrlConf),
}

impl UrlConfUpdate {
    /// Apply this update to an existing urlconf slot
    pub fn apply(&self, slot: &mut Option<UrlConf>) {
        match self {
            Self::Keep => {}
            Self::Default => *slot = None,
            Self::Use(urlconf) => *slot = Some(urlconf.clone()),
        }
    }
}

impl From<VirtualHostRoute> for UrlConfUpdate {
    fn from(route: VirtualHostRoute) -> Self {
        match route {
            VirtualHostRoute::UrlConf(urlconf) => Self::Use(urlconf),
            // Reject is turned into an error before any request is touched
            VirtualHostRoute::Default | VirtualHostRoute::Reject => Self::Default,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_urlconf_serializes_transparently() {
        let urlconf = UrlConf::from("blog_urls");
        assert_eq!(serde_json::to_string(&urlconf).unwrap(), "\"blog_urls\"");
        assert_eq!(urlconf.to_string(), "blog_urls");

        let parsed: UrlConf = serde_json::from_str("\"api_urls\"").unwrap();
        assert_eq!(parsed.as_str(), "api_urls");
    }

    #[test]
    fn test_request_routing_default_is_empty() {
        let routing = RequestRouting::default();
        assert!(routing.host.is_none());
        assert!(routing.subdomain.is_none());
        assert!(routing.urlconf.is_none());

        let routing = RequestRouting::with_urlconf("root_urls");
        assert_eq!(routing.urlconf, Some(UrlConf::from("root_urls")));
    }

    #[test]
    fn test_urlconf_update_apply() {
        let mut slot = Some(UrlConf::from("root_urls"));

        UrlConfUpdate::Keep.apply(&mut slot);
        assert_eq!(slot, Some(UrlConf::from("root_urls")));

        UrlConfUpdate::Use(UrlConf::from("blog_urls")).apply(&mut slot);
        assert_eq!(slot, Some(UrlConf::from("blog_urls")));

        UrlConfUpdate::Default.apply(&mut slot);
        assert!(slot.is_none());
    }

    #[test]
    fn test_virtual_host_route_conversions() {
        assert!(VirtualHostRoute::from(None).is_reject());
        assert_eq!(
            VirtualHostRoute::from(Some(UrlConf::from("custom_urls"))),
            VirtualHostRoute::UrlConf(UrlConf::from("custom_urls"))
        );
        assert_eq!(
            UrlConfUpdate::from(VirtualHostRoute::Default),
            UrlConfUpdate::Default
        );
        assert_eq!(
            UrlConfUpdate::from(VirtualHostRoute::UrlConf(UrlConf::from("x"))),
            UrlConfUpdate::Use(UrlConf::from("x"))
        );
    }
}
