//! Host-to-Urlconf Resolution
//!
//! Resolves incoming Host headers to the urlconf the downstream router should use.
//! Supports:
//! - Bare main domain: example.com -> `SUBDOMAIN_URLCONFS["@"]`
//! - Subdomains: blog.example.com -> `SUBDOMAIN_URLCONFS["blog"]`
//! - Virtual hosts: shop.partner.org -> configured virtual-host resolver

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{Request, Response};
use hostconf_shared::{RequestRouting, RoutingError, UrlConf, UrlConfUpdate, VirtualHostRoute};
use regex::Regex;

use super::vary::patch_vary_headers;
use super::virtual_host::{RejectAll, VirtualHostRegistry, VirtualHostResolver};
use crate::config::{Config, ConfigError};

/// Header every routed response must vary on
pub const HOST_HEADER: &str = "Host";

/// How the host was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionType {
    /// Host is the main domain, optionally with a subdomain label
    MainDomain,
    /// Host is outside the main domain and was accepted by the virtual-host resolver
    VirtualHost,
}

/// Outcome of resolving one host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingDecision {
    /// Normalized host, only set for virtual hosts
    pub host: Option<String>,
    /// Subdomain label, `None` for the bare domain and for virtual hosts
    pub subdomain: Option<String>,
    pub urlconf: UrlConfUpdate,
    pub resolution_type: ResolutionType,
}

impl RoutingDecision {
    /// Write this decision into a request
    pub fn apply_to<R: RoutableRequest + ?Sized>(&self, request: &mut R) {
        request.set_subdomain(self.subdomain.clone());
        if let Some(host) = &self.host {
            request.set_host(host.clone());
        }
        self.urlconf.apply(request.urlconf_mut());
    }
}

/// The request fields host routing reads and writes
pub trait RoutableRequest {
    fn set_host(&mut self, host: String);
    fn set_subdomain(&mut self, subdomain: Option<String>);
    fn urlconf_mut(&mut self) -> &mut Option<UrlConf>;
}

impl RoutableRequest for RequestRouting {
    fn set_host(&mut self, host: String) {
        self.host = Some(host);
    }

    fn set_subdomain(&mut self, subdomain: Option<String>) {
        self.subdomain = subdomain;
    }

    fn urlconf_mut(&mut self) -> &mut Option<UrlConf> {
        &mut self.urlconf
    }
}

/// HTTP requests carry their routing state as a [`RequestRouting`] extension.
/// An extension inserted by an earlier layer provides the default urlconf.
impl<B> RoutableRequest for Request<B> {
    fn set_host(&mut self, host: String) {
        routing_mut(self).set_host(host);
    }

    fn set_subdomain(&mut self, subdomain: Option<String>) {
        routing_mut(self).set_subdomain(subdomain);
    }

    fn urlconf_mut(&mut self) -> &mut Option<UrlConf> {
        routing_mut(self).urlconf_mut()
    }
}

fn routing_mut<B>(request: &mut Request<B>) -> &mut RequestRouting {
    request
        .extensions_mut()
        .get_or_insert_default::<RequestRouting>()
}

/// Host resolver built once at startup
#[derive(Clone)]
pub struct HostResolver {
    main_domain: String,
    pattern: Regex,
    subdomain_urlconfs: HashMap<Option<String>, UrlConf>,
    virtual_hosts: Arc<dyn VirtualHostResolver>,
    force_vary_on_host: bool,
}

impl std::fmt::Debug for HostResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostResolver")
            .field("main_domain", &self.main_domain)
            .field("subdomain_urlconfs", &self.subdomain_urlconfs)
            .field("force_vary_on_host", &self.force_vary_on_host)
            .finish_non_exhaustive()
    }
}

impl HostResolver {
    /// Create a resolver for `main_domain` with no subdomain urlconfs,
    /// a rejecting virtual-host resolver and `Vary: Host` enabled
    pub fn new(main_domain: &str) -> Result<Self, ConfigError> {
        let main_domain = main_domain.trim().to_lowercase();
        if main_domain.is_empty() {
            return Err(ConfigError::Invalid {
                var: "MAIN_DOMAIN",
                reason: "must not be empty".to_string(),
            });
        }

        let pattern = Regex::new(&format!(
            r"^(?:(?P<subdomain>.*?)\.)?{}(?::.*)?$",
            regex::escape(&main_domain)
        ))
        .map_err(|e| ConfigError::Invalid {
            var: "MAIN_DOMAIN",
            reason: e.to_string(),
        })?;

        Ok(Self {
            main_domain,
            pattern,
            subdomain_urlconfs: HashMap::new(),
            virtual_hosts: Arc::new(RejectAll),
            force_vary_on_host: true,
        })
    }

    /// Create a resolver from loaded configuration, picking the
    /// virtual-host resolver by name from `registry`
    pub fn from_config(config: &Config, registry: &VirtualHostRegistry) -> Result<Self, ConfigError> {
        let mut resolver = Self::new(&config.main_domain)?
            .with_subdomain_urlconfs(config.subdomain_urlconfs.clone())
            .with_force_vary_on_host(config.force_vary_on_host);
        resolver.virtual_hosts = registry.build(&config.virtualhost_resolver, config)?;
        Ok(resolver)
    }

    /// Set the subdomain table; the `None` key is the bare main domain
    pub fn with_subdomain_urlconfs(mut self, urlconfs: HashMap<Option<String>, UrlConf>) -> Self {
        self.subdomain_urlconfs = urlconfs
            .into_iter()
            .map(|(label, urlconf)| (label.map(|l| l.to_lowercase()), urlconf))
            .collect();
        self
    }

    pub fn with_virtual_host_resolver(mut self, resolver: impl VirtualHostResolver + 'static) -> Self {
        self.virtual_hosts = Arc::new(resolver);
        self
    }

    pub fn with_force_vary_on_host(mut self, force: bool) -> Self {
        self.force_vary_on_host = force;
        self
    }

    pub fn main_domain(&self) -> &str {
        &self.main_domain
    }

    pub fn force_vary_on_host(&self) -> bool {
        self.force_vary_on_host
    }

    /// Resolve a raw Host header value
    ///
    /// Returns:
    /// - Ok with `ResolutionType::MainDomain` if the host is the main domain or one of its subdomains
    /// - Ok with `ResolutionType::VirtualHost` if the virtual-host resolver accepted it
    /// - Err if the virtual-host resolver rejected it
    pub fn resolve(&self, host: &str) -> Result<RoutingDecision, RoutingError> {
        let host = host.to_lowercase();

        if let Some(captures) = self.pattern.captures(&host) {
            let subdomain = captures.name("subdomain").map(|m| m.as_str().to_string());
            let urlconf = match self.subdomain_urlconfs.get(&subdomain) {
                Some(urlconf) => UrlConfUpdate::Use(urlconf.clone()),
                None => UrlConfUpdate::Keep,
            };

            tracing::debug!(host = %host, subdomain = ?subdomain, urlconf = ?urlconf, "Resolved main domain host");

            return Ok(RoutingDecision {
                host: None,
                subdomain,
                urlconf,
                resolution_type: ResolutionType::MainDomain,
            });
        }

        match self.virtual_hosts.resolve(&host) {
            VirtualHostRoute::Reject => {
                tracing::error!(host = %host, "Attempt to access unroutable hostname; ignored");
                Err(RoutingError::UnroutableHost(host))
            }
            route => {
                let urlconf = UrlConfUpdate::from(route);
                tracing::debug!(host = %host, urlconf = ?urlconf, "Resolved virtual host");

                Ok(RoutingDecision {
                    host: Some(host),
                    subdomain: None,
                    urlconf,
                    resolution_type: ResolutionType::VirtualHost,
                })
            }
        }
    }

    /// Make caches vary on Host so responses are not shared across subdomains
    pub fn finalize_response<B>(&self, mut response: Response<B>) -> Response<B> {
        if self.force_vary_on_host {
            patch_vary_headers(response.headers_mut(), &[HOST_HEADER]);
        }
        response
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header::VARY, HeaderValue};

    fn resolver() -> HostResolver {
        let mut urlconfs = HashMap::new();
        urlconfs.insert(None, UrlConf::from("root_urls"));
        urlconfs.insert(Some("blog".to_string()), UrlConf::from("blog_urls"));
        urlconfs.insert(Some("API".to_string()), UrlConf::from("api_urls"));

        HostResolver::new("Example.com")
            .unwrap()
            .with_subdomain_urlconfs(urlconfs)
    }

    #[test]
    fn test_new_rejects_empty_main_domain() {
        assert!(matches!(
            HostResolver::new("  "),
            Err(ConfigError::Invalid { var: "MAIN_DOMAIN", .. })
        ));
    }

    #[test]
    fn test_main_domain_is_normalized() {
        assert_eq!(resolver().main_domain(), "example.com");
    }

    #[test]
    fn test_subdomain_is_captured() {
        let decision = resolver().resolve("sub.example.com").unwrap();
        assert_eq!(decision.subdomain.as_deref(), Some("sub"));
        assert_eq!(decision.resolution_type, ResolutionType::MainDomain);
        assert!(decision.host.is_none());
    }

    #[test]
    fn test_nested_subdomain_is_captured() {
        let decision = resolver().resolve("a.b.example.com").unwrap();
        assert_eq!(decision.subdomain.as_deref(), Some("a.b"));
    }

    #[test]
    fn test_bare_domain_has_no_subdomain() {
        let decision = resolver().resolve("example.com").unwrap();
        assert!(decision.subdomain.is_none());
        assert_eq!(decision.urlconf, UrlConfUpdate::Use(UrlConf::from("root_urls")));
    }

    #[test]
    fn test_port_is_ignored() {
        let decision = resolver().resolve("example.com:8080").unwrap();
        assert!(decision.subdomain.is_none());
        assert_eq!(decision.resolution_type, ResolutionType::MainDomain);

        let decision = resolver().resolve("blog.example.com:443").unwrap();
        assert_eq!(decision.subdomain.as_deref(), Some("blog"));
        assert_eq!(decision.urlconf, UrlConfUpdate::Use(UrlConf::from("blog_urls")));
    }

    #[test]
    fn test_leading_dot_gives_empty_subdomain() {
        let decision = resolver().resolve(".example.com").unwrap();
        assert_eq!(decision.subdomain.as_deref(), Some(""));
        assert_eq!(decision.urlconf, UrlConfUpdate::Keep);
    }

    #[test]
    fn test_known_subdomain_sets_urlconf() {
        let decision = resolver().resolve("blog.example.com").unwrap();
        assert_eq!(decision.urlconf, UrlConfUpdate::Use(UrlConf::from("blog_urls")));

        // Table labels are lowercased when loaded
        let decision = resolver().resolve("api.example.com").unwrap();
        assert_eq!(decision.urlconf, UrlConfUpdate::Use(UrlConf::from("api_urls")));
    }

    #[test]
    fn test_unknown_subdomain_keeps_urlconf() {
        let decision = resolver().resolve("unknown.example.com").unwrap();
        assert_eq!(decision.subdomain.as_deref(), Some("unknown"));
        assert_eq!(decision.urlconf, UrlConfUpdate::Keep);
    }

    #[test]
    fn test_case_insensitive() {
        let r = resolver();
        assert_eq!(r.resolve("Sub.Example.COM").unwrap(), r.resolve("sub.example.com").unwrap());
        assert_eq!(r.resolve("BLOG.EXAMPLE.COM").unwrap().subdomain.as_deref(), Some("blog"));
    }

    #[test]
    fn test_lookalike_hosts_are_not_main_domain() {
        let r = resolver();
        assert!(r.resolve("evilexample.com").is_err());
        assert!(r.resolve("example.com.evil.org").is_err());
        assert!(r.resolve("exampleXcom").is_err());
    }

    #[test]
    fn test_foreign_host_rejected_by_default() {
        let result = resolver().resolve("Other.ORG");
        assert_eq!(result, Err(RoutingError::UnroutableHost("other.org".to_string())));
    }

    #[test]
    fn test_foreign_host_with_resolver() {
        let r = resolver().with_virtual_host_resolver(|host: &str| {
            if host.starts_with("shop.") {
                VirtualHostRoute::UrlConf(UrlConf::from("custom_urls"))
            } else {
                VirtualHostRoute::Reject
            }
        });

        let decision = r.resolve("Shop.Partner.org").unwrap();
        assert_eq!(decision.host.as_deref(), Some("shop.partner.org"));
        assert!(decision.subdomain.is_none());
        assert_eq!(decision.urlconf, UrlConfUpdate::Use(UrlConf::from("custom_urls")));
        assert_eq!(decision.resolution_type, ResolutionType::VirtualHost);

        assert!(r.resolve("www.partner.org").is_err());
    }

    #[test]
    fn test_foreign_host_with_default_route() {
        let r = resolver().with_virtual_host_resolver(|_: &str| VirtualHostRoute::Default);
        let decision = r.resolve("partner.org").unwrap();
        assert_eq!(decision.urlconf, UrlConfUpdate::Default);
        assert_eq!(decision.host.as_deref(), Some("partner.org"));
    }

    #[test]
    fn test_from_config_uses_registry() {
        let mut virtualhost_urlconfs = HashMap::new();
        virtualhost_urlconfs.insert("partner.org".to_string(), UrlConf::from("partner_urls"));
        let config = Config {
            bind_address: "127.0.0.1:0".to_string(),
            main_domain: "example.com".to_string(),
            subdomain_urlconfs: HashMap::new(),
            virtualhost_resolver: "static".to_string(),
            virtualhost_urlconfs,
            force_vary_on_host: false,
        };

        let r = HostResolver::from_config(&config, &VirtualHostRegistry::new()).unwrap();
        assert!(!r.force_vary_on_host());
        assert_eq!(
            r.resolve("partner.org").unwrap().urlconf,
            UrlConfUpdate::Use(UrlConf::from("partner_urls"))
        );
        assert!(r.resolve("stranger.org").is_err());

        let config = Config {
            virtualhost_resolver: "missing".to_string(),
            ..config
        };
        assert!(matches!(
            HostResolver::from_config(&config, &VirtualHostRegistry::new()),
            Err(ConfigError::UnknownResolver(_))
        ));
    }

    #[test]
    fn test_apply_to_routing_state() {
        let r = resolver();

        let mut routing = RequestRouting::with_urlconf("framework_default");
        r.resolve("unknown.example.com").unwrap().apply_to(&mut routing);
        assert_eq!(routing.subdomain.as_deref(), Some("unknown"));
        assert_eq!(routing.urlconf, Some(UrlConf::from("framework_default")));
        assert!(routing.host.is_none());

        let mut routing = RequestRouting::with_urlconf("framework_default");
        r.resolve("blog.example.com").unwrap().apply_to(&mut routing);
        assert_eq!(routing.urlconf, Some(UrlConf::from("blog_urls")));

        let r = r.with_virtual_host_resolver(|_: &str| VirtualHostRoute::Default);
        let mut routing = RequestRouting::with_urlconf("framework_default");
        r.resolve("partner.org").unwrap().apply_to(&mut routing);
        assert_eq!(routing.host.as_deref(), Some("partner.org"));
        assert!(routing.subdomain.is_none());
        assert!(routing.urlconf.is_none());
    }

    #[test]
    fn test_apply_to_http_request() {
        let mut request = Request::builder().uri("/").body(Body::empty()).unwrap();
        resolver().resolve("blog.example.com").unwrap().apply_to(&mut request);

        let routing = request.extensions().get::<RequestRouting>().unwrap();
        assert_eq!(routing.subdomain.as_deref(), Some("blog"));
        assert_eq!(routing.urlconf, Some(UrlConf::from("blog_urls")));
    }

    #[test]
    fn test_finalize_response_adds_vary() {
        let response = Response::builder()
            .header(VARY, "Accept-Encoding")
            .body(())
            .unwrap();
        let response = resolver().finalize_response(response);
        assert_eq!(response.headers().get(VARY).unwrap(), "Accept-Encoding, Host");
    }

    #[test]
    fn test_finalize_response_respects_flag() {
        let response = Response::builder()
            .header(VARY, HeaderValue::from_static("Accept-Encoding"))
            .body(())
            .unwrap();
        let response = resolver()
            .with_force_vary_on_host(false)
            .finalize_response(response);
        assert_eq!(response.headers().get(VARY).unwrap(), "Accept-Encoding");
    }
}
