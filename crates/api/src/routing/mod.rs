//! Host-based routing
//!
//! This module maps the incoming Host header to the urlconf the downstream
//! router should use:
//! - Main domain and its subdomains: example.com, blog.example.com
//! - Virtual hosts outside the main domain: shop.partner.org

mod host_resolver;
mod middleware;
mod vary;
mod virtual_host;

pub use host_resolver::{
    HostResolver, ResolutionType, RoutableRequest, RoutingDecision, HOST_HEADER,
};
pub use middleware::host_routing_middleware;
pub use vary::patch_vary_headers;
pub use virtual_host::{
    AcceptAll, RejectAll, StaticVirtualHosts, VirtualHostRegistry, VirtualHostResolver,
    DEFAULT_RESOLVER,
};
