//! hostconf API Library
//!
//! Host-header routing for axum services: maps the main domain, its
//! subdomains and foreign virtual hosts to a urlconf attached to each request.

pub mod config;
pub mod error;
pub mod routes;
pub mod routing;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routing::{host_routing_middleware, HostResolver, RoutingDecision, VirtualHostRegistry};
pub use state::AppState;
