//! Host Routing Middleware
//!
//! Resolves the Host header before the request reaches a handler and
//! forces `Vary: Host` onto the response afterwards.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header::HOST, Request, Response},
    middleware::Next,
};

use super::HostResolver;
use crate::error::ApiResult;

/// Middleware that attaches [`hostconf_shared::RequestRouting`] to every request
///
/// Unroutable hosts short-circuit with 404; the handler is not called and no
/// response headers are patched.
pub async fn host_routing_middleware(
    State(resolver): State<Arc<HostResolver>>,
    mut request: Request<Body>,
    next: Next,
) -> ApiResult<Response<Body>> {
    let host = request_host(&request);
    let decision = resolver.resolve(&host)?;
    decision.apply_to(&mut request);

    let response = next.run(request).await;
    Ok(resolver.finalize_response(response))
}

/// Host header value, falling back to the URI authority (HTTP/2)
fn request_host<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| request.uri().authority().map(|authority| authority.as_str()))
        .unwrap_or_default()
        .to_string()
}
