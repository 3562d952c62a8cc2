//! Routing introspection endpoint

use axum::{Extension, Json};
use hostconf_shared::RequestRouting;

use crate::error::{ApiError, ApiResult};

/// Echo the routing values the host middleware attached to this request
pub async fn current_routing(
    routing: Option<Extension<RequestRouting>>,
) -> ApiResult<Json<RequestRouting>> {
    let Extension(routing) = routing.ok_or_else(|| {
        tracing::error!("Route mounted outside host routing middleware");
        ApiError::Internal
    })?;
    Ok(Json(routing))
}
