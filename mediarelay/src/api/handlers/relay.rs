use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use tracing::instrument;

use crate::{
    AppState,
    api::models::relay::RelayRequest,
    auth::authorize,
    errors::{Error, Result},
};

/// Relay remote media into the storage zone and respond with its public URL as plain text.
///
/// Authorization is checked before the body is looked at, so an unauthorized caller never
/// triggers an outbound request.
#[instrument(skip_all)]
pub async fn relay_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<RelayRequest>, JsonRejection>,
) -> Result<String> {
    authorize(&state.config, &headers)?;

    let Json(request) = body.map_err(|e| Error::bad_request(format!("invalid request body: {}", e.body_text())))?;
    let guild_id = request.guild_id.unwrap_or_default();
    let content = request.content.unwrap_or_default();

    state.relay.relay(&guild_id, &content).await
}
