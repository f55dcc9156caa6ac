use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Extension, Json,
};
use maplink_core::ResolvedLocation;
use serde::Deserialize;

use super::{ApiError, AppState};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExpandRequest {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    prefer_center: bool,
}

/// `POST /v1/maps/expand`
///
/// Always answers 200 for a well-formed body: the resolved location, or `{}`
/// when the input was blank or the deadline elapsed first.
pub(super) async fn expand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<ExpandRequest>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return ApiError::bad_request(req_id.0, rejection.body_text()).into_response()
        }
    };

    let work = state
        .resolver
        .expand_and_parse(body.url.as_deref(), body.prefer_center);
    let resolved = match tokio::time::timeout(state.expand_deadline, work).await {
        Ok(resolved) => resolved.unwrap_or_default(),
        Err(_) => {
            tracing::warn!(
                request_id = %req_id.0,
                deadline_secs = state.expand_deadline.as_secs(),
                "expand deadline elapsed"
            );
            ResolvedLocation::default()
        }
    };

    tracing::debug!(
        request_id = %req_id.0,
        resolved = resolved.final_url.is_some(),
        has_coords = resolved.coords().is_some(),
        "expand finished"
    );
    Json(resolved).into_response()
}
