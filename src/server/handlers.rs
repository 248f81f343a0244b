use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use super::AppState;
use crate::{
    error::ProxyError,
    proxy::{
        self,
        models::{HealthStatus, ProbeMode, ProxyRequest, ProxyResult},
    },
};

/// `GET /api/health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus::default())
}

/// `POST /api/test-proxy`: checks that the target answers through the proxy.
pub async fn test_proxy(
    State(state): State<AppState>,
    body: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Json<ProxyResult>, ProxyError> {
    run(&state, &parse_body(body)?, ProbeMode::Test).await
}

/// `POST /api/request`: sends the caller's request and returns a body preview.
pub async fn request(
    State(state): State<AppState>,
    body: Result<Json<ProxyRequest>, JsonRejection>,
) -> Result<Json<ProxyResult>, ProxyError> {
    run(&state, &parse_body(body)?, ProbeMode::Request).await
}

/// Turns body rejections into the endpoints' JSON `400`.
///
/// A body that is not declared as JSON carries no fields, so it is reported as
/// missing input.
fn parse_body(body: Result<Json<ProxyRequest>, JsonRejection>) -> Result<ProxyRequest, ProxyError> {
    match body {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Err(ProxyError::missing_urls()),
        Err(rejection) => Err(ProxyError::validation(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    }
}

async fn run(
    state: &AppState,
    body: &ProxyRequest,
    mode: ProbeMode,
) -> Result<Json<ProxyResult>, ProxyError> {
    match proxy::probe(body, mode, &state.client).await {
        Ok(result) => {
            #[cfg(feature = "log")]
            log::debug!(
                "{:?} via {} -> {} in {}ms",
                mode,
                body.proxy_type.as_deref().unwrap_or("?"),
                result.status_code,
                result.response_time_ms
            );
            Ok(Json(result))
        }
        Err(err) => {
            #[cfg(feature = "log")]
            log::warn!("{:?} failed: {} ({})", mode, err, err.status_code());
            Err(err)
        }
    }
}
