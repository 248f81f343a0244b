use std::fmt::Display;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Detail attached to every failure raised while probing a proxy.
pub type Detail = &'static str;

/// Errors surfaced by the probe endpoints.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Missing or malformed caller input. Nothing was sent upstream.
    #[error("{0}")]
    Validation(String),

    /// The `proxyType` label is not one of the supported kinds.
    #[error("Invalid proxy type. Supported: socks5, socks4, http, https")]
    InvalidProxyType,

    /// The HTTP client could not be configured for the given proxy.
    #[error("{message}")]
    AgentCreationFailed { message: String, detail: Detail },

    /// The single upstream attempt failed.
    #[error("{message}")]
    RequestFailed { message: String, detail: Detail },
}

impl ProxyError {
    pub fn validation<S: Display>(msg: S) -> Self {
        Self::Validation(msg.to_string())
    }

    pub fn missing_urls() -> Self {
        Self::validation("Missing proxyUrl or targetUrl")
    }

    pub fn agent_creation<E: Display>(err: E, detail: Detail) -> Self {
        Self::AgentCreationFailed {
            message: err.to_string(),
            detail,
        }
    }

    pub fn request_failed<E: Display>(err: E, detail: Detail) -> Self {
        Self::RequestFailed {
            message: err.to_string(),
            detail,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidProxyType => StatusCode::BAD_REQUEST,
            Self::AgentCreationFailed { .. } | Self::RequestFailed { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn detail(&self) -> Option<Detail> {
        match self {
            Self::AgentCreationFailed { detail, .. } | Self::RequestFailed { detail, .. } => {
                Some(*detail)
            }
            _ => None,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self.detail() {
            Some(details) => json!({
                "success": false,
                "error": self.to_string(),
                "details": details,
            }),
            None => json!({
                "success": false,
                "error": self.to_string(),
            }),
        };
        (status, Json(body)).into_response()
    }
}
