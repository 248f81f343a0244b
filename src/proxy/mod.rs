pub mod client;
pub mod models;
pub mod transport;

use reqwest::Method;

use crate::{
    error::ProxyError,
    validator::{validate_proxy, validate_target},
};
use client::{Config, ProxyClient};
use models::{ProbeMode, ProxyRequest, ProxyResult};
use transport::select_transport;

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Parses the caller's method, defaulting to `GET`.
pub fn parse_method(method: Option<&str>) -> Result<Method, ProxyError> {
    match method.map(str::trim).filter(|m| !m.is_empty()) {
        None => Ok(Method::GET),
        Some(method) => Method::from_bytes(method.to_ascii_uppercase().as_bytes())
            .map_err(|_| ProxyError::validation(format!("Invalid HTTP method: {}", method))),
    }
}

/// Runs one probe: validates the input, builds the transport and sends a
/// single request through it.
///
/// Every input check happens before any network activity.
pub async fn probe(
    request: &ProxyRequest,
    mode: ProbeMode,
    config: &Config,
) -> Result<ProxyResult, ProxyError> {
    let (proxy_url, target_url) =
        match (non_empty(&request.proxy_url), non_empty(&request.target_url)) {
            (Some(proxy_url), Some(target_url)) => (proxy_url, target_url),
            _ => return Err(ProxyError::missing_urls()),
        };

    if !validate_proxy(proxy_url) {
        return Err(ProxyError::validation(
            "Invalid proxyUrl. Supported schemes: socks5, socks4, http, https",
        ));
    }
    if !validate_target(target_url) {
        return Err(ProxyError::validation(
            "Invalid targetUrl. Supported schemes: http, https",
        ));
    }

    let proxy_type = request.proxy_type.as_deref().unwrap_or_default().trim();
    let transport = select_transport(proxy_type, proxy_url, mode)?;

    let method = match mode {
        ProbeMode::Test => Method::GET,
        ProbeMode::Request => parse_method(request.method.as_deref())?,
    };

    let client = ProxyClient::new(transport, config.clone(), mode)?;
    client.execute(target_url, method).await
}
