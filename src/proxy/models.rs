use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{Detail, ProxyError};

/// Represents the proxy protocols a probe can tunnel through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
    Socks5,
    Socks4,
    Http,
    Https,
}

impl ProxyKind {
    /// Every supported kind, in the order reported by the health endpoint.
    pub const ALL: [ProxyKind; 4] = [Self::Socks5, Self::Socks4, Self::Http, Self::Https];

    /// URL scheme the HTTP client expects for this kind of proxy.
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Socks5 => "socks5",
            Self::Socks4 => "socks4",
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Port assumed when the proxy URL does not carry one.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Socks5 | Self::Socks4 => 1080,
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl Display for ProxyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socks5 => write!(f, "SOCKS5"),
            Self::Socks4 => write!(f, "SOCKS4"),
            Self::Http => write!(f, "HTTP"),
            Self::Https => write!(f, "HTTPS"),
        }
    }
}

impl FromStr for ProxyKind {
    type Err = ProxyError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        match label {
            "socks5" => Ok(Self::Socks5),
            "socks4" => Ok(Self::Socks4),
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            _ => Err(ProxyError::InvalidProxyType),
        }
    }
}

/// Selects between the connectivity check and the full request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMode {
    /// `GET` the target and report status and timing only.
    Test,
    /// Send the caller's method and include a body preview.
    Request,
}

impl ProbeMode {
    pub fn success_message(&self) -> &'static str {
        match self {
            Self::Test => "Proxy connection successful",
            Self::Request => "Request completed successfully",
        }
    }

    pub fn request_failure(&self) -> Detail {
        match self {
            Self::Test => "Failed to connect through proxy",
            Self::Request => "Failed to make request through proxy",
        }
    }

    pub fn agent_failure(&self) -> Detail {
        match self {
            Self::Test => "Failed to create proxy agent",
            Self::Request => "Failed to create proxy agent or make request",
        }
    }
}

/// Body accepted by both probe endpoints.
///
/// Every field is optional on the wire so that missing input is reported with
/// the endpoint's own error message instead of a deserializer rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    #[serde(default)]
    pub proxy_type: Option<String>,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

/// Outcome of a completed round trip through the proxy.
///
/// A non-2xx status from the target is still a success: the proxy delivered a
/// response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResult {
    pub success: bool,
    pub status_code: u16,
    pub status_message: String,
    pub headers: BTreeMap<String, String>,
    pub response_time_ms: u64,
    pub body_length: usize,
    #[serde(rename = "body", skip_serializing_if = "Option::is_none")]
    pub body_preview: Option<String>,
    pub message: String,
}

/// Reply of `GET /api/health`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
    pub supported_protocols: Vec<ProxyKind>,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "ok",
            message: "Proxy probe API is running",
            supported_protocols: ProxyKind::ALL.to_vec(),
        }
    }
}
