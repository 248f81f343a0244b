use std::fmt::Display;

use url::Url;

use super::models::{ProbeMode, ProxyKind};
use crate::error::ProxyError;

/// Where the proxy lives, normalised to the scheme its kind requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    host: String,
    port: u16,
}

impl Endpoint {
    /// Re-addresses `proxy_url` for a proxy of the given `kind`.
    ///
    /// Credentials, host and port are kept. A missing port falls back to the
    /// default of the URL's own scheme, then to the default of `kind`.
    pub fn new(kind: ProxyKind, proxy_url: &str) -> anyhow::Result<Self> {
        let parsed = Url::parse(proxy_url.trim())?;
        let host = match parsed.host_str() {
            Some(host) if !host.is_empty() => host.to_owned(),
            _ => anyhow::bail!("Proxy URL must include a host: {}", proxy_url),
        };
        let port = parsed
            .port_or_known_default()
            .unwrap_or_else(|| kind.default_port());

        let mut url = format!("{}://", kind.scheme());
        if !parsed.username().is_empty() {
            url.push_str(parsed.username());
            if let Some(password) = parsed.password() {
                url.push(':');
                url.push_str(password);
            }
            url.push('@');
        }
        url.push_str(&host);
        url.push(':');
        url.push_str(&port.to_string());

        Ok(Self { url, host, port })
    }

    /// Full proxy URL handed to the HTTP client, credentials included.
    pub fn as_url(&self) -> &str {
        &self.url
    }

    /// Returns the proxy in `<host>:<port>` format, safe to log.
    pub fn as_text(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// A configured way of reaching the target through a proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// SOCKS4 tunnel. Target names are resolved locally.
    Socks4(Endpoint),
    /// SOCKS5 tunnel. Target names are resolved locally.
    Socks5(Endpoint),
    /// Plain-text HTTP proxy; `https` targets are tunnelled with `CONNECT`.
    Http(Endpoint),
    /// HTTP proxy reached over TLS.
    Https(Endpoint),
}

/// Picks the SOCKS version named by the URL's scheme.
fn socks_version(proxy_url: &str) -> anyhow::Result<ProxyKind> {
    let parsed = Url::parse(proxy_url.trim())?;
    match parsed.scheme() {
        "socks4" => Ok(ProxyKind::Socks4),
        "socks5" => Ok(ProxyKind::Socks5),
        scheme => anyhow::bail!(
            "SOCKS proxy URL must use the socks4 or socks5 scheme, got {}",
            scheme
        ),
    }
}

impl Transport {
    /// Builds the transport for a proxy of the given `kind`.
    ///
    /// For SOCKS the protocol version comes from the URL's scheme, so a
    /// `socks4://` URL selected as `socks5` still speaks SOCKS4.
    pub fn new(kind: ProxyKind, proxy_url: &str) -> anyhow::Result<Self> {
        let kind = match kind {
            ProxyKind::Socks4 | ProxyKind::Socks5 => socks_version(proxy_url)?,
            other => other,
        };
        let endpoint = Endpoint::new(kind, proxy_url)?;
        Ok(match kind {
            ProxyKind::Socks4 => Self::Socks4(endpoint),
            ProxyKind::Socks5 => Self::Socks5(endpoint),
            ProxyKind::Http => Self::Http(endpoint),
            ProxyKind::Https => Self::Https(endpoint),
        })
    }

    pub fn kind(&self) -> ProxyKind {
        match self {
            Self::Socks4(_) => ProxyKind::Socks4,
            Self::Socks5(_) => ProxyKind::Socks5,
            Self::Http(_) => ProxyKind::Http,
            Self::Https(_) => ProxyKind::Https,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Self::Socks4(endpoint)
            | Self::Socks5(endpoint)
            | Self::Http(endpoint)
            | Self::Https(endpoint) => endpoint,
        }
    }

    /// Builds the client-side proxy configuration. Every request, whatever its
    /// scheme, is routed through it.
    pub fn to_proxy(&self) -> reqwest::Result<reqwest::Proxy> {
        reqwest::Proxy::all(self.endpoint().as_url())
    }
}

impl Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{} {}>", self.kind(), self.endpoint().as_text())
    }
}

/// Maps a `proxyType` label and a proxy URL to a [`Transport`].
///
/// Unknown labels fail with [`ProxyError::InvalidProxyType`]; URLs the
/// transport cannot be built from fail with
/// [`ProxyError::AgentCreationFailed`].
pub fn select_transport(
    proxy_type: &str,
    proxy_url: &str,
    mode: ProbeMode,
) -> Result<Transport, ProxyError> {
    let kind: ProxyKind = proxy_type.parse()?;
    Transport::new(kind, proxy_url).map_err(|e| ProxyError::agent_creation(e, mode.agent_failure()))
}
