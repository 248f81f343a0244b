use url::Url;

/// Schemes a probe may target.
pub const TARGET_SCHEMES: [&str; 2] = ["http", "https"];
/// Schemes accepted for the proxy address.
pub const PROXY_SCHEMES: [&str; 4] = ["http", "https", "socks4", "socks5"];

fn has_scheme(url: &str, allowed: &[&str]) -> bool {
    // `Url::parse` lowercases the scheme, so `HTTP://` compares equal to `http`.
    match Url::parse(url.trim()) {
        Ok(parsed) => allowed.contains(&parsed.scheme()),
        Err(_) => false,
    }
}

/// Returns `true` when `url` parses and uses the `http` or `https` scheme.
pub fn validate_target(url: &str) -> bool {
    has_scheme(url, &TARGET_SCHEMES)
}

/// Returns `true` when `url` parses and uses one of the supported proxy schemes.
pub fn validate_proxy(url: &str) -> bool {
    has_scheme(url, &PROXY_SCHEMES)
}
