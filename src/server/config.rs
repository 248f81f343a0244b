use std::{
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
    time::Duration,
};

use crate::proxy::client;

/// Options for configuring the API server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to listen on.
    pub host: IpAddr,
    /// Port to listen on; `0` picks a free one.
    pub port: u16,
    /// Settings applied to every outbound probe.
    pub client: client::Config,
    /// Requests allowed per client within `rate_window`; `0` disables limiting.
    pub rate_limit: u32,
    /// Length of a rate limiting window.
    pub rate_window: Duration,
    /// Directory served at `/` for the browser front end (optional).
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            client: client::Config::default(),
            rate_limit: 100,
            rate_window: Duration::from_secs(15 * 60),
            static_dir: None,
        }
    }
}
