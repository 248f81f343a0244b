use std::{net::IpAddr, path::PathBuf};

use clap::builder::styling::AnsiColor;
use clap::builder::{PossibleValue, Styles};
use clap::Parser;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Green.on_default())
        .literal(AnsiColor::BrightGreen.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

/// Web API for checking connectivity through SOCKS4, SOCKS5, HTTP and HTTPS proxies.
#[derive(Parser, Debug, Clone)]
#[command(version, styles = get_styles())]
pub struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Timeout in milliseconds for a whole upstream request.
    #[arg(long, default_value = "10000", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,

    /// Timeout in milliseconds for connecting to the proxy.
    #[arg(long, default_value = "5000", value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: u64,

    /// Redirects to follow; 0 reports the redirect response as is.
    #[arg(long, default_value = "0")]
    pub max_redirects: usize,

    /// Number of body bytes returned by /api/request.
    #[arg(long, default_value = "1000")]
    pub preview_limit: usize,

    /// Requests allowed per client in each window; 0 disables rate limiting.
    #[arg(long, default_value = "100", help_heading = "Rate limiting")]
    pub rate_limit: u32,

    /// Length of the rate limiting window in seconds.
    #[arg(
        long,
        default_value = "900",
        help_heading = "Rate limiting",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub rate_window: u64,

    /// Directory holding the browser front end, served at /.
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Accept invalid TLS certificates from targets and HTTPS proxies.
    #[arg(long)]
    pub insecure: bool,

    /// Send a random browser User-Agent with each upstream request.
    #[arg(long)]
    pub random_user_agent: bool,

    /// Log level for application output.
    #[arg(
        long = "log",
        default_value = "off",
        value_parser([
            PossibleValue::new("debug"),
            PossibleValue::new("info"),
            PossibleValue::new("warn"),
            PossibleValue::new("error"),
            PossibleValue::new("trace"),
            PossibleValue::new("off"),
        ])
    )]
    pub log_level: String,
}
