use std::time::Duration;

use argument::Cli;
use clap::Parser;
#[cfg(feature = "color")]
use colored::Colorize;
#[cfg(feature = "log")]
use proxy_probe::initialize_logging;
use proxy_probe::{
    proxy::{client, models::ProxyKind},
    server::{Config, Server},
};
use tokio::runtime;

mod argument;

fn main() {
    if let Err(e) = run_application() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

fn server_config(options: Cli) -> Config {
    Config {
        host: options.host,
        port: options.port,
        client: client::Config {
            request_timeout: options.timeout,
            connect_timeout: options.connect_timeout,
            max_redirects: options.max_redirects,
            preview_limit: options.preview_limit,
            accept_invalid_certs: options.insecure,
            random_user_agent: options.random_user_agent,
        },
        rate_limit: options.rate_limit,
        rate_window: Duration::from_secs(options.rate_window),
        static_dir: options.static_dir,
    }
}

fn print_banner(url: &str) {
    let protocols = ProxyKind::ALL
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    #[cfg(feature = "color")]
    {
        println!("Proxy probe running on {}", url.bright_green());
        println!("Supported proxy types: {}", protocols.cyan());
    }
    #[cfg(not(feature = "color"))]
    {
        println!("Proxy probe running on {}", url);
        println!("Supported proxy types: {}", protocols);
    }
}

fn run_application() -> anyhow::Result<()> {
    let options = Cli::parse();

    #[cfg(feature = "log")]
    {
        let log_level = match options.log_level.as_str() {
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Off,
        };
        initialize_logging(log_level)?;
    }

    let config = server_config(options);
    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async {
        let server = Server::bind(&config).await?;
        print_banner(&format!("http://{}", server.local_addr()?));
        server.run().await
    })
}
