pub mod error;
pub mod proxy;
pub mod server;
pub mod validator;

pub use error::ProxyError;
pub use proxy::{
    client::ProxyClient,
    models::{ProbeMode, ProxyKind, ProxyRequest, ProxyResult},
    probe,
    transport::{select_transport, Transport},
};
pub use validator::{validate_proxy, validate_target};

/// Initializes the logging system for the application.
///
/// This function configures the logging system with the specified verbosity level.
///
/// # Arguments
///
/// * `log_level`: The desired verbosity level for logging. Determines which log messages will be displayed.
///
/// # Returns
///
/// A result indicating the success or failure of the logging setup.
#[cfg(feature = "log")]
pub fn initialize_logging(log_level: log::LevelFilter) -> anyhow::Result<()> {
    stderrlog::new()
        .module(module_path!()) // Only this crate's records are shown.
        .show_module_names(true)
        .verbosity(log_level)
        .init()?;
    Ok(())
}
