use std::{collections::BTreeMap, error::Error, fmt::Display, time::Duration};

use fake::{faker::internet::en::UserAgent, Fake};
use reqwest::{
    header::{HeaderMap, USER_AGENT},
    redirect, Method,
};
use tokio::time;
use url::Url;

use super::{
    models::{ProbeMode, ProxyResult},
    transport::Transport,
};
use crate::error::ProxyError;

/// Options for a single probe through a proxy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Timeout for the whole request, body included, in milliseconds.
    pub request_timeout: u64,
    /// Timeout for establishing the connection to the proxy, in milliseconds.
    pub connect_timeout: u64,
    /// Redirects to follow before reporting the redirect response itself.
    pub max_redirects: usize,
    /// Number of body bytes returned as preview.
    pub preview_limit: usize,
    /// Accept invalid certificates from the target and from HTTPS proxies.
    pub accept_invalid_certs: bool,
    /// Send a randomly picked browser `User-Agent`.
    pub random_user_agent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            request_timeout: 10_000,
            connect_timeout: 5_000,
            max_redirects: 0,
            preview_limit: 1000,
            accept_invalid_certs: false,
            random_user_agent: false,
        }
    }
}

/// A client that sends exactly one request through a proxy.
#[derive(Debug)]
pub struct ProxyClient {
    transport: Transport,
    client: reqwest::Client,
    config: Config,
    mode: ProbeMode,
}

impl ProxyClient {
    /// Creates a new instance of `ProxyClient`.
    ///
    /// # Arguments
    ///
    /// * `transport`: The proxy every request is routed through.
    /// * `config`: Timeouts, redirect policy and preview size.
    /// * `mode`: Whether this is a connectivity test or a full request.
    ///
    /// # Returns
    ///
    /// The client, or [`ProxyError::AgentCreationFailed`] if the underlying
    /// HTTP client rejects the proxy configuration.
    pub fn new(transport: Transport, config: Config, mode: ProbeMode) -> Result<Self, ProxyError> {
        let detail = mode.agent_failure();
        let proxy = transport
            .to_proxy()
            .map_err(|e| ProxyError::agent_creation(error_chain(&e), detail))?;

        let redirect_policy = if config.max_redirects == 0 {
            redirect::Policy::none()
        } else {
            redirect::Policy::limited(config.max_redirects)
        };

        let client = reqwest::Client::builder()
            .proxy(proxy)
            .timeout(Duration::from_millis(config.request_timeout))
            .connect_timeout(Duration::from_millis(config.connect_timeout))
            .redirect(redirect_policy)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| ProxyError::agent_creation(error_chain(&e), detail))?;

        Ok(Self {
            transport,
            client,
            config,
            mode,
        })
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Sends `method` to `target_url` through the proxy and aggregates the
    /// response.
    ///
    /// The reported time spans from sending the request until the body has
    /// been fully read. A body preview is only attached in
    /// [`ProbeMode::Request`].
    pub async fn execute(&self, target_url: &str, method: Method) -> Result<ProxyResult, ProxyError> {
        let detail = self.mode.request_failure();
        let url = Url::parse(target_url.trim()).map_err(ProxyError::validation)?;

        let mut request = self.client.request(method.clone(), url);
        if self.config.random_user_agent {
            let user_agent: String = UserAgent().fake();
            request = request.header(USER_AGENT, user_agent);
        }

        self.log_trace(format!("Sending {} {}", method, target_url));
        let start_time = time::Instant::now();

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let message = error_chain(&e);
                self.log_error(&message);
                return Err(ProxyError::request_failed(message, detail));
            }
        };

        let status = response.status();
        let headers = flatten_headers(response.headers());
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                let message = error_chain(&e);
                self.log_error(&message);
                return Err(ProxyError::request_failed(message, detail));
            }
        };

        let elapsed_time = start_time.elapsed();
        self.log_trace(format!(
            "Got {} with {} bytes in {:?}",
            status,
            body.len(),
            elapsed_time
        ));

        let body_preview = match self.mode {
            ProbeMode::Request => {
                let end = body.len().min(self.config.preview_limit);
                Some(String::from_utf8_lossy(&body[..end]).into_owned())
            }
            ProbeMode::Test => None,
        };

        Ok(ProxyResult {
            success: true,
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            response_time_ms: whole_millis(elapsed_time),
            body_length: body.len(),
            body_preview,
            message: self.mode.success_message().to_owned(),
        })
    }

    /// Logs a trace message.
    ///
    /// # Arguments
    ///
    /// * `msg`: The message to log.
    pub fn log_trace<S>(&self, msg: S)
    where
        S: Display,
    {
        #[cfg(feature = "log")]
        log::trace!("{}: {}", self.transport, msg);
    }

    /// Logs an error message.
    ///
    /// # Arguments
    ///
    /// * `msg`: The message to log as an error.
    pub fn log_error<S>(&self, msg: S)
    where
        S: Display,
    {
        #[cfg(feature = "log")]
        if log::max_level() >= log::LevelFilter::Debug {
            log::error!("{}: {}", self.transport, msg);
        }
    }
}

/// Milliseconds in `elapsed`, saturating at `u64::MAX`.
fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Joins repeated headers with `", "` into one value per name.
fn flatten_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut flattened = BTreeMap::new();
    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        flattened.insert(name.as_str().to_owned(), value);
    }
    flattened
}

/// Renders an error with all of its sources, outermost first.
fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
