mod config;
pub mod handlers;
pub mod rate_limit;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

pub use config::Config;
use rate_limit::{limit_requests, RateLimiter};

use crate::proxy::client;

/// State shared by the API handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub client: Arc<client::Config>,
}

/// Builds the application router: the JSON API, the optional rate limiter in
/// front of it and the optional static front end.
pub fn router(config: &Config) -> Router {
    let state = AppState {
        client: Arc::new(config.client.clone()),
    };

    let mut app = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/test-proxy", post(handlers::test_proxy))
        .route("/api/request", post(handlers::request))
        .with_state(state);

    if config.rate_limit > 0 {
        let limiter = RateLimiter::new(config.rate_limit, config.rate_window);
        app = app.route_layer(middleware::from_fn_with_state(limiter, limit_requests));
    }

    if let Some(dir) = &config.static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// A bound, not yet running, API server.
pub struct Server {
    listener: TcpListener,
    app: Router,
}

impl Server {
    /// Binds the listener described by `config`.
    pub async fn bind(config: &Config) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(config.host, config.port)).await?;
        Ok(Self {
            listener,
            app: router(config),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serves requests until Ctrl-C is received.
    pub async fn run(self) -> anyhow::Result<()> {
        #[cfg(feature = "log")]
        log::info!("Listening on {}", self.local_addr()?);

        axum::serve(
            self.listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(_err) = tokio::signal::ctrl_c().await {
        #[cfg(feature = "log")]
        log::error!("Failed to listen for shutdown signal: {}", _err);
        std::future::pending::<()>().await;
    }
    #[cfg(feature = "log")]
    log::info!("Shutting down");
}
