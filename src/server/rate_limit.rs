//! Fixed-window request limiting per client address.

use std::{
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use hashbrown::HashMap;
use tokio::time::Instant;

/// Body sent back once a client exceeds its allowance.
pub const REJECTION: &str = "Too many requests, please try again later.";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Windows {
    by_client: HashMap<Option<IpAddr>, Window>,
    last_pruned: Instant,
}

/// Counts requests per client; clients whose address is unknown share a bucket.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<Windows>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(Windows {
                by_client: HashMap::new(),
                last_pruned: Instant::now(),
            })),
            max_requests,
            window,
        }
    }

    /// Records a request from `client` and returns whether it is allowed.
    pub fn check(&self, client: Option<IpAddr>) -> bool {
        self.check_at(client, Instant::now())
    }

    fn check_at(&self, client: Option<IpAddr>, now: Instant) -> bool {
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Expired windows are dropped at most once per window.
        if now.duration_since(windows.last_pruned) >= self.window {
            let window = self.window;
            windows
                .by_client
                .retain(|_, w| now.duration_since(w.started) < window);
            windows.last_pruned = now;
        }

        let entry = windows.by_client.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.count = 0;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .by_client
            .len()
    }
}

/// Middleware rejecting clients that exceeded their allowance with a plain
/// text `429`.
pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    if !limiter.check(client) {
        #[cfg(feature = "log")]
        log::debug!(
            "Rate limit exceeded for {}",
            client.map_or_else(|| "unknown client".to_owned(), |ip| ip.to_string())
        );
        return (StatusCode::TOO_MANY_REQUESTS, REJECTION).into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;

    const ALICE: Option<IpAddr> = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    const BOB: Option<IpAddr> = Some(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2)));

    #[test]
    fn allows_up_to_the_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ALICE, now));
        assert!(limiter.check_at(ALICE, now));
        assert!(limiter.check_at(ALICE, now));
        assert!(!limiter.check_at(ALICE, now));
    }

    #[test]
    fn clients_are_counted_separately() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ALICE, now));
        assert!(!limiter.check_at(ALICE, now));
        assert!(limiter.check_at(BOB, now));
        assert!(limiter.check_at(None, now));
        assert!(!limiter.check_at(None, now));
    }

    #[test]
    fn window_resets_after_interval() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ALICE, now));
        assert!(!limiter.check_at(ALICE, now + Duration::from_secs(59)));
        assert!(limiter.check_at(ALICE, now + Duration::from_secs(60)));
        assert!(!limiter.check_at(ALICE, now + Duration::from_secs(61)));
    }

    #[test]
    fn expired_windows_are_pruned_once_per_window() {
        let limiter = RateLimiter::new(5, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.check_at(ALICE, now));
        assert!(limiter.check_at(BOB, now + Duration::from_secs(30)));
        assert_eq!(limiter.tracked_clients(), 2);

        // Alice's window has expired, Bob's is still live.
        assert!(limiter.check_at(None, now + Duration::from_secs(61)));
        assert_eq!(limiter.tracked_clients(), 2);

        // Nothing is scanned again until another window has passed.
        assert!(limiter.check_at(ALICE, now + Duration::from_secs(95)));
        assert_eq!(limiter.tracked_clients(), 3);
    }
}
