use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use crate::{config::AppConfig, error::AppError};

/// Windows are pruned once this many clients are tracked.
const PRUNE_THRESHOLD: usize = 10_000;

struct Window {
    started: Instant,
    hits: u32,
}

/// RateLimiter
///
/// Fixed-window request counter keyed by client address. Requests whose peer
/// address is unknown (no `ConnectInfo`, as in router tests) share one bucket.
#[derive(Clone)]
pub struct RateLimiter {
    window: Duration,
    max: u32,
    clients: Arc<Mutex<HashMap<Option<IpAddr>, Window>>>,
}

impl RateLimiter {
    pub fn new(window: Duration, max: u32) -> Self {
        Self {
            window,
            max,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Duration::from_secs(config.rate_limit_window_secs),
            config.rate_limit_max,
        )
    }

    /// check
    ///
    /// Counts one request from `client` at `now`. Once the client is over the
    /// limit, returns how long until its window resets.
    pub fn check(&self, client: Option<IpAddr>, now: Instant) -> Result<(), Duration> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() >= PRUNE_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            hits: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            entry.started = now;
            entry.hits = 0;
        }

        if entry.hits >= self.max {
            return Err(self.window.saturating_sub(now.duration_since(entry.started)));
        }
        entry.hits += 1;
        Ok(())
    }
}

/// limit
///
/// Global middleware: mounted with `from_fn_with_state(limiter, limit)` around
/// the whole router, so every route shares the same budget per client.
pub async fn limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match limiter.check(client, Instant::now()) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            tracing::warn!(?client, "rate limit exceeded");
            let mut response = AppError::new(
                "Too many requests, please try again later",
                StatusCode::TOO_MANY_REQUESTS,
            )
            .into_response();
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            response
        }
    }
}
