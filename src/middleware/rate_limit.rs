//! Rate limiting middleware
//!
//! Fixed-window limiter keyed by client address concatenated with the route
//! path. Each key gets a counter and a reset instant; the first request after
//! the reset instant starts a new window with a count of one.
//!
//! The store is owned by the application state rather than being global, so
//! its memory is bounded by the caller: a capacity cap evicts the entry with
//! the oldest reset instant, and [`RateLimiter::sweep_expired`] drops entries
//! whose window has already elapsed.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info, warn};

use crate::utils::errors::{AscesaError, Result};
use crate::utils::logging::log_rate_limit_rejection;

/// Length of one rate limit window
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

/// Requests allowed per key per window
pub const DEFAULT_MAX_REQUESTS: u32 = 100;

/// Default cap on tracked keys
pub const DEFAULT_MAX_ENTRIES: usize = 100_000;

/// Bucket used when the client address cannot be determined.
///
/// Every such client shares this one quota.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window_duration: Duration,
    /// Maximum number of keys kept in memory
    pub max_entries: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window_duration: DEFAULT_WINDOW,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

/// Counter for one (client, route) key
#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

impl RateLimitEntry {
    fn new(now: Instant, window: Duration) -> Self {
        Self {
            count: 1,
            reset_at: now + window,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        now > self.reset_at
    }
}

/// Fixed-window request counter store
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl RateLimiter {
    /// Create a new limiter with its own empty store
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Composite key for a client and route
    pub fn key(client: &str, route: &str) -> String {
        format!("{}{}", client, route)
    }

    // A panic while holding the lock cannot leave a counter half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, RateLimitEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count a request for `client` on `route`
    pub fn check(&self, client: &str, route: &str) -> Result<()> {
        self.check_at(client, route, Instant::now())
    }

    /// Count a request at an explicit instant.
    ///
    /// The whole read-increment-write happens under one lock so concurrent
    /// requests for the same key cannot lose updates.
    pub fn check_at(&self, client: &str, route: &str, now: Instant) -> Result<()> {
        let key = Self::key(client, route);
        let mut entries = self.lock();

        let count = match entries.get_mut(&key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.count = entry.count.saturating_add(1);
                entry.count
            }
            Some(entry) => {
                *entry = RateLimitEntry::new(now, self.config.window_duration);
                1
            }
            None => {
                if entries.len() >= self.config.max_entries {
                    Self::make_room(&mut entries, now, self.config.max_entries);
                }
                entries.insert(key, RateLimitEntry::new(now, self.config.window_duration));
                1
            }
        };
        drop(entries);

        if count > self.config.max_requests {
            log_rate_limit_rejection(client, route, count, self.config.max_requests);
            return Err(AscesaError::RateLimitExceeded);
        }

        debug!(client = client, route = route, count = count, "Rate limit check passed");
        Ok(())
    }

    /// Free at least one slot: drop expired entries, then the oldest window
    fn make_room(entries: &mut HashMap<String, RateLimitEntry>, now: Instant, cap: usize) {
        entries.retain(|_, entry| !entry.is_expired(now));

        while entries.len() >= cap {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.reset_at)
                .map(|(key, _)| key.clone());

            match oldest {
                Some(key) => {
                    debug!(key = %key, "Evicting oldest rate limit entry");
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Current state of a key without counting a request
    pub fn status(&self, client: &str, route: &str) -> RateLimitStatus {
        self.status_at(client, route, Instant::now())
    }

    pub fn status_at(&self, client: &str, route: &str, now: Instant) -> RateLimitStatus {
        let entries = self.lock();
        let live = entries
            .get(&Self::key(client, route))
            .filter(|entry| !entry.is_expired(now));

        match live {
            Some(entry) => RateLimitStatus {
                current_requests: entry.count,
                max_requests: self.config.max_requests,
                remaining: self.config.max_requests.saturating_sub(entry.count),
                reset_time: entry.reset_at,
            },
            None => RateLimitStatus {
                current_requests: 0,
                max_requests: self.config.max_requests,
                remaining: self.config.max_requests,
                reset_time: now + self.config.window_duration,
            },
        }
    }

    /// Drop every entry whose window has elapsed, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Instant::now())
    }

    pub fn sweep_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();

        debug!(removed = removed, remaining_entries = entries.len(), "Swept expired rate limit entries");
        removed
    }

    /// Clear the counter for one key (admin function)
    pub fn clear_key(&self, client: &str, route: &str) -> bool {
        let removed = self.lock().remove(&Self::key(client, route)).is_some();

        if removed {
            info!(client = client, route = route, "Rate limit cleared for key");
        }

        removed
    }

    /// Clear all counters (admin function)
    pub fn clear_all(&self) -> usize {
        let mut entries = self.lock();
        let count = entries.len();
        entries.clear();

        info!(cleared_count = count, "All rate limits cleared");
        count
    }

    /// Number of tracked keys
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get rate limit statistics
    pub fn statistics(&self) -> RateLimitStatistics {
        let now = Instant::now();
        let entries = self.lock();

        let mut active_keys = 0;
        let mut total_requests: u64 = 0;
        let mut keys_at_limit = 0;

        for entry in entries.values().filter(|entry| !entry.is_expired(now)) {
            active_keys += 1;
            total_requests += u64::from(entry.count);
            if entry.count >= self.config.max_requests {
                keys_at_limit += 1;
            }
        }

        RateLimitStatistics {
            total_keys: entries.len(),
            active_keys,
            total_requests,
            keys_at_limit,
            config: self.config.clone(),
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

/// Rate limit status for a key
#[derive(Debug, Clone)]
pub struct RateLimitStatus {
    pub current_requests: u32,
    pub max_requests: u32,
    pub remaining: u32,
    pub reset_time: Instant,
}

/// Rate limit statistics
#[derive(Debug, Clone)]
pub struct RateLimitStatistics {
    pub total_keys: usize,
    pub active_keys: usize,
    pub total_requests: u64,
    pub keys_at_limit: usize,
    pub config: RateLimitConfig,
}

/// Axum adapter that resolves the client and route of a request and
/// consults the shared [`RateLimiter`]
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
    trust_forwarded_for: bool,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>, trust_forwarded_for: bool) -> Self {
        Self {
            limiter,
            trust_forwarded_for,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Client address for a request, or [`UNKNOWN_CLIENT`]
    pub fn client_address(&self, req: &Request) -> String {
        if self.trust_forwarded_for {
            let forwarded = req
                .headers()
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            if let Some(addr) = forwarded {
                return addr.to_string();
            }
        }

        match req.extensions().get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => addr.ip().to_string(),
            None => {
                warn!(uri = %req.uri(), "Client address unavailable, using shared rate limit bucket");
                UNKNOWN_CLIENT.to_string()
            }
        }
    }

    /// Route template when matched (`/users/{id}`), otherwise the raw path
    pub fn route_path(req: &Request) -> String {
        req.extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| req.uri().path().to_string())
    }
}

/// Middleware function applied with `axum::middleware::from_fn_with_state`
pub async fn enforce_rate_limit(
    State(middleware): State<RateLimitMiddleware>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let client = middleware.client_address(&req);
    let route = RateLimitMiddleware::route_path(&req);

    middleware.limiter.check(&client, &route)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use axum::body::Body;

    fn limiter() -> RateLimiter {
        RateLimiter::default()
    }

    #[test]
    fn test_defaults_match_fixed_window() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_duration, Duration::from_millis(60_000));
    }

    #[test]
    fn test_hundred_allowed_then_rejected() {
        let limiter = limiter();
        let now = Instant::now();

        for n in 1..=100 {
            assert!(limiter.check_at("10.0.0.1", "/benefits", now).is_ok(), "request {} should pass", n);
        }

        assert_matches!(
            limiter.check_at("10.0.0.1", "/benefits", now),
            Err(AscesaError::RateLimitExceeded)
        );
        // Still rejected later in the same window
        assert!(limiter
            .check_at("10.0.0.1", "/benefits", now + Duration::from_secs(59))
            .is_err());
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = limiter();
        let start = Instant::now();

        for _ in 0..101 {
            let _ = limiter.check_at("10.0.0.1", "/login", start);
        }
        assert!(limiter.check_at("10.0.0.1", "/login", start).is_err());

        // Exactly at the reset instant the window is still open
        let reset = start + DEFAULT_WINDOW;
        assert!(limiter.check_at("10.0.0.1", "/login", reset).is_err());

        let after = reset + Duration::from_millis(1);
        assert!(limiter.check_at("10.0.0.1", "/login", after).is_ok());

        let status = limiter.status_at("10.0.0.1", "/login", after);
        assert_eq!(status.current_requests, 1);
        assert_eq!(status.remaining, 99);
    }

    #[test]
    fn test_keys_do_not_share_counters() {
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..100 {
            limiter.check_at("10.0.0.1", "/partners", now).unwrap();
        }
        assert!(limiter.check_at("10.0.0.1", "/partners", now).is_err());

        // Same client, other route
        assert!(limiter.check_at("10.0.0.1", "/benefits", now).is_ok());
        // Other client, same route
        assert!(limiter.check_at("10.0.0.2", "/partners", now).is_ok());

        assert_eq!(limiter.status_at("10.0.0.1", "/benefits", now).current_requests, 1);
        assert_eq!(limiter.status_at("10.0.0.2", "/partners", now).current_requests, 1);
    }

    #[test]
    fn test_unknown_clients_share_one_bucket() {
        // Known accuracy limitation: clients without an address are merged.
        let limiter = limiter();
        let now = Instant::now();

        for _ in 0..60 {
            limiter.check_at(UNKNOWN_CLIENT, "/auth/login", now).unwrap();
        }
        for _ in 0..40 {
            limiter.check_at(UNKNOWN_CLIENT, "/auth/login", now).unwrap();
        }
        assert!(limiter.check_at(UNKNOWN_CLIENT, "/auth/login", now).is_err());
    }

    #[test]
    fn test_capacity_evicts_oldest_window() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_entries: 2,
            ..RateLimitConfig::default()
        });
        let t0 = Instant::now();

        limiter.check_at("a", "/x", t0).unwrap();
        limiter.check_at("b", "/x", t0 + Duration::from_secs(1)).unwrap();
        limiter.check_at("c", "/x", t0 + Duration::from_secs(2)).unwrap();

        assert_eq!(limiter.len(), 2);
        let now = t0 + Duration::from_secs(2);
        assert_eq!(limiter.status_at("a", "/x", now).current_requests, 0);
        assert_eq!(limiter.status_at("b", "/x", now).current_requests, 1);
        assert_eq!(limiter.status_at("c", "/x", now).current_requests, 1);
    }

    #[test]
    fn test_sweep_expired() {
        let limiter = limiter();
        let t0 = Instant::now();

        limiter.check_at("a", "/x", t0).unwrap();
        limiter.check_at("b", "/x", t0 + Duration::from_secs(30)).unwrap();

        let removed = limiter.sweep_expired_at(t0 + DEFAULT_WINDOW + Duration::from_secs(1));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_clear_and_statistics() {
        let limiter = limiter();

        limiter.check("a", "/x").unwrap();
        limiter.check("a", "/x").unwrap();
        limiter.check("b", "/y").unwrap();

        let stats = limiter.statistics();
        assert_eq!(stats.total_keys, 2);
        assert_eq!(stats.active_keys, 2);
        assert_eq!(stats.total_requests, 3);
        assert_eq!(stats.keys_at_limit, 0);

        assert!(limiter.clear_key("a", "/x"));
        assert!(!limiter.clear_key("a", "/x"));
        assert_eq!(limiter.clear_all(), 1);
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_concurrent_checks_lose_no_updates() {
        let limiter = Arc::new(limiter());
        let now = Instant::now();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..25)
                        .filter(|_| limiter.check_at("10.0.0.9", "/payments", now).is_ok())
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 100);
        assert_eq!(limiter.status_at("10.0.0.9", "/payments", now).current_requests, 200);
    }

    #[test]
    fn test_client_address_resolution() {
        let limiter = Arc::new(limiter());

        let req = axum::http::Request::builder().uri("/benefits").body(Body::empty()).unwrap();
        let plain = RateLimitMiddleware::new(Arc::clone(&limiter), false);
        assert_eq!(plain.client_address(&req), UNKNOWN_CLIENT);

        let mut req = axum::http::Request::builder()
            .uri("/benefits")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(plain.client_address(&req), UNKNOWN_CLIENT);

        let trusting = RateLimitMiddleware::new(Arc::clone(&limiter), true);
        assert_eq!(trusting.client_address(&req), "203.0.113.7");

        req.headers_mut().remove("x-forwarded-for");
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 10], 5555))));
        assert_eq!(trusting.client_address(&req), "192.168.1.10");
        assert_eq!(RateLimitMiddleware::route_path(&req), "/benefits");
    }
}
