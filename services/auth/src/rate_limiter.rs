//! Login throttling against password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Attempts allowed per window
    pub max_attempts: u32,
    /// Length of the counting window
    pub window: Duration,
    /// How long a key stays blocked once it exceeds the limit
    pub ban_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            ban_duration: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct Entry {
    attempts: u32,
    window_start: Instant,
    banned_until: Option<Instant>,
}

impl Entry {
    /// Nothing left to remember: no active ban and the window has run out
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.banned_until {
            Some(until) => now >= until,
            None => now.saturating_duration_since(self.window_start) >= window,
        }
    }
}

#[derive(Debug)]
struct Entries {
    by_key: HashMap<String, Entry>,
    last_sweep: Instant,
}

/// Per-key attempt counter.
///
/// Stale keys are swept at most once per window, so the table only holds
/// keys seen within the last window plus those still banned.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<Entries>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(Entries {
                by_key: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.entries.lock().await.by_key.len()
    }

    /// Record an attempt for `key`; false when the key is currently blocked
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now()).await
    }

    async fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let mut entries = self.entries.lock().await;
        let window = self.config.window;
        if now.saturating_duration_since(entries.last_sweep) >= window {
            entries.by_key.retain(|_, entry| !entry.is_stale(now, window));
            entries.last_sweep = now;
        }

        let entry = entries.by_key.entry(key.to_string()).or_insert(Entry {
            attempts: 0,
            window_start: now,
            banned_until: None,
        });

        match entry.banned_until {
            Some(until) if now < until => return false,
            Some(_) => {
                entry.banned_until = None;
                entry.attempts = 0;
                entry.window_start = now;
            }
            None => {}
        }

        if now.saturating_duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.banned_until = Some(now + self.config.ban_duration);
            warn!(
                "Blocked login key for {} seconds",
                self.config.ban_duration.as_secs()
            );
            return false;
        }

        entry.attempts += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts: 2,
            window: Duration::from_secs(60),
            ban_duration: Duration::from_secs(600),
        })
    }

    #[tokio::test]
    async fn blocks_after_max_attempts_until_ban_expires() {
        let limiter = limiter();
        let t0 = Instant::now();

        assert!(limiter.is_allowed_at("k", t0).await);
        assert!(limiter.is_allowed_at("k", t0).await);
        assert!(!limiter.is_allowed_at("k", t0).await);
        assert!(!limiter.is_allowed_at("k", t0 + Duration::from_secs(599)).await);
        assert!(limiter.is_allowed_at("k", t0 + Duration::from_secs(601)).await);
    }

    #[tokio::test]
    async fn window_expiry_resets_the_count() {
        let limiter = limiter();
        let t0 = Instant::now();

        assert!(limiter.is_allowed_at("k", t0).await);
        assert!(limiter.is_allowed_at("k", t0).await);
        assert!(limiter.is_allowed_at("k", t0 + Duration::from_secs(61)).await);
    }

    #[tokio::test]
    async fn stale_keys_are_swept() {
        let limiter = limiter();
        let t0 = Instant::now();

        for i in 0..50 {
            limiter.is_allowed_at(&format!("user{i}@example.com"), t0).await;
        }
        for _ in 0..3 {
            limiter.is_allowed_at("banned", t0).await;
        }
        assert_eq!(limiter.tracked_keys().await, 51);

        let later = t0 + Duration::from_secs(61);
        assert!(limiter.is_allowed_at("fresh", later).await);
        assert_eq!(limiter.tracked_keys().await, 2);
        assert!(!limiter.is_allowed_at("banned", later).await);

        let after_ban = t0 + Duration::from_secs(700);
        assert!(limiter.is_allowed_at("another", after_ban).await);
        assert_eq!(limiter.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let limiter = limiter();
        let t0 = Instant::now();

        limiter.is_allowed_at("a", t0).await;
        limiter.is_allowed_at("a", t0).await;
        assert!(!limiter.is_allowed_at("a", t0).await);
        assert!(limiter.is_allowed_at("b", t0).await);
    }
}
