// ABOUTME: Fixed-window rate limiting for login, registration, and recipe generation
// ABOUTME: Tracks attempt counts per key in memory and reports time until window reset
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Savora Health

//! # Fixed-Window Rate Limiting
//!
//! A key's window opens on its first attempt and lasts for the configured
//! duration. Attempts inside an open window count against the limit; once
//! the window elapses the next attempt opens a fresh one. Auth routes key
//! by normalized email, generation by user id.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;

/// Attempt counter for one key's current window
#[derive(Debug, Clone, Copy)]
struct WindowEntry {
    count: u32,
    reset_at: Instant,
}

/// In-memory fixed-window attempt limiter
#[derive(Debug)]
pub struct FixedWindowLimiter {
    max_attempts: u32,
    window: Duration,
    entries: DashMap<String, WindowEntry>,
}

impl FixedWindowLimiter {
    /// Create a limiter allowing `max_attempts` per `window`
    #[must_use]
    pub fn new(max_attempts: u32, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            entries: DashMap::new(),
        }
    }

    /// Create a limiter from server configuration
    #[must_use]
    pub fn from_config(config: RateLimitConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_secs(config.window_secs))
    }

    /// Maximum attempts allowed inside one window
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Window length
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Record an attempt for `key` and report whether it is allowed
    ///
    /// The first attempt of a window always passes and opens the window;
    /// attempts beyond the limit are rejected until the window elapses.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(key.to_owned())
            .or_insert_with(|| WindowEntry {
                count: 0,
                reset_at: now + self.window,
            });

        if now > entry.reset_at {
            entry.count = 1;
            entry.reset_at = now + self.window;
            return true;
        }

        if entry.count >= self.max_attempts {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Time until `key`'s window resets; zero when no window is open
    #[must_use]
    pub fn remaining_time(&self, key: &str) -> Duration {
        let now = Instant::now();
        self.entries
            .get(key)
            .map_or(Duration::ZERO, |entry| {
                entry.reset_at.saturating_duration_since(now)
            })
    }

    /// Forget any open window for `key`
    pub fn reset(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Drop entries whose windows have elapsed
    pub fn prune(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| now <= entry.reset_at);
    }

    /// Number of keys with tracked windows
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit_then_blocks() {
        let limiter = FixedWindowLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.check("alice@example.com"));
        assert!(limiter.check("alice@example.com"));
        assert!(limiter.check("alice@example.com"));
        assert!(!limiter.check("alice@example.com"));
        assert!(!limiter.check("alice@example.com"));

        // Other keys are unaffected
        assert!(limiter.check("bob@example.com"));
    }

    #[test]
    fn test_window_elapses_and_resets() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(10));

        assert!(limiter.check("key"));
        assert!(!limiter.check("key"));

        std::thread::sleep(Duration::from_millis(20));
        assert!(limiter.check("key"));
    }

    #[test]
    fn test_remaining_time() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));

        assert_eq!(limiter.remaining_time("key"), Duration::ZERO);
        limiter.check("key");
        let remaining = limiter.remaining_time("key");
        assert!(remaining > Duration::from_secs(50));
        assert!(remaining <= Duration::from_secs(60));
    }

    #[test]
    fn test_reset_clears_window() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_secs(60));

        limiter.check("key");
        assert!(!limiter.check("key"));
        limiter.reset("key");
        assert!(limiter.check("key"));
    }

    #[test]
    fn test_prune_drops_elapsed_windows() {
        let limiter = FixedWindowLimiter::new(1, Duration::from_millis(5));

        limiter.check("gone");
        std::thread::sleep(Duration::from_millis(15));
        limiter.check("kept");

        limiter.prune();
        assert_eq!(limiter.tracked_keys(), 1);
        assert_eq!(limiter.remaining_time("gone"), Duration::ZERO);
    }
}
