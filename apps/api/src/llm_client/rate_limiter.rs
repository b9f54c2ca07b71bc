//! Sliding-window admission control for outbound generation requests.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use tracing::warn;

use crate::llm_client::CompletionError;

/// Width of the sliding window.
pub const WINDOW: Duration = Duration::from_secs(60);

/// Process-wide request gate. At most `max_requests` calls are admitted in any
/// window; denied calls fail immediately and are never queued.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests_per_minute: u32) -> Self {
        Self::with_window(max_requests_per_minute, WINDOW)
    }

    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests as usize,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    pub fn admit(&self) -> Result<(), CompletionError> {
        self.admit_at(Instant::now())
    }

    /// Prune, check, and record happen under one lock so two concurrent callers
    /// can never both take the last slot.
    pub fn admit_at(&self, now: Instant) -> Result<(), CompletionError> {
        let mut timestamps = self
            .timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        while let Some(&oldest) = timestamps.front() {
            if now.saturating_duration_since(oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            warn!(
                "Rate limit exceeded ({} requests per {}s)",
                self.max_requests,
                self.window.as_secs()
            );
            return Err(CompletionError::RateLimitExceeded {
                limit: self.max_requests as u32,
            });
        }

        timestamps.push_back(now);
        Ok(())
    }

    /// Requests currently counted against the window, without pruning.
    #[cfg(test)]
    pub fn recorded(&self) -> usize {
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
