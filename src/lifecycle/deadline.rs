//! Bounded-lifetime cancellation context.
//!
//! A [`Deadline`] fires when its timeout elapses or when its
//! [`DeadlineGuard`] is dropped, whichever happens first. The guard is the
//! cleanup half: holding it in a local binding releases the deadline on
//! every exit path of the owning scope, exactly once.

use std::time::Duration;

use tokio::time::Instant;

/// Stand-in for "never" when a timeout does not fit in an `Instant`
/// (roughly 30 years, as `tokio::time` does).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);
use tokio_util::sync::{CancellationToken, DropGuard};

/// A point in time after which a bounded operation should give up.
#[derive(Debug, Clone)]
pub struct Deadline {
    token: CancellationToken,
    expires_at: Instant,
    timeout: Duration,
}

/// Releases its [`Deadline`] when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard releases the deadline immediately"]
pub struct DeadlineGuard {
    _release: DropGuard,
}

impl Deadline {
    /// Create a deadline `timeout` from now.
    pub fn after(timeout: Duration) -> (Self, DeadlineGuard) {
        let token = CancellationToken::new();
        let guard = DeadlineGuard {
            _release: token.clone().drop_guard(),
        };
        let now = Instant::now();
        let expires_at = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let deadline = Self {
            token,
            expires_at,
            timeout,
        };
        (deadline, guard)
    }

    /// Resolves once the deadline has passed or been released.
    pub async fn expired(&self) {
        tokio::select! {
            () = tokio::time::sleep_until(self.expires_at) => {}
            () = self.token.cancelled() => {}
        }
    }

    /// True once the timeout has elapsed.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// True once the guard has been dropped.
    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
