//! Order-completion polling
//!
//! Placing an order with the ordering API returns an order id right away, but
//! the resource it buys shows up on the account later. `OrderPoller` lists the
//! account with a filter on that order id until exactly one resource appears.
//!
//! - zero matches: still pending, sleep and try again
//! - one match: done
//! - more than one match: the backend broke its one-resource-per-order
//!   guarantee, fail without retrying
//!
//! Listing errors are returned as-is. The remote client does its own
//! low-level retries.
//!
//! Time comes from a [`Clock`] so that tests can use [`ManualClock`] and skip
//! the real waiting. A [`CancellationToken`] can stop a wait before the
//! deadline.

use crate::error::CloudError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Upper bound for the backoff interval unless a larger minimum is configured
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(10);

/// Source of time for the poll loop
#[async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;

    async fn sleep(&self, duration: Duration);
}

/// Clock backed by the tokio timer
///
/// Uses tokio's instant so a paused runtime (`start_paused`) drives it too.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock that only moves when slept on
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Total simulated time since creation
    pub fn elapsed(&self) -> Duration {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn advance(&self, duration: Duration) {
        *self.offset.lock().unwrap_or_else(|e| e.into_inner()) += duration;
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(duration);
        self.advance(duration);
    }
}

/// Timing parameters for one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Give up once this much time has passed since the poll started
    pub timeout: Duration,

    /// Wait before the first listing call
    pub initial_delay: Duration,

    /// Shortest pause between two listing calls
    pub min_interval: Duration,

    /// Longest pause between two listing calls
    pub max_interval: Duration,
}

impl PollConfig {
    pub fn new(
        timeout: Duration,
        initial_delay: Duration,
        min_interval: Duration,
    ) -> Result<Self, CloudError> {
        let config = Self {
            timeout,
            initial_delay,
            min_interval,
            max_interval: DEFAULT_MAX_INTERVAL.max(min_interval),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_interval(mut self, max_interval: Duration) -> Result<Self, CloudError> {
        self.max_interval = max_interval;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), CloudError> {
        if self.min_interval.is_zero() {
            return Err(CloudError::InvalidConfig(
                "poll min_interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout <= self.initial_delay {
            return Err(CloudError::InvalidConfig(format!(
                "poll timeout {:?} must exceed initial delay {:?}",
                self.timeout, self.initial_delay
            )));
        }
        if self.max_interval < self.min_interval {
            return Err(CloudError::InvalidConfig(format!(
                "poll max_interval {:?} is shorter than min_interval {:?}",
                self.max_interval, self.min_interval
            )));
        }
        Ok(())
    }
}

/// Equality filter selecting the resources created by one order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderFilter {
    /// Dotted field path on the account listing
    pub path: String,

    /// Order identifier returned by the ordering API
    pub order_id: u64,
}

impl OrderFilter {
    pub fn new(path: impl Into<String>, order_id: u64) -> Result<Self, CloudError> {
        if order_id == 0 {
            return Err(CloudError::InvalidConfig(
                "order id must be a positive integer".to_string(),
            ));
        }
        Ok(Self {
            path: path.into(),
            order_id,
        })
    }
}

impl std::fmt::Display for OrderFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} == {}", self.path, self.order_id)
    }
}

/// How a poll ended when it did not resolve
#[derive(Error, Debug)]
pub enum PollError<E> {
    #[error("timed out after {elapsed:?} waiting for order {order_id}")]
    Timeout { order_id: u64, elapsed: Duration },

    #[error("expected exactly one resource for order {order_id}, found {count}")]
    Ambiguous { order_id: u64, count: usize },

    #[error("wait for order {order_id} was cancelled")]
    Cancelled { order_id: u64 },

    #[error(transparent)]
    Transport(E),
}

impl<E: Into<CloudError>> From<PollError<E>> for CloudError {
    fn from(err: PollError<E>) -> Self {
        match err {
            PollError::Timeout { order_id, elapsed } => CloudError::Timeout(format!(
                "order {order_id} did not complete within {elapsed:?}"
            )),
            PollError::Ambiguous { order_id, count } => CloudError::AmbiguousResult(format!(
                "expected exactly one resource for order {order_id}, found {count}"
            )),
            PollError::Cancelled { order_id } => {
                CloudError::Cancelled(format!("wait for order {order_id}"))
            }
            PollError::Transport(e) => e.into(),
        }
    }
}

/// Result of one listing call
#[derive(Debug, PartialEq, Eq)]
enum Tick<T> {
    Pending,
    Complete(T),
    Ambiguous(usize),
}

fn classify<T>(mut candidates: Vec<T>) -> Tick<T> {
    match candidates.len() {
        0 => Tick::Pending,
        1 => candidates.pop().map_or(Tick::Pending, Tick::Complete),
        n => Tick::Ambiguous(n),
    }
}

/// Waits for an order to materialize as exactly one resource
#[derive(Clone)]
pub struct OrderPoller {
    config: PollConfig,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for OrderPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderPoller")
            .field("config", &self.config)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl OrderPoller {
    pub fn new(config: PollConfig) -> Self {
        Self {
            config,
            clock: Arc::new(TokioClock),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Poll `list` until it returns exactly one resource for `filter`
    pub async fn wait_for<T, E, F, Fut>(
        &self,
        filter: &OrderFilter,
        mut list: F,
    ) -> Result<T, PollError<E>>
    where
        F: FnMut(&OrderFilter) -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
    {
        let started = self.clock.now();
        // A timeout past the clock's range never expires.
        let deadline = started.checked_add(self.config.timeout);
        let mut interval = self.config.min_interval;
        let mut tick = 0u32;

        tracing::debug!(filter = %filter, timeout = ?self.config.timeout, "Waiting for order");
        self.pause(filter, self.config.initial_delay).await?;

        loop {
            tick += 1;
            let candidates = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(PollError::Cancelled {
                        order_id: filter.order_id,
                    });
                }
                listed = list(filter) => listed.map_err(PollError::Transport)?,
            };

            match classify(candidates) {
                Tick::Complete(resource) => {
                    tracing::info!(order_id = filter.order_id, tick, "Order completed");
                    return Ok(resource);
                }
                Tick::Ambiguous(count) => {
                    tracing::error!(order_id = filter.order_id, count, "Order matched several resources");
                    return Err(PollError::Ambiguous {
                        order_id: filter.order_id,
                        count,
                    });
                }
                Tick::Pending => {}
            }

            let now = self.clock.now();
            let remaining = deadline.map_or(Duration::MAX, |d| d.saturating_duration_since(now));
            if remaining.is_zero() {
                let elapsed = now.saturating_duration_since(started);
                tracing::warn!(order_id = filter.order_id, ?elapsed, "Order did not complete in time");
                return Err(PollError::Timeout {
                    order_id: filter.order_id,
                    elapsed,
                });
            }

            let wait = interval.min(remaining);
            tracing::debug!(order_id = filter.order_id, tick, ?wait, "Order pending");
            self.pause(filter, wait).await?;
            interval = interval.saturating_mul(2).min(self.config.max_interval);
        }
    }

    async fn pause<E>(&self, filter: &OrderFilter, duration: Duration) -> Result<(), PollError<E>> {
        let cancelled = || PollError::Cancelled {
            order_id: filter.order_id,
        };

        if self.cancel.is_cancelled() {
            return Err(cancelled());
        }
        if duration.is_zero() {
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(cancelled()),
            _ = self.clock.sleep(duration) => Ok(()),
        }
    }
}
