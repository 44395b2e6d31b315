//! Bounded polling used by every lookup that is allowed to wait.

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::trace;
use vista_common::{Result, VistaError};

/// Interval between probes when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// A timeout paired with a poll interval.
///
/// A zero timeout means exactly one probe and no sleeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run `probe` until it yields `Some`, or fail with
    /// [`VistaError::Timeout`] once the timeout has elapsed.
    ///
    /// Errors from the probe end the wait immediately. The last probe runs
    /// at (or just after) the deadline, so a success is never missed because
    /// of the poll interval.
    pub async fn until<T, F, Fut>(&self, condition: &str, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let started = Instant::now();
        // `None` when the timeout is too large to represent: wait forever.
        let deadline = started.checked_add(self.timeout);
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            if let Some(value) = probe().await? {
                trace!(target: "vista.wait", %condition, attempt, "condition met");
                return Ok(value);
            }
            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    trace!(target: "vista.wait", %condition, attempt, "gave up");
                    return Err(VistaError::Timeout {
                        waited: now - started,
                        condition: condition.to_string(),
                    });
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };
            trace!(target: "vista.wait", %condition, attempt, ?pause, "not yet");
            sleep(pause).await;
        }
    }
}
