//! Blocking entry point for callers that are not async themselves.
//!
//! Extraction is asynchronous end to end; [`VistaRuntime`] owns a
//! current-thread Tokio runtime so a synchronous program can drive an
//! extraction to completion on the calling thread.
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tracing::debug;

pub struct VistaRuntime {
    runtime: Runtime,
}

impl VistaRuntime {
    /// Runtime that runs everything on the calling thread.
    ///
    /// ```
    /// use vista_runtime::VistaRuntime;
    ///
    /// let runtime = VistaRuntime::current_thread().unwrap();
    /// let slept = runtime.block_on(async {
    ///     tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    ///     "done"
    /// });
    /// assert_eq!(slept, "done");
    /// ```
    pub fn current_thread() -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build current-thread runtime")?;
        debug!(target: "vista.runtime", "runtime ready");
        Ok(Self { runtime })
    }

    /// Run a future to completion on the runtime, blocking the caller.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Shut the runtime down, giving pending timers `graceful` to finish.
    pub fn shutdown(self, graceful: Duration) {
        self.runtime.shutdown_timeout(graceful);
    }
}

/// Run `fut` to completion on a fresh current-thread runtime.
///
/// Any error type that absorbs an `anyhow::Error` works, so extraction
/// results can be driven directly.
///
/// ```
/// let answer = vista_runtime::block_on(async { Ok::<_, anyhow::Error>(7) }).unwrap();
/// assert_eq!(answer, 7);
/// ```
pub fn block_on<F, T, E>(fut: F) -> std::result::Result<T, E>
where
    F: Future<Output = std::result::Result<T, E>>,
    E: From<anyhow::Error>,
{
    VistaRuntime::current_thread()
        .map_err(E::from)?
        .block_on(fut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_propagates_errors() {
        let err = block_on(async { Err::<(), _>(anyhow::anyhow!("session gone")) }).unwrap_err();
        assert_eq!(err.to_string(), "session gone");
    }

    #[test]
    fn timers_run_on_the_calling_thread() {
        let caller = std::thread::current().id();
        let runtime = VistaRuntime::current_thread().unwrap();
        let (waited, ran_on) = runtime.block_on(async {
            let started = tokio::time::Instant::now();
            tokio::time::sleep(Duration::from_millis(5)).await;
            (started.elapsed(), std::thread::current().id())
        });
        assert!(waited >= Duration::from_millis(5));
        assert_eq!(ran_on, caller);
        runtime.shutdown(Duration::from_millis(10));
    }
}
