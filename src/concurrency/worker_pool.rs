//! Secondary pool for blocking work such as politeness delays.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};

use crate::error::{AppError, Result};

/// Bounded pool of blocking threads with an unbounded queue.
///
/// Threads beyond `core_threads` are spawned on demand up to `max_threads`
/// and released after `idle` without work.
pub struct WorkerPool {
    runtime: Runtime,
}

impl WorkerPool {
    pub fn new(core_threads: usize, max_threads: usize, idle: Duration) -> Result<Self> {
        let core_threads = core_threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(core_threads)
            .max_blocking_threads(max_threads.max(core_threads))
            .thread_keep_alive(idle)
            .thread_name("delay-worker")
            .enable_time()
            .build()?;

        Ok(Self { runtime })
    }

    /// Sleep on a pool thread; the awaiting task yields its own thread meanwhile.
    ///
    /// A sleep that does not complete is fatal for the caller.
    pub async fn delay(&self, millis: u64) -> Result<()> {
        if millis == 0 {
            return Ok(());
        }
        self.runtime
            .spawn_blocking(move || std::thread::sleep(Duration::from_millis(millis)))
            .await
            .map_err(|e| AppError::interrupted(format!("delay of {millis} ms: {e}")))
    }
}
