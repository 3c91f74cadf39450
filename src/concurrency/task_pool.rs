//! Work-stealing task pool for crawl tasks.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::concurrency::CountDownLatch;
use crate::error::Result;

/// Fixed-size multi-threaded pool. Idle workers steal queued tasks from busy ones.
pub struct ParallelTaskPool {
    runtime: Runtime,
    threads: usize,
}

impl ParallelTaskPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads)
            .thread_name("crawl-pool")
            .enable_all()
            .build()?;

        log::debug!("Started crawl pool with {} threads", threads);
        Ok(Self { runtime, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Submit a task without waiting for it.
    pub fn execute<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task);
    }

    /// Submit every task and block the calling thread until all have finished.
    ///
    /// Must be called from outside the pool. A task that panics still counts
    /// as finished.
    pub fn execute_await<I, F>(&self, tasks: I)
    where
        I: IntoIterator<Item = F>,
        F: Future<Output = ()> + Send + 'static,
    {
        let tasks: Vec<F> = tasks.into_iter().collect();
        let latch = Arc::new(CountDownLatch::new(tasks.len()));

        for task in tasks {
            let latch = Arc::clone(&latch);
            self.execute(async move {
                let _done = latch.guard();
                task.await;
            });
        }

        latch.wait();
    }

    /// Run a single future to completion on the pool.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
