//! Thread pools shared by the crawler and the indexing pipeline.
//!
//! - `ParallelTaskPool`: work-stealing pool that runs crawl tasks
//! - `WorkerPool`: secondary pool whose threads absorb blocking delays
//! - `CountDownLatch`: completion barrier used by `execute_await`

mod latch;
mod task_pool;
mod worker_pool;

pub use latch::CountDownLatch;
pub use task_pool::ParallelTaskPool;
pub use worker_pool::WorkerPool;
