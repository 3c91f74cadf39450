//! Countdown latch.

use parking_lot::{Condvar, Mutex};

/// Blocks waiters until `count_down` has been called `count` times.
#[derive(Debug)]
pub struct CountDownLatch {
    remaining: Mutex<usize>,
    zero: Condvar,
}

impl CountDownLatch {
    pub fn new(count: usize) -> Self {
        Self {
            remaining: Mutex::new(count),
            zero: Condvar::new(),
        }
    }

    /// Decrement the counter, waking waiters when it reaches zero.
    pub fn count_down(&self) {
        let mut remaining = self.remaining.lock();
        if *remaining > 0 {
            *remaining -= 1;
            if *remaining == 0 {
                self.zero.notify_all();
            }
        }
    }

    pub fn count(&self) -> usize {
        *self.remaining.lock()
    }

    /// Block until the counter reaches zero.
    pub fn wait(&self) {
        let mut remaining = self.remaining.lock();
        while *remaining > 0 {
            self.zero.wait(&mut remaining);
        }
    }

    /// A guard that counts down when dropped, including during unwinding.
    pub fn guard(&self) -> LatchGuard<'_> {
        LatchGuard { latch: self }
    }
}

pub struct LatchGuard<'a> {
    latch: &'a CountDownLatch,
}

impl Drop for LatchGuard<'_> {
    fn drop(&mut self) {
        self.latch.count_down();
    }
}
