//! Counting handoff between threads
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::error::Error;

/// Counting semaphore. Waits are always bounded.
#[derive(Debug, Default)]
pub struct Semaphore {
    count: Mutex<usize>,
    cond: Condvar,
}

impl Semaphore {
    /// Creates a [Semaphore] holding `initial` tokens
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            cond: Condvar::new(),
        }
    }
    /// Adds one token, waking up one waiter
    pub fn post(&self) {
        *self.count.lock() += 1;
        self.cond.notify_one();
    }
    /// Takes one token, waiting up to `timeout` for it to be posted.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<(), Error> {
        let deadline = Instant::now() + timeout;
        let mut count = self.count.lock();
        while *count == 0 {
            if self.cond.wait_until(&mut count, deadline).timed_out() {
                if *count == 0 {
                    return Err(Error::Timeout);
                }
                break;
            }
        }
        *count -= 1;
        Ok(())
    }
    /// Takes one token if available
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock();
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod test {
    use super::Semaphore;
    use crate::error::Error;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn bounded_wait() {
        let sem = Semaphore::new(1);
        assert!(sem.wait_timeout(Duration::from_millis(10)).is_ok());
        assert_eq!(
            sem.wait_timeout(Duration::from_millis(10)),
            Err(Error::Timeout)
        );
        assert!(!sem.try_wait());
    }

    #[test]
    fn cross_thread_post() {
        let sem = Arc::new(Semaphore::default());
        let poster = {
            let sem = sem.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    sem.post();
                }
            })
        };
        for _ in 0..3 {
            assert!(sem.wait_timeout(Duration::from_secs(5)).is_ok());
        }
        poster.join().unwrap();
        assert!(!sem.try_wait());
    }
}
