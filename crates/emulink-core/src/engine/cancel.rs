use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A cancellation flag that supports interruptible waits.
///
/// Engine loops check it between iterations and sleep through [`wait`],
/// so cancelling wakes them immediately instead of after their tick interval.
///
/// [`wait`]: CancelToken::wait
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    condvar: Condvar,
    mutex: Mutex<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel, waking every thread blocked in `wait`.
    pub fn cancel(&self) {
        let _guard = self.mutex.lock();
        self.cancelled.store(true, Ordering::SeqCst);
        self.condvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait for `duration` or until cancelled.
    ///
    /// Returns `true` if cancelled, `false` if the full duration elapsed.
    pub fn wait(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }

        let Ok(guard) = self.mutex.lock() else {
            return true;
        };
        match self
            .condvar
            .wait_timeout_while(guard, duration, |_| !self.is_cancelled())
        {
            Ok((_, timeout)) => !timeout.timed_out(),
            // Poisoned: treat as cancelled
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_initial_state() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn test_wait_timeout() {
        let token = CancelToken::new();
        let start = Instant::now();
        let cancelled = token.wait(Duration::from_millis(50));

        assert!(!cancelled);
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_wait_interrupted() {
        let token = Arc::new(CancelToken::new());
        let waiter = Arc::clone(&token);

        let handle = thread::spawn(move || {
            let start = Instant::now();
            (waiter.wait(Duration::from_secs(10)), start.elapsed())
        });

        thread::sleep(Duration::from_millis(50));
        token.cancel();

        let (cancelled, elapsed) = handle.join().unwrap();
        assert!(cancelled);
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_after_cancel_returns_immediately() {
        let token = CancelToken::new();
        token.cancel();

        let start = Instant::now();
        assert!(token.wait(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
