use std::sync::{Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};

/// Tracks the last dispatch to a single host.
///
/// The timestamp lives behind a lock that doubles as the host's critical
/// section: whoever holds a [`Turn`] is the only caller allowed to wait for,
/// and dispatch to, this host. Everybody else queues on the lock.
#[derive(Debug, Default)]
pub struct HostLimiter {
    /// `None` until the first dispatch
    last_dispatch: Mutex<Option<Instant>>,
}

impl HostLimiter {
    /// Create a limiter for a host that has never been contacted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter the critical section for this host, blocking while another
    /// caller holds it.
    ///
    /// A poisoned lock (a previous holder panicked mid-dispatch) is
    /// recovered, since the stored timestamp is still accurate.
    pub fn acquire(&self) -> Turn<'_> {
        let last_dispatch = self
            .last_dispatch
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Turn { last_dispatch }
    }

    /// Whether a caller currently holds the critical section
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.last_dispatch.try_lock(),
            Err(TryLockError::WouldBlock)
        )
    }
}

/// Exclusive access to one host, released on drop.
#[derive(Debug)]
pub struct Turn<'a> {
    last_dispatch: MutexGuard<'a, Option<Instant>>,
}

impl Turn<'_> {
    /// Time left until `min_interval` has passed since the last dispatch.
    /// Zero for a host that was never contacted.
    #[must_use]
    pub fn remaining(&self, min_interval: Duration) -> Duration {
        self.last_dispatch.map_or(Duration::ZERO, |last| {
            min_interval.saturating_sub(last.elapsed())
        })
    }

    /// Block the current thread until `min_interval` has passed since the
    /// last dispatch. Returns how long we slept.
    pub fn wait(&mut self, min_interval: Duration) -> Duration {
        let remaining = self.remaining(min_interval);
        if !remaining.is_zero() {
            thread::sleep(remaining);
        }
        remaining
    }

    /// Record a dispatch at the current instant
    pub fn stamp(&mut self) {
        *self.last_dispatch = Some(Instant::now());
    }

    /// The last recorded dispatch, if any
    #[must_use]
    pub fn last_dispatch(&self) -> Option<Instant> {
        *self.last_dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fresh_limiter_does_not_wait() {
        let limiter = HostLimiter::new();
        let mut turn = limiter.acquire();

        assert_eq!(turn.last_dispatch(), None);
        assert_eq!(turn.wait(Duration::from_secs(60)), Duration::ZERO);
    }

    #[test]
    fn test_wait_covers_remaining_interval() {
        let limiter = HostLimiter::new();
        let interval = Duration::from_millis(100);

        let mut turn = limiter.acquire();
        turn.stamp();
        let stamped = turn.last_dispatch().unwrap();
        drop(turn);

        let mut turn = limiter.acquire();
        let waited = turn.wait(interval);
        assert!(waited > Duration::ZERO);
        assert!(stamped.elapsed() >= interval);
    }

    #[test]
    fn test_elapsed_interval_means_no_wait() {
        let limiter = HostLimiter::new();
        let mut turn = limiter.acquire();
        turn.stamp();
        thread::sleep(Duration::from_millis(30));

        assert_eq!(turn.remaining(Duration::from_millis(10)), Duration::ZERO);
        assert_eq!(turn.wait(Duration::ZERO), Duration::ZERO);
    }

    #[test]
    fn test_turn_is_exclusive() {
        let limiter = HostLimiter::new();
        assert!(!limiter.is_active());

        let turn = limiter.acquire();
        assert!(limiter.is_active());

        drop(turn);
        assert!(!limiter.is_active());
    }

    #[test]
    fn test_concurrent_turns_are_spaced() {
        let limiter = Arc::new(HostLimiter::new());
        let interval = Duration::from_millis(50);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || {
                    let mut turn = limiter.acquire();
                    turn.wait(interval);
                    turn.stamp();
                    turn.last_dispatch().unwrap()
                })
            })
            .collect();

        let mut dispatched: Vec<Instant> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        dispatched.sort();

        for pair in dispatched.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= interval);
        }
    }

    #[test]
    fn test_poisoned_lock_is_recovered() {
        let limiter = Arc::new(HostLimiter::new());

        let poisoner = Arc::clone(&limiter);
        let result = thread::spawn(move || {
            let mut turn = poisoner.acquire();
            turn.stamp();
            panic!("transport blew up");
        })
        .join();
        assert!(result.is_err());

        let turn = limiter.acquire();
        assert!(turn.last_dispatch().is_some());
    }
}
