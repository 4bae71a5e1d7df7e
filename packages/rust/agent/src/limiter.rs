//! Bounded-concurrency gate for outbound search calls.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Maximum simultaneous outbound provider calls per agent.
pub const MAX_CONCURRENT_SEARCHES: usize = 5;

/// A counting gate with fixed capacity.
///
/// [`RateLimiter::acquire`] suspends until a slot frees; the returned
/// [`SearchSlot`] gives the slot back when dropped, so it is released on
/// every exit path, including errors and panics.
pub struct RateLimiter {
    semaphore: Arc<Semaphore>,
}

impl RateLimiter {
    /// Create a gate with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
        }
    }

    /// Wait for a free slot.
    pub async fn acquire(&self) -> SearchSlot {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore closed");
        SearchSlot { _permit: permit }
    }

    /// Slots currently free.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(MAX_CONCURRENT_SEARCHES)
    }
}

/// An acquired slot, returned on drop.
pub struct SearchSlot {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let limiter = Arc::new(RateLimiter::new(MAX_CONCURRENT_SEARCHES));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..12 {
            let limiter = limiter.clone();
            let in_flight = in_flight.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _slot = limiter.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(max_seen.load(Ordering::SeqCst) <= MAX_CONCURRENT_SEARCHES);
        assert_eq!(limiter.available(), MAX_CONCURRENT_SEARCHES);
    }

    #[tokio::test]
    async fn slot_is_released_on_drop() {
        let limiter = RateLimiter::new(1);
        {
            let _slot = limiter.acquire().await;
            assert_eq!(limiter.available(), 0);
        }
        assert_eq!(limiter.available(), 1);
    }
}
