//! Shared rate gate: bounded concurrency plus a per-second token budget
//!
//! Every outbound RPC call acquires the gate first. The gate enforces two
//! independent limits:
//! - at most `concurrency` calls in flight at once (semaphore slots, handed
//!   to queued callers in FIFO order on release)
//! - at most `rate_per_second` calls admitted per rolling 1000ms window
//!   (token bucket refilled to full capacity at each window boundary, so a
//!   caller may burst up to capacity right after a refill)
//!
//! There are no error conditions; a caller that times out or is cancelled
//! simply drops its guard, which frees the slot.
use log::debug;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_millis(1000);
/// Lower bound on the wait between bucket re-checks, so an exhausted bucket
/// never busy-spins.
const MIN_WAIT: Duration = Duration::from_millis(5);

struct Bucket {
    tokens: u32,
    window_start: Instant,
}

pub struct RateGate {
    slots: Arc<Semaphore>,
    bucket: Mutex<Bucket>,
    capacity: u32,
}

impl RateGate {
    pub fn new(concurrency: usize, rate_per_second: u32) -> Self {
        let capacity = rate_per_second.max(1);
        Self {
            slots: Arc::new(Semaphore::new(concurrency.max(1))),
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                window_start: Instant::now(),
            }),
            capacity,
        }
    }

    /// Wait until both a concurrency slot and a rate token are available.
    ///
    /// The returned guard holds the slot for the caller's full round trip
    /// and releases it on drop.
    pub async fn acquire(&self) -> RateGateGuard {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("rate gate semaphore is never closed");

        self.take_token().await;

        RateGateGuard { _permit: permit }
    }

    async fn take_token(&self) {
        loop {
            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();

                if now.duration_since(bucket.window_start) >= WINDOW {
                    bucket.tokens = self.capacity;
                    bucket.window_start = now;
                }

                if bucket.tokens > 0 {
                    bucket.tokens -= 1;
                    return;
                }

                // Sleep until the current window rolls over.
                WINDOW.saturating_sub(now.duration_since(bucket.window_start))
            };

            let wait = wait.max(MIN_WAIT);
            debug!("rate budget exhausted, waiting {:?} for next window", wait);
            tokio::time::sleep(wait).await;
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Concurrency slots currently free. Exposed for diagnostics.
    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

/// RAII guard returned by [`RateGate::acquire`].
pub struct RateGateGuard {
    _permit: OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_concurrency_bound() {
        let gate = Arc::new(RateGate::new(5, 1000));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..40 {
            let gate = gate.clone();
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = gate.acquire().await;
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 5, "peak {}", peak.load(Ordering::SeqCst));
        assert_eq!(gate.available_slots(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_bound_per_window() {
        let gate = Arc::new(RateGate::new(50, 10));
        let admissions = Arc::new(std::sync::Mutex::new(Vec::new()));

        let start = Instant::now();
        let mut handles = Vec::new();
        for _ in 0..35 {
            let gate = gate.clone();
            let admissions = admissions.clone();
            handles.push(tokio::spawn(async move {
                let _guard = gate.acquire().await;
                admissions.lock().unwrap().push(start.elapsed());
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let times = admissions.lock().unwrap().clone();
        assert_eq!(times.len(), 35);
        // No 1000ms window may admit more than 10 calls.
        for t in &times {
            let window_start = *t;
            let in_window = times
                .iter()
                .filter(|u| **u >= window_start && **u < window_start + WINDOW)
                .count();
            assert!(in_window <= 10, "{} admissions within one window", in_window);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_after_refill() {
        let gate = RateGate::new(10, 3);
        // Drain the first window.
        for _ in 0..3 {
            let _ = gate.acquire().await;
        }
        tokio::time::sleep(WINDOW).await;

        // Full capacity is available again immediately.
        let before = Instant::now();
        for _ in 0..3 {
            let _ = gate.acquire().await;
        }
        assert!(before.elapsed() < Duration::from_millis(50));
    }
}
