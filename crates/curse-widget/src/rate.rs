//! Sliding-window request counter for the status page

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Counts events within a trailing time window
pub struct RateCounter {
    window: Duration,
    events: Mutex<VecDeque<Instant>>,
}

impl RateCounter {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn per_hour() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }

    pub fn incr(&self) {
        self.incr_at(Instant::now());
    }

    /// Number of increments within the trailing window
    pub fn rate(&self) -> u64 {
        self.rate_at(Instant::now())
    }

    fn incr_at(&self, now: Instant) {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        Self::evict(&mut events, now, self.window);
        events.push_back(now);
    }

    fn rate_at(&self, now: Instant) -> u64 {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        Self::evict(&mut events, now, self.window);
        events.len() as u64
    }

    fn evict(events: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while let Some(&oldest) = events.front() {
            if now.saturating_duration_since(oldest) < window {
                break;
            }
            events.pop_front();
        }
    }
}

impl Default for RateCounter {
    fn default() -> Self {
        Self::per_hour()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_increments() {
        let counter = RateCounter::per_hour();
        assert_eq!(counter.rate(), 0);
        counter.incr();
        counter.incr();
        counter.incr();
        assert_eq!(counter.rate(), 3);
    }

    #[test]
    fn test_old_increments_leave_the_window() {
        let counter = RateCounter::new(Duration::from_secs(60));
        let start = Instant::now();

        counter.incr_at(start);
        counter.incr_at(start + Duration::from_secs(30));
        counter.incr_at(start + Duration::from_secs(59));

        assert_eq!(counter.rate_at(start + Duration::from_secs(59)), 3);
        // The first increment is exactly one window old
        assert_eq!(counter.rate_at(start + Duration::from_secs(60)), 2);
        assert_eq!(counter.rate_at(start + Duration::from_secs(100)), 1);
        assert_eq!(counter.rate_at(start + Duration::from_secs(200)), 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let counter = std::sync::Arc::new(RateCounter::per_hour());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        counter.incr();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.rate(), 800);
    }
}
