//! Sliding-window rate counter.

use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};

#[derive(Debug, Clone, Copy)]
struct Node {
    amount: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct Window {
    sum: u64,
    /// Index of the oldest live node.
    offset: usize,
    nodes: Vec<Node>,
}

impl Window {
    fn evict(&mut self, now: Instant) {
        while let Some(node) = self.nodes.get(self.offset) {
            if node.expires_at > now {
                break;
            }
            self.sum -= node.amount;
            self.offset += 1;
        }

        if self.offset == self.nodes.len() {
            self.nodes.clear();
            self.offset = 0;
        }
    }

    fn push(&mut self, node: Node) {
        if self.nodes.len() == self.nodes.capacity() && self.offset > 0 {
            self.nodes.drain(..self.offset);
            self.offset = 0;
        }
        self.sum += node.amount;
        self.nodes.push(node);
    }
}

/// Accumulates amounts that expire `period` after they were added and
/// rejects any addition that would push the live sum above `limit`.
///
/// ```
/// use std::time::Duration;
/// use kestrel_core::RateCounter;
///
/// let counter = RateCounter::new(3, Duration::from_secs(30));
/// assert!(counter.add(2));
/// assert!(!counter.add(2));
/// assert!(counter.add(1));
/// ```
#[derive(Debug)]
pub struct RateCounter<C: Clock = SystemClock> {
    limit: u64,
    period: Duration,
    clock: C,
    window: Mutex<Window>,
}

impl RateCounter {
    pub fn new(limit: u64, period: Duration) -> Self {
        Self::with_clock(limit, period, SystemClock)
    }
}

impl<C: Clock> RateCounter<C> {
    pub fn with_clock(limit: u64, period: Duration, clock: C) -> Self {
        Self {
            limit,
            period,
            clock,
            window: Mutex::new(Window::default()),
        }
    }

    /// Tries to consume `amount`. A rejected call leaves the window untouched
    /// apart from evicting expired nodes.
    pub fn add(&self, amount: u64) -> bool {
        let now = self.clock.now();
        let mut window = self.window.lock();

        window.evict(now);

        match window.sum.checked_add(amount) {
            Some(total) if total <= self.limit => {
                window.push(Node {
                    amount,
                    expires_at: self.clock.deadline(self.period),
                });
                true
            }
            _ => false,
        }
    }

    /// Returns the live sum, evicting expired nodes first.
    pub fn sum(&self) -> u64 {
        let mut window = self.window.lock();
        window.evict(self.clock.now());
        window.sum
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn counter(limit: u64, period_secs: u64) -> (RateCounter<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let counter = RateCounter::with_clock(limit, Duration::from_secs(period_secs), clock.clone());
        (counter, clock)
    }

    #[test]
    fn test_rejects_over_limit() {
        let (counter, _) = counter(5, 10);
        assert!(counter.add(3));
        assert!(counter.add(2));
        assert!(!counter.add(1));
        assert_eq!(counter.sum(), 5);
    }

    #[test]
    fn test_rejected_add_does_not_mutate() {
        let (counter, _) = counter(5, 10);
        assert!(counter.add(4));
        assert!(!counter.add(2));
        assert_eq!(counter.sum(), 4);
        assert!(counter.add(1));
    }

    #[test]
    fn test_amounts_expire_after_period() {
        let (counter, clock) = counter(2, 10);
        assert!(counter.add(1));
        clock.advance(Duration::from_secs(5));
        assert!(counter.add(1));
        assert!(!counter.add(1));

        clock.advance(Duration::from_secs(5));
        assert_eq!(counter.sum(), 1);
        assert!(counter.add(1));
        assert!(!counter.add(1));

        clock.advance(Duration::from_secs(10));
        assert_eq!(counter.sum(), 0);
    }

    #[test]
    fn test_sum_never_exceeds_limit() {
        let (counter, clock) = counter(7, 3);
        for step in 0..200u64 {
            counter.add(step % 4 + 1);
            assert!(counter.sum() <= 7);
            clock.advance(Duration::from_millis(400));
        }
    }

    #[test]
    fn test_compaction_keeps_live_nodes() {
        let (counter, clock) = counter(1000, 4);
        for _ in 0..64 {
            assert!(counter.add(1));
            clock.advance(Duration::from_secs(1));
        }
        // Four one-second-spaced nodes stay inside a four-second window.
        assert_eq!(counter.sum(), 3);
        let window = counter.window.lock();
        assert!(window.nodes.len() - window.offset <= 4);
    }

    #[test]
    fn test_zero_limit_rejects_everything_but_zero() {
        let (counter, _) = counter(0, 1);
        assert!(!counter.add(1));
        assert!(counter.add(0));
    }
}
