//! # Fibonacci Backoff
//!
//! Progressive requeue delays for stacks whose reconciliation keeps failing.
//! Grows more slowly than exponential backoff, so a stack that fails on a
//! transient API error is retried soon while a persistently failing one
//! settles at the configured maximum.
//!
//! ## Usage
//!
//! ```rust
//! use lokistack_controller::controller::backoff::FibonacciBackoff;
//! use std::time::Duration;
//!
//! let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(60));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
//! assert_eq!(backoff.next_backoff(), Duration::from_secs(15));
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator
///
/// Each delay is the sum of the previous two, starting from `min` and capped
/// at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    prev: Duration,
    current: Duration,
    max: Duration,
}

impl FibonacciBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        let min = min.min(max);
        Self {
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next delay and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        let next = self.prev.saturating_add(self.current);
        self.prev = self.current;
        self.current = next.min(self.max);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(backoff: &mut FibonacciBackoff) -> u64 {
        backoff.next_backoff().as_secs()
    }

    #[test]
    fn test_fibonacci_backoff_sequence() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        let seq: Vec<u64> = (0..8).map(|_| secs(&mut backoff)).collect();
        assert_eq!(seq, vec![5, 5, 10, 15, 25, 40, 65, 105]);
    }

    #[test]
    fn test_fibonacci_backoff_max_cap() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(5), Duration::from_secs(20));
        let seq: Vec<u64> = (0..7).map(|_| secs(&mut backoff)).collect();
        assert_eq!(seq, vec![5, 5, 10, 15, 20, 20, 20]);
    }

    #[test]
    fn test_min_above_max_is_clamped() {
        let mut backoff = FibonacciBackoff::new(Duration::from_secs(90), Duration::from_secs(30));
        assert_eq!(secs(&mut backoff), 30);
        assert_eq!(secs(&mut backoff), 30);
    }
}
