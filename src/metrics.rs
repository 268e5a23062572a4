//! Session metrics: latency, token usage and query count

use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Running totals for one chat session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsTracker {
    total_latency: Duration,
    token_usage: u64,
    query_count: u64,
}

impl MetricsTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed query
    pub fn record_query(&mut self, latency: Duration, tokens: u64) {
        self.total_latency += latency;
        self.token_usage += tokens;
        self.query_count += 1;
    }

    pub const fn query_count(&self) -> u64 {
        self.query_count
    }

    pub const fn total_token_usage(&self) -> u64 {
        self.token_usage
    }

    pub const fn total_latency(&self) -> Duration {
        self.total_latency
    }

    /// Mean latency per query; zero before the first query
    pub fn average_latency(&self) -> Duration {
        match u32::try_from(self.query_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total_latency / count,
            Err(_) => Duration::from_secs_f64(
                self.total_latency.as_secs_f64() / self.query_count as f64,
            ),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for MetricsTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metrics Summary:")?;
        writeln!(f, "  Queries Processed: {}", self.query_count)?;
        writeln!(
            f,
            "  Average Latency: {:.2} seconds",
            self.average_latency().as_secs_f64()
        )?;
        write!(f, "  Total Token Usage: {} tokens", self.token_usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tracker() {
        let metrics = MetricsTracker::new();
        assert_eq!(metrics.query_count(), 0);
        assert_eq!(metrics.average_latency(), Duration::ZERO);
    }

    #[test]
    fn test_record_and_average() {
        let mut metrics = MetricsTracker::new();
        metrics.record_query(Duration::from_millis(1000), 300);
        metrics.record_query(Duration::from_millis(3000), 0);

        assert_eq!(metrics.query_count(), 2);
        assert_eq!(metrics.total_token_usage(), 300);
        assert_eq!(metrics.average_latency(), Duration::from_millis(2000));
    }

    #[test]
    fn test_reset() {
        let mut metrics = MetricsTracker::new();
        metrics.record_query(Duration::from_secs(1), 10);
        metrics.reset();
        assert_eq!(metrics, MetricsTracker::default());
    }

    #[test]
    fn test_display() {
        let mut metrics = MetricsTracker::new();
        metrics.record_query(Duration::from_millis(1500), 342);
        assert_eq!(
            metrics.to_string(),
            "Metrics Summary:\n  Queries Processed: 1\n  Average Latency: 1.50 seconds\n  Total Token Usage: 342 tokens"
        );
    }
}
