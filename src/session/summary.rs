//! Aggregate timing statistics over a completed reply log.

use super::store::Exchange;

/// Summary statistics for one finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplySummary {
    /// Number of prompts that received a reply.
    pub answered: usize,
    /// Mean reply latency in seconds, 0.0 when nothing was answered.
    pub average_secs: f64,
    /// Worst reply latency in seconds, 0.0 when nothing was answered.
    pub slowest_secs: f64,
}

impl ReplySummary {
    /// The all-zero summary of an empty log.
    pub fn empty() -> Self {
        Self {
            answered: 0,
            average_secs: 0.0,
            slowest_secs: 0.0,
        }
    }
}

/// Compute summary statistics over a reply log.
///
/// Pure and deterministic; the log is not mutated. Latencies are
/// non-negative by construction since replies are only recorded after
/// their prompt was sent.
pub fn summarize(log: &[Exchange]) -> ReplySummary {
    if log.is_empty() {
        return ReplySummary::empty();
    }

    let mut total = 0.0;
    let mut slowest = 0.0f64;

    for exchange in log {
        let latency = exchange.latency().as_secs_f64();
        total += latency;
        slowest = slowest.max(latency);
    }

    ReplySummary {
        answered: log.len(),
        average_secs: total / log.len() as f64,
        slowest_secs: slowest,
    }
}
