use std::time::Duration;

use hdrhistogram::Histogram;

use crate::dispatch::Completion;
use crate::executor::Outcome;

/// Aggregate view of a run, filled from the completions the dispatcher
/// collects once every execution has finished.
pub struct Statistics {
    expected: u64,
    recorded: u64,
    responded: u64,
    non_success: u64,
    failed: u64,
    bytes: u64,
    histogram: Option<Histogram<u64>>,
}

impl Statistics {
    pub fn new(expected: u64) -> Self {
        let histogram = match Histogram::<u64>::new(3) {
            Ok(histogram) => Some(histogram),
            Err(e) => {
                tracing::warn!("Latency histogram unavailable: {}", e);
                None
            }
        };
        Statistics {
            expected,
            recorded: 0,
            responded: 0,
            non_success: 0,
            failed: 0,
            bytes: 0,
            histogram,
        }
    }

    pub fn record(&mut self, completion: &Completion) {
        self.recorded += 1;
        match completion.outcome {
            Outcome::Responded { status, bytes } => {
                self.responded += 1;
                self.bytes += bytes;
                if !status.is_success() {
                    self.non_success += 1;
                }
                if let Some(histogram) = self.histogram.as_mut() {
                    let micros = u64::try_from(completion.latency.as_micros()).unwrap_or(u64::MAX);
                    histogram.saturating_record(micros);
                }
            }
            Outcome::Failed(_) => self.failed += 1,
        }
    }

    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    pub fn responded(&self) -> u64 {
        self.responded
    }

    pub fn non_success(&self) -> u64 {
        self.non_success
    }

    /// Failed executions, counting any that never reported back.
    pub fn failed(&self) -> u64 {
        self.failed + self.expected.saturating_sub(self.recorded)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn print_stats(&self, elapsed: Duration) {
        let secs = elapsed.as_secs_f64();

        println!("\nStatistics:");
        println!("  Responses: {} ({} non-2xx)", self.responded, self.non_success);
        println!("  Failed: {}", self.failed());
        if secs > 0.0 {
            println!("  Requests/sec: {:.2}", self.expected as f64 / secs);
            println!("  Transfer/sec: {:.2}KB", self.bytes as f64 / secs / 1024.0);
        }

        let histogram = match &self.histogram {
            Some(histogram) if !histogram.is_empty() => histogram,
            _ => return,
        };
        println!("\nLatency:");
        println!("  Avg: {:.2}ms", histogram.mean() / 1000.0);
        println!("  Min: {:.2}ms", histogram.min() as f64 / 1000.0);
        println!("  Max: {:.2}ms", histogram.max() as f64 / 1000.0);
        println!("  P99: {:.2}ms", histogram.value_at_quantile(0.99) as f64 / 1000.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::FailureKind;
    use hyper::StatusCode;

    fn completion(ordinal: u64, outcome: Outcome) -> Completion {
        Completion {
            ordinal,
            outcome,
            latency: Duration::from_millis(ordinal),
        }
    }

    #[test]
    fn tallies_outcomes() {
        let mut stats = Statistics::new(4);
        stats.record(&completion(
            1,
            Outcome::Responded {
                status: StatusCode::OK,
                bytes: 10,
            },
        ));
        stats.record(&completion(
            2,
            Outcome::Responded {
                status: StatusCode::NOT_FOUND,
                bytes: 5,
            },
        ));
        stats.record(&completion(3, Outcome::Failed(FailureKind::Transport)));

        assert_eq!(stats.recorded(), 3);
        assert_eq!(stats.responded(), 2);
        assert_eq!(stats.non_success(), 1);
        assert_eq!(stats.bytes(), 15);
        // Ordinal 4 never reported back.
        assert_eq!(stats.failed(), 2);
    }

    #[test]
    fn empty_run_prints_without_latency() {
        let stats = Statistics::new(0);
        assert_eq!(stats.failed(), 0);
        stats.print_stats(Duration::ZERO);
    }
}
