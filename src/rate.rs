use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

/// Releases at most one permit per `1s / per_second`. With no rate
/// configured `acquire` returns immediately.
pub struct RateGate {
    ticker: Option<Interval>,
}

impl RateGate {
    pub fn new(per_second: u32) -> Self {
        if per_second == 0 {
            return RateGate { ticker: None };
        }

        let period = (Duration::from_secs(1) / per_second).max(Duration::from_nanos(1));
        let mut ticker = interval(period);
        // A late consumer gets one tick straight away, never a backlog.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        RateGate {
            ticker: Some(ticker),
        }
    }

    pub fn unlimited() -> Self {
        RateGate { ticker: None }
    }

    pub fn is_limited(&self) -> bool {
        self.ticker.is_some()
    }

    /// Waits for the next permit. The first permit is granted immediately.
    pub async fn acquire(&mut self) {
        if let Some(ticker) = self.ticker.as_mut() {
            ticker.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn unlimited_gate_never_blocks() {
        let mut gate = RateGate::unlimited();
        assert!(!gate.is_limited());
        let started = Instant::now();
        for _ in 0..1000 {
            gate.acquire().await;
        }
        // 1000 permits at even 1000/s would need ~1s.
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn zero_rate_is_unlimited() {
        assert!(!RateGate::new(0).is_limited());
        assert!(RateGate::new(1).is_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn limited_gate_spaces_permits() {
        let mut gate = RateGate::new(10);
        let started = tokio::time::Instant::now();
        for _ in 0..11 {
            gate.acquire().await;
        }
        // First permit is free, the other ten take a tick each.
        assert!(started.elapsed() >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_gate_does_not_bank_a_burst() {
        let mut gate = RateGate::new(10);
        gate.acquire().await;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let started = tokio::time::Instant::now();
        for _ in 0..5 {
            gate.acquire().await;
        }
        // One pending tick at most, so four of the five still wait.
        assert!(started.elapsed() >= Duration::from_millis(300));
    }
}
