use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, Notify, Semaphore};

use crate::executor::{Execute, Outcome};
use crate::rate::RateGate;
use crate::stats::Statistics;

/// Counts launched executions that have not finished yet.
#[derive(Debug, Default)]
pub struct Outstanding {
    count: AtomicUsize,
    drained: Notify,
}

/// Held by one execution; dropping it marks that execution complete.
#[derive(Debug)]
pub struct CompletionGuard {
    outstanding: Arc<Outstanding>,
}

impl Outstanding {
    pub fn new() -> Arc<Self> {
        Arc::new(Outstanding::default())
    }

    /// Must be called before the execution is launched.
    pub fn register(self: &Arc<Self>) -> CompletionGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        CompletionGuard {
            outstanding: Arc::clone(self),
        }
    }

    pub fn pending(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Returns once every registered guard has been dropped.
    pub async fn wait(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register interest before checking, so a decrement that lands in
            // between still wakes us.
            notified.as_mut().enable();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if self.outstanding.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.outstanding.drained.notify_waiters();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub ordinal: u64,
    pub outcome: Outcome,
    pub latency: Duration,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub total: u64,
    pub per_second: u32,
    pub max_in_flight: Option<NonZeroUsize>,
}

/// What a finished run looked like.
pub struct RunReport {
    pub total: u64,
    pub per_second: u32,
    pub started: Instant,
    pub finished: Instant,
    pub stats: Statistics,
}

impl RunReport {
    pub fn elapsed(&self) -> Duration {
        self.finished.duration_since(self.started)
    }
}

/// Launches `options.total` executions in ordinal order, paced by the rate
/// gate, and waits for every one of them to finish.
pub async fn dispatch<E: Execute>(executor: Arc<E>, options: DispatchOptions) -> RunReport {
    let mut gate = RateGate::new(options.per_second);
    let in_flight = options
        .max_in_flight
        .map(|limit| Arc::new(Semaphore::new(limit.get())));
    let outstanding = Outstanding::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();

    let started = Instant::now();

    for ordinal in 1..=options.total {
        gate.acquire().await;

        // The semaphore is never closed, so acquiring only fails in theory.
        let permit = match &in_flight {
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        };

        let guard = outstanding.register();
        let executor = Arc::clone(&executor);
        let tx = tx.clone();
        tokio::spawn(async move {
            let _guard = guard;
            let _permit = permit;
            let launched = Instant::now();
            let outcome = executor.execute(ordinal).await;
            let completion = Completion {
                ordinal,
                outcome,
                latency: launched.elapsed(),
            };
            if tx.send(completion).is_err() {
                tracing::debug!("[Request {}] completion dropped, receiver closed", ordinal);
            }
        });
    }
    drop(tx);

    outstanding.wait().await;
    let finished = Instant::now();

    let mut stats = Statistics::new(options.total);
    while let Ok(completion) = rx.try_recv() {
        stats.record(&completion);
    }

    RunReport {
        total: options.total,
        per_second: options.per_second,
        started,
        finished,
        stats,
    }
}
