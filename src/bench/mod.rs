//! Timing harness: untimed warm-up trials, then best-of-N timed trials.

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::pipeline::RunResult;

/// Warm-up trials run before timing starts.
pub const DEFAULT_WARMUP: usize = 10;
/// Timed trials when `-n` is not given.
pub const DEFAULT_ITERATIONS: usize = 10;

/// Per-trial durations of one measurement.
#[derive(Debug, Clone, Default)]
pub struct Timing {
    pub samples: Vec<Duration>,
    /// Trials (warm-up included) that returned a non-zero status.
    pub failures: usize,
}

impl Timing {
    /// Fastest timed trial; `None` when nothing was timed.
    pub fn best(&self) -> Option<Duration> {
        self.samples.iter().min().copied()
    }

    /// Best time in seconds, 0.0 when nothing was timed.
    pub fn seconds(&self) -> f64 {
        self.best().map(|d| d.as_secs_f64()).unwrap_or(0.0)
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().sum();
        Some(total / self.samples.len() as u32)
    }

    pub fn trials(&self) -> usize {
        self.samples.len()
    }
}

/// Call `f` `warmup` times untimed, then `timed` times timed, strictly in
/// sequence. A non-zero status is logged and counted but does not stop
/// the measurement.
pub fn measure<F>(timed: usize, warmup: usize, f: F) -> Timing
where
    F: FnMut() -> RunResult,
{
    measure_with(timed, warmup, f, |_| {})
}

/// Like [`measure`], also handing every non-zero status to `on_failure`
/// once the trial's clock has stopped.
pub fn measure_with<F, G>(timed: usize, warmup: usize, mut f: F, mut on_failure: G) -> Timing
where
    F: FnMut() -> RunResult,
    G: FnMut(RunResult),
{
    let mut timing = Timing {
        samples: Vec::with_capacity(timed),
        failures: 0,
    };

    for _ in 0..warmup {
        let status = f();
        record_status(&mut timing, status, &mut on_failure);
    }

    for trial in 0..timed {
        let start = Instant::now();
        let status = f();
        let elapsed = start.elapsed();
        trace!(trial, elapsed_us = elapsed.as_micros() as u64, "timed trial");
        timing.samples.push(elapsed);
        record_status(&mut timing, status, &mut on_failure);
    }

    timing
}

fn record_status<G: FnMut(RunResult)>(timing: &mut Timing, status: RunResult, on_failure: &mut G) {
    if !status.is_success() {
        warn!(%status, "pipeline failed!");
        timing.failures += 1;
        on_failure(status);
    }
}
