//! Benchmark result formatting and JSON export.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::accel::RunMode;
use crate::bench::Timing;

/// Outcome of one (mode, pipeline) pass.
#[derive(Debug, Clone, Serialize)]
pub struct BenchRecord {
    pub pipeline: String,
    pub mode: RunMode,
    pub best_seconds: f64,
    pub mean_seconds: f64,
    pub trials: usize,
    pub failed_trials: usize,
}

impl BenchRecord {
    pub fn new(pipeline: &str, mode: RunMode, timing: &Timing) -> Self {
        Self {
            pipeline: pipeline.to_string(),
            mode,
            best_seconds: timing.seconds(),
            mean_seconds: timing.mean().map(|d| d.as_secs_f64()).unwrap_or(0.0),
            trials: timing.trials(),
            failed_trials: timing.failures,
        }
    }
}

/// Every verified pass of a run.
#[derive(Debug, Clone, Serialize)]
pub struct BenchReport {
    pub generated_at: DateTime<Utc>,
    pub width: usize,
    pub height: usize,
    pub iterations: usize,
    pub warmup: usize,
    pub modes: Vec<RunMode>,
    pub records: Vec<BenchRecord>,
}

impl BenchReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn records_for(&self, mode: RunMode) -> impl Iterator<Item = &BenchRecord> {
        self.records.iter().filter(move |r| r.mode == mode)
    }
}

/// Progress line printed once a pipeline has been timed.
pub fn format_done_line(record: &BenchRecord) -> String {
    format!(
        "Done, time ({}): {} s {}",
        record.pipeline,
        format_seconds(record.best_seconds),
        record.mode.label()
    )
}

/// Six significant digits, like C's `%g`.
pub fn format_seconds(seconds: f64) -> String {
    if seconds == 0.0 {
        return "0".to_string();
    }

    // Rounding to six digits can carry into the next decade (999999.5 -> 1e+06),
    // so take the exponent after rounding.
    let sci = format!("{:.5e}", seconds);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };

    if !(-4..6).contains(&exp) {
        let sign = if exp < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs());
    }

    let decimals = (5 - exp) as usize;
    trim_fraction(&format!("{:.*}", decimals, seconds)).to_string()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
