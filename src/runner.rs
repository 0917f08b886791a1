//! Orchestration loop over (mode x pipeline).
//!
//! For every selected mode, each registered pipeline that has a variant for
//! that mode is initialized, timed with the accelerator held in turbo, and
//! verified. A verification failure stops the run immediately.

use std::io::{self, Write};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::accel::{PowerController, PowerGuard, RunMode};
use crate::bench::{self, DEFAULT_ITERATIONS, DEFAULT_WARMUP};
use crate::pipeline::{PipelineDescriptor, RunResult};
use crate::report::{format_done_line, BenchRecord, BenchReport};

/// Default processing extent.
pub const DEFAULT_WIDTH: usize = 1024;
pub const DEFAULT_HEIGHT: usize = 1024;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("verification failed for {pipeline} {}", .mode.label())]
    VerificationFailed { pipeline: String, mode: RunMode },

    #[error("nothing to run: zero timed and zero warm-up trials")]
    NoTrials,

    #[error("failed to write progress output: {0}")]
    Io(#[from] io::Error),
}

/// What to run and how often.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    pub modes: Vec<RunMode>,
    pub iterations: usize,
    /// Fixed at [`DEFAULT_WARMUP`]; not read from config files.
    #[serde(skip_deserializing)]
    pub warmup: usize,
    pub width: usize,
    pub height: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            modes: RunMode::ALL.to_vec(),
            iterations: DEFAULT_ITERATIONS,
            warmup: DEFAULT_WARMUP,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Drives the registered pipelines; owns them and the power controller for
/// the duration of the run.
pub struct Orchestrator<P: PowerController> {
    pipelines: Vec<PipelineDescriptor>,
    power: P,
    settings: RunSettings,
}

impl<P: PowerController> Orchestrator<P> {
    pub fn new(pipelines: Vec<PipelineDescriptor>, power: P, settings: RunSettings) -> Self {
        Self {
            pipelines,
            power,
            settings,
        }
    }

    pub fn into_power(self) -> P {
        self.power
    }

    /// Visit every (mode, pipeline) pair, writing progress lines to `out`.
    ///
    /// Returns the timings of every verified pass, or the first
    /// verification failure.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<BenchReport, RunError> {
        let settings = &self.settings;
        let mut records = Vec::new();

        // Verifying an output no variant ever wrote would fail spuriously.
        if settings.iterations + settings.warmup == 0 {
            return Err(RunError::NoTrials);
        }

        info!(
            modes = ?settings.modes,
            pipelines = self.pipelines.len(),
            iterations = settings.iterations,
            warmup = settings.warmup,
            "starting benchmark run"
        );

        for &mode in &settings.modes {
            debug!(%mode, vector_bytes = ?mode.vector_bytes(), "selecting mode");
            for pipeline in self.pipelines.iter_mut() {
                if !pipeline.supports(mode) {
                    debug!(pipeline = %pipeline.name(), %mode, "no variant for mode, skipping");
                    continue;
                }

                pipeline.init();
                writeln!(out, "Running {}...", pipeline.name())?;

                let record = {
                    let _power = PowerGuard::acquire(&mut self.power);

                    let mut write_err = None;
                    let timing = bench::measure_with(
                        settings.iterations,
                        settings.warmup,
                        || match pipeline.run(mode) {
                            Ok(status) => status,
                            Err(e) => {
                                error!(error = %e, "dispatch failed");
                                RunResult::DISPATCH_FAILED
                            }
                        },
                        |status| {
                            if write_err.is_none() {
                                write_err = writeln!(out, "pipeline failed! {}", status).err();
                            }
                        },
                    );
                    if let Some(e) = write_err {
                        return Err(e.into());
                    }

                    let record = BenchRecord::new(pipeline.name(), mode, &timing);
                    writeln!(out, "{}", format_done_line(&record))?;
                    record
                };

                if !pipeline.verify(settings.width, settings.height) {
                    error!(pipeline = %pipeline.name(), %mode, "verification failed");
                    out.flush()?;
                    return Err(RunError::VerificationFailed {
                        pipeline: pipeline.name().to_string(),
                        mode,
                    });
                }

                info!(
                    pipeline = %record.pipeline,
                    %mode,
                    best_s = record.best_seconds,
                    failed_trials = record.failed_trials,
                    "pipeline verified"
                );
                records.push(record);
            }
        }

        writeln!(out, "Success!")?;
        out.flush()?;

        Ok(BenchReport {
            generated_at: Utc::now(),
            width: settings.width,
            height: settings.height,
            iterations: settings.iterations,
            warmup: settings.warmup,
            modes: settings.modes.clone(),
            records,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::HostPower;
    use crate::catalog;

    fn small_settings(modes: Vec<RunMode>) -> RunSettings {
        RunSettings {
            modes,
            iterations: 1,
            warmup: 0,
            width: 40,
            height: 12,
        }
    }

    #[test]
    fn test_defaults() {
        let settings = RunSettings::default();
        assert_eq!(settings.modes, RunMode::ALL);
        assert_eq!(settings.iterations, 10);
        assert_eq!(settings.warmup, 10);
        assert_eq!((settings.width, settings.height), (1024, 1024));
    }

    #[test]
    fn test_cpu_run_prints_progress() {
        let pipelines = catalog::default_catalog(40, 12).unwrap();
        let mut orchestrator =
            Orchestrator::new(pipelines, HostPower::default(), small_settings(vec![RunMode::Cpu]));

        let mut out = Vec::new();
        let report = orchestrator.run(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(report.records.len(), catalog::KERNELS.len());
        assert!(text.starts_with("Running conv3x3a16...\n"));
        assert!(text.contains("Done, time (sobel): "));
        assert!(text.ends_with("Success!\n"));
        assert!(!text.contains("byte mode"));

        let power = orchestrator.into_power();
        assert!(!power.is_on());
        assert_eq!(power.power_cycles(), catalog::KERNELS.len() as u64);
    }

    #[test]
    fn test_no_trials_is_rejected() {
        let pipelines = catalog::default_catalog(40, 12).unwrap();
        let mut settings = small_settings(vec![RunMode::Cpu]);
        settings.iterations = 0;
        let mut orchestrator = Orchestrator::new(pipelines, HostPower::default(), settings);

        let mut out = Vec::new();
        assert!(matches!(orchestrator.run(&mut out), Err(RunError::NoTrials)));
        assert!(out.is_empty());
        assert_eq!(orchestrator.into_power().power_cycles(), 0);
    }

    #[test]
    fn test_borrowed_power_controller() {
        let mut power = HostPower::default();
        let pipelines = catalog::default_catalog(40, 12).unwrap();
        let mut orchestrator =
            Orchestrator::new(pipelines, &mut power, small_settings(RunMode::ALL.to_vec()));
        let report = orchestrator.run(&mut io::sink()).unwrap();

        assert_eq!(report.records.len(), 3 * catalog::KERNELS.len());
        assert_eq!(report.records_for(RunMode::Hvx64).count(), catalog::KERNELS.len());
        assert_eq!(power.power_cycles(), 18);
    }
}
