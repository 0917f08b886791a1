//! small-filters -- benchmark harness for small image filters on HVX and CPU.
//!
//! Each registered pipeline carries up to three variants (HVX 64-byte,
//! HVX 128-byte, CPU). The runner times every variant with the accelerator
//! held in turbo and verifies its output against a reference before moving on.

pub mod accel;
pub mod bench;
pub mod catalog;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod runner;

pub use accel::RunMode;
pub use pipeline::{Frame, PipelineDescriptor, RunResult};
pub use runner::{Orchestrator, RunError, RunSettings};
