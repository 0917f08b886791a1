//! Run modes and accelerator plumbing -- HVX 64/128 byte vector modes or CPU.
//!
//! The Hexagon HVX coprocessor runs in one of two vector widths. Each kernel
//! may provide a variant for either width plus a general-purpose CPU variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cpu;
pub mod hvx;
pub mod ops;
pub mod power;

pub use power::{HostPower, PerformanceMode, PowerController, PowerError, PowerGuard};

/// Which variant family a pass of the benchmark exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// HVX with 64-byte vectors
    Hvx64,
    /// HVX with 128-byte vectors
    Hvx128,
    /// General-purpose CPU
    Cpu,
}

#[derive(Debug, Error)]
#[error("unknown run mode '{0}' (expected hvx64, hvx128 or cpu)")]
pub struct ParseModeError(pub String);

impl RunMode {
    /// Default pass order when no mode is selected.
    pub const ALL: [RunMode; 3] = [RunMode::Hvx64, RunMode::Hvx128, RunMode::Cpu];

    /// Vector width in bytes, `None` for the CPU.
    pub fn vector_bytes(self) -> Option<usize> {
        match self {
            RunMode::Hvx64 => Some(hvx::HVX64_LANES),
            RunMode::Hvx128 => Some(hvx::HVX128_LANES),
            RunMode::Cpu => None,
        }
    }

    /// Suffix used on progress lines.
    pub fn label(self) -> &'static str {
        match self {
            RunMode::Hvx64 => "(64 byte mode)",
            RunMode::Hvx128 => "(128 byte mode)",
            RunMode::Cpu => "(cpu)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Hvx64 => "hvx64",
            RunMode::Hvx128 => "hvx128",
            RunMode::Cpu => "cpu",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hvx64" => Ok(RunMode::Hvx64),
            "hvx128" => Ok(RunMode::Hvx128),
            "cpu" => Ok(RunMode::Cpu),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}
