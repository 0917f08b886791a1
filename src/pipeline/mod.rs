//! Pipeline descriptors: one named kernel, its per-mode variants and buffers.

pub mod frame;

pub use frame::Frame;

use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};

use crate::accel::RunMode;

/// Seed for the input pattern. Fixed so every run verifies the same data.
pub const INPUT_SEED: u64 = 0x5eed_f11e;

/// Status code returned by a single variant invocation. Zero is success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RunResult(pub i32);

impl RunResult {
    pub const SUCCESS: RunResult = RunResult(0);
    /// Input and output extents differ.
    pub const BAD_EXTENT: RunResult = RunResult(-1);
    /// Variant was called with an unusable parameter.
    pub const BAD_ARGUMENT: RunResult = RunResult(-2);
    /// Dispatch itself failed before the variant ran.
    pub const DISPATCH_FAILED: RunResult = RunResult(-3);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One kernel on one hardware target.
pub type VariantFn = Box<dyn Fn(&Frame, &mut Frame) -> RunResult>;

/// Known-correct computation producing the expected output.
pub type ReferenceFn = Box<dyn Fn(&Frame, &mut Frame)>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline {pipeline} has no {mode} variant")]
    VariantMissing { pipeline: String, mode: RunMode },

    #[error("pipeline {pipeline} was run before init")]
    NotInitialized { pipeline: String },

    #[error("pipeline {pipeline} has accelerator variants but no cpu variant or reference")]
    NoReference { pipeline: String },
}

/// Why `verify` failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    Pixel {
        x: usize,
        y: usize,
        expected: u8,
        actual: u8,
    },
    /// Requested extent exceeds the buffers.
    Extent { width: usize, height: usize },
    Uninitialized,
}

struct Buffers {
    input: Frame,
    output: Frame,
    expected: Frame,
}

impl Buffers {
    fn new(width: usize, height: usize) -> Self {
        Self {
            input: Frame::new(width, height),
            output: Frame::new(width, height),
            expected: Frame::new(width, height),
        }
    }
}

/// A named image kernel with up to three hardware variants.
pub struct PipelineDescriptor {
    name: String,
    width: usize,
    height: usize,
    hvx64: Option<VariantFn>,
    hvx128: Option<VariantFn>,
    cpu: Option<VariantFn>,
    reference: Option<ReferenceFn>,
    buffers: Option<Buffers>,
}

impl fmt::Debug for PipelineDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineDescriptor")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hvx64", &self.hvx64.is_some())
            .field("hvx128", &self.hvx128.is_some())
            .field("cpu", &self.cpu.is_some())
            .field("initialized", &self.buffers.is_some())
            .finish()
    }
}

impl PipelineDescriptor {
    pub fn builder(name: impl Into<String>, width: usize, height: usize) -> PipelineBuilder {
        PipelineBuilder {
            name: name.into(),
            width,
            height,
            hvx64: None,
            hvx128: None,
            cpu: None,
            reference: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff at least one variant is present.
    pub fn defined(&self) -> bool {
        self.hvx64.is_some() || self.hvx128.is_some() || self.cpu.is_some()
    }

    pub fn supports(&self, mode: RunMode) -> bool {
        self.variant(mode).is_some()
    }

    fn variant(&self, mode: RunMode) -> Option<&VariantFn> {
        match mode {
            RunMode::Hvx64 => self.hvx64.as_ref(),
            RunMode::Hvx128 => self.hvx128.as_ref(),
            RunMode::Cpu => self.cpu.as_ref(),
        }
    }

    /// Prepare buffers for a timed pass.
    ///
    /// Buffers are allocated on the first call and reused afterwards. Every
    /// call refills the input from the fixed seed, recomputes the expected
    /// output and clears the output buffer.
    pub fn init(&mut self) {
        let (width, height) = (self.width, self.height);
        let buffers = self.buffers.get_or_insert_with(|| {
            debug!(pipeline = %self.name, width, height, "allocating buffers");
            Buffers::new(width, height)
        });

        buffers.input.fill_deterministic(INPUT_SEED);
        buffers.output.clear();
        buffers.expected.clear();

        match (&self.reference, &self.cpu) {
            (Some(reference), _) => reference(&buffers.input, &mut buffers.expected),
            (None, Some(cpu)) => {
                let status = cpu(&buffers.input, &mut buffers.expected);
                if !status.is_success() {
                    warn!(pipeline = %self.name, %status, "cpu variant failed while computing reference");
                }
            }
            (None, None) => {}
        }
    }

    /// Invoke the variant for `mode` over the owned buffers.
    pub fn run(&mut self, mode: RunMode) -> Result<RunResult, PipelineError> {
        let variant = match mode {
            RunMode::Hvx64 => &self.hvx64,
            RunMode::Hvx128 => &self.hvx128,
            RunMode::Cpu => &self.cpu,
        }
        .as_ref()
        .ok_or_else(|| PipelineError::VariantMissing {
            pipeline: self.name.clone(),
            mode,
        })?;

        let buffers = self
            .buffers
            .as_mut()
            .ok_or_else(|| PipelineError::NotInitialized {
                pipeline: self.name.clone(),
            })?;

        Ok(variant(&buffers.input, &mut buffers.output))
    }

    /// Compare the last output against the expected output over `width` x `height`.
    pub fn verify(&self, width: usize, height: usize) -> bool {
        match self.first_mismatch(width, height) {
            None => true,
            Some(Mismatch::Pixel {
                x,
                y,
                expected,
                actual,
            }) => {
                warn!(pipeline = %self.name, x, y, expected, actual, "output mismatch");
                false
            }
            Some(mismatch) => {
                warn!(pipeline = %self.name, ?mismatch, "cannot verify output");
                false
            }
        }
    }

    pub fn first_mismatch(&self, width: usize, height: usize) -> Option<Mismatch> {
        let Some(buffers) = &self.buffers else {
            return Some(Mismatch::Uninitialized);
        };
        if width > self.width || height > self.height {
            return Some(Mismatch::Extent { width, height });
        }

        for y in 0..height {
            let actual = &buffers.output.row(y)[..width];
            let expected = &buffers.expected.row(y)[..width];
            if let Some(x) = actual.iter().zip(expected).position(|(a, e)| a != e) {
                return Some(Mismatch::Pixel {
                    x,
                    y,
                    expected: expected[x],
                    actual: actual[x],
                });
            }
        }
        None
    }
}

pub struct PipelineBuilder {
    name: String,
    width: usize,
    height: usize,
    hvx64: Option<VariantFn>,
    hvx128: Option<VariantFn>,
    cpu: Option<VariantFn>,
    reference: Option<ReferenceFn>,
}

impl PipelineBuilder {
    pub fn hvx64(mut self, f: VariantFn) -> Self {
        self.hvx64 = Some(f);
        self
    }

    pub fn hvx128(mut self, f: VariantFn) -> Self {
        self.hvx128 = Some(f);
        self
    }

    pub fn cpu(mut self, f: VariantFn) -> Self {
        self.cpu = Some(f);
        self
    }

    /// Without a reference the cpu variant's output is trusted instead.
    pub fn reference(mut self, f: ReferenceFn) -> Self {
        self.reference = Some(f);
        self
    }

    pub fn build(self) -> Result<PipelineDescriptor, PipelineError> {
        let accelerated = self.hvx64.is_some() || self.hvx128.is_some();
        if accelerated && self.cpu.is_none() && self.reference.is_none() {
            return Err(PipelineError::NoReference {
                pipeline: self.name,
            });
        }

        Ok(PipelineDescriptor {
            name: self.name,
            width: self.width,
            height: self.height,
            hvx64: self.hvx64,
            hvx128: self.hvx128,
            cpu: self.cpu,
            reference: self.reference,
            buffers: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invert(input: &Frame, output: &mut Frame) -> RunResult {
        for y in 0..input.height() {
            for x in 0..input.width() {
                output.set(x, y, 255 - input.get(x, y));
            }
        }
        RunResult::SUCCESS
    }

    fn invert_pipeline() -> PipelineDescriptor {
        PipelineDescriptor::builder("invert", 16, 8)
            .cpu(Box::new(invert))
            .reference(Box::new(|i: &Frame, o: &mut Frame| {
                invert(i, o);
            }))
            .build()
            .unwrap()
    }

    #[test]
    fn test_defined_requires_a_variant() {
        let empty = PipelineDescriptor::builder("empty", 4, 4).build().unwrap();
        assert!(!empty.defined());
        assert!(!RunMode::ALL.iter().any(|&m| empty.supports(m)));

        let p = invert_pipeline();
        assert!(p.defined());
        assert!(p.supports(RunMode::Cpu));
        assert!(!p.supports(RunMode::Hvx64));
    }

    #[test]
    fn test_init_run_verify_is_repeatable() {
        let mut p = invert_pipeline();
        for _ in 0..3 {
            p.init();
            assert_eq!(p.run(RunMode::Cpu).unwrap(), RunResult::SUCCESS);
            assert!(p.verify(16, 8));
        }
    }

    #[test]
    fn test_verify_fails_before_run() {
        let mut p = invert_pipeline();
        p.init();
        // Output was cleared, expected is 255 - input.
        assert!(!p.verify(16, 8));
    }

    #[test]
    fn test_run_missing_variant_is_error() {
        let mut p = invert_pipeline();
        p.init();
        let err = p.run(RunMode::Hvx128).unwrap_err();
        assert!(matches!(err, PipelineError::VariantMissing { mode: RunMode::Hvx128, .. }));
    }

    #[test]
    fn test_run_before_init_is_error() {
        let mut p = invert_pipeline();
        assert!(matches!(
            p.run(RunMode::Cpu),
            Err(PipelineError::NotInitialized { .. })
        ));
        assert_eq!(p.first_mismatch(16, 8), Some(Mismatch::Uninitialized));
    }

    #[test]
    fn test_wrong_pixel_is_located() {
        let mut p = PipelineDescriptor::builder("broken", 16, 8)
            .cpu(Box::new(|i: &Frame, o: &mut Frame| {
                let status = invert(i, o);
                o.set(5, 3, o.get(5, 3).wrapping_add(1));
                status
            }))
            .reference(Box::new(|i: &Frame, o: &mut Frame| {
                invert(i, o);
            }))
            .build()
            .unwrap();

        p.init();
        p.run(RunMode::Cpu).unwrap();
        assert!(!p.verify(16, 8));
        assert!(matches!(
            p.first_mismatch(16, 8),
            Some(Mismatch::Pixel { x: 5, y: 3, .. })
        ));
        // A smaller extent that excludes the bad pixel passes.
        assert!(p.verify(16, 3));
    }

    #[test]
    fn test_verify_rejects_oversized_extent() {
        let mut p = invert_pipeline();
        p.init();
        p.run(RunMode::Cpu).unwrap();
        assert_eq!(
            p.first_mismatch(32, 8),
            Some(Mismatch::Extent { width: 32, height: 8 })
        );
    }

    #[test]
    fn test_cpu_variant_serves_as_reference() {
        let mut p = PipelineDescriptor::builder("invert", 16, 8)
            .cpu(Box::new(invert))
            .hvx64(Box::new(invert))
            .build()
            .unwrap();
        p.init();
        p.run(RunMode::Hvx64).unwrap();
        assert!(p.verify(16, 8));
    }

    #[test]
    fn test_accelerated_only_needs_reference() {
        let result = PipelineDescriptor::builder("hvx-only", 4, 4)
            .hvx128(Box::new(invert))
            .build();
        assert!(matches!(result, Err(PipelineError::NoReference { .. })));
    }
}
