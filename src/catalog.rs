//! The registered small-filter pipelines.

use crate::accel::ops::{Conv3x3a16, Conv3x3a32, Dilate3x3, FilterOp, Gaussian5x5, Median3x3, Sobel};
use crate::accel::{cpu, hvx};
use crate::pipeline::{Frame, PipelineDescriptor, PipelineError};

/// Kernel names in registration order.
pub const KERNELS: [&str; 6] = [
    "conv3x3a16",
    "dilate3x3",
    "median3x3",
    "gaussian5x5",
    "sobel",
    "conv3x3a32",
];

/// Build every pipeline for a `width` x `height` extent, in registration order.
pub fn default_catalog(width: usize, height: usize) -> Result<Vec<PipelineDescriptor>, PipelineError> {
    Ok(vec![
        stencil_pipeline(Conv3x3a16, width, height)?,
        stencil_pipeline(Dilate3x3, width, height)?,
        stencil_pipeline(Median3x3, width, height)?,
        stencil_pipeline(Gaussian5x5, width, height)?,
        stencil_pipeline(Sobel, width, height)?,
        stencil_pipeline(Conv3x3a32, width, height)?,
    ])
}

/// A pipeline with all three variants of `op` and the scalar reference.
pub fn stencil_pipeline<Op: FilterOp>(
    op: Op,
    width: usize,
    height: usize,
) -> Result<PipelineDescriptor, PipelineError> {
    PipelineDescriptor::builder(op.name(), width, height)
        .hvx64(Box::new(move |input: &Frame, output: &mut Frame| {
            hvx::run(&op, hvx::HVX64_LANES, input, output)
        }))
        .hvx128(Box::new(move |input: &Frame, output: &mut Frame| {
            hvx::run(&op, hvx::HVX128_LANES, input, output)
        }))
        .cpu(Box::new(move |input: &Frame, output: &mut Frame| cpu::run(&op, input, output)))
        .reference(Box::new(move |input: &Frame, output: &mut Frame| {
            cpu::reference(&op, input, output)
        }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::RunMode;

    #[test]
    fn test_registration_order() {
        let catalog = default_catalog(8, 8).unwrap();
        let names: Vec<&str> = catalog.iter().map(|p| p.name()).collect();
        assert_eq!(names, KERNELS);
    }

    #[test]
    fn test_every_variant_verifies() {
        let mut catalog = default_catalog(131, 17).unwrap();
        for pipeline in catalog.iter_mut() {
            assert!(RunMode::ALL.iter().all(|&m| pipeline.supports(m)));
            for mode in RunMode::ALL {
                pipeline.init();
                let status = pipeline.run(mode).unwrap();
                assert!(status.is_success(), "{} {}", pipeline.name(), mode);
                assert!(pipeline.verify(131, 17), "{} {}", pipeline.name(), mode);
            }
        }
    }
}
