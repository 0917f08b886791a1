//! Host emulation of the HVX vector variants.
//!
//! Each output row is processed in blocks of `lanes` pixels. For every tap of
//! the window one contiguous vector is loaded from the padded input (what a
//! `vmem` load does on the DSP), then the lanes are reduced independently.
//! The last block of a row is partial when the width is not a multiple of the
//! vector size.

use crate::accel::cpu::Padded;
use crate::accel::ops::{window_len, FilterOp};
use crate::pipeline::{Frame, RunResult};

/// Pixels per vector in 64-byte mode.
pub const HVX64_LANES: usize = 64;
/// Pixels per vector in 128-byte mode.
pub const HVX128_LANES: usize = 128;

pub fn run<Op: FilterOp>(op: &Op, lanes: usize, input: &Frame, output: &mut Frame) -> RunResult {
    if lanes == 0 {
        return RunResult::BAD_ARGUMENT;
    }
    if !input.same_extent(output) {
        return RunResult::BAD_EXTENT;
    }
    if input.data().is_empty() {
        return RunResult::SUCCESS;
    }

    let padded = Padded::new(input, Op::RADIUS);
    let side = 2 * Op::RADIUS + 1;
    let taps_len = window_len::<Op>();

    // One "register" per tap.
    let mut vectors = vec![0u8; taps_len * lanes];
    let mut taps = vec![0u8; taps_len];

    for y in 0..output.height() {
        let row = output.row_mut(y);
        for (block, out) in row.chunks_mut(lanes).enumerate() {
            let x0 = block * lanes;
            let n = out.len();

            for (t, vector) in vectors.chunks_exact_mut(lanes).enumerate() {
                let (dy, dx) = (t / side, t % side);
                vector[..n].copy_from_slice(padded.span(x0 + dx, y + dy, n));
            }

            for (lane, px) in out.iter_mut().enumerate() {
                for (t, tap) in taps.iter_mut().enumerate() {
                    *tap = vectors[t * lanes + lane];
                }
                *px = op.apply(&taps);
            }
        }
    }

    RunResult::SUCCESS
}
