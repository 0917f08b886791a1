use crate::accel::ops::{window_len, FilterOp};
use crate::pipeline::{Frame, RunResult};

/// Scalar reference: one window gather per pixel with clamped coordinates.
/// Slow and obviously correct; used as the verification oracle.
pub fn reference<Op: FilterOp>(op: &Op, input: &Frame, output: &mut Frame) {
    let r = Op::RADIUS as i64;
    let mut taps = vec![0u8; window_len::<Op>()];

    for y in 0..output.height().min(input.height()) {
        for x in 0..output.width().min(input.width()) {
            let mut k = 0;
            for dy in -r..=r {
                for dx in -r..=r {
                    taps[k] = input.get_clamped(x as i64 + dx, y as i64 + dy);
                    k += 1;
                }
            }
            output.set(x, y, op.apply(&taps));
        }
    }
}

/// CPU variant: pads the input once, then walks rows without bounds clamping.
pub fn run<Op: FilterOp>(op: &Op, input: &Frame, output: &mut Frame) -> RunResult {
    if !input.same_extent(output) {
        return RunResult::BAD_EXTENT;
    }
    if input.data().is_empty() {
        return RunResult::SUCCESS;
    }

    let padded = Padded::new(input, Op::RADIUS);
    let side = 2 * Op::RADIUS + 1;
    let mut taps = vec![0u8; side * side];

    for y in 0..output.height() {
        let row = output.row_mut(y);
        for (x, px) in row.iter_mut().enumerate() {
            padded.gather(x, y, side, &mut taps);
            *px = op.apply(&taps);
        }
    }

    RunResult::SUCCESS
}

/// Copy of a frame with a replicated border of `radius` pixels on every side.
pub(crate) struct Padded {
    stride: usize,
    data: Vec<u8>,
}

impl Padded {
    pub(crate) fn new(frame: &Frame, radius: usize) -> Self {
        let stride = frame.width() + 2 * radius;
        let rows = frame.height() + 2 * radius;
        let r = radius as i64;

        let mut data = Vec::with_capacity(stride * rows);
        for py in 0..rows as i64 {
            for px in 0..stride as i64 {
                data.push(frame.get_clamped(px - r, py - r));
            }
        }

        Self { stride, data }
    }

    /// Padded row `y`, starting at padded column `x`, `len` pixels long.
    pub(crate) fn span(&self, x: usize, y: usize, len: usize) -> &[u8] {
        let start = y * self.stride + x;
        &self.data[start..start + len]
    }

    /// Window of `side` x `side` taps whose top-left corner is padded (x, y),
    /// i.e. centred on output pixel (x, y).
    pub(crate) fn gather(&self, x: usize, y: usize, side: usize, taps: &mut [u8]) {
        for (i, dst) in taps.chunks_exact_mut(side).enumerate() {
            dst.copy_from_slice(self.span(x, y + i, side));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::ops::{Dilate3x3, Gaussian5x5, Median3x3};

    fn test_frame(width: usize, height: usize) -> Frame {
        let mut frame = Frame::new(width, height);
        frame.fill_deterministic(42);
        frame
    }

    #[test]
    fn test_cpu_matches_reference() {
        let input = test_frame(37, 23);
        let mut expected = Frame::new(37, 23);
        let mut actual = Frame::new(37, 23);

        reference(&Gaussian5x5, &input, &mut expected);
        assert!(run(&Gaussian5x5, &input, &mut actual).is_success());
        assert_eq!(expected, actual);

        reference(&Median3x3, &input, &mut expected);
        assert!(run(&Median3x3, &input, &mut actual).is_success());
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_extent_mismatch_is_reported() {
        let input = test_frame(8, 8);
        let mut output = Frame::new(8, 4);
        assert_eq!(run(&Dilate3x3, &input, &mut output), RunResult::BAD_EXTENT);
    }

    #[test]
    fn test_padding_replicates_edges() {
        let mut frame = Frame::new(2, 2);
        frame.set(0, 0, 1);
        frame.set(1, 0, 2);
        frame.set(0, 1, 3);
        frame.set(1, 1, 4);

        let padded = Padded::new(&frame, 1);
        assert_eq!(padded.span(0, 0, 4), &[1, 1, 2, 2]);
        assert_eq!(padded.span(0, 3, 4), &[3, 3, 4, 4]);
    }
}
