//! Per-pixel math for the small filter catalog.
//!
//! Every op is an 8-bit stencil: it sees a square window of
//! `(2 * RADIUS + 1)^2` taps in row-major order and produces one pixel.

/// Trait every stencil op implements.
/// The reference, CPU and HVX variants all drive the same `apply`.
pub trait FilterOp: Copy + Send + Sync + 'static {
    /// Window half-width.
    const RADIUS: usize;

    fn name(&self) -> &'static str;

    fn apply(&self, taps: &[u8]) -> u8;
}

/// Number of taps in the window of `Op`.
pub fn window_len<Op: FilterOp>() -> usize {
    let side = 2 * Op::RADIUS + 1;
    side * side
}

const CONV_MASK: [i8; 9] = [1, -4, 7, 2, -5, 8, 3, -6, 9];

/// 3x3 convolution accumulating in 16 bits.
#[derive(Debug, Clone, Copy)]
pub struct Conv3x3a16;

impl FilterOp for Conv3x3a16 {
    const RADIUS: usize = 1;

    fn name(&self) -> &'static str {
        "conv3x3a16"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        let sum = taps
            .iter()
            .zip(CONV_MASK)
            .fold(0i16, |acc, (&p, m)| acc.wrapping_add(p as i16 * m as i16));
        (sum >> 4).clamp(0, 255) as u8
    }
}

/// 3x3 convolution accumulating in 32 bits.
#[derive(Debug, Clone, Copy)]
pub struct Conv3x3a32;

impl FilterOp for Conv3x3a32 {
    const RADIUS: usize = 1;

    fn name(&self) -> &'static str {
        "conv3x3a32"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        let sum: i32 = taps
            .iter()
            .zip(CONV_MASK)
            .map(|(&p, m)| p as i32 * m as i32)
            .sum();
        (sum >> 4).clamp(0, 255) as u8
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Dilate3x3;

impl FilterOp for Dilate3x3 {
    const RADIUS: usize = 1;

    fn name(&self) -> &'static str {
        "dilate3x3"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        taps.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Median3x3;

impl FilterOp for Median3x3 {
    const RADIUS: usize = 1;

    fn name(&self) -> &'static str {
        "median3x3"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        let mut window = [0u8; 9];
        window.copy_from_slice(taps);
        window.sort_unstable();
        window[4]
    }
}

const GAUSS_WEIGHTS: [u32; 5] = [1, 4, 6, 4, 1];

/// Separable 5x5 binomial blur, weights sum to 256.
#[derive(Debug, Clone, Copy)]
pub struct Gaussian5x5;

impl FilterOp for Gaussian5x5 {
    const RADIUS: usize = 2;

    fn name(&self) -> &'static str {
        "gaussian5x5"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        let mut sum = 0u32;
        for (row, wy) in GAUSS_WEIGHTS.iter().enumerate() {
            for (col, wx) in GAUSS_WEIGHTS.iter().enumerate() {
                sum += taps[row * 5 + col] as u32 * wy * wx;
            }
        }
        ((sum + 128) >> 8) as u8
    }
}

/// Gradient magnitude, `|gx| + |gy|` saturated to 255.
#[derive(Debug, Clone, Copy)]
pub struct Sobel;

impl FilterOp for Sobel {
    const RADIUS: usize = 1;

    fn name(&self) -> &'static str {
        "sobel"
    }

    fn apply(&self, taps: &[u8]) -> u8 {
        let t = |i: usize| taps[i] as i32;
        let gx = (t(2) + 2 * t(5) + t(8)) - (t(0) + 2 * t(3) + t(6));
        let gy = (t(6) + 2 * t(7) + t(8)) - (t(0) + 2 * t(1) + t(2));
        (gx.abs() + gy.abs()).min(255) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_window_behaviour() {
        let flat = [100u8; 9];
        assert_eq!(Dilate3x3.apply(&flat), 100);
        assert_eq!(Median3x3.apply(&flat), 100);
        assert_eq!(Sobel.apply(&flat), 0);
        // Mask sums to 15, so 100 * 15 >> 4 = 93.
        assert_eq!(Conv3x3a16.apply(&flat), 93);
        assert_eq!(Conv3x3a32.apply(&flat), 93);
        assert_eq!(Gaussian5x5.apply(&[100u8; 25]), 100);
    }

    #[test]
    fn test_median_picks_middle_value() {
        let taps = [9, 1, 8, 2, 7, 3, 6, 4, 5];
        assert_eq!(Median3x3.apply(&taps), 5);
    }

    #[test]
    fn test_sobel_saturates() {
        let edge = [0, 0, 255, 0, 0, 255, 0, 0, 255];
        assert_eq!(Sobel.apply(&edge), 255);
    }

    #[test]
    fn test_conv_clamps_negative_sums() {
        // Only the negative mask taps are lit.
        let taps = [0, 255, 0, 0, 255, 0, 0, 255, 0];
        assert_eq!(Conv3x3a16.apply(&taps), 0);
        assert_eq!(Conv3x3a32.apply(&taps), 0);
    }

    #[test]
    fn test_window_len() {
        assert_eq!(window_len::<Sobel>(), 9);
        assert_eq!(window_len::<Gaussian5x5>(), 25);
    }
}
