//! Owned 8-bit single-channel image buffers.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A `width` x `height` 8-bit image stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate a zero-filled frame.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn same_extent(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn get(&self, x: usize, y: usize) -> u8 {
        self.data[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        self.data[y * self.width + x] = value;
    }

    /// Read a pixel with coordinates clamped to the frame edge (replicated border).
    pub fn get_clamped(&self, x: i64, y: i64) -> u8 {
        let cx = x.clamp(0, self.width as i64 - 1) as usize;
        let cy = y.clamp(0, self.height as i64 - 1) as usize;
        self.get(cx, cy)
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Zero every pixel without reallocating.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }

    /// Fill with a pseudo-random pattern that depends only on `seed`.
    pub fn fill_deterministic(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        rng.fill(&mut self.data[..]);
    }
}
