use num_complex::Complex64;
use rustfft::{num_traits::Zero, Fft, FftPlanner};
use std::sync::Arc;

/// Helper that wraps the `rustfft` planner for a fixed transform length.
pub struct FftHelper {
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
    size: usize,
}

impl FftHelper {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        Self {
            forward,
            inverse,
            size,
        }
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Unnormalised forward DFT; input is zero-padded or truncated to the planned length.
    pub fn forward(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = self.prepare(input);
        self.forward.process(&mut buffer);
        buffer
    }

    /// Inverse DFT scaled by `1/n`, so `inverse(forward(x)) == x`.
    pub fn inverse(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = self.prepare(input);
        self.inverse.process(&mut buffer);
        if self.size > 0 {
            let scale = 1.0 / self.size as f64;
            for value in buffer.iter_mut() {
                *value *= scale;
            }
        }
        buffer
    }

    fn prepare(&self, input: &[Complex64]) -> Vec<Complex64> {
        let mut buffer = input.to_vec();
        buffer.resize(self.size, Complex64::zero());
        buffer
    }
}
