use crate::prelude::ENTROPY_EPSILON;
use ndarray::ArrayView1;
use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    pub fn rms(samples: ArrayView1<Complex64>) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples.iter().map(|c| c.norm_sqr()).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    /// Arithmetic mean of `|x|`; `None` for an empty view.
    pub fn mean_magnitude(samples: ArrayView1<Complex64>) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let total: f64 = samples.iter().map(|c| c.norm()).sum();
        Some(total / samples.len() as f64)
    }

    /// `-sum(|x| * ln(|x| + eps))`; `None` for an empty view.
    pub fn entropy(samples: ArrayView1<Complex64>) -> Option<f64> {
        if samples.is_empty() {
            return None;
        }
        let sum: f64 = samples
            .iter()
            .map(|c| {
                let magnitude = c.norm();
                magnitude * (magnitude + ENTROPY_EPSILON).ln()
            })
            .sum();
        Some(-sum)
    }
}
