use ndarray::{Array1, ArrayView1, ArrayView2};
use num_complex::Complex64;

pub struct MatrixHelper;

impl MatrixHelper {
    /// Weighted average of the rows of `layers`: `weights . layers / sum(weights)`.
    ///
    /// Callers guarantee one weight per row and a non-zero weight sum.
    pub fn weighted_rows(layers: ArrayView2<Complex64>, weights: ArrayView1<f64>) -> Array1<Complex64> {
        let total: f64 = weights.sum();
        let weights = weights.mapv(|w| Complex64::new(w / total, 0.0));
        weights.dot(&layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn weighted_rows_averages_columns() {
        let layers = Array2::from_shape_fn((2, 3), |(row, col)| {
            Complex64::new((row * 3 + col) as f64, 0.0)
        });
        let averaged = MatrixHelper::weighted_rows(layers.view(), array![1.0, 1.0].view());
        let re: Vec<f64> = averaged.iter().map(|c| c.re).collect();
        assert_eq!(re, vec![1.5, 2.5, 3.5]);
    }

    #[test]
    fn weights_are_normalised() {
        let layers = Array2::from_shape_fn((2, 2), |(row, _)| {
            Complex64::new(if row == 0 { 2.0 } else { 4.0 }, 0.0)
        });
        let averaged = MatrixHelper::weighted_rows(layers.view(), array![3.0, 1.0].view());
        assert!(averaged.iter().all(|c| (c.re - 2.5).abs() < 1e-12));
    }
}
