use crate::interface::ConvolveMode;
use crate::prelude::{PipelineError, PipelineResult};
use ndarray::{s, Array1, ArrayView1};
use num_complex::Complex64;
use rustfft::num_traits::Zero;

pub struct ConvolutionHelper;

impl ConvolutionHelper {
    /// Direct-form discrete convolution of `signal` with `kernel`.
    ///
    /// The kernel may not be longer than the signal in any mode. `Same`
    /// keeps the centred window of the full result, matching the usual
    /// numeric-library convention of offset `(k - 1) / 2`.
    pub fn convolve(
        signal: ArrayView1<Complex64>,
        kernel: ArrayView1<Complex64>,
        mode: ConvolveMode,
    ) -> PipelineResult<Array1<Complex64>> {
        let n = signal.len();
        let k = kernel.len();
        if n == 0 || k == 0 {
            return Err(PipelineError::InvalidInput(
                "convolution operands must be non-empty".into(),
            ));
        }
        if k > n {
            return Err(PipelineError::ShapeMismatch(format!(
                "kernel length {k} exceeds signal length {n}"
            )));
        }

        let mut full = Array1::from_elem(n + k - 1, Complex64::zero());
        for (i, &x) in signal.iter().enumerate() {
            for (j, &h) in kernel.iter().enumerate() {
                full[i + j] += x * h;
            }
        }

        let window = match mode {
            ConvolveMode::Full => return Ok(full),
            ConvolveMode::Same => {
                let offset = (k - 1) / 2;
                offset..offset + n
            }
            ConvolveMode::Valid => (k - 1)..n,
        };
        Ok(full.slice(s![window]).to_owned())
    }
}
