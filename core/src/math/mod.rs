pub mod convolution;
pub mod fft;
pub mod matrix;
pub mod stats;

pub use convolution::ConvolutionHelper;
pub use fft::FftHelper;
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
