use std::f64::consts::PI;

/// Sine waveform with `frequency` cycles over `length` samples.
pub fn sine_wave(length: usize, frequency: f64) -> Vec<f64> {
    (0..length)
        .map(|i| ((i as f64 * frequency) / length as f64 * 2.0 * PI).sin())
        .collect()
}

/// `length` evenly spaced sample times covering `[0, duration)`.
pub fn time_vector(length: usize, duration: f64) -> Vec<f64> {
    if length == 0 {
        return Vec::new();
    }
    let step = duration / length as f64;
    (0..length).map(|i| i as f64 * step).collect()
}
