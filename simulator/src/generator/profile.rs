use crate::generator::template::{sine_wave, time_vector};
use anyhow::Context;
use fieldcore::interface::{FrameSeries, NamedInput, RawSignal, SampleKind};
use fieldcore::prelude::PRIMARY_INPUT;
use fieldcore::processing::InputAdapter;
use num_complex::Complex64;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for generating synthetic field data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub length: usize,
    /// Cycles over `duration`.
    pub frequency: f64,
    /// Half-width of the uniform jitter added to every component.
    pub noise: f64,
    pub seed: u64,
    /// Emit complex samples; real fields are plain sine waves.
    pub complex: bool,
    pub duration: f64,
    pub description: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            length: 256,
            frequency: 8.0,
            noise: 0.03,
            seed: 0,
            complex: true,
            duration: 1.0,
            description: None,
        }
    }
}

impl GeneratorConfig {
    /// Samples generated for `count` fields of this configuration.
    pub fn sample_count(&self, count: usize) -> anyhow::Result<usize> {
        count
            .checked_mul(self.normalized_length())
            .context("overflow computing generated sample count")
    }

    fn normalized_length(&self) -> usize {
        self.length.max(1)
    }

    fn kind(&self) -> SampleKind {
        if self.complex {
            SampleKind::Complex
        } else {
            SampleKind::Real
        }
    }
}

fn jitter(rng: &mut StdRng, noise: f64) -> f64 {
    if noise > 0.0 {
        rng.gen_range(-noise..noise)
    } else {
        0.0
    }
}

fn build_samples(config: &GeneratorConfig, phase_offset: f64, rng: &mut StdRng) -> Vec<Complex64> {
    let length = config.normalized_length();
    if !config.complex {
        return sine_wave(length, config.frequency)
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                let envelope = 0.2 + 0.8 * (1.0 - i as f64 / length as f64);
                Complex64::new(value * envelope + jitter(rng, config.noise), 0.0)
            })
            .collect();
    }

    time_vector(length, config.duration)
        .into_iter()
        .enumerate()
        .map(|(i, t)| {
            let phase = 2.0 * PI * config.frequency * t / config.duration.max(f64::EPSILON)
                + phase_offset;
            let envelope = 0.2 + 0.8 * (1.0 - i as f64 / length as f64);
            Complex64::from_polar(envelope, phase)
                + Complex64::new(jitter(rng, config.noise), jitter(rng, config.noise))
        })
        .collect()
}

/// One synthetic field bound to the primary input.
pub fn build_inputs(config: &GeneratorConfig) -> anyhow::Result<Vec<NamedInput>> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let samples = build_samples(config, 0.0, &mut rng);
    let data = match config.kind() {
        SampleKind::Real => RawSignal::Real(samples.iter().map(|c| c.re).collect()),
        SampleKind::Complex => RawSignal::Complex(samples),
    };
    // Surface invalid parameters (NaN frequency and the like) before the run.
    InputAdapter::adapt(&data).context("validating synthetic field")?;
    Ok(vec![NamedInput::new(PRIMARY_INPUT, data)])
}

/// `count` fields, each shifted by a quarter radian from the previous one.
pub fn build_frames(config: &GeneratorConfig, count: usize) -> anyhow::Result<FrameSeries> {
    config.sample_count(count)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let rows: Vec<Vec<Complex64>> = (0..count)
        .map(|index| build_samples(config, index as f64 * 0.25, &mut rng))
        .collect();
    InputAdapter::adapt_frame_rows(&rows, config.kind()).context("building synthetic frame series")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_builds_expected_sample_count() {
        let inputs = build_inputs(&GeneratorConfig::default()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, PRIMARY_INPUT);
        match &inputs[0].data {
            RawSignal::Complex(samples) => assert_eq!(samples.len(), 256),
            other => panic!("expected complex samples, got {other:?}"),
        }
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let config = GeneratorConfig {
            length: 32,
            seed: 13,
            ..Default::default()
        };
        assert_eq!(build_inputs(&config).unwrap(), build_inputs(&config).unwrap());
    }

    #[test]
    fn real_fields_have_no_imaginary_part() {
        let config = GeneratorConfig {
            length: 64,
            complex: false,
            noise: 0.0,
            ..Default::default()
        };
        let inputs = build_inputs(&config).unwrap();
        assert!(matches!(&inputs[0].data, RawSignal::Real(values) if values.len() == 64));
    }

    #[test]
    fn frames_share_length() {
        let config = GeneratorConfig {
            length: 16,
            ..Default::default()
        };
        let frames = build_frames(&config, 5).unwrap();
        assert_eq!(frames.frame_count(), 5);
        assert_eq!(frames.frame_len(), 16);
        assert_eq!(frames.kind(), SampleKind::Complex);
    }

    #[test]
    fn zero_frames_are_rejected() {
        assert!(build_frames(&GeneratorConfig::default(), 0).is_err());
    }

    #[test]
    fn sample_count_detects_overflow() {
        let config = GeneratorConfig {
            length: usize::MAX / 4,
            ..Default::default()
        };
        assert_eq!(config.sample_count(1).unwrap(), usize::MAX / 4);
        assert!(config.sample_count(8).is_err());
    }
}
