use fieldcore::interface::{FrameSeries, PipelineRequest, RawSignal};
use serde_json::Value;

/// Admission check run before a request reaches the pipeline.
pub trait PolicyGate: Send + Sync {
    fn name(&self) -> &str;

    fn check(&self, request: &PipelineRequest) -> anyhow::Result<()>;

    fn check_frames(&self, _frames: &FrameSeries) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs before synthetic data of `samples` total length is allocated.
    fn check_generation(&self, _samples: usize) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Rejects requests whose total sample count exceeds `max_samples`.
#[derive(Debug, Clone, Copy)]
pub struct SizeLimitGate {
    max_samples: usize,
}

impl SizeLimitGate {
    pub fn new(max_samples: usize) -> Self {
        Self { max_samples }
    }

    fn admit(&self, samples: usize) -> anyhow::Result<()> {
        anyhow::ensure!(
            samples <= self.max_samples,
            "{samples} samples exceed the limit of {}",
            self.max_samples
        );
        Ok(())
    }
}

fn sample_count(raw: &RawSignal) -> usize {
    match raw {
        RawSignal::Real(values) => values.len(),
        RawSignal::Complex(values) => values.len(),
        RawSignal::Json(Value::Array(items)) => items.len(),
        RawSignal::Json(_) => 0,
    }
}

impl PolicyGate for SizeLimitGate {
    fn name(&self) -> &str {
        "size_limit"
    }

    fn check(&self, request: &PipelineRequest) -> anyhow::Result<()> {
        let samples = request
            .inputs
            .iter()
            .map(|input| sample_count(&input.data))
            .sum();
        self.admit(samples)
    }

    fn check_frames(&self, frames: &FrameSeries) -> anyhow::Result<()> {
        self.admit(frames.frame_count().saturating_mul(frames.frame_len()))
    }

    fn check_generation(&self, samples: usize) -> anyhow::Result<()> {
        self.admit(samples)
    }
}
