use crate::generator::profile::GeneratorConfig;
use anyhow::Context;
use fieldcore::interface::{
    AggregateSpec, AggregationMethod, NamedInput, Operation, PipelineRequest, StepSpec,
    TransformSpec,
};
use fieldcore::prelude::PRIMARY_INPUT;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub spec: TransformSpec,
    pub aggregations: Vec<AggregateSpec>,
    /// Reduction applied to the final signal of each frame.
    pub method: AggregationMethod,
    pub include_inputs: bool,
    pub generator: GeneratorConfig,
    /// Synthetic frame count; zero runs a single invocation.
    pub frames: usize,
    /// Upper bound on samples accepted per request.
    pub max_samples: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let spec = default_spec();
        let output = spec.output_name().to_string();
        Self {
            aggregations: vec![
                AggregateSpec::new(output.clone(), AggregationMethod::MeanMagnitude),
                AggregateSpec::new(output, AggregationMethod::Entropy),
            ],
            spec,
            method: AggregationMethod::Entropy,
            include_inputs: false,
            generator: GeneratorConfig::default(),
            frames: 0,
            max_samples: 1 << 20,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(length: usize, frequency: f64, seed: u64, frames: usize) -> Self {
        let defaults = Self::default();
        Self {
            generator: GeneratorConfig {
                length,
                frequency,
                seed,
                ..defaults.generator.clone()
            },
            frames,
            ..defaults
        }
    }

    pub fn request(&self, inputs: Vec<NamedInput>) -> PipelineRequest {
        PipelineRequest {
            inputs,
            spec: self.spec.clone(),
            aggregations: self.aggregations.clone(),
            include_inputs: self.include_inputs,
        }
    }
}

/// Splits a complex field into modulus and angle, rebuilds it, blends the
/// rebuild with the original and takes the magnitude spectrum of the blend.
pub fn default_spec() -> TransformSpec {
    TransformSpec::new()
        .step(StepSpec::new("intensity", Operation::Magnitude))
        .step(StepSpec::new("phase_map", Operation::Phase))
        .step(StepSpec::new("rebuilt", Operation::Polar).with_inputs(["intensity", "phase_map"]))
        .step(
            StepSpec::new("composite", Operation::Compose { weights: None })
                .with_inputs([PRIMARY_INPUT, "rebuilt"]),
        )
        .step(StepSpec::new("spectrum", Operation::Fourier).with_inputs(["composite"]))
        .step(StepSpec::new("resonance", Operation::Magnitude).with_inputs(["spectrum"]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcore::interface::{ConvolveMode, KernelSource};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn config_from_args_sets_generator() {
        let cfg = WorkflowConfig::from_args(64, 3.0, 9, 4);
        assert_eq!(cfg.generator.length, 64);
        assert_eq!(cfg.generator.seed, 9);
        assert_eq!(cfg.frames, 4);
        assert_eq!(cfg.spec.output_name(), "resonance");
    }

    #[test]
    fn default_aggregates_target_final_step() {
        let names: Vec<String> = WorkflowConfig::default()
            .aggregations
            .iter()
            .map(AggregateSpec::output_name)
            .collect();
        assert_eq!(names, vec!["resonance.mean_magnitude", "resonance.entropy"]);
    }

    #[test]
    fn config_load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"spec:\n  - name: smooth\n    op: convolve\n    kernel: [0.25, 0.5, 0.25]\n    mode: valid\naggregations:\n  - source: smooth\n    method: mean_magnitude\nmethod: mean_magnitude\ngenerator:\n  length: 32\n  complex: false\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        let cfg = WorkflowConfig::load(&path).unwrap();

        assert_eq!(cfg.spec.len(), 1);
        assert_eq!(
            cfg.spec.steps[0].op,
            Operation::Convolve {
                kernel: KernelSource::Values(vec![0.25, 0.5, 0.25]),
                mode: ConvolveMode::Valid,
            }
        );
        assert_eq!(cfg.method, AggregationMethod::MeanMagnitude);
        assert_eq!(cfg.generator.length, 32);
        assert!(!cfg.generator.complex);
        assert_eq!(cfg.max_samples, 1 << 20);
    }

    #[test]
    fn bundled_config_parses() {
        let cfg: WorkflowConfig =
            serde_yaml::from_str(include_str!("../../configs/field_chain.yaml")).unwrap();
        assert_eq!(cfg.spec.output_name(), "resonance");
        assert_eq!(cfg.aggregations.len(), 2);
    }

    #[test]
    fn missing_config_reports_path() {
        let err = WorkflowConfig::load("/definitely/not/here.yaml").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.yaml"));
    }
}
