use crate::prelude::{PipelineError, PipelineResult, PRIMARY_INPUT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output length policy for [`Operation::Convolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConvolveMode {
    /// `n + k - 1` samples.
    Full,
    /// `n` samples, centred on the full result.
    #[default]
    Same,
    /// `n - k + 1` samples where the kernel fully overlaps the signal.
    Valid,
}

/// Convolution kernel: literal real taps or the name of another signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KernelSource {
    Signal(String),
    Values(Vec<f64>),
}

fn unit() -> f64 {
    1.0
}

/// Elementary operation applied by one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Magnitude,
    Phase,
    Fourier,
    InverseFourier,
    Convolve {
        kernel: KernelSource,
        #[serde(default)]
        mode: ConvolveMode,
    },
    /// Weighted elementwise average; equal weights when omitted.
    Compose {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        weights: Option<Vec<f64>>,
    },
    Scale {
        factor: f64,
    },
    Multiply,
    /// `amplitude * exp(i * frequency * x)` over a real signal.
    Phasor {
        #[serde(default = "unit")]
        amplitude: f64,
        #[serde(default = "unit")]
        frequency: f64,
    },
    /// Modulus (first input) and angle (second input) to a complex signal.
    Polar,
}

impl Operation {
    pub fn label(&self) -> &'static str {
        match self {
            Operation::Magnitude => "magnitude",
            Operation::Phase => "phase",
            Operation::Fourier => "fourier",
            Operation::InverseFourier => "inverse_fourier",
            Operation::Convolve { .. } => "convolve",
            Operation::Compose { .. } => "compose",
            Operation::Scale { .. } => "scale",
            Operation::Multiply => "multiply",
            Operation::Phasor { .. } => "phasor",
            Operation::Polar => "polar",
        }
    }

    /// Accepted number of inputs as `(min, max)`.
    fn arity(&self) -> (usize, Option<usize>) {
        match self {
            Operation::Compose { .. } => (1, None),
            Operation::Multiply | Operation::Polar => (2, Some(2)),
            _ => (1, Some(1)),
        }
    }

    fn validate_parameters(&self, step: &str, input_count: usize) -> PipelineResult<()> {
        match self {
            Operation::Convolve {
                kernel: KernelSource::Values(values),
                ..
            } => {
                if values.is_empty() {
                    return Err(PipelineError::InvalidSpec(format!(
                        "step `{step}` has an empty convolution kernel"
                    )));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(PipelineError::InvalidSpec(format!(
                        "step `{step}` has a non-finite convolution kernel"
                    )));
                }
            }
            Operation::Compose {
                weights: Some(weights),
            } => {
                if weights.len() != input_count {
                    return Err(PipelineError::ShapeMismatch(format!(
                        "step `{step}` has {} weights for {} inputs",
                        weights.len(),
                        input_count
                    )));
                }
                let total: f64 = weights.iter().sum();
                if weights.iter().any(|w| !w.is_finite()) || !total.is_finite() || total == 0.0 {
                    return Err(PipelineError::InvalidSpec(format!(
                        "step `{step}` weights must be finite with a non-zero sum"
                    )));
                }
            }
            Operation::Scale { factor } if !factor.is_finite() => {
                return Err(PipelineError::InvalidSpec(format!(
                    "step `{step}` scale factor must be finite"
                )));
            }
            Operation::Phasor {
                amplitude,
                frequency,
            } if !amplitude.is_finite() || !frequency.is_finite() => {
                return Err(PipelineError::InvalidSpec(format!(
                    "step `{step}` phasor parameters must be finite"
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// One named step of a [`TransformSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepSpec {
    pub name: String,
    /// Signals this step reads; the primary input when empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(flatten)]
    pub op: Operation,
}

impl StepSpec {
    pub fn new(name: impl Into<String>, op: Operation) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            op,
        }
    }

    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn inputs(&self) -> Vec<&str> {
        if self.inputs.is_empty() {
            vec![PRIMARY_INPUT]
        } else {
            self.inputs.iter().map(String::as_str).collect()
        }
    }

    /// Every signal name the step reads, kernel references included.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps = self.inputs();
        if let Operation::Convolve {
            kernel: KernelSource::Signal(name),
            ..
        } = &self.op
        {
            deps.push(name.as_str());
        }
        deps
    }

    /// Checks arity and parameters without looking at any signal data.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::InvalidSpec("step name must not be empty".into()));
        }
        let count = self.inputs().len();
        let (min, max) = self.op.arity();
        if count < min || max.is_some_and(|max| count > max) {
            let expected = match max {
                Some(max) if max == min => format!("{min}"),
                Some(max) => format!("{min}..={max}"),
                None => format!("at least {min}"),
            };
            return Err(PipelineError::InvalidSpec(format!(
                "step `{}` ({}) takes {} input(s), got {}",
                self.name,
                self.op.label(),
                expected,
                count
            )));
        }
        self.op.validate_parameters(&self.name, count)
    }
}

/// Ordered list of steps; later entries may read earlier ones and vice versa
/// as long as the references stay acyclic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformSpec {
    pub steps: Vec<StepSpec>,
}

impl TransformSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, step: StepSpec) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&StepSpec> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// Name of the final step, or the primary input for an empty spec.
    pub fn output_name(&self) -> &str {
        self.steps
            .last()
            .map(|step| step.name.as_str())
            .unwrap_or(PRIMARY_INPUT)
    }
}

/// Scalar reduction applied by the aggregation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMethod {
    MeanMagnitude,
    Entropy,
}

impl AggregationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationMethod::MeanMagnitude => "mean_magnitude",
            AggregationMethod::Entropy => "entropy",
        }
    }
}

impl fmt::Display for AggregationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean_magnitude" => Ok(AggregationMethod::MeanMagnitude),
            "entropy" => Ok(AggregationMethod::Entropy),
            other => Err(PipelineError::UnsupportedOperation(format!(
                "unknown aggregation method `{other}`"
            ))),
        }
    }
}

/// Reduce the signal `source` with `method`, stored under `name`
/// (`"<source>.<method>"` when unnamed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: String,
    pub method: AggregationMethod,
}

impl AggregateSpec {
    pub fn new(source: impl Into<String>, method: AggregationMethod) -> Self {
        Self {
            name: None,
            source: source.into(),
            method,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn output_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}.{}", self.source, self.method))
    }
}

/// Everything one pipeline invocation needs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineRequest {
    pub inputs: Vec<crate::interface::NamedInput>,
    #[serde(default)]
    pub spec: TransformSpec,
    #[serde(default)]
    pub aggregations: Vec<AggregateSpec>,
    /// Copy the adapted inputs into the record ahead of derived signals.
    #[serde(default)]
    pub include_inputs: bool,
}
