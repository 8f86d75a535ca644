pub use crate::interface::{
    AggregateSpec, AggregationMethod, Artifact, ConvolveMode, FrameSeries, KernelSource,
    NamedInput, Operation, PipelineRequest, RawSignal, ResultRecord, SampleKind, Signal,
    SignalSet, StepSpec, TransformSpec,
};

/// Name bound to the caller's array when a pipeline is invoked with a single input.
pub const PRIMARY_INPUT: &str = "input";

/// Additive guard applied to magnitudes before taking logarithms.
pub const ENTROPY_EPSILON: f64 = 1e-10;

/// Common error type for every pipeline stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    #[error("cyclic transform spec: {0}")]
    CyclicSpec(String),
    #[error("empty signal: {0}")]
    EmptySignal(String),
    #[error("invalid transform spec: {0}")]
    InvalidSpec(String),
    #[error("unknown reference `{0}`")]
    UnknownReference(String),
}

impl PipelineError {
    /// Prefixes the message with the step that raised it.
    pub fn in_step(self, step: &str) -> Self {
        let prefix = |msg: String| format!("step `{step}`: {msg}");
        match self {
            PipelineError::InvalidInput(msg) => PipelineError::InvalidInput(prefix(msg)),
            PipelineError::ShapeMismatch(msg) => PipelineError::ShapeMismatch(prefix(msg)),
            PipelineError::UnsupportedOperation(msg) => {
                PipelineError::UnsupportedOperation(prefix(msg))
            }
            PipelineError::EmptySignal(msg) => PipelineError::EmptySignal(prefix(msg)),
            other => other,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Trait describing one stateless stage of the pipeline.
///
/// Stages are configured at construction (a resolved plan, a list of
/// aggregation requests) and consume `I` on every invocation.
pub trait ProcessingStage<I> {
    type Output;

    fn name(&self) -> &'static str;
    fn execute(&self, input: I) -> PipelineResult<Self::Output>;
}
