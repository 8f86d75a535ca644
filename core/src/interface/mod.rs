pub mod record;
pub mod signal;
pub mod spec;

pub use record::{Artifact, ResultRecord};
pub use signal::{FrameSeries, NamedInput, RawSignal, SampleKind, Signal, SignalSet};
pub use spec::{
    AggregateSpec, AggregationMethod, ConvolveMode, KernelSource, Operation, PipelineRequest,
    StepSpec, TransformSpec,
};
