//! Core of the field transform pipeline.
//!
//! Caller-supplied arrays are adapted into immutable [`Signal`]s, pushed
//! through a dependency-ordered set of elementary transforms, reduced to
//! scalar summaries and packaged into a [`ResultRecord`]. Every invocation is
//! independent; nothing persists between calls.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod telemetry;

pub use interface::{ResultRecord, Signal, TransformSpec};
pub use num_complex::Complex64;
pub use prelude::{PipelineError, PipelineResult, ProcessingStage};
pub use processing::Pipeline;
