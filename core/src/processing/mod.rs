pub mod adapter;
pub mod aggregate;
pub mod assembler;
pub mod pipeline;
pub mod resolver;
pub mod transform;

pub use adapter::InputAdapter;
pub use aggregate::AggregationStage;
pub use assembler::OutputAssembler;
pub use pipeline::Pipeline;
pub use resolver::{DependencyResolver, ExecutionPlan};
pub use transform::TransformStage;
