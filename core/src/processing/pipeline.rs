use crate::interface::{
    AggregateSpec, AggregationMethod, Artifact, FrameSeries, NamedInput, PipelineRequest,
    RawSignal, ResultRecord, SignalSet, TransformSpec,
};
use crate::prelude::{PipelineError, PipelineResult, ProcessingStage, PRIMARY_INPUT};
use crate::processing::adapter::InputAdapter;
use crate::processing::aggregate::AggregationStage;
use crate::processing::assembler::OutputAssembler;
use crate::processing::resolver::{DependencyResolver, ExecutionPlan};
use crate::processing::transform::TransformStage;
use crate::telemetry::LogManager;

/// Runs adapter, transform, aggregation and assembly for one request.
///
/// The pipeline holds no data between invocations and can be shared freely
/// across threads.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline {
    logger: LogManager,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            logger: LogManager::new("fieldcore::pipeline"),
        }
    }

    pub fn run(&self, request: &PipelineRequest) -> PipelineResult<ResultRecord> {
        self.run_parts(
            &request.inputs,
            &request.spec,
            &request.aggregations,
            request.include_inputs,
        )
    }

    /// Single-array invocation: `raw` is bound to [`PRIMARY_INPUT`] and the
    /// spec's final output is reduced with `method`, stored under the
    /// method's name.
    pub fn run_single(
        &self,
        raw: impl Into<RawSignal>,
        spec: &TransformSpec,
        method: AggregationMethod,
    ) -> PipelineResult<ResultRecord> {
        let inputs = [NamedInput::new(PRIMARY_INPUT, raw)];
        let aggregations = [Self::final_aggregate(spec, method)];
        self.run_parts(&inputs, spec, &aggregations, false)
    }

    /// Runs the spec once per frame, each frame bound to [`PRIMARY_INPUT`].
    ///
    /// The spec is resolved once; the first failing frame aborts the series.
    pub fn run_frames(
        &self,
        frames: &FrameSeries,
        spec: &TransformSpec,
        method: AggregationMethod,
    ) -> PipelineResult<Vec<ResultRecord>> {
        let plan = DependencyResolver::resolve(spec, &[PRIMARY_INPUT])?;
        let aggregations = [Self::final_aggregate(spec, method)];
        self.logger.record(&format!(
            "frame series: {} frames of {} samples, {} steps",
            frames.frame_count(),
            frames.frame_len(),
            plan.len()
        ));

        frames
            .frames()
            .map(|frame| {
                let mut signals = SignalSet::new();
                signals.insert(PRIMARY_INPUT, frame);
                self.finish(&plan, spec, signals, &aggregations, &[])
            })
            .collect()
    }

    fn run_parts(
        &self,
        inputs: &[NamedInput],
        spec: &TransformSpec,
        aggregations: &[AggregateSpec],
        include_inputs: bool,
    ) -> PipelineResult<ResultRecord> {
        let names: Vec<&str> = inputs.iter().map(|input| input.name.as_str()).collect();
        let plan = DependencyResolver::resolve(spec, &names)?;
        for request in aggregations {
            let source = request.source.as_str();
            if !names.contains(&source) && spec.get(source).is_none() {
                return Err(PipelineError::UnknownReference(request.source.clone()));
            }
        }

        let signals = self.stage(&InputAdapter::new(), inputs)?;
        self.logger.record(&format!(
            "pipeline run: {} inputs, {} steps, {} aggregations",
            inputs.len(),
            plan.len(),
            aggregations.len()
        ));
        let carried: &[&str] = if include_inputs { &names } else { &[] };
        self.finish(&plan, spec, signals, aggregations, carried)
    }

    fn finish(
        &self,
        plan: &ExecutionPlan<'_>,
        spec: &TransformSpec,
        signals: SignalSet,
        aggregations: &[AggregateSpec],
        carried: &[&str],
    ) -> PipelineResult<ResultRecord> {
        let mut signals = self.stage(&TransformStage::new(plan), signals)?;
        let scalars = self.stage(&AggregationStage::new(aggregations), &signals)?;

        let mut artifacts = Vec::with_capacity(carried.len() + spec.len() + scalars.len());
        let names = carried
            .iter()
            .copied()
            .chain(spec.steps.iter().map(|step| step.name.as_str()));
        for name in names {
            if let Some(signal) = signals.remove(name) {
                artifacts.push((name.to_string(), Artifact::Signal(signal)));
            }
        }
        artifacts.extend(
            scalars
                .into_iter()
                .map(|(name, value)| (name, Artifact::Scalar(value))),
        );

        let record = self.stage(&OutputAssembler, artifacts)?;
        self.logger
            .detail(&format!("assembled record with {} artifacts", record.len()));
        Ok(record)
    }

    fn stage<I, S>(&self, stage: &S, input: I) -> PipelineResult<S::Output>
    where
        S: ProcessingStage<I>,
    {
        stage.execute(input).map_err(|err| {
            self.logger
                .failure(&format!("{} stage failed: {err}", stage.name()));
            err
        })
    }

    fn final_aggregate(spec: &TransformSpec, method: AggregationMethod) -> AggregateSpec {
        AggregateSpec::new(spec.output_name(), method).named(method.as_str())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
