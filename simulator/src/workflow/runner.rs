use crate::generator::profile::{build_frames, build_inputs, GeneratorConfig};
use crate::workflow::config::WorkflowConfig;
use crate::workflow::gate::{PolicyGate, SizeLimitGate};
use anyhow::Context;
use fieldcore::interface::{FrameSeries, NamedInput, PipelineRequest, RawSignal, ResultRecord};
use fieldcore::telemetry::{Metrics, MetricsRecorder};
use fieldcore::{Pipeline, PipelineResult};
use log::{info, warn};
use std::sync::Arc;
use tokio::runtime::Builder;

/// Drives the pipeline for the CLI and the HTTP bridge.
#[derive(Clone)]
pub struct Runner {
    config: Arc<WorkflowConfig>,
    pipeline: Pipeline,
    gates: Vec<Arc<dyn PolicyGate>>,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        let gates: Vec<Arc<dyn PolicyGate>> = vec![Arc::new(SizeLimitGate::new(config.max_samples))];
        Self {
            config: Arc::new(config),
            pipeline: Pipeline::new(),
            gates,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn with_gate(mut self, gate: impl PolicyGate + 'static) -> Self {
        self.gates.push(Arc::new(gate));
        self
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.snapshot()
    }

    /// Generates one synthetic field once the gates admit its size.
    pub fn generate(&self, generator: &GeneratorConfig) -> anyhow::Result<Vec<NamedInput>> {
        self.admit_generation(generator.sample_count(1)?)?;
        build_inputs(generator)
    }

    pub fn generate_frames(
        &self,
        generator: &GeneratorConfig,
        count: usize,
    ) -> anyhow::Result<FrameSeries> {
        self.admit_generation(generator.sample_count(count)?)?;
        build_frames(generator, count)
    }

    /// Runs the configured spec and aggregations over `inputs`.
    pub fn execute(&self, inputs: Vec<NamedInput>) -> anyhow::Result<ResultRecord> {
        self.execute_request(&self.config.request(inputs))
    }

    pub fn execute_request(&self, request: &PipelineRequest) -> anyhow::Result<ResultRecord> {
        for gate in &self.gates {
            gate.check(request)
                .with_context(|| format!("policy gate `{}` refused the request", gate.name()))?;
        }
        let record = self.track(self.pipeline.run(request)).context("running pipeline")?;
        info!(
            "pipeline produced {} artifacts from {} inputs",
            record.len(),
            request.inputs.len()
        );
        Ok(record)
    }

    pub fn execute_frames(&self, frames: &FrameSeries) -> anyhow::Result<Vec<ResultRecord>> {
        self.admit_frames(frames)?;
        let records = self
            .track(
                self.pipeline
                    .run_frames(frames, &self.config.spec, self.config.method),
            )
            .context("running frame series")?;
        self.metrics.record_frames(records.len());
        Ok(records)
    }

    /// Fans the frames out over a worker pool; records come back in frame order.
    pub fn execute_frames_parallel(
        &self,
        frames: &FrameSeries,
    ) -> anyhow::Result<Vec<ResultRecord>> {
        self.admit_frames(frames)?;
        let runtime = Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating runtime for frame fan-out")?;

        let spec = Arc::new(self.config.spec.clone());
        let method = self.config.method;
        let pipeline = self.pipeline;
        let outcome = runtime.block_on(async {
            let handles: Vec<_> = frames
                .frames()
                .map(|frame| {
                    let raw = if frame.is_real() {
                        RawSignal::Real(frame.real_parts())
                    } else {
                        RawSignal::Complex(frame.to_vec())
                    };
                    let spec = Arc::clone(&spec);
                    tokio::task::spawn_blocking(move || pipeline.run_single(raw, &spec, method))
                })
                .collect();

            let mut records = Vec::with_capacity(handles.len());
            for (index, handle) in handles.into_iter().enumerate() {
                let result = handle
                    .await
                    .with_context(|| format!("frame {index} worker failed"))?;
                records.push(result.with_context(|| format!("processing frame {index}"))?);
            }
            Ok::<_, anyhow::Error>(records)
        });

        match outcome {
            Ok(records) => {
                self.metrics.record_processed();
                self.metrics.record_frames(records.len());
                Ok(records)
            }
            Err(err) => {
                self.metrics.record_error();
                warn!("parallel frame run failed: {err:#}");
                Err(err)
            }
        }
    }

    fn admit_generation(&self, samples: usize) -> anyhow::Result<()> {
        for gate in &self.gates {
            gate.check_generation(samples)
                .with_context(|| format!("policy gate `{}` refused generation", gate.name()))?;
        }
        Ok(())
    }

    fn admit_frames(&self, frames: &FrameSeries) -> anyhow::Result<()> {
        for gate in &self.gates {
            gate.check_frames(frames)
                .with_context(|| format!("policy gate `{}` refused the frames", gate.name()))?;
        }
        Ok(())
    }

    fn track<T>(&self, outcome: PipelineResult<T>) -> PipelineResult<T> {
        match &outcome {
            Ok(_) => self.metrics.record_processed(),
            Err(err) => {
                self.metrics.record_error();
                warn!("pipeline rejected the request: {err}");
            }
        }
        outcome
    }
}
