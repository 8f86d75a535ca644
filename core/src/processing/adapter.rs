use crate::interface::{FrameSeries, NamedInput, RawSignal, SampleKind, Signal, SignalSet};
use crate::prelude::{PipelineError, PipelineResult, ProcessingStage};
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde_json::Value;

/// Validates caller-supplied arrays and turns them into [`Signal`]s.
///
/// Accepted shapes are a non-empty list of finite numbers (real) or a
/// non-empty list of finite `[re, im]` pairs (complex). Frame series are a
/// list of such lists, all of the same length and kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct InputAdapter;

impl InputAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn adapt(raw: &RawSignal) -> PipelineResult<Signal> {
        match raw {
            RawSignal::Real(values) => Self::adapt_real(values),
            RawSignal::Complex(values) => Self::adapt_complex(values),
            RawSignal::Json(value) => Self::adapt_value(value),
        }
    }

    pub fn adapt_real(values: &[f64]) -> PipelineResult<Signal> {
        ensure_non_empty(values.len())?;
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(non_finite(index));
        }
        Ok(Signal::from_real(Array1::from(values.to_vec())))
    }

    pub fn adapt_complex(values: &[Complex64]) -> PipelineResult<Signal> {
        ensure_non_empty(values.len())?;
        if let Some(index) = values.iter().position(|c| !c.is_finite()) {
            return Err(non_finite(index));
        }
        Ok(Signal::from_parts(
            Array1::from(values.to_vec()),
            SampleKind::Complex,
        ))
    }

    pub fn adapt_value(value: &Value) -> PipelineResult<Signal> {
        let items = expect_array(value)?;
        let (samples, kind) = parse_samples(items)?;
        Ok(Signal::from_parts(Array1::from(samples), kind))
    }

    /// Adapts a list of rows into a frame series.
    pub fn adapt_frames(value: &Value) -> PipelineResult<FrameSeries> {
        let rows = expect_array(value)?;
        ensure_non_empty(rows.len())?;
        let mut parsed = Vec::with_capacity(rows.len());
        let mut series_kind = None;
        for (index, row) in rows.iter().enumerate() {
            let (samples, kind) = expect_array(row)
                .and_then(|items| parse_samples(items))
                .map_err(|err| with_context(err, format!("frame {index}")))?;
            match series_kind {
                None => series_kind = Some(kind),
                Some(expected) if expected != kind => {
                    return Err(PipelineError::InvalidInput(format!(
                        "frame {index} mixes real and complex rows"
                    )));
                }
                Some(_) => {}
            }
            parsed.push(samples);
        }
        Self::adapt_frame_rows(&parsed, series_kind.unwrap_or(SampleKind::Real))
    }

    /// Typed counterpart of [`adapt_frames`](Self::adapt_frames).
    pub fn adapt_frame_rows(rows: &[Vec<Complex64>], kind: SampleKind) -> PipelineResult<FrameSeries> {
        ensure_non_empty(rows.len())?;
        let width = rows[0].len();
        ensure_non_empty(width)?;
        if let Some(index) = rows.iter().position(|row| row.len() != width) {
            return Err(PipelineError::InvalidInput(format!(
                "ragged frames: frame {index} has {} samples, expected {width}",
                rows[index].len()
            )));
        }
        if rows.iter().flatten().any(|c| !c.is_finite()) {
            return Err(PipelineError::InvalidInput(
                "frames contain non-finite samples".into(),
            ));
        }
        let flat: Vec<Complex64> = rows.iter().flatten().copied().collect();
        let frames = Array2::from_shape_vec((rows.len(), width), flat)
            .map_err(|err| PipelineError::InvalidInput(err.to_string()))?;
        let frames = match kind {
            SampleKind::Real => frames.mapv(|c| Complex64::new(c.re, 0.0)),
            SampleKind::Complex => frames,
        };
        Ok(FrameSeries::from_parts(frames, kind))
    }
}

impl<'a> ProcessingStage<&'a [NamedInput]> for InputAdapter {
    type Output = SignalSet;

    fn name(&self) -> &'static str {
        "input-adapter"
    }

    fn execute(&self, inputs: &'a [NamedInput]) -> PipelineResult<SignalSet> {
        if inputs.is_empty() {
            return Err(PipelineError::InvalidInput("no input signals supplied".into()));
        }
        let mut signals = SignalSet::new();
        for input in inputs {
            let signal = Self::adapt(&input.data)
                .map_err(|err| with_context(err, format!("input `{}`", input.name)))?;
            if signals.insert(input.name.clone(), signal).is_some() {
                return Err(PipelineError::InvalidInput(format!(
                    "input `{}` supplied more than once",
                    input.name
                )));
            }
        }
        Ok(signals)
    }
}

fn ensure_non_empty(len: usize) -> PipelineResult<()> {
    if len == 0 {
        return Err(PipelineError::InvalidInput("array is empty".into()));
    }
    Ok(())
}

fn non_finite(index: usize) -> PipelineError {
    PipelineError::InvalidInput(format!("sample {index} is not finite"))
}

fn with_context(err: PipelineError, context: String) -> PipelineError {
    match err {
        PipelineError::InvalidInput(msg) => PipelineError::InvalidInput(format!("{context}: {msg}")),
        other => other,
    }
}

fn parse_samples(items: &[Value]) -> PipelineResult<(Vec<Complex64>, SampleKind)> {
    ensure_non_empty(items.len())?;
    let kind = match items[0] {
        Value::Array(_) => SampleKind::Complex,
        _ => SampleKind::Real,
    };
    let mut samples = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let sample = match (kind, item) {
            (SampleKind::Real, Value::Number(_)) => Complex64::new(number(item, index)?, 0.0),
            (SampleKind::Complex, Value::Array(pair)) if pair.len() == 2 => {
                Complex64::new(number(&pair[0], index)?, number(&pair[1], index)?)
            }
            (SampleKind::Complex, Value::Array(pair)) => {
                return Err(PipelineError::InvalidInput(format!(
                    "sample {index} has {} components, expected [re, im]",
                    pair.len()
                )));
            }
            (_, Value::Number(_)) | (_, Value::Array(_)) => {
                return Err(PipelineError::InvalidInput(format!(
                    "ragged array: sample {index} mixes scalars and pairs"
                )));
            }
            (_, other) => {
                return Err(PipelineError::InvalidInput(format!(
                    "sample {index} is {}, not numeric",
                    type_name(other)
                )));
            }
        };
        if !sample.is_finite() {
            return Err(non_finite(index));
        }
        samples.push(sample);
    }
    Ok((samples, kind))
}

fn number(value: &Value, index: usize) -> PipelineResult<f64> {
    value.as_f64().ok_or_else(|| {
        PipelineError::InvalidInput(format!(
            "sample {index} is {}, not numeric",
            type_name(value)
        ))
    })
}

fn expect_array(value: &Value) -> PipelineResult<&Vec<Value>> {
    match value {
        Value::Array(items) => Ok(items),
        other => Err(PipelineError::InvalidInput(format!(
            "expected an array, found {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
