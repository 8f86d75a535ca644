use crate::prelude::{PipelineError, PipelineResult};
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::Complex64;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a signal's samples carry imaginary parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleKind {
    Real,
    Complex,
}

impl SampleKind {
    /// Real only when every operand is real.
    pub fn combine(kinds: impl IntoIterator<Item = SampleKind>) -> SampleKind {
        if kinds.into_iter().all(|kind| kind == SampleKind::Real) {
            SampleKind::Real
        } else {
            SampleKind::Complex
        }
    }
}

/// Immutable, non-empty sequence of finite samples.
///
/// Samples are always stored as complex values; real signals keep a zero
/// imaginary part so that every operation can work on one representation.
/// Construction outside the crate goes through
/// [`InputAdapter`](crate::processing::InputAdapter), which enforces the
/// non-empty and finite invariants.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Array1<Complex64>,
    kind: SampleKind,
}

impl Signal {
    pub(crate) fn from_parts(samples: Array1<Complex64>, kind: SampleKind) -> Self {
        let samples = match kind {
            SampleKind::Real => samples.mapv(|c| Complex64::new(c.re, 0.0)),
            SampleKind::Complex => samples,
        };
        Self { samples, kind }
    }

    pub(crate) fn from_real(values: Array1<f64>) -> Self {
        Self {
            samples: values.mapv(|v| Complex64::new(v, 0.0)),
            kind: SampleKind::Real,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    pub fn is_real(&self) -> bool {
        self.kind == SampleKind::Real
    }

    pub fn samples(&self) -> ArrayView1<'_, Complex64> {
        self.samples.view()
    }

    pub fn to_vec(&self) -> Vec<Complex64> {
        self.samples.to_vec()
    }

    /// Real parts of every sample.
    pub fn real_parts(&self) -> Vec<f64> {
        self.samples.iter().map(|c| c.re).collect()
    }

    pub fn magnitudes(&self) -> Array1<f64> {
        self.samples.mapv(|c| c.norm())
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SignalRepr {
    Real { values: Vec<f64> },
    Complex { values: Vec<[f64; 2]> },
}

impl Serialize for Signal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = match self.kind {
            SampleKind::Real => SignalRepr::Real {
                values: self.real_parts(),
            },
            SampleKind::Complex => SignalRepr::Complex {
                values: self.samples.iter().map(|c| [c.re, c.im]).collect(),
            },
        };
        repr.serialize(serializer)
    }
}

/// Caller-supplied array data before validation.
///
/// JSON arrays of numbers decode as [`RawSignal::Real`], arrays of `[re, im]`
/// pairs as [`RawSignal::Complex`]; anything else is kept as a raw value so
/// the adapter can report why it was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawSignal {
    Real(Vec<f64>),
    Complex(Vec<Complex64>),
    Json(serde_json::Value),
}

impl From<Vec<f64>> for RawSignal {
    fn from(values: Vec<f64>) -> Self {
        RawSignal::Real(values)
    }
}

impl From<Vec<Complex64>> for RawSignal {
    fn from(values: Vec<Complex64>) -> Self {
        RawSignal::Complex(values)
    }
}

impl From<serde_json::Value> for RawSignal {
    fn from(value: serde_json::Value) -> Self {
        RawSignal::Json(value)
    }
}

/// A raw array bound to the name later steps use to reference it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedInput {
    pub name: String,
    pub data: RawSignal,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, data: impl Into<RawSignal>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Equal-length frames, one per row, processed independently.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSeries {
    frames: Array2<Complex64>,
    kind: SampleKind,
}

impl FrameSeries {
    pub(crate) fn from_parts(frames: Array2<Complex64>, kind: SampleKind) -> Self {
        Self { frames, kind }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.nrows()
    }

    pub fn frame_len(&self) -> usize {
        self.frames.ncols()
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Row `index` as a signal.
    pub fn frame(&self, index: usize) -> Option<Signal> {
        if index >= self.frame_count() {
            return None;
        }
        Some(Signal::from_parts(
            self.frames.row(index).to_owned(),
            self.kind,
        ))
    }

    pub fn frames(&self) -> impl Iterator<Item = Signal> + '_ {
        self.frames
            .rows()
            .into_iter()
            .map(move |row| Signal::from_parts(row.to_owned(), self.kind))
    }
}

/// Working set of named signals passed between stages.
#[derive(Debug, Clone, Default)]
pub struct SignalSet {
    signals: HashMap<String, Signal>,
}

impl SignalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the signal previously bound to `name`, if any.
    pub fn insert(&mut self, name: impl Into<String>, signal: Signal) -> Option<Signal> {
        self.signals.insert(name.into(), signal)
    }

    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    pub fn require(&self, name: &str) -> PipelineResult<&Signal> {
        self.get(name)
            .ok_or_else(|| PipelineError::UnknownReference(name.to_string()))
    }

    pub fn remove(&mut self, name: &str) -> Option<Signal> {
        self.signals.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
