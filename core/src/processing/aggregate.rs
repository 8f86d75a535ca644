use crate::interface::{AggregateSpec, AggregationMethod, Signal, SignalSet};
use crate::math::StatsHelper;
use crate::prelude::{PipelineError, PipelineResult, ProcessingStage};
use ndarray::ArrayView1;
use num_complex::Complex64;

/// Reduces named signals to scalars.
pub struct AggregationStage<'a> {
    requests: &'a [AggregateSpec],
}

impl<'a> AggregationStage<'a> {
    pub fn new(requests: &'a [AggregateSpec]) -> Self {
        Self { requests }
    }

    pub fn aggregate(signal: &Signal, method: AggregationMethod) -> PipelineResult<f64> {
        Self::aggregate_samples(signal.samples(), method)
    }

    pub fn aggregate_samples(
        samples: ArrayView1<Complex64>,
        method: AggregationMethod,
    ) -> PipelineResult<f64> {
        let value = match method {
            AggregationMethod::MeanMagnitude => StatsHelper::mean_magnitude(samples),
            AggregationMethod::Entropy => StatsHelper::entropy(samples),
        };
        value.ok_or_else(|| {
            PipelineError::EmptySignal(format!("cannot compute {method} of zero samples"))
        })
    }
}

impl<'s> ProcessingStage<&'s SignalSet> for AggregationStage<'_> {
    type Output = Vec<(String, f64)>;

    fn name(&self) -> &'static str {
        "aggregation"
    }

    fn execute(&self, signals: &'s SignalSet) -> PipelineResult<Self::Output> {
        self.requests
            .iter()
            .map(|request| {
                let signal = signals.require(&request.source)?;
                let value = Self::aggregate(signal, request.method)?;
                Ok((request.output_name(), value))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::InputAdapter;
    use approx::assert_abs_diff_eq;
    use ndarray::Array1;

    #[test]
    fn mean_magnitude_of_alternating_signal_is_one() {
        let signal = InputAdapter::adapt_real(&[1.0, -1.0, 1.0, -1.0]).unwrap();
        let value = AggregationStage::aggregate(&signal, AggregationMethod::MeanMagnitude).unwrap();
        assert_eq!(value, 1.0);
    }

    #[test]
    fn entropy_of_zero_signal_is_finite() {
        let signal = InputAdapter::adapt_real(&[0.0; 8]).unwrap();
        let value = AggregationStage::aggregate(&signal, AggregationMethod::Entropy).unwrap();
        assert!(value.is_finite());
    }

    #[test]
    fn entropy_matches_closed_form() {
        let signal = InputAdapter::adapt_real(&[0.5, 2.0]).unwrap();
        let value = AggregationStage::aggregate(&signal, AggregationMethod::Entropy).unwrap();
        let eps = crate::prelude::ENTROPY_EPSILON;
        let expected = -(0.5 * (0.5 + eps).ln() + 2.0 * (2.0 + eps).ln());
        assert_abs_diff_eq!(value, expected, epsilon = 1e-12);
    }

    #[test]
    fn empty_samples_are_rejected() {
        let empty: Array1<Complex64> = Array1::from(Vec::new());
        let err = AggregationStage::aggregate_samples(empty.view(), AggregationMethod::Entropy)
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptySignal(_)));
    }

    #[test]
    fn stage_names_outputs_and_checks_sources() {
        let mut signals = SignalSet::new();
        signals.insert("mag", InputAdapter::adapt_real(&[3.0, 1.0]).unwrap());
        let requests = vec![
            AggregateSpec::new("mag", AggregationMethod::MeanMagnitude),
            AggregateSpec::new("mag", AggregationMethod::Entropy).named("density"),
        ];
        let scalars = AggregationStage::new(&requests).execute(&signals).unwrap();
        assert_eq!(scalars[0], ("mag.mean_magnitude".to_string(), 2.0));
        assert_eq!(scalars[1].0, "density");

        let missing = vec![AggregateSpec::new("nope", AggregationMethod::Entropy)];
        let err = AggregationStage::new(&missing).execute(&signals).unwrap_err();
        assert_eq!(err, PipelineError::UnknownReference("nope".into()));
    }
}
