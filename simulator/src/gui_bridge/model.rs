use fieldcore::interface::ResultRecord;
use fieldcore::telemetry::Metrics;
use serde::Serialize;

/// Latest outcome served to HTTP consumers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BridgeState {
    pub latest: Option<ResultRecord>,
    pub runs: usize,
    pub last_error: Option<String>,
    pub metrics: Metrics,
}

impl BridgeState {
    pub fn accept(&mut self, record: ResultRecord) {
        self.latest = Some(record);
        self.runs += 1;
        self.last_error = None;
    }

    pub fn reject(&mut self, message: String) {
        self.last_error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldcore::interface::{AggregationMethod, TransformSpec};
    use fieldcore::Pipeline;

    #[test]
    fn accept_clears_previous_error() {
        let record = Pipeline::new()
            .run_single(vec![1.0, 3.0], &TransformSpec::new(), AggregationMethod::MeanMagnitude)
            .unwrap();
        let mut state = BridgeState::default();
        state.reject("bad input".into());
        state.accept(record);

        assert_eq!(state.runs, 1);
        assert!(state.last_error.is_none());
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["latest"]["mean_magnitude"], 2.0);
    }
}
