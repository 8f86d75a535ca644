use serde::Serialize;
use std::sync::Mutex;

/// Invocation counters shared between independent pipeline runs.
pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub processed: usize,
    pub errors: usize,
    pub frames: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.errors += 1;
        }
    }

    pub fn record_frames(&self, count: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += count;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn counters_accumulate_across_threads() {
        let recorder = Arc::new(MetricsRecorder::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let recorder = recorder.clone();
                thread::spawn(move || {
                    recorder.record_processed();
                    recorder.record_frames(2);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        recorder.record_error();

        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.processed, 4);
        assert_eq!(snapshot.frames, 8);
        assert_eq!(snapshot.errors, 1);
    }
}
