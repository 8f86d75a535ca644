use log::{debug, info, log_enabled, warn, Level};

/// Thin wrapper over the `log` facade with a fixed target per component.
#[derive(Debug, Clone, Copy)]
pub struct LogManager {
    target: &'static str,
}

impl LogManager {
    pub fn new(target: &'static str) -> Self {
        Self { target }
    }

    pub fn record(&self, message: &str) {
        info!(target: self.target, "{}", message);
    }

    pub fn detail(&self, message: &str) {
        debug!(target: self.target, "{}", message);
    }

    /// Whether `detail` output would be emitted; guards costly messages.
    pub fn detail_enabled(&self) -> bool {
        log_enabled!(target: self.target, Level::Debug)
    }

    pub fn failure(&self, message: &str) {
        warn!(target: self.target, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("fieldcore")
    }
}
