use std::ops::Deref;

use tracing::{info, warn};

/// Receives messages about what happened to timers. The entry point decides where they end up.
pub trait Reporter {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);
}

impl<T: Deref> Reporter for T
where
    T::Target: Reporter,
{
    fn info(&self, message: &str) {
        self.deref().info(message)
    }

    fn warn(&self, message: &str) {
        self.deref().warn(message)
    }
}

/// Forwards everything to `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

#[cfg(test)]
pub use recording::{RecordingReporter, ReportLevel};
