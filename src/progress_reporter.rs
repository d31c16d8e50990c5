use std::sync::atomic::{AtomicU64, Ordering};

use log::info;

/// Receives progress updates from long-running loops
///
pub trait ProgressReporter: Sync {
    /// Set the total number of work units and reset the completed count
    fn start(&self, total: u64);

    /// Mark one work unit complete
    fn inc(&self, label: &str);

    fn finish(&self);
}

/// Reports progress through the logger
///
pub struct LogProgressReporter {
    action: String,
    unit: String,
    total: AtomicU64,
    completed: AtomicU64,
}

impl LogProgressReporter {
    /// # Arguments
    ///
    /// * `action` - past tense description of the work, eg. "Annotated"
    /// * `unit` - plural name of the work unit, eg. "chromosomes"
    ///
    pub fn new(action: &str, unit: &str) -> Self {
        Self {
            action: action.to_string(),
            unit: unit.to_string(),
            total: AtomicU64::new(0),
            completed: AtomicU64::new(0),
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for LogProgressReporter {
    fn start(&self, total: u64) {
        self.total.store(total, Ordering::Relaxed);
        self.completed.store(0, Ordering::Relaxed);
    }

    fn inc(&self, label: &str) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        let total = self.total.load(Ordering::Relaxed);
        info!(
            "{} {}/{} {} ({})",
            self.action, completed, total, self.unit, label
        );
    }

    fn finish(&self) {
        info!(
            "{} all {} {}",
            self.action,
            self.completed(),
            self.unit
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_progress_reporter() {
        let reporter = LogProgressReporter::new("Annotated", "chromosomes");
        reporter.start(3);
        reporter.inc("chr1");
        reporter.inc("chr2");
        assert_eq!(reporter.completed(), 2);

        reporter.start(1);
        assert_eq!(reporter.completed(), 0);
    }
}
