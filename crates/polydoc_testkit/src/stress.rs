//! Concurrent write drivers.
//!
//! These helpers hammer the version store from several threads and report
//! what came back, so tests can check numbering and retention under load.

use polydoc_core::{NewVersion, VersionKey, VersionStore};
use polydoc_storage::Fields;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Version numbers handed out, in completion order per thread.
    pub numbers: Vec<u64>,
    /// Failed writes.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
}

impl StressTestResult {
    /// Total writes attempted.
    pub fn total_ops(&self) -> usize {
        self.numbers.len() + self.failed_ops
    }

    /// Returns the handed-out numbers in ascending order.
    pub fn sorted_numbers(&self) -> Vec<u64> {
        let mut numbers = self.numbers.clone();
        numbers.sort_unstable();
        numbers
    }

    /// Prints a summary of the run.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Writes: {}", self.total_ops());
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
    }
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Writes per thread.
    pub writes_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            writes_per_thread: 25,
        }
    }
}

/// Creates versions for one partition from many threads at once.
pub fn stress_concurrent_versions(
    versions: Arc<VersionStore>,
    key: &VersionKey,
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let versions = Arc::clone(&versions);
            let key = key.clone();
            let writes = config.writes_per_thread;
            thread::spawn(move || {
                let mut numbers = Vec::with_capacity(writes);
                let mut failed = 0usize;
                for _ in 0..writes {
                    let new = NewVersion::new(&key.document_id, &key.schema_name, Fields::new())
                        .locale(&key.locale);
                    match versions.create_version(new) {
                        Ok(v) => numbers.push(v.version_number),
                        Err(_) => failed += 1,
                    }
                }
                (numbers, failed)
            })
        })
        .collect();

    let mut numbers = Vec::new();
    let mut failed_ops = 0;
    for handle in handles {
        let (n, f) = handle.join().expect("writer thread panicked");
        numbers.extend(n);
        failed_ops += f;
    }

    StressTestResult {
        numbers,
        failed_ops,
        duration: start.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestStore;

    #[test]
    fn concurrent_numbers_are_gap_free() {
        let t = TestStore::with_max_versions(0);
        let key = VersionKey::new("doc-1", "post", "en");
        let config = StressConfig {
            threads: 4,
            writes_per_thread: 10,
        };
        let result = stress_concurrent_versions(Arc::clone(&t.versions), &key, &config);
        assert_eq!(result.failed_ops, 0);
        assert_eq!(result.sorted_numbers(), (1..=40).collect::<Vec<_>>());
    }
}
