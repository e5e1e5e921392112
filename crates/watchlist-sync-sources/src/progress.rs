use std::collections::HashMap;
use tracing::{info, warn};

/// Progress tracker for the list walk
///
/// The number of items is only known page by page, so the total grows as
/// pages are parsed. Emits periodic progress lines and a final summary
/// instead of one log line per item.
pub struct ProgressTracker {
    total: usize,
    processed: usize,
    cached: usize,
    resolved: usize,
    unresolved: usize,
    failed: usize,
    skipped: usize,
    start_time: std::time::Instant,
    progress_interval: usize, // Log every N items
    last_progress_log: usize,
    error_counts: HashMap<String, usize>, // Track errors by category
}

impl ProgressTracker {
    /// # Arguments
    /// * `progress_interval` - Log progress every N items
    pub fn new(progress_interval: usize) -> Self {
        Self {
            total: 0,
            processed: 0,
            cached: 0,
            resolved: 0,
            unresolved: 0,
            failed: 0,
            skipped: 0,
            start_time: std::time::Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    /// Account for the items of a newly parsed page
    pub fn extend_total(&mut self, items: usize) {
        self.total += items;
    }

    /// Answered from the resolution cache
    pub fn record_cached(&mut self) {
        self.bump();
        self.cached += 1;
    }

    /// Detail page fetched and a TMDB id found
    pub fn record_resolved(&mut self) {
        self.bump();
        self.resolved += 1;
    }

    /// Detail page fetched but carried no TMDB link
    pub fn record_unresolved(&mut self) {
        self.bump();
        self.unresolved += 1;
    }

    /// Record a failure, grouped by category in the summary
    pub fn record_failed_with_error(&mut self, error_category: &str) {
        self.bump();
        self.failed += 1;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    /// Malformed list entry without a reference
    pub fn record_skipped(&mut self) {
        self.bump();
        self.skipped += 1;
    }

    fn bump(&mut self) {
        self.processed += 1;
        self.log_progress();
    }

    fn log_progress(&mut self) {
        if self.processed - self.last_progress_log < self.progress_interval {
            return;
        }
        let elapsed = self.start_time.elapsed();
        let rate = if elapsed.as_secs_f64() > 0.0 {
            self.processed as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        info!(
            "Progress: {}/{} ({:.2} items/sec) | Cached: {} | Resolved: {} | Unresolved: {} | Failed: {} | Skipped: {}",
            self.processed, self.total, rate,
            self.cached, self.resolved, self.unresolved, self.failed, self.skipped
        );
        self.last_progress_log = self.processed;
    }

    /// Log final summary of the walk
    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed();
        // Failures are actionable, so they raise the summary to WARN
        if self.failed > 0 {
            warn!(
                "{} completed: {} items in {:.1}s | Cached: {} | Resolved: {} | Unresolved: {} | Failed: {} | Skipped: {}",
                operation_name, self.processed, elapsed.as_secs_f64(),
                self.cached, self.resolved, self.unresolved, self.failed, self.skipped
            );

            if !self.error_counts.is_empty() {
                let mut error_entries: Vec<_> = self.error_counts.iter().collect();
                error_entries.sort_by(|a, b| b.1.cmp(a.1)); // Sort by count descending

                let error_summary: Vec<String> = error_entries
                    .iter()
                    .map(|(category, count)| format!("{}: {}", category, count))
                    .collect();

                info!("Error breakdown: {}", error_summary.join(", "));
            }
        } else {
            info!(
                "{} completed: {} items in {:.1}s | Cached: {} | Resolved: {} | Unresolved: {} | Skipped: {}",
                operation_name, self.processed, elapsed.as_secs_f64(),
                self.cached, self.resolved, self.unresolved, self.skipped
            );
        }
    }
}
