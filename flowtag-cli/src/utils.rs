//! Utility functions for the flowtag CLI

use log::info;
use std::time::{Duration, Instant};

/// Format a duration as a human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();

    if total_secs < 60 {
        format!("{}.{:03}s", total_secs, duration.subsec_millis())
    } else if total_secs < 3600 {
        let mins = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", mins, secs)
    } else {
        let hours = total_secs / 3600;
        let mins = (total_secs % 3600) / 60;
        let secs = total_secs % 60;
        format!("{}h {}m {}s", hours, mins, secs)
    }
}

/// Logs how long a pipeline stage took when dropped
pub struct Timer {
    start: Instant,
    stage: &'static str,
}

impl Timer {
    /// Start timing the named stage
    pub fn new(stage: &'static str) -> Self {
        info!("Starting {} stage", stage);
        Self {
            start: Instant::now(),
            stage,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        info!(
            "Stage '{}' finished in {}",
            self.stage,
            format_duration(self.start.elapsed())
        );
    }
}

/// Print a section header in the CLI output
pub fn print_header(title: &str) {
    let separator = "=".repeat(title.len());
    println!("\n{}", title);
    println!("{}", separator);
}
