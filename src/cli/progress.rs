//! CLI-specific progress handling for resort-routes
//!
//! Provides the acquisition progress bar for the command-line interface.

use indicatif::{ProgressBar, ProgressStyle};

/// Creates a progress bar counting routed resorts
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} resorts ({percent}%) ETA: {eta}")
            .expect("Failed to create progress style")
            .progress_chars("#>-")
    );
    pb
}

/// Progress manager for acquisition runs
pub struct ProgressManager {
    pub pb: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total: u64, message: &str) -> Self {
        let pb = create_progress_bar(total);

        // Print initial message to stderr
        eprintln!("{}", message);

        Self { pb }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_bar_template() {
        let pb = create_progress_bar(300);

        assert_eq!(pb.length().unwrap(), 300);

        // The bar must accept updates without panicking, which verifies
        // the template string is valid
        pb.set_position(120);
        pb.finish();
    }

    #[test]
    fn test_progress_manager_creation() {
        let manager = ProgressManager::new(42, "Routing resorts");
        assert_eq!(manager.pb.length().unwrap(), 42);
    }
}
