use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Batch progress on stderr. Hidden when disabled so callers never branch.
#[derive(Clone)]
pub struct ProgressTracker {
    progress_bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, enabled: bool) -> Self {
        let progress_bar = if enabled {
            ProgressBar::with_draw_target(Some(total), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        progress_bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
        );
        Self { progress_bar }
    }

    pub fn advance(&self, doc_id: &str) {
        self.progress_bar.set_message(doc_id.to_string());
        self.progress_bar.inc(1);
    }

    pub fn finish(&self, summary: &str) {
        self.progress_bar.finish_with_message(summary.to_string());
    }
}
