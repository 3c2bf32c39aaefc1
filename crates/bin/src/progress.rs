//! Terminal progress reporting.

use cohort::{Pass, Progress};
use cohort_stats::Selection;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Shows one spinner per pass on stderr.
#[derive(Debug, Default)]
pub(crate) struct SpinnerProgress {
    bar: Option<ProgressBar>,
}

impl SpinnerProgress {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }
}

impl Progress for SpinnerProgress {
    fn pass_started(&mut self, pass: Pass) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::style());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Running {} pass...", pass.name()));
        self.bar = Some(pb);
    }

    fn block_done(&mut self, pass: Pass, rows: u64) {
        if let Some(pb) = &self.bar {
            pb.set_message(format!("Running {} pass... {} rows", pass.name(), rows));
        }
    }

    fn pass_finished(&mut self, pass: Pass, rows: u64) {
        if let Some(pb) = self.bar.take() {
            pb.finish_with_message(format!("✓ {} pass ({} rows)", pass.name(), rows));
        }
    }

    fn selected(&mut self, selection: &Selection) {
        eprintln!(
            "✓ selected {} of {} qualifying entities",
            selection.len(),
            selection.qualifying()
        );
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if let Some(pb) = self.bar.take() {
            pb.abandon_with_message("✗ interrupted");
        }
    }
}
