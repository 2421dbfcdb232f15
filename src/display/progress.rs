//! Progress bars for the embedding, clustering, and extraction passes.

use crate::pipeline::{ProgressEvent, ProgressSink};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

/// Create a spinner for indeterminate progress.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Renders [`ProgressEvent`]s on a single bar, one phase at a time.
pub struct PhaseProgressBar {
    bar: ProgressBar,
}

impl Default for PhaseProgressBar {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseProgressBar {
    pub fn new() -> Self {
        Self::with_bar(ProgressBar::new(0))
    }

    /// Wraps an existing bar, e.g. a hidden one.
    pub fn with_bar(bar: ProgressBar) -> Self {
        if let Ok(style) = ProgressStyle::default_bar().template(BAR_TEMPLATE) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl ProgressSink for PhaseProgressBar {
    fn report(&self, event: ProgressEvent) {
        self.bar.set_length(event.total as u64);
        self.bar.set_position(event.current as u64);
        self.bar.set_message(event.phase.to_string());
    }
}
