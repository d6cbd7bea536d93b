use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::error::EepError;
use crate::observer::Observer;

const PROGRESS_TEMPLATE: &str =
    "[{spinner:.green} {elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}";

pub fn create_progress_bar(total_steps: u64, msg: &str) -> ProgressBar {
    let pb = ProgressBar::new(total_steps);

    // The template is a constant, fall back to the default style if it ever stops parsing
    let style = ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(msg.to_owned());

    pb
}

/// Draws transfer progress on the terminal, counted in bytes
pub struct ProgressBarObserver {
    bar: ProgressBar,
}

impl ProgressBarObserver {
    pub fn new(total_bytes: usize, msg: &str) -> Self {
        ProgressBarObserver {
            bar: create_progress_bar(total_bytes as u64, msg),
        }
    }

    pub fn finish(&self) {
        self.bar.finish();
    }
}

impl Observer for ProgressBarObserver {
    fn on_progress(&self, progress: f64) {
        let len = self.bar.length().unwrap_or(0);
        let pos = (progress.clamp(0.0, 1.0) * len as f64).round() as u64;
        self.bar.set_position(pos);
    }

    fn on_message(&self, message: &str) {
        self.bar.suspend(|| info!("{}", message));
    }

    fn on_error(&self, err: &EepError) {
        self.bar.suspend(|| error!("{}", err));
    }
}
