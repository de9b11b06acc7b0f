//! Progress reporting for long-running exports.
//!
//! Library code reports `(stage, done, total)` through [`ProgressSink`] and
//! stays unaware of terminals. The CLI plugs in [`StageProgress`], an
//! indicatif bar that hides itself when stderr is not interactive.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, stderr};
use std::sync::Mutex;

/// Receiver for progress updates. Called concurrently from worker threads.
pub trait ProgressSink: Sync {
    fn update(&self, stage: &str, done: usize, total: usize);

    fn finish(&self) {}
}

/// Sink that drops every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _stage: &str, _done: usize, _total: usize) {}
}

/// Check if we should show progress indicators.
///
/// Progress is shown only if stderr is an interactive terminal.
#[must_use]
pub fn should_show_progress() -> bool {
    stderr().is_terminal()
}

/// Create a determinate progress bar.
///
/// Falls back to indicatif's default style if the template is rejected.
#[must_use]
pub fn create_progress_bar(total: u64, message: &str, show: bool) -> ProgressBar {
    let pb = ProgressBar::new(total);

    if show {
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map_or_else(|_| ProgressStyle::default_bar(), |s| s.progress_chars("=>-"));
        pb.set_style(style);
        pb.set_message(message.to_string());
    } else {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    pb
}

/// Indicatif-backed sink that shows one bar per stage.
pub struct StageProgress {
    bar: ProgressBar,
    stage: Mutex<String>,
    showing: bool,
}

impl StageProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::with_visibility(should_show_progress())
    }

    #[must_use]
    pub fn with_visibility(show: bool) -> Self {
        Self {
            bar: create_progress_bar(0, "", show),
            stage: Mutex::new(String::new()),
            showing: show,
        }
    }

    #[must_use]
    pub const fn is_showing(&self) -> bool {
        self.showing
    }
}

impl Default for StageProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for StageProgress {
    fn update(&self, stage: &str, done: usize, total: usize) {
        if let Ok(mut current) = self.stage.lock() {
            if current.as_str() != stage {
                stage.clone_into(&mut current);
                self.bar.set_message(stage.to_string());
                self.bar.reset_elapsed();
            }
        }
        self.bar.set_length(total as u64);
        self.bar.set_position(done as u64);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting(AtomicUsize);

    impl ProgressSink for Counting {
        fn update(&self, _stage: &str, _done: usize, _total: usize) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_progress_bar_hidden_when_not_terminal() {
        let pb = create_progress_bar(100, "Test", false);
        pb.inc(50);
        pb.finish();
    }

    #[test]
    fn test_stage_progress_hidden_tracks_position() {
        let progress = StageProgress::with_visibility(false);
        progress.update("Fetching issues", 3, 10);
        assert_eq!(progress.bar.position(), 3);
        assert_eq!(progress.bar.length(), Some(10));
        progress.update("Writing CSV", 1, 2);
        assert_eq!(progress.bar.length(), Some(2));
        progress.finish();
        assert!(!progress.is_showing());
    }

    #[test]
    fn test_sink_is_usable_as_trait_object() {
        let counting = Counting(AtomicUsize::new(0));
        let sink: &dyn ProgressSink = &counting;
        sink.update("a", 0, 1);
        sink.update("a", 1, 1);
        sink.finish();
        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
    }
}
