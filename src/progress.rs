//! Progress reporting for the mirroring run
//!
//! One bar counts data files as their transfers complete, another counts
//! downloaded bytes across all in-flight transfers. To avoid corrupted
//! terminal output, nothing should be written to stdout or stderr while a
//! report is being displayed. Please use logs for debug messages.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::{
    borrow::Cow,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// CLI progress report of the ongoing mirroring run
#[derive(Clone, Debug, Default)]
pub struct ProgressReport(MultiProgress);
//
impl ProgressReport {
    /// Prepare to report progress on the cli
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare to report on a new asynchronous operation
    ///
    /// Set `can_add_work` if the total amount of work is not known yet, and
    /// call `done_adding_work()` on the tracker once it is.
    pub fn add(
        &self,
        what: impl Into<Cow<'static, str>>,
        initial_work: Work,
        can_add_work: bool,
    ) -> ProgressTracker {
        let bar = ProgressBar::new(initial_work.amount())
            .with_prefix(what.into())
            .with_style(
                ProgressStyle::with_template(initial_work.style())
                    .expect("hardcoded styles should be valid indicatif templates"),
            );
        let added = initial_work.amount() > 0;
        if added {
            self.0.add(bar.clone());
        }
        ProgressTracker {
            bar,
            report: self.0.clone(),
            added: Arc::new(AtomicBool::new(added)),
            upcoming: Arc::new(AtomicBool::new(can_add_work)),
        }
    }
}

/// Work whose progression can be tracked
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Work {
    /// Data files to be transferred
    Files(usize),

    /// Bytes to be downloaded
    Bytes(u64),
}
//
impl Work {
    /// Initial length of the progress bar
    fn amount(self) -> u64 {
        match self {
            Work::Files(files) => files as u64,
            Work::Bytes(bytes) => bytes,
        }
    }

    /// Display style matching the unit of work
    fn style(self) -> &'static str {
        match self {
            Work::Files(_) => "{prefix} {wide_bar} {pos}/{len}",
            Work::Bytes(_) => {
                "{prefix} {wide_bar} {decimal_bytes}/{decimal_total_bytes} ({decimal_bytes_per_sec})"
            }
        }
    }
}

/// Mechanism to track progress of one operation
#[derive(Clone, Debug)]
pub struct ProgressTracker {
    /// Progress bar for this specific operation
    bar: ProgressBar,

    /// Underlying full-run report
    report: MultiProgress,

    /// Truth that the progress bar has already been added to the report
    added: Arc<AtomicBool>,

    /// Truth that more work can still be added to this progress bar
    upcoming: Arc<AtomicBool>,
}
//
impl ProgressTracker {
    /// Show that a certain amount of progress has been made
    ///
    /// Returns truth that the progress bar has reached its maximum value
    pub fn make_progress(&self, progress: u64) -> bool {
        self.bar.inc(progress);
        let current = self.bar.position();
        let max = self.bar.length().unwrap_or(0);

        // Hide the progress bar once done
        let finished = current >= max && !self.upcoming.load(Ordering::Acquire);
        if finished {
            self.bar.finish_and_clear();
            self.report.remove(&self.bar);
        }
        finished
    }

    /// Increment the amount of progress that remains to be done
    pub fn add_work(&self, remaining: u64) {
        assert!(
            self.upcoming.load(Ordering::Acquire),
            "should not add work after done_adding_work"
        );
        if !self.added.swap(true, Ordering::AcqRel) && remaining > 0 {
            self.report.add(self.bar.clone());
        }
        self.bar.inc_length(remaining);
    }

    /// Promise that add_work will not be called anymore
    ///
    /// This allows for the progress bar to be hidden once full.
    pub fn done_adding_work(&self) {
        self.upcoming.store(false, Ordering::Release);
    }
}
