//! Progress reporting decoupled from the work it tracks.
//!
//! The external tools this crate drives (ffmpeg, whisper) expose no
//! granular progress callback, so long stages animate a synthetic curve
//! derived from a time estimate (see [`crate::estimate`]) while the real
//! work blocks. The simulation is an approximation by contract, not a
//! measurement.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::warn;

/// Interval between simulated progress ticks. Doubles as the bound on how
/// long the background task can outlive its completion signal.
const SIMULATION_TICK: Duration = Duration::from_millis(250);

/// The simulation stops short of the full bar; only real completion may
/// claim 100%.
const SIMULATION_CEILING_RATIO: f64 = 0.9;

/// Display resolution of the console bar.
const BAR_UNITS: u64 = 1000;

/// A registered listener notified on every progress update and on
/// completion. Implementations must be fast and non-blocking: they are
/// invoked synchronously under the reporter's lock.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, value: f64, message: &str);
    fn on_complete(&self);
}

struct ReporterState {
    current: f64,
    observers: Vec<Box<dyn ProgressObserver>>,
}

/// Mutable progress value broadcast to zero or more observers.
///
/// A single mutex guards both the current value and observer dispatch, so
/// `update` is safe to call from a background estimation task while the
/// primary task performs blocking work.
pub struct ProgressReporter {
    total: f64,
    state: Mutex<ReporterState>,
}

impl ProgressReporter {
    pub fn new(total: f64) -> Self {
        Self {
            total,
            state: Mutex::new(ReporterState {
                current: 0.0,
                observers: Vec::new(),
            }),
        }
    }

    pub fn add_observer(&self, observer: Box<dyn ProgressObserver>) {
        let mut state = self.state.lock().expect("progress state poisoned");
        state.observers.push(observer);
    }

    /// Store `value` clamped to `[0, total]` and notify every observer.
    pub fn update(&self, value: f64, message: &str) {
        let mut state = self.state.lock().expect("progress state poisoned");
        let clamped = value.clamp(0.0, self.total);
        state.current = clamped;
        for observer in &state.observers {
            observer.on_progress(clamped, message);
        }
    }

    /// Advance the current value by `delta`.
    pub fn increment(&self, delta: f64) {
        let mut state = self.state.lock().expect("progress state poisoned");
        let clamped = (state.current + delta).clamp(0.0, self.total);
        state.current = clamped;
        for observer in &state.observers {
            observer.on_progress(clamped, "");
        }
    }

    /// Force the value to `total` and send the completion notification.
    ///
    /// Every call notifies: calling `complete` twice delivers `on_complete`
    /// twice and never panics.
    pub fn complete(&self) {
        let mut state = self.state.lock().expect("progress state poisoned");
        state.current = self.total;
        for observer in &state.observers {
            observer.on_complete();
        }
    }

    pub fn current(&self) -> f64 {
        self.state.lock().expect("progress state poisoned").current
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

/// Console observer rendering a bounded-width bar, a percentage, and an ETA.
pub struct ConsoleProgressObserver {
    bar: ProgressBar,
    total: f64,
}

impl ConsoleProgressObserver {
    pub fn new(operation: &str, total: f64) -> Self {
        let bar = ProgressBar::new(BAR_UNITS);
        bar.set_style(ProgressStyle::default_bar()
            .template("{prefix}: [{bar:30.cyan/blue}] {percent}% ({eta} remaining) {msg}")
            .unwrap()
            .progress_chars("#>-"));
        bar.set_prefix(operation.to_string());

        Self { bar, total }
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_progress(&self, value: f64, message: &str) {
        if self.total > 0.0 {
            let position = ((value / self.total) * BAR_UNITS as f64) as u64;
            self.bar.set_position(position.min(BAR_UNITS));
        }
        if !message.is_empty() {
            self.bar.set_message(message.to_string());
        }
    }

    fn on_complete(&self) {
        self.bar.set_position(BAR_UNITS);
        self.bar.finish_with_message("done");
    }
}

/// Background task animating a reporter from 0 toward 90% of its total
/// over an estimated duration while the primary task blocks.
///
/// The task watches a single-use completion signal at every tick, so it
/// stops within [`SIMULATION_TICK`] of real work finishing. It never
/// claims 100%: finalizing the reporter is the caller's job, after
/// [`SimulatedProgress::finish`] has joined the task.
pub struct SimulatedProgress {
    stop: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl SimulatedProgress {
    pub fn start(reporter: Arc<ProgressReporter>, estimated_secs: f64, message: &str) -> Self {
        let stop = Arc::new(Notify::new());
        let signal = Arc::clone(&stop);
        let message = message.to_string();

        let handle = tokio::spawn(async move {
            let started = tokio::time::Instant::now();
            let estimate = estimated_secs.max(0.1);
            let ceiling = reporter.total() * SIMULATION_CEILING_RATIO;

            loop {
                tokio::select! {
                    _ = signal.notified() => break,
                    _ = tokio::time::sleep(SIMULATION_TICK) => {}
                }

                let elapsed = started.elapsed().as_secs_f64();
                let value = ((elapsed / estimate) * ceiling).min(ceiling);
                reporter.update(value, &message);
            }
        });

        Self { stop, handle }
    }

    /// Signal the task to stop and join it with a bounded timeout. The
    /// caller finalizes the reporter with `complete()` afterwards, so
    /// completion is observed exactly once regardless of which code path
    /// finished the real work.
    pub async fn finish(self) {
        self.stop.notify_one();
        if tokio::time::timeout(Duration::from_secs(1), self.handle)
            .await
            .is_err()
        {
            warn!("progress simulation task did not stop within 1s, detaching");
        }
    }
}
