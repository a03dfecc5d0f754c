//! Progress reporting for the threshold scan.
//!
//! With the `progress` feature, [`ScanProgress`] renders an `indicatif` bar with one step
//! per scan threshold. Its message carries the current threshold, the duration of the
//! previous iteration and a smoothed iteration time
//! (`avg ← α·last + (1–α)·avg`, initialized with the first duration).
//! Without the feature every call is a no-op, so the scanner has a single code path.
#[cfg(feature = "progress")]
use std::time::{Duration, Instant};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

#[cfg(feature = "progress")]
const SMOOTHING: f64 = 0.2;

pub(crate) struct ScanProgress {
    #[cfg(feature = "progress")]
    bar: ProgressBar,
    #[cfg(feature = "progress")]
    iteration_start: Option<Instant>,
    #[cfg(feature = "progress")]
    avg_secs: Option<f64>,
}

impl ScanProgress {
    #[cfg(feature = "progress")]
    pub(crate) fn new(n_thresholds: usize) -> Self {
        let bar = ProgressBar::new((n_thresholds as u64).max(1));
        let style = ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} ({percent:>3}%) | ETA {eta_precise} | {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(200));
        ScanProgress {
            bar,
            iteration_start: None,
            avg_secs: None,
        }
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn new(_n_thresholds: usize) -> Self {
        ScanProgress {}
    }

    /// Mark the start of the `threshold` iteration.
    #[cfg(feature = "progress")]
    pub(crate) fn start(&mut self, threshold: f64) {
        let now = Instant::now();
        let message = match self.iteration_start.replace(now) {
            None => format!("threshold {threshold}"),
            Some(previous) => {
                let last = now.duration_since(previous);
                let avg = smooth(self.avg_secs, last.as_secs_f64());
                self.avg_secs = Some(avg);
                format!(
                    "threshold {threshold} | last: {last:.2?}, avg: {:.2?}",
                    Duration::from_secs_f64(avg)
                )
            }
        };
        self.bar.set_message(message);
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn start(&mut self, _threshold: f64) {}

    #[cfg(feature = "progress")]
    pub(crate) fn done(&self) {
        self.bar.inc(1);
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn done(&self) {}

    #[cfg(feature = "progress")]
    pub(crate) fn finish(self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }

    #[cfg(not(feature = "progress"))]
    pub(crate) fn finish(self) {}
}

#[cfg(feature = "progress")]
fn smooth(avg: Option<f64>, sample: f64) -> f64 {
    match avg {
        None => sample,
        Some(avg) => SMOOTHING * sample + (1.0 - SMOOTHING) * avg,
    }
}
