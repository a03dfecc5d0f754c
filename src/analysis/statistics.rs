//! # Cut-flow statistics
//!
//! Summarizes the per-event cut flows of one scan threshold into, for each cut:
//!
//! * the **mean survivor count** over all events (a continuous statistic: an event with
//!   seven surviving tracks contributes seven),
//! * an asymmetric **profile-likelihood interval** on the fraction of events with at
//!   least one survivor.
//!
//! ## Interval construction
//! -----------------
//! Each event is a Bernoulli trial: *accept* if its count at the cut is nonzero,
//! *reject* otherwise. With `p = accept / n` and
//!
//! ```text
//! L(q) = accept · ln(q) + reject · ln(1 - q)
//! ```
//!
//! the lower bound is `p - k·step` for the largest `k` such that
//! `L(p - k·step) - L(p) > -drop`, and symmetrically for the upper bound. The reported
//! half-widths are `(p - lower, upper - p)`. With the default `drop = 0.5` this is the
//! usual one-parameter ≈68% likelihood-ratio interval.
//!
//! ## Boundaries
//! -----------------
//! * Terms with a zero count vanish (`0 · ln 0 = 0`), so `L` is finite at `p = 0` and
//!   `p = 1`.
//! * The scan never steps outside `[0, 1]`: at `p = 0` the lower half-width is `0`, at
//!   `p = 1` the upper half-width is `0`. Each direction takes at most `1/step + 1`
//!   evaluations.
//! * Half-widths are resolved in whole steps only. When the true bound lies closer
//!   than one step to `p`, the half-width is reported as `0`: with 100000 events and
//!   no accepted track, [`StatisticsAggregator::interval`] returns `(0, 0)`.
//! * Zero events is an error ([`TrackQcError::EmptyAggregation`]).
use std::fmt;

use serde::Serialize;

use crate::analysis::params::ScanParams;
use crate::constants::{EventStatsMap, LIKELIHOOD_DROP, LIKELIHOOD_STEP};
use crate::trackqc_errors::TrackQcError;

/// Statistics of one cut for one threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CutSummary {
    pub name: String,
    /// Mean cumulative survivor count per event
    pub mean: f64,
    /// Lower half-width of the efficiency interval
    pub ci_low: f64,
    /// Upper half-width of the efficiency interval
    pub ci_high: f64,
    /// Events with at least one survivor
    pub accept: usize,
    /// Events without survivor
    pub reject: usize,
}

impl CutSummary {
    /// Observed fraction of events with at least one survivor.
    pub fn efficiency(&self) -> f64 {
        self.accept as f64 / (self.accept + self.reject) as f64
    }
}

/// Per-cut statistics of one threshold, in pipeline order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutFlowSummary {
    pub cuts: Vec<CutSummary>,
}

impl CutFlowSummary {
    pub fn get(&self, name: &str) -> Option<&CutSummary> {
        self.cuts.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CutSummary> {
        self.cuts.iter()
    }

    pub fn len(&self) -> usize {
        self.cuts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }
}

impl fmt::Display for CutFlowSummary {
    /// Compact by default; aligned multi-line table with the alternate flag (`{:#}`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let width = self.cuts.iter().map(|c| c.name.len()).max().unwrap_or(0);
            writeln!(f, "{:<width$} : mean       -err     +err", "cut")?;
            for c in &self.cuts {
                writeln!(
                    f,
                    "{:<width$} : {:<10.4} {:<8.4} {:<8.4}",
                    c.name, c.mean, c.ci_low, c.ci_high
                )?;
            }
            Ok(())
        } else {
            let parts: Vec<String> = self
                .cuts
                .iter()
                .map(|c| {
                    format!(
                        "{}={:.4} (-{:.4}/+{:.4})",
                        c.name, c.mean, c.ci_low, c.ci_high
                    )
                })
                .collect();
            write!(f, "{}", parts.join(", "))
        }
    }
}

/// Binomial log-likelihood with the `0 · ln 0 = 0` convention.
pub fn log_likelihood(q: f64, accept: usize, reject: usize) -> f64 {
    let term = |count: usize, x: f64| {
        if count == 0 {
            0.0
        } else {
            count as f64 * x.ln()
        }
    };
    term(accept, q) + term(reject, 1.0 - q)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticsAggregator {
    step: f64,
    drop: f64,
}

impl Default for StatisticsAggregator {
    fn default() -> Self {
        StatisticsAggregator {
            step: LIKELIHOOD_STEP,
            drop: LIKELIHOOD_DROP,
        }
    }
}

impl StatisticsAggregator {
    pub fn from_params(params: &ScanParams) -> Self {
        StatisticsAggregator {
            step: params.likelihood_step,
            drop: params.likelihood_drop,
        }
    }

    /// Asymmetric half-widths `(p - lower, upper - p)` of the likelihood interval.
    ///
    /// Arguments
    /// -----------------
    /// * `accept`: number of events with at least one survivor.
    /// * `reject`: number of events without survivor.
    ///
    /// Return
    /// ----------
    /// * The two half-widths, or [`TrackQcError::EmptyAggregation`] when
    ///   `accept + reject == 0`.
    pub fn interval(&self, accept: usize, reject: usize) -> Result<(f64, f64), TrackQcError> {
        let n = accept + reject;
        if n == 0 {
            return Err(TrackQcError::EmptyAggregation);
        }
        let p = accept as f64 / n as f64;
        let lower = self.scan_bound(p, accept, reject, -1.0);
        let upper = self.scan_bound(p, accept, reject, 1.0);
        Ok((p - lower, upper - p))
    }

    /// Walk from `p` in `direction` while the likelihood drop stays above `-drop`.
    fn scan_bound(&self, p: f64, accept: usize, reject: usize, direction: f64) -> f64 {
        let l_max = log_likelihood(p, accept, reject);
        let mut k: u64 = 0;
        loop {
            let next = p + direction * (k + 1) as f64 * self.step;
            if !(0.0..=1.0).contains(&next) {
                break;
            }
            // `!(x > y)` also stops on NaN
            if !(log_likelihood(next, accept, reject) - l_max > -self.drop) {
                break;
            }
            k += 1;
        }
        p + direction * k as f64 * self.step
    }

    /// Mean survivor count and likelihood interval of every cut.
    ///
    /// Arguments
    /// -----------------
    /// * `stats`: per-event cut flows of one threshold; every event counts in the
    ///   denominators, including events without tracks.
    /// * `cut_names`: cuts to summarize, in output order.
    ///
    /// Return
    /// ----------
    /// * One [`CutSummary`] per name, or [`TrackQcError::EmptyAggregation`] when
    ///   `stats` is empty and `cut_names` is not.
    pub fn summarize(
        &self,
        stats: &EventStatsMap,
        cut_names: &[String],
    ) -> Result<CutFlowSummary, TrackQcError> {
        let n_events = stats.len();
        let mut cuts = Vec::with_capacity(cut_names.len());
        for name in cut_names {
            let counts = stats.values().map(|s| s.count(name));
            let total: u64 = counts.clone().sum();
            let accept = counts.filter(|&c| c > 0).count();
            let reject = n_events - accept;
            let (ci_low, ci_high) = self.interval(accept, reject)?;
            cuts.push(CutSummary {
                name: name.clone(),
                mean: total as f64 / n_events as f64,
                ci_low,
                ci_high,
                accept,
                reject,
            });
        }
        Ok(CutFlowSummary { cuts })
    }
}

#[cfg(test)]
mod statistics_test {
    use super::*;
    use crate::analysis::cuts::{CutFlow, EventStats};
    use approx::assert_relative_eq;

    fn stats(events: &[&[u64]], names: &[&str]) -> EventStatsMap {
        events
            .iter()
            .enumerate()
            .map(|(id, counts)| {
                let mut flow = CutFlow::new(names.iter().copied());
                for (name, &count) in names.iter().zip(counts.iter()) {
                    for _ in 0..count {
                        flow.increment(name);
                    }
                }
                (id as u32, EventStats { cut_flow: flow })
            })
            .collect()
    }

    #[test]
    fn test_log_likelihood_boundaries() {
        assert_eq!(log_likelihood(0.0, 0, 10), 0.0);
        assert_eq!(log_likelihood(1.0, 10, 0), 0.0);
        assert_eq!(log_likelihood(1.0, 3, 1), f64::NEG_INFINITY);
        assert_relative_eq!(log_likelihood(0.5, 1, 1), 2.0 * 0.5f64.ln());
    }

    #[test]
    fn test_symmetric_interval() {
        let agg = StatisticsAggregator::default();
        let (low, high) = agg.interval(50, 50).unwrap();
        assert!((low - high).abs() <= 1e-4);
        // Gaussian approximation: sqrt(p(1-p)/n) = 0.05
        assert_relative_eq!(low, 0.05, epsilon = 2e-3);
    }

    #[test]
    fn test_sub_step_bound_is_zero() {
        let agg = StatisticsAggregator::default();
        assert_eq!(agg.interval(0, 100_000).unwrap(), (0.0, 0.0));
        assert_eq!(agg.interval(100_000, 0).unwrap(), (0.0, 0.0));
    }

    #[test]
    fn test_two_event_interval() {
        let agg = StatisticsAggregator::default();
        let (low, high) = agg.interval(1, 1).unwrap();
        // Solution of q(1-q) = e^-0.5 / 4
        let q = (1.0 - (1.0 - (-0.5f64).exp()).sqrt()) / 2.0;
        assert_relative_eq!(low, 0.5 - q, epsilon = 2e-4);
        assert_relative_eq!(high, 0.5 - q, epsilon = 2e-4);
    }

    #[test]
    fn test_degenerate_intervals_are_bounded() {
        let agg = StatisticsAggregator::default();

        let (low, high) = agg.interval(0, 10).unwrap();
        assert_eq!(low, 0.0);
        // 10·ln(1-q) > -0.5  ⇔  q < 1 - e^-0.05
        assert_relative_eq!(high, 1.0 - (-0.05f64).exp(), epsilon = 2e-4);

        let (low, high) = agg.interval(10, 0).unwrap();
        assert_eq!(high, 0.0);
        assert_relative_eq!(low, 1.0 - (-0.05f64).exp(), epsilon = 2e-4);

        // A single accepted event: ln(q) > -0.5
        let (low, high) = agg.interval(1, 0).unwrap();
        assert_eq!(high, 0.0);
        assert_relative_eq!(low, 1.0 - (-0.5f64).exp(), epsilon = 2e-4);

        assert_eq!(agg.interval(0, 0), Err(TrackQcError::EmptyAggregation));
    }

    #[test]
    fn test_summarize_means_and_counts() {
        let names = ["cut0", "cut1", "cut2"];
        let map = stats(&[&[3, 3, 2], &[1, 0, 0], &[0, 0, 0]], &names);
        let cut_names: Vec<String> = names.iter().map(|s| s.to_string()).collect();

        let summary = StatisticsAggregator::default()
            .summarize(&map, &cut_names)
            .unwrap();

        assert_eq!(summary.len(), 3);
        assert_relative_eq!(summary.cuts[0].mean, 4.0 / 3.0);
        assert_relative_eq!(summary.cuts[1].mean, 1.0);
        assert_relative_eq!(summary.cuts[2].mean, 2.0 / 3.0);
        assert_eq!((summary.cuts[0].accept, summary.cuts[0].reject), (2, 1));
        assert_eq!((summary.cuts[2].accept, summary.cuts[2].reject), (1, 2));
        assert_relative_eq!(summary.get("cut1").unwrap().efficiency(), 1.0 / 3.0);
    }

    #[test]
    fn test_summarize_empty() {
        let agg = StatisticsAggregator::default();
        let empty = EventStatsMap::new();
        assert_eq!(
            agg.summarize(&empty, &["cut".to_string()]),
            Err(TrackQcError::EmptyAggregation)
        );
        assert!(agg.summarize(&empty, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_display() {
        let summary = CutFlowSummary {
            cuts: vec![CutSummary {
                name: "ndf".into(),
                mean: 1.5,
                ci_low: 0.25,
                ci_high: 0.125,
                accept: 1,
                reject: 1,
            }],
        };
        assert_eq!(summary.to_string(), "ndf=1.5000 (-0.2500/+0.1250)");
        assert!(format!("{summary:#}").contains("ndf"));
    }
}
