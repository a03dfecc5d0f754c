//! # Threshold scan
//!
//! Treats the scan metric (matching degree by default) as a categorical selector: the
//! whole per-event analysis is repeated once for every distinct value `t` it takes in
//! the data, with the scan cut narrowed to the exact-match range `[t, t]`.
//!
//! ## One iteration
//! -----------------
//! 1. Rebuild the metric table with the scan metric ranged to `[t, t]`
//!    ([`MetricTable::with_range`]) and derive its [`CutPipeline`].
//! 2. For every event of the [`TrackSource`], in ascending id order:
//!    fetch fresh tracks, clear their flags, [`deduplicate`], run every track through
//!    the pipeline and hand the accepted ones to the [`CutFlowSink`].
//!    Events without tracks still get a zero-valued [`EventStats`].
//! 3. Summarize the per-event flows with the [`StatisticsAggregator`] and pass the
//!    summary to the sink.
//!
//! Iterations share nothing mutable: each one owns its fetched tracks and its
//! [`EventStatsMap`], so [`ThresholdScanner::run_threshold`] can be driven
//! independently for each threshold.
//!
//! ## Example
//! -----------------
//! ```rust
//! use trackqc::analysis::histogram::HistogramSink;
//! use trackqc::analysis::metrics::MetricTable;
//! use trackqc::analysis::params::ScanParams;
//! use trackqc::analysis::scanner::ThresholdScanner;
//! use trackqc::tracks::track_store::TrackStore;
//!
//! let store = TrackStore::new();
//! let scanner = ThresholdScanner::new(MetricTable::default(), ScanParams::default()).unwrap();
//! let mut sink = HistogramSink::new(scanner.table().clone());
//! let outcome = scanner.run(&store, &mut sink).unwrap();
//! assert!(outcome.thresholds.is_empty());
//! ```
use std::collections::BTreeMap;

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::analysis::cuts::{CutPipeline, EventStats};
use crate::analysis::dedup::deduplicate;
use crate::analysis::metrics::{CutRange, MetricKind, MetricTable};
use crate::analysis::params::ScanParams;
use crate::analysis::progress_bar::ScanProgress;
use crate::analysis::report::CutFlowSink;
use crate::analysis::statistics::{CutFlowSummary, StatisticsAggregator};
use crate::constants::{EventId, EventStatsMap, ThresholdResult};
use crate::trackqc_errors::TrackQcError;
use crate::tracks::track_store::TrackSource;

/// Totals of a full scan.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanReport {
    /// Accepted tracks summed over every threshold
    pub accepted_tracks: u64,
    /// Events of the source
    pub events: usize,
    /// Scan thresholds processed
    pub thresholds: usize,
}

impl ScanReport {
    /// Accepted tracks per event, `0` for a source without events.
    pub fn tracks_per_event(&self) -> f64 {
        if self.events == 0 {
            0.0
        } else {
            self.accepted_tracks as f64 / self.events as f64
        }
    }
}

/// Result of a single threshold iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdIteration {
    pub stats: EventStatsMap,
    pub summary: CutFlowSummary,
    pub accepted_tracks: u64,
}

/// Result of a full scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanOutcome {
    pub thresholds: ThresholdResult,
    pub summaries: BTreeMap<OrderedFloat<f64>, CutFlowSummary>,
    pub report: ScanReport,
}

#[derive(Debug, Clone)]
pub struct ThresholdScanner {
    table: MetricTable,
    scan_kind: MetricKind,
    params: ScanParams,
    aggregator: StatisticsAggregator,
}

impl ThresholdScanner {
    /// Bind a metric table and the scan parameters.
    ///
    /// Return
    /// ----------
    /// * [`TrackQcError::UnknownMetric`] if `params.scan_metric` is not in `table`.
    pub fn new(table: MetricTable, params: ScanParams) -> Result<Self, TrackQcError> {
        let scan_kind = table
            .get(&params.scan_metric)
            .map(|m| m.kind)
            .ok_or_else(|| TrackQcError::UnknownMetric(params.scan_metric.clone()))?;
        Ok(ThresholdScanner {
            aggregator: StatisticsAggregator::from_params(&params),
            table,
            scan_kind,
            params,
        })
    }

    pub fn table(&self) -> &MetricTable {
        &self.table
    }

    pub fn params(&self) -> &ScanParams {
        &self.params
    }

    /// Distinct values of the scan metric over every track of `source`, ascending.
    ///
    /// Values are compared exactly; `NaN` values are skipped.
    pub fn scan_values<S>(&self, source: &S) -> Result<Vec<f64>, TrackQcError>
    where
        S: TrackSource + ?Sized,
    {
        let tracks = source.all_tracks()?;
        Ok(tracks
            .iter()
            .map(|t| self.scan_kind.eval(t))
            .filter(|v| !v.is_nan())
            .map(OrderedFloat)
            .sorted()
            .dedup()
            .map(|v| v.0)
            .collect())
    }

    /// Run the analysis of every event for one scan threshold.
    ///
    /// Arguments
    /// -----------------
    /// * `source`: provider of the per-event tracks.
    /// * `event_ids`: events to process; all of them enter the aggregation denominators.
    /// * `threshold`: exact value required from the scan metric.
    /// * `sink`: receives the accepted tracks and the summary.
    ///
    /// Return
    /// ----------
    /// * The per-event flows, their summary and the accepted-track count, or the first
    ///   error of the source, the aggregator or the sink.
    pub fn run_threshold<S, K>(
        &self,
        source: &S,
        event_ids: &[EventId],
        threshold: f64,
        sink: &mut K,
    ) -> Result<ThresholdIteration, TrackQcError>
    where
        S: TrackSource + ?Sized,
        K: CutFlowSink + ?Sized,
    {
        let table = self
            .table
            .with_range(&self.params.scan_metric, CutRange::exact(threshold))?;
        let pipeline = CutPipeline::new(&table);

        sink.begin_threshold(threshold);

        let mut stats = EventStatsMap::new();
        let mut accepted_tracks = 0u64;
        for &event_id in event_ids {
            let mut tracks = source.tracks_for_event(event_id)?;
            tracks.iter_mut().for_each(|t| t.reset_flags());
            deduplicate(&mut tracks);

            let mut event_stats: EventStats = pipeline.new_event_stats();
            for track in &tracks {
                if pipeline.process_track(track, &mut event_stats) {
                    accepted_tracks += 1;
                    sink.fill(threshold, track);
                }
            }
            log::debug!("threshold {threshold}, event {event_id}: {}", event_stats.cut_flow);
            stats.insert(event_id, event_stats);
        }

        let summary = self.aggregator.summarize(&stats, &pipeline.cut_names())?;
        sink.record_cut_flow(threshold, &summary)?;

        log::info!("threshold {threshold}: {accepted_tracks} accepted tracks | {summary}");

        Ok(ThresholdIteration {
            stats,
            summary,
            accepted_tracks,
        })
    }

    /// Sweep every distinct scan value of `source`.
    ///
    /// Return
    /// ----------
    /// * The per-threshold event flows and summaries plus the run totals, or the first
    ///   error encountered. An empty source yields an empty outcome.
    pub fn run<S, K>(&self, source: &S, sink: &mut K) -> Result<ScanOutcome, TrackQcError>
    where
        S: TrackSource + ?Sized,
        K: CutFlowSink + ?Sized,
    {
        let event_ids = source.event_ids();
        let values = self.scan_values(source)?;
        log::info!(
            "Scanning {} values of {} over {} events",
            values.len(),
            self.params.scan_metric,
            event_ids.len()
        );

        let mut outcome = ScanOutcome {
            report: ScanReport {
                events: event_ids.len(),
                thresholds: values.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        let mut progress = ScanProgress::new(values.len());
        for threshold in values {
            progress.start(threshold);
            let iteration = self.run_threshold(source, &event_ids, threshold, sink)?;
            outcome.report.accepted_tracks += iteration.accepted_tracks;
            outcome
                .thresholds
                .insert(OrderedFloat(threshold), iteration.stats);
            outcome
                .summaries
                .insert(OrderedFloat(threshold), iteration.summary);
            progress.done();
        }
        progress.finish();

        log::info!(
            "Total number of accepted tracks: {}",
            outcome.report.accepted_tracks
        );
        log::info!(
            "Total number of accepted tracks per event: {:.4}",
            outcome.report.tracks_per_event()
        );

        Ok(outcome)
    }
}
