//! # Metric histograms
//!
//! In-memory recording of the accepted-track distributions of a scan.
//!
//! ## Overview
//! -----------------
//! * [`Histogram1D`] – uniform binning with underflow, overflow and `NaN` counters.
//! * [`TrackHistogramSet`] – one histogram per metric of a [`MetricTable`], named
//!   `<metric>_<suffix>`, binned with the metric's [`HistogramShape`].
//! * [`HistogramSink`] – a [`CutFlowSink`] keeping one set and one cut-flow summary per
//!   scan threshold (the threshold is the name suffix).
//!
//! Sets are exported as CSV with one row per bin:
//! `histogram,bin,low,high,count`. Underflow, overflow and `NaN` counts are written as
//! bins `underflow`, `overflow` and `nan` with empty edges.
use std::collections::BTreeMap;
use std::io;

use ordered_float::OrderedFloat;
use serde::Serialize;

use crate::analysis::metrics::{HistogramShape, Metric, MetricTable};
use crate::analysis::report::CutFlowSink;
use crate::analysis::statistics::CutFlowSummary;
use crate::trackqc_errors::TrackQcError;
use crate::tracks::Track;

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram1D {
    pub name: String,
    pub shape: HistogramShape,
    bins: Vec<u64>,
    underflow: u64,
    overflow: u64,
    nan: u64,
}

impl Histogram1D {
    pub fn new(name: impl Into<String>, shape: HistogramShape) -> Self {
        Histogram1D {
            name: name.into(),
            shape,
            bins: vec![0; shape.n_bins],
            underflow: 0,
            overflow: 0,
            nan: 0,
        }
    }

    /// Bins are `[low + i·w, low + (i+1)·w)`; `high` itself goes to the overflow.
    pub fn fill(&mut self, value: f64) {
        let HistogramShape { n_bins, low, high } = self.shape;
        if value.is_nan() {
            self.nan += 1;
        } else if value < low {
            self.underflow += 1;
        } else if value >= high || n_bins == 0 {
            self.overflow += 1;
        } else {
            let index = ((value - low) / (high - low) * n_bins as f64) as usize;
            self.bins[index.min(n_bins - 1)] += 1;
        }
    }

    pub fn bins(&self) -> &[u64] {
        &self.bins
    }

    pub fn underflow(&self) -> u64 {
        self.underflow
    }

    pub fn overflow(&self) -> u64 {
        self.overflow
    }

    pub fn nan(&self) -> u64 {
        self.nan
    }

    /// Every fill, including out-of-range and `NaN` values.
    pub fn entries(&self) -> u64 {
        self.bins.iter().sum::<u64>() + self.underflow + self.overflow + self.nan
    }

    /// `(low, high)` edges of bin `index`.
    pub fn bin_edges(&self, index: usize) -> (f64, f64) {
        let HistogramShape { n_bins, low, high } = self.shape;
        let width = (high - low) / n_bins as f64;
        (low + index as f64 * width, low + (index + 1) as f64 * width)
    }
}

#[derive(Debug, Serialize)]
struct BinRow<'a> {
    histogram: &'a str,
    bin: String,
    low: Option<f64>,
    high: Option<f64>,
    count: u64,
}

/// Histograms of every metric of a table for one scan threshold.
#[derive(Debug, Clone)]
pub struct TrackHistogramSet {
    histograms: Vec<(Metric, Histogram1D)>,
}

impl TrackHistogramSet {
    pub fn new(table: &MetricTable, suffix: &str) -> Self {
        let histograms = table
            .metrics()
            .iter()
            .map(|m| {
                (
                    m.clone(),
                    Histogram1D::new(format!("{}_{suffix}", m.name), m.histogram),
                )
            })
            .collect();
        TrackHistogramSet { histograms }
    }

    pub fn fill(&mut self, track: &Track) {
        for (metric, histogram) in &mut self.histograms {
            histogram.fill(metric.value(track));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Histogram1D> {
        self.iter().find(|h| h.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Histogram1D> {
        self.histograms.iter().map(|(_, h)| h)
    }

    pub fn len(&self) -> usize {
        self.histograms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histograms.is_empty()
    }

    /// Write every histogram as CSV rows to `writer`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), TrackQcError> {
        let mut csv = csv::Writer::from_writer(writer);
        for histogram in self.iter() {
            for (i, &count) in histogram.bins().iter().enumerate() {
                let (low, high) = histogram.bin_edges(i);
                csv.serialize(BinRow {
                    histogram: &histogram.name,
                    bin: i.to_string(),
                    low: Some(low),
                    high: Some(high),
                    count,
                })?;
            }
            for (bin, count) in [
                ("underflow", histogram.underflow()),
                ("overflow", histogram.overflow()),
                ("nan", histogram.nan()),
            ] {
                csv.serialize(BinRow {
                    histogram: &histogram.name,
                    bin: bin.to_string(),
                    low: None,
                    high: None,
                    count,
                })?;
            }
        }
        csv.flush()?;
        Ok(())
    }
}

/// In-memory sink: one histogram set and one summary per threshold.
#[derive(Debug, Clone)]
pub struct HistogramSink {
    table: MetricTable,
    sets: BTreeMap<OrderedFloat<f64>, TrackHistogramSet>,
    summaries: BTreeMap<OrderedFloat<f64>, CutFlowSummary>,
}

impl HistogramSink {
    pub fn new(table: MetricTable) -> Self {
        HistogramSink {
            table,
            sets: BTreeMap::new(),
            summaries: BTreeMap::new(),
        }
    }

    pub fn histograms(&self, threshold: f64) -> Option<&TrackHistogramSet> {
        self.sets.get(&OrderedFloat(threshold))
    }

    pub fn summary(&self, threshold: f64) -> Option<&CutFlowSummary> {
        self.summaries.get(&OrderedFloat(threshold))
    }

    /// Recorded thresholds, ascending.
    pub fn thresholds(&self) -> Vec<f64> {
        self.sets.keys().map(|t| t.0).collect()
    }

    fn set_mut(&mut self, threshold: f64) -> &mut TrackHistogramSet {
        let table = &self.table;
        self.sets
            .entry(OrderedFloat(threshold))
            .or_insert_with(|| TrackHistogramSet::new(table, &threshold.to_string()))
    }
}

impl CutFlowSink for HistogramSink {
    fn begin_threshold(&mut self, threshold: f64) {
        self.set_mut(threshold);
    }

    fn fill(&mut self, threshold: f64, track: &Track) {
        self.set_mut(threshold).fill(track);
    }

    fn record_cut_flow(
        &mut self,
        threshold: f64,
        summary: &CutFlowSummary,
    ) -> Result<(), TrackQcError> {
        self.summaries
            .insert(OrderedFloat(threshold), summary.clone());
        Ok(())
    }
}
