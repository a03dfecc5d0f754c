//! # Output sinks
//!
//! The scanner hands two kinds of output to a [`CutFlowSink`]:
//!
//! * every **accepted track** of a threshold iteration (for distribution recording),
//! * the per-cut **summary** of that iteration once every event has been processed.
//!
//! [`CsvCutFlowWriter`] persists the summaries as CSV rows
//! `threshold,cut,mean,ci_low,ci_high,accept,reject`;
//! [`HistogramSink`](crate::analysis::histogram::HistogramSink) keeps histograms and
//! summaries in memory. A pair `(A, B)` of sinks forwards everything to both.
use std::fs::File;
use std::io;

use camino::Utf8Path;
use serde::Serialize;

use crate::analysis::statistics::CutFlowSummary;
use crate::trackqc_errors::TrackQcError;
use crate::tracks::Track;

/// Receiver of the scanner outputs.
pub trait CutFlowSink {
    /// Called once before the events of `threshold` are processed.
    fn begin_threshold(&mut self, _threshold: f64) {}

    /// An accepted track of the `threshold` iteration.
    fn fill(&mut self, threshold: f64, track: &Track);

    /// The cut-flow summary of the `threshold` iteration.
    fn record_cut_flow(
        &mut self,
        threshold: f64,
        summary: &CutFlowSummary,
    ) -> Result<(), TrackQcError>;
}

impl<A: CutFlowSink, B: CutFlowSink> CutFlowSink for (A, B) {
    fn begin_threshold(&mut self, threshold: f64) {
        self.0.begin_threshold(threshold);
        self.1.begin_threshold(threshold);
    }

    fn fill(&mut self, threshold: f64, track: &Track) {
        self.0.fill(threshold, track);
        self.1.fill(threshold, track);
    }

    fn record_cut_flow(
        &mut self,
        threshold: f64,
        summary: &CutFlowSummary,
    ) -> Result<(), TrackQcError> {
        self.0.record_cut_flow(threshold, summary)?;
        self.1.record_cut_flow(threshold, summary)
    }
}

#[derive(Debug, Serialize)]
struct CutFlowRow<'a> {
    threshold: f64,
    cut: &'a str,
    mean: f64,
    ci_low: f64,
    ci_high: f64,
    accept: usize,
    reject: usize,
}

/// CSV persistence of the per-threshold cut flows; accepted tracks are ignored.
pub struct CsvCutFlowWriter<W: io::Write> {
    writer: csv::Writer<W>,
}

impl CsvCutFlowWriter<File> {
    pub fn from_path(path: &Utf8Path) -> Result<Self, TrackQcError> {
        Ok(CsvCutFlowWriter {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: io::Write> CsvCutFlowWriter<W> {
    pub fn new(inner: W) -> Self {
        CsvCutFlowWriter {
            writer: csv::Writer::from_writer(inner),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> Result<W, TrackQcError> {
        self.writer
            .into_inner()
            .map_err(|e| TrackQcError::IoError(e.into_error()))
    }
}

impl<W: io::Write> CutFlowSink for CsvCutFlowWriter<W> {
    fn fill(&mut self, _threshold: f64, _track: &Track) {}

    fn record_cut_flow(
        &mut self,
        threshold: f64,
        summary: &CutFlowSummary,
    ) -> Result<(), TrackQcError> {
        for cut in summary.iter() {
            self.writer.serialize(CutFlowRow {
                threshold,
                cut: &cut.name,
                mean: cut.mean,
                ci_low: cut.ci_low,
                ci_high: cut.ci_high,
                accept: cut.accept,
                reject: cut.reject,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
