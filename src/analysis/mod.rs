//! # Track quality analysis
//!
//! Per-event ambiguity resolution, cumulative cut flows and the matching-degree
//! threshold scan with profile-likelihood efficiency intervals.
//!
//! Modules
//! -----------------
//! * [`metrics`](crate::analysis::metrics) – The [`MetricTable`](crate::analysis::metrics::MetricTable):
//!   named per-track quantities, cut ranges and histogram binnings.
//! * [`dedup`](crate::analysis::dedup) – Overlap and multiplicity flagging within one event.
//! * [`cuts`](crate::analysis::cuts) – The ordered [`CutPipeline`](crate::analysis::cuts::CutPipeline)
//!   and per-event [`EventStats`](crate::analysis::cuts::EventStats).
//! * [`statistics`](crate::analysis::statistics) – Mean survivor counts and likelihood intervals.
//! * [`scanner`](crate::analysis::scanner) – The [`ThresholdScanner`](crate::analysis::scanner::ThresholdScanner)
//!   driving everything above once per scan value.
//! * [`params`](crate::analysis::params) – [`ScanParams`](crate::analysis::params::ScanParams) and its builder.
//! * [`report`](crate::analysis::report) – The [`CutFlowSink`](crate::analysis::report::CutFlowSink)
//!   seam and the CSV cut-flow writer.
//! * [`histogram`](crate::analysis::histogram) – Accepted-track histograms.
//! * *(crate-private)* `progress_bar` – Optional progress UI when the `progress` feature is enabled.
//!
//! Features
//! -----------------
//! * `progress` — live progress bar and per-threshold timing during a scan.
pub mod cuts;
pub mod dedup;
pub mod histogram;
pub mod metrics;
pub mod params;
pub(crate) mod progress_bar;
pub mod report;
pub mod scanner;
pub mod statistics;
