//! # Constants and type definitions for trackqc
//!
//! This module centralizes the **numerical defaults** and the **common type definitions**
//! shared by the readers, the cut pipeline, the threshold scanner and the statistics
//! aggregator.
//!
//! ## Overview
//!
//! - Defaults of the profile-likelihood scan (step size, log-likelihood drop)
//! - Default name of the scan metric and default Parquet batch size
//! - Identifier aliases for events and tracks
//! - Container aliases for hit sequences and per-threshold statistics

use std::collections::BTreeMap;

use nalgebra::Vector3;
use ordered_float::OrderedFloat;
use smallvec::SmallVec;

use crate::analysis::cuts::EventStats;

// -------------------------------------------------------------------------------------------------
// Numerical defaults
// -------------------------------------------------------------------------------------------------

/// Step of the discretized profile-likelihood scan
pub const LIKELIHOOD_STEP: f64 = 1e-4;

/// Log-likelihood drop defining the interval bounds (≈ 1σ for one parameter)
pub const LIKELIHOOD_DROP: f64 = 0.5;

/// Metric swept by the threshold scanner
pub const SCAN_METRIC: &str = "matchingDegree";

/// Arrow record batch size used by the Parquet reader
pub const DEFAULT_BATCH_SIZE: usize = 8192;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Identifier of a detector readout event
pub type EventId = u32;

/// Identifier of a track inside its event
pub type TrackId = i32;

/// Ordered sequence of 3D hit positions (or residuals / pulls) along a track
pub type Hits = SmallVec<[Vector3<f64>; 8]>;

/// Per-event cut flows of a single scan threshold
pub type EventStatsMap = BTreeMap<EventId, EventStats>;

/// Per-event cut flows of every scan threshold, ordered by threshold value
pub type ThresholdResult = BTreeMap<OrderedFloat<f64>, EventStatsMap>;
