//! # Tracks: data model, sources, and ingestion
//!
//! Reconstructed trajectory candidates ("tracks") as produced by an upstream Kalman-filter
//! fitting stage, and the facilities to **load** and **serve** them per event.
//!
//! Modules
//! -----------------
//! * [`track_store`](crate::tracks::track_store) – In-memory [`TrackStore`](crate::tracks::track_store::TrackStore),
//!   the [`TrackSource`](crate::tracks::track_store::TrackSource) seam used by the scanner, and the
//!   [`TrackFile`](crate::tracks::track_store::TrackFile) ingestion trait.
//! * *(crate-private)* `parquet_reader` – Arrow/Parquet-based ingestion of flat track tables.
//!
//! Data Model
//! -----------------
//! A [`Track`] carries:
//! * identifiers (`event_id`, `track_id`),
//! * fit quality (`chi2`, `ndf`) and the matching degree between measured and true hits,
//! * hit sequences at each processing stage, with residuals and pulls,
//! * the momentum 4-vector `(px, py, pz, E)` at the interaction point, its truth and error,
//! * the vertex position, its truth and error,
//! * two flags, `is_overlap` and `is_multiple`, owned by the deduplication pass.
//!
//! The flags are scoped to one scan iteration: call [`Track::reset_flags`] before
//! resolving an event again.
use nalgebra::{Vector3, Vector4};

use crate::constants::{EventId, Hits, TrackId};

pub(crate) mod parquet_reader;
pub mod track_store;

/// Momentum 4-vector stored as `(px, py, pz, E)`.
pub type LorentzVector = Vector4<f64>;

/// One reconstructed trajectory candidate of one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    pub event_id: EventId,
    pub track_id: TrackId,

    /// Track hits from the true information
    pub true_track_hits: Hits,
    /// Track hits from the measurements
    pub track_hits: Hits,

    /// KF predicted, filtered and smoothed track hits
    pub predicted_track_hits: Hits,
    pub filtered_track_hits: Hits,
    pub smoothed_track_hits: Hits,

    /// KF residuals with respect to the true hits
    pub true_predicted_residuals: Hits,
    pub true_filtered_residuals: Hits,
    pub true_smoothed_residuals: Hits,

    /// KF residuals with respect to the measurements
    pub predicted_residuals: Hits,
    pub filtered_residuals: Hits,
    pub smoothed_residuals: Hits,

    /// KF pulls with respect to the true hits
    pub true_predicted_pulls: Hits,
    pub true_filtered_pulls: Hits,
    pub true_smoothed_pulls: Hits,

    /// KF pulls with respect to the measurements
    pub predicted_pulls: Hits,
    pub filtered_pulls: Hits,
    pub smoothed_pulls: Hits,

    /// Fraction of hits shared between the fitted and the true track
    pub matching_degree: f64,

    pub chi2: f64,
    pub ndf: i32,

    pub ip_momentum: LorentzVector,
    pub ip_momentum_truth: LorentzVector,
    pub ip_momentum_error: Vector3<f64>,

    pub vertex: Vector3<f64>,
    pub vertex_truth: Vector3<f64>,
    pub vertex_error: Vector3<f64>,

    pub is_overlap: bool,
    pub is_multiple: bool,
}

impl Track {
    /// Fit quality normalized by the degrees of freedom.
    ///
    /// `ndf == 0` is not trapped and yields `±inf` or `NaN`; such values fail every
    /// bounded cut downstream.
    #[inline]
    pub fn chi2_ndf(&self) -> f64 {
        self.chi2 / self.ndf as f64
    }

    /// Clear the deduplication flags.
    #[inline]
    pub fn reset_flags(&mut self) {
        self.is_overlap = false;
        self.is_multiple = false;
    }
}

/// Azimuthal angle of a momentum 4-vector, in `(-π, π]`.
#[inline]
pub fn phi(p: &LorentzVector) -> f64 {
    p.y.atan2(p.x)
}

/// Polar angle of a momentum 4-vector with respect to the z axis, in `[0, π]`.
#[inline]
pub fn theta(p: &LorentzVector) -> f64 {
    p.x.hypot(p.y).atan2(p.z)
}
