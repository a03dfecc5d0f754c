#![allow(dead_code)]

use std::fs::File;
use std::sync::Arc;

use arrow_array::types::Float64Type;
use arrow_array::{ArrayRef, Float64Array, Int32Array, ListArray, RecordBatch, UInt32Array};
use camino::Utf8Path;
use nalgebra::Vector3;
use parquet::arrow::ArrowWriter;

use trackqc::analysis::metrics::{CutRange, HistogramShape, Metric, MetricKind, MetricTable};
use trackqc::constants::Hits;
use trackqc::tracks::track_store::{TrackFile, TrackStore};
use trackqc::tracks::{LorentzVector, Track};

/// Track with three measured hits unique to `(event_id, track_id)`.
pub fn track(event_id: u32, track_id: i32, matching_degree: f64, chi2: f64, ndf: i32) -> Track {
    let x = f64::from(event_id) * 100.0 + f64::from(track_id);
    Track {
        event_id,
        track_id,
        matching_degree,
        chi2,
        ndf,
        track_hits: (0..3).map(|k| Vector3::new(x, k as f64, 0.0)).collect(),
        ..Default::default()
    }
}

/// `matchingDegree`, `ndf ∈ [8, 8]`, `chi2ndf ∈ [0, 2.2]`.
pub fn scenario_table() -> MetricTable {
    let h = HistogramShape::new(10, 0.0, 10.0);
    MetricTable::new(vec![
        Metric::new("matchingDegree", MetricKind::MatchingDegree, h)
            .with_cut(CutRange::new(0.0, 1.0)),
        Metric::new("ndf", MetricKind::Ndf, h).with_cut(CutRange::exact(8.0)),
        Metric::new("chi2ndf", MetricKind::Chi2Ndf, h).with_cut(CutRange::new(0.0, 2.2)),
    ])
}

/// Event 1: three tracks passing `ndf`, two of them passing `chi2ndf`.
/// Event 2: one track failing `ndf`.
/// Every track has a matching degree of `0.9`.
pub fn scenario_store() -> TrackStore {
    TrackStore::new_from_vec(vec![
        track(1, 0, 0.9, 8.0, 8),
        track(1, 1, 0.9, 12.0, 8),
        track(1, 2, 0.9, 24.0, 8),
        track(2, 0, 0.9, 8.0, 5),
    ])
}

/// Fully populated track, every vector field distinct.
pub fn full_track(event_id: u32, track_id: i32, n_hits: usize) -> Track {
    let base = f64::from(event_id) * 10.0 + f64::from(track_id);
    let hits = |offset: f64| -> Hits {
        (0..n_hits)
            .map(|k| Vector3::new(base + offset, k as f64, -(k as f64)))
            .collect()
    };
    Track {
        event_id,
        track_id,
        true_track_hits: hits(0.1),
        track_hits: hits(0.2),
        predicted_track_hits: hits(0.3),
        filtered_track_hits: hits(0.4),
        smoothed_track_hits: hits(0.5),
        true_predicted_residuals: hits(1.1),
        true_filtered_residuals: hits(1.2),
        true_smoothed_residuals: hits(1.3),
        predicted_residuals: hits(1.4),
        filtered_residuals: hits(1.5),
        smoothed_residuals: hits(1.6),
        true_predicted_pulls: hits(2.1),
        true_filtered_pulls: hits(2.2),
        true_smoothed_pulls: hits(2.3),
        predicted_pulls: hits(2.4),
        filtered_pulls: hits(2.5),
        smoothed_pulls: hits(2.6),
        matching_degree: 0.75,
        chi2: 12.5,
        ndf: 8,
        ip_momentum: LorentzVector::new(0.01, 2.5, -0.1, 2.6),
        ip_momentum_truth: LorentzVector::new(0.0, 2.4, 0.0, 2.5),
        ip_momentum_error: Vector3::new(0.001, 0.002, 0.003),
        vertex: Vector3::new(0.1, 0.2, 0.3),
        vertex_truth: Vector3::new(0.0, 0.0, 0.0),
        vertex_error: Vector3::new(0.05, 0.05, 0.1),
        is_overlap: false,
        is_multiple: false,
    }
}

fn list_column<F>(tracks: &[Track], values: F) -> ArrayRef
where
    F: Fn(&Track) -> Vec<f64>,
{
    Arc::new(ListArray::from_iter_primitive::<Float64Type, _, _>(
        tracks
            .iter()
            .map(|t| Some(values(t).into_iter().map(Some).collect::<Vec<_>>())),
    ))
}

fn flatten(hits: &Hits) -> Vec<f64> {
    hits.iter().flat_map(|h| [h.x, h.y, h.z]).collect()
}

type HitsGetter = fn(&Track) -> &Hits;

const HIT_COLUMNS: [(&str, HitsGetter); 17] = [
    ("true_track_hits", |t| &t.true_track_hits),
    ("track_hits", |t| &t.track_hits),
    ("predicted_track_hits", |t| &t.predicted_track_hits),
    ("filtered_track_hits", |t| &t.filtered_track_hits),
    ("smoothed_track_hits", |t| &t.smoothed_track_hits),
    ("true_predicted_residuals", |t| &t.true_predicted_residuals),
    ("true_filtered_residuals", |t| &t.true_filtered_residuals),
    ("true_smoothed_residuals", |t| &t.true_smoothed_residuals),
    ("predicted_residuals", |t| &t.predicted_residuals),
    ("filtered_residuals", |t| &t.filtered_residuals),
    ("smoothed_residuals", |t| &t.smoothed_residuals),
    ("true_predicted_pulls", |t| &t.true_predicted_pulls),
    ("true_filtered_pulls", |t| &t.true_filtered_pulls),
    ("true_smoothed_pulls", |t| &t.true_smoothed_pulls),
    ("predicted_pulls", |t| &t.predicted_pulls),
    ("filtered_pulls", |t| &t.filtered_pulls),
    ("smoothed_pulls", |t| &t.smoothed_pulls),
];

/// Every column of the track table, in the reader's layout, except those in `skip`.
pub fn tracks_to_batch(tracks: &[Track], skip: &[&str]) -> RecordBatch {
    let mut columns: Vec<(&str, ArrayRef)> = vec![
        (
            "event_id",
            Arc::new(UInt32Array::from_iter_values(tracks.iter().map(|t| t.event_id))) as ArrayRef,
        ),
        (
            "track_id",
            Arc::new(Int32Array::from_iter_values(tracks.iter().map(|t| t.track_id))) as ArrayRef,
        ),
        (
            "ndf",
            Arc::new(Int32Array::from_iter_values(tracks.iter().map(|t| t.ndf))) as ArrayRef,
        ),
        (
            "chi2",
            Arc::new(Float64Array::from_iter_values(tracks.iter().map(|t| t.chi2))) as ArrayRef,
        ),
        (
            "matching_degree",
            Arc::new(Float64Array::from_iter_values(
                tracks.iter().map(|t| t.matching_degree),
            )) as ArrayRef,
        ),
        (
            "ip_momentum",
            list_column(tracks, |t| t.ip_momentum.iter().copied().collect()),
        ),
        (
            "ip_momentum_truth",
            list_column(tracks, |t| t.ip_momentum_truth.iter().copied().collect()),
        ),
        (
            "ip_momentum_error",
            list_column(tracks, |t| t.ip_momentum_error.iter().copied().collect()),
        ),
        (
            "vertex",
            list_column(tracks, |t| t.vertex.iter().copied().collect()),
        ),
        (
            "vertex_truth",
            list_column(tracks, |t| t.vertex_truth.iter().copied().collect()),
        ),
        (
            "vertex_error",
            list_column(tracks, |t| t.vertex_error.iter().copied().collect()),
        ),
    ];
    for (name, getter) in HIT_COLUMNS {
        columns.push((name, list_column(tracks, |t| flatten(getter(t)))));
    }

    RecordBatch::try_from_iter(columns.into_iter().filter(|(name, _)| !skip.contains(name)))
        .unwrap()
}

pub fn write_batch(path: &Utf8Path, batch: &RecordBatch) {
    let file = File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
    writer.write(batch).unwrap();
    writer.close().unwrap();
}

pub fn write_tracks(path: &Utf8Path, tracks: &[Track]) {
    write_batch(path, &tracks_to_batch(tracks, &[]));
}
