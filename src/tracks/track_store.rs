//! # Track sources and in-memory storage
//!
//! The scanner never reads files itself: it pulls tracks through the [`TrackSource`]
//! trait, once per event and per scan threshold. [`TrackStore`] is the in-memory
//! implementation, filled from Parquet files or in-memory vectors through the
//! [`TrackFile`] trait.
//!
//! ## Data model
//! -----------------
//! - A [`TrackStore`] is a `BTreeMap<EventId, Vec<Track>>`: events are served in
//!   ascending id order, tracks of one event in insertion order.
//! - [`TrackSource::tracks_for_event`] always returns **owned copies**, so the
//!   in-place flagging done by the deduplication pass never reaches the store.
//!
//! ## Ingestion sources
//! -----------------
//! - [`TrackFile::new_from_parquet`] / [`TrackFile::add_from_parquet`] – flat Parquet
//!   table, one row per track (see `parquet_reader` for the schema). Errors propagate.
//! - [`TrackFile::new_from_vec`] / [`TrackFile::add_from_vec`] – already-built tracks,
//!   grouped by their `event_id`.
use std::collections::BTreeMap;

use camino::Utf8Path;

use crate::constants::EventId;
use crate::trackqc_errors::TrackQcError;
use crate::tracks::parquet_reader::parquet_to_tracks;
use crate::tracks::Track;

/// Provider of per-event track collections.
pub trait TrackSource {
    /// Identifiers of every event known to the source, in ascending order.
    fn event_ids(&self) -> Vec<EventId>;

    /// Fresh copies of the tracks of one event.
    ///
    /// Unknown events yield an empty vector.
    fn tracks_for_event(&self, event_id: EventId) -> Result<Vec<Track>, TrackQcError>;

    /// Fresh copies of every track of every event, event by event.
    fn all_tracks(&self) -> Result<Vec<Track>, TrackQcError> {
        let mut tracks = Vec::new();
        for id in self.event_ids() {
            tracks.extend(self.tracks_for_event(id)?);
        }
        Ok(tracks)
    }
}

/// In-memory track collection bucketed by event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackStore {
    events: BTreeMap<EventId, Vec<Track>>,
}

impl TrackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one track to the bucket of its event.
    pub fn insert(&mut self, track: Track) {
        self.events.entry(track.event_id).or_default().push(track);
    }

    /// Register an event without tracks.
    ///
    /// Empty events still count in the aggregation denominators.
    pub fn insert_empty_event(&mut self, event_id: EventId) {
        self.events.entry(event_id).or_default();
    }

    #[inline]
    pub fn number_of_events(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn total_tracks(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Extend<Track> for TrackStore {
    fn extend<I: IntoIterator<Item = Track>>(&mut self, iter: I) {
        for track in iter {
            self.insert(track);
        }
    }
}

impl FromIterator<Track> for TrackStore {
    fn from_iter<I: IntoIterator<Item = Track>>(iter: I) -> Self {
        let mut store = TrackStore::new();
        store.extend(iter);
        store
    }
}

impl TrackSource for TrackStore {
    fn event_ids(&self) -> Vec<EventId> {
        self.events.keys().copied().collect()
    }

    fn tracks_for_event(&self, event_id: EventId) -> Result<Vec<Track>, TrackQcError> {
        Ok(self.events.get(&event_id).cloned().unwrap_or_default())
    }
}

pub trait TrackFile {
    /// Build a new store from a Parquet track table.
    ///
    /// Arguments
    /// -----------------
    /// * `parquet`: path to the Parquet file.
    /// * `batch_size`: optional Arrow reader batch size (default: 8192 rows).
    ///
    /// Return
    /// ----------
    /// * The populated store, or the first schema/I/O error met.
    fn new_from_parquet(parquet: &Utf8Path, batch_size: Option<usize>) -> Result<Self, TrackQcError>
    where
        Self: Sized;

    /// Append the tracks of a Parquet track table to an existing store.
    fn add_from_parquet(
        &mut self,
        parquet: &Utf8Path,
        batch_size: Option<usize>,
    ) -> Result<(), TrackQcError>;

    /// Build a new store from already-built tracks.
    fn new_from_vec(tracks: Vec<Track>) -> Self
    where
        Self: Sized;

    /// Append already-built tracks to an existing store.
    fn add_from_vec(&mut self, tracks: Vec<Track>);
}

impl TrackFile for TrackStore {
    fn new_from_parquet(
        parquet: &Utf8Path,
        batch_size: Option<usize>,
    ) -> Result<Self, TrackQcError> {
        let mut store = TrackStore::new();
        store.add_from_parquet(parquet, batch_size)?;
        Ok(store)
    }

    fn add_from_parquet(
        &mut self,
        parquet: &Utf8Path,
        batch_size: Option<usize>,
    ) -> Result<(), TrackQcError> {
        let tracks = parquet_to_tracks(parquet, batch_size)?;
        let n_tracks = tracks.len();
        self.extend(tracks);
        log::info!(
            "Loaded {n_tracks} tracks from {parquet} ({} events in store)",
            self.number_of_events()
        );
        Ok(())
    }

    fn new_from_vec(tracks: Vec<Track>) -> Self {
        tracks.into_iter().collect()
    }

    fn add_from_vec(&mut self, tracks: Vec<Track>) {
        self.extend(tracks);
    }
}
