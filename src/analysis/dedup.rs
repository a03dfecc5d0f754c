//! # Ambiguity resolution
//!
//! Flags, without removing or reordering anything, the track candidates of one event
//! that should not be counted as independent tracks:
//!
//! * [`resolve_overlaps`] – pairs sharing a measured hit: the worse fit is flagged
//!   `is_overlap`.
//! * [`resolve_multiplicity`] – every track but the best-fitting one is flagged
//!   `is_multiple`.
//!
//! Both passes rank tracks by `χ²/ndf` (lower is better) and set their flags
//! independently; a track may carry both. Flags are only ever raised here, so callers
//! re-running an event must clear them first ([`Track::reset_flags`]).
use std::cmp::Ordering;

use itertools::Itertools;

use crate::tracks::Track;

/// Two measured-hit sequences overlap when they have the same length and at least one
/// index holds exactly the same position.
pub fn shares_hit(a: &Track, b: &Track) -> bool {
    a.track_hits.len() == b.track_hits.len()
        && a.track_hits
            .iter()
            .zip(b.track_hits.iter())
            .any(|(ha, hb)| ha == hb)
}

/// Flag the worse-fitting track of every overlapping pair.
///
/// For a pair `(i, j)` with `i < j`, track `j` is flagged when `χ²/ndf(i) < χ²/ndf(j)`,
/// otherwise track `i` is flagged (ties and `NaN` ratios flag the earlier track).
/// A track left unflagged by one pair may still be flagged by another.
///
/// Complexity is `O(n²)` in the number of tracks of the event.
pub fn resolve_overlaps(tracks: &mut [Track]) {
    for i in 0..tracks.len() {
        for j in (i + 1)..tracks.len() {
            if !shares_hit(&tracks[i], &tracks[j]) {
                continue;
            }
            if tracks[i].chi2_ndf() < tracks[j].chi2_ndf() {
                tracks[j].is_overlap = true;
            } else {
                tracks[i].is_overlap = true;
            }
        }
    }
}

/// Keep the best-fitting track unflagged and flag all others as `is_multiple`.
///
/// The best track has the smallest `χ²/ndf`; among equal ratios the first one in input
/// order wins, and `NaN` ratios rank after every number. The overlap flag is ignored.
pub fn resolve_multiplicity(tracks: &mut [Track]) {
    let Some(best) = tracks
        .iter()
        .position_min_by(|a, b| nan_last(a.chi2_ndf(), b.chi2_ndf()))
    else {
        return;
    };
    for (i, track) in tracks.iter_mut().enumerate() {
        track.is_multiple = i != best;
    }
}

/// Overlap pass followed by the multiplicity pass.
pub fn deduplicate(tracks: &mut [Track]) {
    resolve_overlaps(tracks);
    resolve_multiplicity(tracks);
}

fn nan_last(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b)
        .unwrap_or_else(|| a.is_nan().cmp(&b.is_nan()))
}
