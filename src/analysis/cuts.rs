//! # Cut pipeline and cut flows
//!
//! A [`CutPipeline`] is the ordered list of cuts taken from a [`MetricTable`] (every
//! metric with a range, in table order). Each track runs through it until the first
//! failing cut; every cut passed so far increments its counter in the event's
//! [`EventStats`].
//!
//! Counters are therefore **cumulative**: the count of cut `i` is the number of tracks
//! that passed cuts `0..=i` in sequence, and counts never increase along the pipeline.
//!
//! Comparisons are plain floating-point comparisons: a `NaN` metric value fails its
//! cut, so does an infinite one unless the range itself is infinite.
use std::fmt;

use crate::analysis::metrics::{CutRange, MetricKind, MetricTable};
use crate::tracks::Track;

/// Ordered `cut name → cumulative survivor count` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CutFlow {
    flow: Vec<(String, u64)>,
}

impl CutFlow {
    /// A zero-valued flow over `names`, in the given order.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CutFlow {
            flow: names.into_iter().map(|n| (n.into(), 0)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.flow.iter().find(|(n, _)| n == name).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.flow.iter().map(|(n, c)| (n.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.flow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flow.is_empty()
    }

    /// Increment `name`, appending it if the flow does not know it yet.
    pub fn increment(&mut self, name: &str) {
        match self.flow.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += 1,
            None => self.flow.push((name.to_string(), 1)),
        }
    }

    /// `true` when counts never increase along the flow order.
    pub fn is_non_increasing(&self) -> bool {
        self.flow.windows(2).all(|w| w[0].1 >= w[1].1)
    }
}

impl fmt::Display for CutFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(n, c)| format!("{n}={c}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Cut flow of one event for one scan threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    pub cut_flow: CutFlow,
}

impl EventStats {
    /// Survivor count at `cut`; cuts never reached count as zero.
    pub fn count(&self, cut: &str) -> u64 {
        self.cut_flow.get(cut).unwrap_or(0)
    }
}

/// One acceptance cut of the pipeline.
#[derive(Debug, Clone)]
pub struct Cut {
    pub name: String,
    pub range: CutRange,
    pub kind: MetricKind,
}

impl Cut {
    #[inline]
    pub fn passes(&self, track: &Track) -> bool {
        self.range.contains(self.kind.eval(track))
    }
}

#[derive(Debug, Clone)]
pub struct CutPipeline {
    cuts: Vec<Cut>,
}

impl CutPipeline {
    /// Collect the cuts of `table`, in table order.
    pub fn new(table: &MetricTable) -> Self {
        let cuts = table
            .metrics()
            .iter()
            .filter_map(|m| {
                m.range.map(|range| Cut {
                    name: m.name.clone(),
                    range,
                    kind: m.kind,
                })
            })
            .collect();
        CutPipeline { cuts }
    }

    pub fn cuts(&self) -> &[Cut] {
        &self.cuts
    }

    pub fn cut_names(&self) -> Vec<String> {
        self.cuts().iter().map(|c| c.name.clone()).collect()
    }

    /// Zero-valued statistics covering every cut of the pipeline.
    pub fn new_event_stats(&self) -> EventStats {
        EventStats {
            cut_flow: CutFlow::new(self.cuts().iter().map(|c| c.name.as_str())),
        }
    }

    /// Run `track` through the cuts, recording survivors in `stats`.
    ///
    /// Return
    /// ----------
    /// * `true` if the track passed every cut (accepted), `false` at the first failure.
    ///   No counter is touched for the failing cut or any later one.
    pub fn process_track(&self, track: &Track, stats: &mut EventStats) -> bool {
        for cut in &self.cuts {
            if !cut.passes(track) {
                return false;
            }
            stats.cut_flow.increment(&cut.name);
        }
        true
    }
}
