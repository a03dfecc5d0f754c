//! # Metric table
//!
//! Named scalar quantities extracted from a [`Track`], each optionally carrying an
//! inclusive acceptance range (which turns it into a **cut**) and the binning used
//! when its distribution is histogrammed.
//!
//! The [`MetricTable`] is the single configuration surface of the analysis: adding a
//! plotted quantity or a new cut means adding one [`Metric`] entry. Table order is cut
//! order.
//!
//! The table is never modified in place. [`MetricTable::with_range`] returns a rebuilt
//! copy, which is how the threshold scanner narrows the scan cut for each iteration.
use std::f64::consts::FRAC_PI_2;

use crate::trackqc_errors::TrackQcError;
use crate::tracks::{phi, theta, Track};

/// Inclusive acceptance interval `[low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutRange {
    pub low: f64,
    pub high: f64,
}

impl CutRange {
    pub const fn new(low: f64, high: f64) -> Self {
        CutRange { low, high }
    }

    /// Degenerate interval `[value, value]`: exact match only.
    pub const fn exact(value: f64) -> Self {
        CutRange {
            low: value,
            high: value,
        }
    }

    /// `low <= value <= high`. `NaN` is never contained.
    #[inline]
    pub fn contains(&self, value: f64) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Uniform binning of a metric histogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramShape {
    pub n_bins: usize,
    pub low: f64,
    pub high: f64,
}

impl HistogramShape {
    pub const fn new(n_bins: usize, low: f64, high: f64) -> Self {
        HistogramShape { n_bins, low, high }
    }
}

/// Extraction function of a metric.
///
/// Divisions are not guarded: a zero `ndf`, a zero truth component or a zero error
/// produces `±inf`/`NaN`, which then fails any bounded cut.
#[derive(Debug, Clone, Copy)]
pub enum MetricKind {
    MatchingDegree,
    Ndf,
    IsOverlap,
    IsMultiple,
    Chi2Ndf,

    IpPx,
    IpPy,
    IpPz,
    E,

    IpPxTruth,
    IpPyTruth,
    IpPzTruth,
    ETruth,

    /// Relative errors `(truth - estimate) / truth`
    IpPxErr,
    IpPyErr,
    IpPzErr,
    EErr,

    VertexXSignificance,
    VertexZSignificance,
    /// `(φ - π/2) / σ_x` of the IP momentum
    IpMomentumPhiSignificance,
    /// `(θ - π/2) / σ_y` of the IP momentum
    IpMomentumThetaSignificance,

    Custom(fn(&Track) -> f64),
}

fn relative_error(truth: f64, estimate: f64) -> f64 {
    (truth - estimate) / truth
}

impl MetricKind {
    pub fn eval(&self, track: &Track) -> f64 {
        let p = &track.ip_momentum;
        let p_truth = &track.ip_momentum_truth;
        match self {
            MetricKind::MatchingDegree => track.matching_degree,
            MetricKind::Ndf => track.ndf as f64,
            MetricKind::IsOverlap => f64::from(u8::from(track.is_overlap)),
            MetricKind::IsMultiple => f64::from(u8::from(track.is_multiple)),
            MetricKind::Chi2Ndf => track.chi2_ndf(),

            MetricKind::IpPx => p.x,
            MetricKind::IpPy => p.y,
            MetricKind::IpPz => p.z,
            MetricKind::E => p.w,

            MetricKind::IpPxTruth => p_truth.x,
            MetricKind::IpPyTruth => p_truth.y,
            MetricKind::IpPzTruth => p_truth.z,
            MetricKind::ETruth => p_truth.w,

            MetricKind::IpPxErr => relative_error(p_truth.x, p.x),
            MetricKind::IpPyErr => relative_error(p_truth.y, p.y),
            MetricKind::IpPzErr => relative_error(p_truth.z, p.z),
            MetricKind::EErr => relative_error(p_truth.w, p.w),

            MetricKind::VertexXSignificance => track.vertex.x / track.vertex_error.x,
            MetricKind::VertexZSignificance => track.vertex.z / track.vertex_error.z,
            MetricKind::IpMomentumPhiSignificance => {
                (phi(p) - FRAC_PI_2) / track.ip_momentum_error.x
            }
            MetricKind::IpMomentumThetaSignificance => {
                (theta(p) - FRAC_PI_2) / track.ip_momentum_error.y
            }

            MetricKind::Custom(f) => f(track),
        }
    }
}

/// One entry of the [`MetricTable`].
#[derive(Debug, Clone)]
pub struct Metric {
    pub name: String,
    pub kind: MetricKind,
    /// Acceptance range; `Some` makes the metric a cut.
    pub range: Option<CutRange>,
    pub histogram: HistogramShape,
}

impl Metric {
    /// A plotted-only metric.
    pub fn new(name: impl Into<String>, kind: MetricKind, histogram: HistogramShape) -> Self {
        Metric {
            name: name.into(),
            kind,
            range: None,
            histogram,
        }
    }

    /// Turn the metric into a cut.
    pub fn with_cut(mut self, range: CutRange) -> Self {
        self.range = Some(range);
        self
    }

    #[inline]
    pub fn value(&self, track: &Track) -> f64 {
        self.kind.eval(track)
    }

    #[inline]
    pub fn is_cut(&self) -> bool {
        self.range.is_some()
    }
}

/// Ordered, immutable list of metrics.
#[derive(Debug, Clone)]
pub struct MetricTable {
    metrics: Vec<Metric>,
}

impl MetricTable {
    pub fn new(metrics: Vec<Metric>) -> Self {
        MetricTable { metrics }
    }

    pub fn metrics(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn get(&self, name: &str) -> Option<&Metric> {
        self.metrics.iter().find(|m| m.name == name)
    }

    /// Metrics with a range, in table order.
    pub fn cuts(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter().filter(|m| m.is_cut())
    }

    pub fn cut_names(&self) -> Vec<String> {
        self.cuts().map(|m| m.name.clone()).collect()
    }

    /// Copy of the table where `name` carries `range`.
    ///
    /// A metric without a range becomes a cut at its table position.
    ///
    /// Return
    /// ----------
    /// * The rebuilt table, or [`TrackQcError::UnknownMetric`] if no metric is named `name`.
    pub fn with_range(&self, name: &str, range: CutRange) -> Result<MetricTable, TrackQcError> {
        if self.get(name).is_none() {
            return Err(TrackQcError::UnknownMetric(name.to_string()));
        }
        let metrics = self
            .metrics
            .iter()
            .map(|m| {
                if m.name == name {
                    m.clone().with_cut(range)
                } else {
                    m.clone()
                }
            })
            .collect();
        Ok(MetricTable { metrics })
    }
}

impl Default for MetricTable {
    /// Standard table: fit-quality and inter-track cuts, kinematic distributions.
    fn default() -> Self {
        use MetricKind::*;
        let h = HistogramShape::new;
        MetricTable::new(vec![
            // D.o.F. performance
            Metric::new("matchingDegree", MatchingDegree, h(100, 0.0, 1.0))
                .with_cut(CutRange::new(0.0, 1.0)),
            Metric::new("ndf", Ndf, h(100, 0.0, 100.0)).with_cut(CutRange::exact(8.0)),
            // Inter-track performance
            Metric::new("isOverlap", IsOverlap, h(2, 0.0, 1.0)).with_cut(CutRange::exact(0.0)),
            Metric::new("isMultiple", IsMultiple, h(2, 0.0, 1.0)).with_cut(CutRange::exact(0.0)),
            // KF fit performance
            Metric::new("chi2ndf", Chi2Ndf, h(100, 0.0, 3.0)).with_cut(CutRange::new(0.0, 2.2)),
            // KF-estimated kinematics
            Metric::new("ipPx", IpPx, h(100, -0.1, 0.1)),
            Metric::new("ipPy", IpPy, h(100, 1.0, 4.5)),
            Metric::new("ipPz", IpPz, h(100, -0.5, 0.5)),
            Metric::new("E", E, h(100, 1.0, 4.5)),
            // Truth kinematics
            Metric::new("ipPxTruth", IpPxTruth, h(100, -0.02, 0.02)),
            Metric::new("ipPyTruth", IpPyTruth, h(100, 1.0, 4.5)),
            Metric::new("ipPzTruth", IpPzTruth, h(100, -0.01, 0.01)),
            Metric::new("ETruth", ETruth, h(100, 1.0, 4.5)),
            // Kinematics errors
            Metric::new("ipPxErr", IpPxErr, h(1000, -1000.0, 1000.0)),
            Metric::new("ipPyErr", IpPyErr, h(100, -0.2, 0.2)),
            Metric::new("ipPzErr", IpPzErr, h(1000, -1000.0, 1000.0)),
            Metric::new("EErr", EErr, h(100, -0.2, 0.2)),
            // Significances
            Metric::new("vertexXSignificance", VertexXSignificance, h(100, -10.0, 10.0)),
            Metric::new("vertexZSignificance", VertexZSignificance, h(100, -30.0, 30.0)),
            Metric::new(
                "ipMomentumPhiSignificance",
                IpMomentumPhiSignificance,
                h(100, -40.0, 40.0),
            ),
            Metric::new(
                "ipMomentumThetaSignificance",
                IpMomentumThetaSignificance,
                h(200, -60.0, 80.0),
            ),
        ])
    }
}
