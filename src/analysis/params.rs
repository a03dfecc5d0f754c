//! # Scan configuration
//!
//! [`ScanParams`] groups the tunables of a threshold scan. Build it through
//! [`ScanParams::builder`], which validates every value in [`ScanParamsBuilder::build`].
//!
//! ```rust
//! use trackqc::analysis::params::ScanParams;
//!
//! let params = ScanParams::builder()
//!     .scan_metric("matchingDegree")
//!     .likelihood_step(1e-4)
//!     .likelihood_drop(0.5)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.scan_metric, "matchingDegree");
//! ```
use crate::constants::{LIKELIHOOD_DROP, LIKELIHOOD_STEP, SCAN_METRIC};
use crate::trackqc_errors::TrackQcError;

#[derive(Debug, Clone, PartialEq)]
pub struct ScanParams {
    /// Metric whose distinct values are swept, one exact-match cut per value
    pub scan_metric: String,
    /// Step of the profile-likelihood scan
    pub likelihood_step: f64,
    /// Log-likelihood drop defining the interval bounds
    pub likelihood_drop: f64,
}

impl ScanParams {
    pub fn builder() -> ScanParamsBuilder {
        ScanParamsBuilder::new()
    }
}

impl Default for ScanParams {
    fn default() -> Self {
        ScanParams {
            scan_metric: SCAN_METRIC.to_string(),
            likelihood_step: LIKELIHOOD_STEP,
            likelihood_drop: LIKELIHOOD_DROP,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScanParamsBuilder {
    params: ScanParams,
}

impl Default for ScanParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanParamsBuilder {
    /// Create a new builder initialized with default values.
    pub fn new() -> Self {
        Self {
            params: ScanParams::default(),
        }
    }

    pub fn scan_metric(mut self, v: impl Into<String>) -> Self {
        self.params.scan_metric = v.into();
        self
    }
    pub fn likelihood_step(mut self, v: f64) -> Self {
        self.params.likelihood_step = v;
        self
    }
    pub fn likelihood_drop(mut self, v: f64) -> Self {
        self.params.likelihood_drop = v;
        self
    }

    /// Validate and return the parameters.
    ///
    /// Return
    /// ----------
    /// * [`TrackQcError::InvalidScanParameter`] if the step is not in `(0, 1]`, the drop
    ///   is not strictly positive and finite, or the scan metric name is empty.
    pub fn build(self) -> Result<ScanParams, TrackQcError> {
        let p = &self.params;

        if p.scan_metric.is_empty() {
            return Err(TrackQcError::InvalidScanParameter(
                "scan_metric must not be empty".into(),
            ));
        }
        if !(p.likelihood_step > 0.0 && p.likelihood_step <= 1.0) {
            return Err(TrackQcError::InvalidScanParameter(
                "likelihood_step must be in (0, 1]".into(),
            ));
        }
        if !(p.likelihood_drop.is_finite() && p.likelihood_drop > 0.0) {
            return Err(TrackQcError::InvalidScanParameter(
                "likelihood_drop must be finite and > 0".into(),
            ));
        }

        Ok(self.params)
    }
}

#[cfg(test)]
mod params_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = ScanParams::builder().build().unwrap();
        assert_eq!(params, ScanParams::default());
        assert_eq!(params.scan_metric, "matchingDegree");
        assert_eq!(params.likelihood_step, 1e-4);
        assert_eq!(params.likelihood_drop, 0.5);
    }

    #[test]
    fn test_invalid_values() {
        let err = |b: ScanParamsBuilder| b.build().unwrap_err();

        assert_eq!(
            err(ScanParams::builder().likelihood_step(0.0)),
            TrackQcError::InvalidScanParameter("likelihood_step must be in (0, 1]".into())
        );
        assert_eq!(
            err(ScanParams::builder().likelihood_step(f64::NAN)),
            TrackQcError::InvalidScanParameter("likelihood_step must be in (0, 1]".into())
        );
        assert_eq!(
            err(ScanParams::builder().likelihood_drop(f64::INFINITY)),
            TrackQcError::InvalidScanParameter("likelihood_drop must be finite and > 0".into())
        );
        assert_eq!(
            err(ScanParams::builder().scan_metric("")),
            TrackQcError::InvalidScanParameter("scan_metric must not be empty".into())
        );
    }
}
