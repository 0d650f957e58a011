//! Nominal rate table keyed by loan duration
//!
//! Lenders quote rates for a handful of duration anchors (15, 20 and 25 years).
//! Durations between anchors are linearly interpolated, durations outside the
//! table are pinned to the nearest endpoint.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annual nominal rates (percent) by duration anchor in years
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    anchors: BTreeMap<u32, f64>,
}

impl RateTable {
    /// Create from `(duration_years, annual_rate_percent)` pairs
    pub fn from_pairs(pairs: &[(u32, f64)]) -> Self {
        Self {
            anchors: pairs.iter().copied().collect(),
        }
    }

    /// Default market grid at the 15/20/25 year anchors
    pub fn default_market() -> Self {
        Self::from_pairs(&[(15, 2.95), (20, 3.09), (25, 3.20)])
    }

    pub fn set_rate(&mut self, duration_years: u32, annual_rate_percent: f64) {
        self.anchors.insert(duration_years, annual_rate_percent);
    }

    pub fn rate_at(&self, duration_years: u32) -> Option<f64> {
        self.anchors.get(&duration_years).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn anchors(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.anchors.iter().map(|(&d, &r)| (d, r))
    }

    /// Annual rate (percent) for an arbitrary duration
    ///
    /// Returns 0.0 for a zero duration or an empty table; callers must read
    /// that as "rate unavailable".
    pub fn interpolate(&self, duration_years: u32) -> f64 {
        if duration_years == 0 {
            return 0.0;
        }
        if let Some(rate) = self.rate_at(duration_years) {
            return rate;
        }

        let below = self.anchors.range(..duration_years).next_back();
        let above = self.anchors.range(duration_years..).next();

        match (below, above) {
            (Some((&d1, &r1)), Some((&d2, &r2))) => {
                let weight = (duration_years - d1) as f64 / (d2 - d1) as f64;
                r1 + (r2 - r1) * weight
            }
            // Shorter than the first anchor
            (None, Some((_, &r))) => r,
            // Longer than the last anchor
            (Some((_, &r)), None) => r,
            (None, None) => 0.0,
        }
    }
}
