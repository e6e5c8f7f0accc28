//! # Hazard Classification
//!
//! Maps a continuous model output onto five ordinal hazard levels using four
//! ascending thresholds. Bands are inclusive at the lower edge, so a value
//! equal to a threshold lands in the higher band. `NaN` has no level.

use crate::error::{HazardError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal hazard level, 0 (negligible) to 4 (severe).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum HazardLevel {
    Negligible = 0,
    Low = 1,
    Moderate = 2,
    High = 3,
    Severe = 4,
}

impl HazardLevel {
    pub const ALL: [HazardLevel; 5] = [
        HazardLevel::Negligible,
        HazardLevel::Low,
        HazardLevel::Moderate,
        HazardLevel::High,
        HazardLevel::Severe,
    ];

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Colour name used by the chart collaborators for this level.
    pub fn color_name(self) -> &'static str {
        match self {
            HazardLevel::Negligible => "lightgrey",
            HazardLevel::Low => "yellowgreen",
            HazardLevel::Moderate => "orange",
            HazardLevel::High => "orangered",
            HazardLevel::Severe => "darkred",
        }
    }
}

impl From<HazardLevel> for u8 {
    fn from(level: HazardLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for HazardLevel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        HazardLevel::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("hazard level out of range: {value}"))
    }
}

impl fmt::Display for HazardLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// Four strictly ascending band edges `[t1, t2, t3, t4]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds(pub [f64; 4]);

impl Thresholds {
    /// Build a threshold set, rejecting non-finite or non-ascending edges.
    pub fn new(edges: [f64; 4]) -> Result<Self> {
        let thresholds = Thresholds(edges);
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.0.iter().any(|t| !t.is_finite()) {
            return Err(HazardError::InvalidInput(format!(
                "thresholds must be finite: {:?}",
                self.0
            )));
        }
        if self.0.windows(2).any(|w| w[0] >= w[1]) {
            return Err(HazardError::InvalidInput(format!(
                "thresholds must be strictly ascending: {:?}",
                self.0
            )));
        }
        Ok(())
    }

    pub fn classify(&self, value: f64) -> Option<HazardLevel> {
        classify(value, &self.0)
    }
}

/// Level for `value` in bands `[−∞,t1) [t1,t2) [t2,t3) [t3,t4) [t4,+∞)`.
///
/// Returns `None` for `NaN`, which means "no hazard computable", never level 0.
///
/// # Example
/// ```
/// use beach_hazard_lib::classify::{classify, HazardLevel};
///
/// let edges = [5.0, 20.0, 50.0, 90.0];
/// assert_eq!(classify(20.0, &edges), Some(HazardLevel::Moderate));
/// assert_eq!(classify(f64::NAN, &edges), None);
/// ```
pub fn classify(value: f64, thresholds: &[f64; 4]) -> Option<HazardLevel> {
    if value.is_nan() {
        return None;
    }
    let band = thresholds.iter().take_while(|&&t| value >= t).count();
    HazardLevel::ALL.get(band).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTENDANCE: [f64; 4] = [5.0, 20.0, 50.0, 90.0];
    const RIP: [f64; 4] = [0.3006, 0.9107, 1.3764, 1.8915];

    #[test]
    fn test_band_interiors() {
        assert_eq!(classify(0.0, &ATTENDANCE), Some(HazardLevel::Negligible));
        assert_eq!(classify(10.0, &ATTENDANCE), Some(HazardLevel::Low));
        assert_eq!(classify(30.0, &ATTENDANCE), Some(HazardLevel::Moderate));
        assert_eq!(classify(70.0, &ATTENDANCE), Some(HazardLevel::High));
        assert_eq!(classify(95.0, &ATTENDANCE), Some(HazardLevel::Severe));
    }

    #[test]
    fn test_boundary_values_take_higher_band() {
        for (i, &t) in RIP.iter().enumerate() {
            assert_eq!(classify(t, &RIP).map(HazardLevel::as_u8), Some(i as u8 + 1));
        }
    }

    #[test]
    fn test_total_on_reals() {
        assert_eq!(classify(f64::NEG_INFINITY, &RIP), Some(HazardLevel::Negligible));
        assert_eq!(classify(f64::INFINITY, &RIP), Some(HazardLevel::Severe));
        assert_eq!(classify(-1e300, &RIP), Some(HazardLevel::Negligible));
        assert_eq!(classify(f64::NAN, &RIP), None);
    }

    #[test]
    fn test_thresholds_validation() {
        assert!(Thresholds::new(RIP).is_ok());
        assert!(Thresholds::new([1.0, 1.0, 2.0, 3.0]).is_err());
        assert!(Thresholds::new([3.0, 2.0, 1.0, 0.0]).is_err());
        assert!(Thresholds::new([0.0, 1.0, f64::NAN, 3.0]).is_err());
    }

    #[test]
    fn test_level_serializes_as_integer() {
        let json = serde_json::to_string(&HazardLevel::High).unwrap();
        assert_eq!(json, "3");
        let back: HazardLevel = serde_json::from_str("4").unwrap();
        assert_eq!(back, HazardLevel::Severe);
        assert!(serde_json::from_str::<HazardLevel>("7").is_err());
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(HazardLevel::Negligible.color_name(), "lightgrey");
        assert_eq!(HazardLevel::Severe.color_name(), "darkred");
    }
}
