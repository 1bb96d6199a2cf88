/// Signal classification
///
/// Splits validated points by reported strength. The valid window is open on
/// both ends: exactly -150 dBm is a dead-zone candidate and exactly 0 dBm is
/// a sentinel.

use serde::Serialize;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::measurement::LocatedMeasurement;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignalClass {
    /// Plausible dBm reading.
    Valid,
    /// At or below the floor: a dead zone or a "no reading" marker.
    Invalid,
    /// At or above the ceiling, missing, or NaN. Excluded from analysis.
    Sentinel,
}

pub fn classify_strength(strength_dbm: Option<f64>, config: &AnalysisConfig) -> SignalClass {
    match strength_dbm {
        Some(s) if s > config.signal_floor_dbm && s < config.signal_ceiling_dbm => SignalClass::Valid,
        Some(s) if s <= config.signal_floor_dbm => SignalClass::Invalid,
        _ => SignalClass::Sentinel,
    }
}

/// Disjoint, order-preserving split of the validated set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalPartition {
    pub valid: Vec<LocatedMeasurement>,
    pub invalid: Vec<LocatedMeasurement>,
    pub sentinel: Vec<LocatedMeasurement>,
}

impl SignalPartition {
    pub fn len(&self) -> usize {
        self.valid.len() + self.invalid.len() + self.sentinel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn classify_signals(validated: &[LocatedMeasurement], config: &AnalysisConfig) -> SignalPartition {
    let mut partition = SignalPartition::default();

    for point in validated {
        let bucket = match classify_strength(point.signal_strength_dbm, config) {
            SignalClass::Valid => &mut partition.valid,
            SignalClass::Invalid => &mut partition.invalid,
            SignalClass::Sentinel => &mut partition.sentinel,
        };
        bucket.push(point.clone());
    }

    info!(
        valid = partition.valid.len(),
        invalid = partition.invalid.len(),
        sentinel = partition.sentinel.len(),
        "classified signal strength"
    );

    partition
}
