/// Analysis configuration
///
/// Every stage takes an `&AnalysisConfig` instead of reading module-level
/// constants. The defaults are the fixed survey constants; alternate values
/// exist so tests can move thresholds without touching shared state.

use serde::{Deserialize, Serialize};

/// Mean earth radius used for every great-circle computation (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Readings at or below this value are invalid signal (dBm, exclusive bound for valid).
    pub signal_floor_dbm: f64,
    /// Readings at or above this value are sentinel/erroneous (dBm, exclusive bound for valid).
    pub signal_ceiling_dbm: f64,
    /// A valid reading strictly closer than this clears a dead-zone candidate.
    pub dead_zone_radius_m: f64,
    pub earth_radius_m: f64,
    pub max_valid_markers: usize,
    pub max_dead_zone_markers: usize,
    pub downsample_seed: u64,
    /// Quality tier cut-offs for map colouring.
    pub good_signal_dbm: f64,
    pub fair_signal_dbm: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            signal_floor_dbm: -150.0,
            signal_ceiling_dbm: 0.0,
            dead_zone_radius_m: 10.0,
            earth_radius_m: EARTH_RADIUS_M,
            max_valid_markers: 50_000,
            max_dead_zone_markers: 30_000,
            downsample_seed: 42,
            good_signal_dbm: -90.0,
            fair_signal_dbm: -105.0,
        }
    }
}

impl AnalysisConfig {
    /// Dead-zone radius expressed as a central angle.
    pub fn dead_zone_radius_rad(&self) -> f64 {
        self.dead_zone_radius_m / self.earth_radius_m
    }

    pub fn earth_radius_km(&self) -> f64 {
        self.earth_radius_m / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_survey_constants() {
        let config = AnalysisConfig::default();
        assert_eq!(config.signal_floor_dbm, -150.0);
        assert_eq!(config.signal_ceiling_dbm, 0.0);
        assert_eq!(config.dead_zone_radius_m, 10.0);
        assert_eq!(config.dead_zone_radius_rad(), 10.0 / 6_371_000.0);
        assert_eq!(config.max_valid_markers, 50_000);
        assert_eq!(config.max_dead_zone_markers, 30_000);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: AnalysisConfig = config_from_csv("dead_zone_radius_m", 25.0);
        assert_eq!(config.dead_zone_radius_m, 25.0);
        assert_eq!(config.signal_floor_dbm, -150.0);
    }

    // A one-column record leaves every other field to #[serde(default)].
    fn config_from_csv(field: &str, value: f64) -> AnalysisConfig {
        let data = format!("{}\n{}\n", field, value);
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        rdr.deserialize().next().unwrap().unwrap()
    }
}
