/// Coordinate validation
///
/// Drops rows without a usable GPS fix. A coordinate is unusable when it is
/// missing, non-finite, or exactly zero (the logger writes 0 when it has no
/// fix). Nothing here fails: rejected rows are counted and skipped.

use serde::Serialize;
use tracing::info;

use crate::measurement::{LocatedMeasurement, MeasurementRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ValidationCounts {
    pub total: usize,
    pub valid_location: usize,
    /// Missing or non-numeric latitude/longitude.
    pub missing_coordinate: usize,
    /// Latitude or longitude exactly 0.
    pub zero_placeholder: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    pub validated: Vec<LocatedMeasurement>,
    pub counts: ValidationCounts,
}

enum Rejection {
    Missing,
    ZeroPlaceholder,
}

fn usable_coordinate(value: Option<f64>) -> Result<f64, Rejection> {
    match value {
        Some(v) if !v.is_finite() => Err(Rejection::Missing),
        Some(v) if v == 0.0 => Err(Rejection::ZeroPlaceholder),
        Some(v) => Ok(v),
        None => Err(Rejection::Missing),
    }
}

fn locate(record: &MeasurementRecord) -> Result<LocatedMeasurement, Rejection> {
    let lat = usable_coordinate(record.latitude);
    let lon = usable_coordinate(record.longitude);

    // A missing value outranks a placeholder when both coordinates are bad.
    let (latitude, longitude) = match (lat, lon) {
        (Ok(lat), Ok(lon)) => (lat, lon),
        (Err(Rejection::Missing), _) | (_, Err(Rejection::Missing)) => return Err(Rejection::Missing),
        _ => return Err(Rejection::ZeroPlaceholder),
    };

    Ok(LocatedMeasurement {
        latitude,
        longitude,
        signal_strength_dbm: record.signal_strength_dbm,
        network_type: record.network_type.clone(),
        band: record.band,
        time: record.time.clone(),
        source_id: record.source_id.clone(),
    })
}

/// Keep records with a usable location, in input order.
pub fn validate_locations(records: &[MeasurementRecord]) -> ValidationOutcome {
    let mut outcome = ValidationOutcome {
        validated: Vec::with_capacity(records.len()),
        counts: ValidationCounts {
            total: records.len(),
            ..Default::default()
        },
    };

    for record in records {
        match locate(record) {
            Ok(located) => outcome.validated.push(located),
            Err(Rejection::Missing) => outcome.counts.missing_coordinate += 1,
            Err(Rejection::ZeroPlaceholder) => outcome.counts.zero_placeholder += 1,
        }
    }
    outcome.counts.valid_location = outcome.validated.len();

    info!(
        total = outcome.counts.total,
        valid_location = outcome.counts.valid_location,
        missing = outcome.counts.missing_coordinate,
        zero_placeholder = outcome.counts.zero_placeholder,
        "validated coordinates"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::SourceId;

    fn raw(lat: Option<f64>, lon: Option<f64>) -> MeasurementRecord {
        MeasurementRecord {
            latitude: lat,
            longitude: lon,
            signal_strength_dbm: Some(-80.0),
            network_type: None,
            band: None,
            time: None,
            source_id: SourceId::new("a.csv"),
        }
    }

    #[test]
    fn test_excludes_missing_and_zero_coordinates() {
        let records = vec![
            raw(Some(10.0), Some(20.0)),
            raw(None, Some(20.0)),
            raw(Some(10.0), None),
            raw(Some(0.0), Some(20.0)),
            raw(Some(10.0), Some(0.0)),
            raw(Some(0.0), Some(0.0)),
            raw(Some(f64::NAN), Some(20.0)),
            raw(Some(-33.9), Some(f64::INFINITY)),
            raw(Some(-33.9), Some(151.2)),
        ];

        let outcome = validate_locations(&records);

        assert_eq!(outcome.validated.len(), 2);
        assert_eq!(outcome.validated[0].latitude, 10.0);
        assert_eq!(outcome.validated[1].longitude, 151.2);
        assert_eq!(outcome.counts.total, 9);
        assert_eq!(outcome.counts.valid_location, 2);
        assert_eq!(outcome.counts.missing_coordinate, 4);
        assert_eq!(outcome.counts.zero_placeholder, 3);
    }

    #[test]
    fn test_negative_zero_is_placeholder() {
        let outcome = validate_locations(&[raw(Some(-0.0), Some(20.0))]);
        assert!(outcome.validated.is_empty());
        assert_eq!(outcome.counts.zero_placeholder, 1);
    }

    #[test]
    fn test_missing_outranks_placeholder() {
        let outcome = validate_locations(&[raw(Some(0.0), None)]);
        assert_eq!(outcome.counts.missing_coordinate, 1);
        assert_eq!(outcome.counts.zero_placeholder, 0);
    }

    #[test]
    fn test_empty_input() {
        let outcome = validate_locations(&[]);
        assert!(outcome.validated.is_empty());
        assert_eq!(outcome.counts, ValidationCounts::default());
    }

    #[test]
    fn test_carries_non_location_fields() {
        let record = MeasurementRecord::new(SourceId::new("b.csv"), 1.5, 2.5, -95.0)
            .with_time("2024-01-01 10:00:00")
            .with_network("LTE", 3);
        let outcome = validate_locations(std::slice::from_ref(&record));
        let located = &outcome.validated[0];
        assert_eq!(located.signal_strength_dbm, Some(-95.0));
        assert_eq!(located.network_type.as_deref(), Some("LTE"));
        assert_eq!(located.band, Some(3));
        assert_eq!(located.time.as_deref(), Some("2024-01-01 10:00:00"));
        assert_eq!(located.source_id.as_str(), "b.csv");
    }
}
