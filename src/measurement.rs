/// Measurement records
///
/// Raw rows arrive with every field optional: ingestion coerces text into
/// numbers and anything that does not parse becomes `None`. Once a row has a
/// usable location it is promoted to a `LocatedMeasurement`, which the rest of
/// the engine consumes read-only.

use geo::{point, Point};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Band value the logger writes when the modem reports no serving band.
pub const NO_SIGNAL_BAND: i64 = -1;

/// Identifies the file (or upload) a record came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn new(name: impl AsRef<str>) -> Self {
        SourceId(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub signal_strength_dbm: Option<f64>,
    pub network_type: Option<String>,
    pub band: Option<i64>,
    /// Timestamp text exactly as logged; parsed only by the trajectory stage.
    pub time: Option<String>,
    pub source_id: SourceId,
}

impl MeasurementRecord {
    /// Record with a location and strength; the remaining fields empty.
    pub fn new(source_id: SourceId, latitude: f64, longitude: f64, signal_strength_dbm: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            signal_strength_dbm: Some(signal_strength_dbm),
            network_type: None,
            band: None,
            time: None,
            source_id,
        }
    }

    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    pub fn with_network(mut self, network_type: impl Into<String>, band: i64) -> Self {
        self.network_type = Some(network_type.into());
        self.band = Some(band);
        self
    }
}

/// A measurement whose coordinates passed validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocatedMeasurement {
    pub latitude: f64,
    pub longitude: f64,
    pub signal_strength_dbm: Option<f64>,
    pub network_type: Option<String>,
    pub band: Option<i64>,
    pub time: Option<String>,
    pub source_id: SourceId,
}

impl LocatedMeasurement {
    pub fn point(&self) -> Point<f64> {
        point!(x: self.longitude, y: self.latitude)
    }
}

/// Parallel coordinate arrays for batch geodesy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinateColumns {
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

impl CoordinateColumns {
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a LocatedMeasurement>,
    {
        let (latitudes, longitudes) = points
            .into_iter()
            .map(|p| (p.latitude, p.longitude))
            .unzip();
        Self { latitudes, longitudes }
    }

    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }
}
