/// Trajectory aggregation
///
/// Duration and path length are computed per source file and then summed.
/// Chaining points across files would count the idle gap between unrelated
/// recording sessions as travel, so sources are never mixed.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::geodesy::consecutive_distances_m;
use crate::measurement::{CoordinateColumns, LocatedMeasurement, SourceId};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a logged timestamp. Zone-aware stamps are normalised to UTC; naive
/// ones are kept as the logger's local time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }

    // Unix epoch seconds, possibly fractional.
    let secs: f64 = raw.parse().ok()?;
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos).map(|dt| dt.naive_utc())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTrajectory {
    pub source_id: SourceId,
    /// Points with a parseable timestamp.
    pub points: usize,
    pub dropped_timestamps: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub duration_seconds: f64,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrajectoryTotals {
    pub total_duration_seconds: f64,
    pub total_distance_km: f64,
    pub dropped_timestamps: usize,
    pub per_source: Vec<SourceTrajectory>,
}

fn source_trajectory(
    source_id: SourceId,
    points: &[&LocatedMeasurement],
    config: &AnalysisConfig,
) -> SourceTrajectory {
    let mut timed: Vec<(NaiveDateTime, &LocatedMeasurement)> = points
        .iter()
        .filter_map(|p| p.time.as_deref().and_then(parse_timestamp).map(|t| (t, *p)))
        .collect();
    let dropped_timestamps = points.len() - timed.len();

    // Stable: equal timestamps keep their logged order.
    timed.sort_by_key(|(t, _)| *t);

    let start = timed.first().map(|(t, _)| *t);
    let end = timed.last().map(|(t, _)| *t);
    let duration_seconds = match (start, end) {
        (Some(s), Some(e)) => (e - s).num_milliseconds() as f64 / 1000.0,
        _ => 0.0,
    };

    let columns = CoordinateColumns::from_points(timed.iter().map(|(_, p)| *p));
    let distance_m: f64 = consecutive_distances_m(&columns.latitudes, &columns.longitudes, config.earth_radius_m)
        .iter()
        .sum();

    debug!(
        source = %source_id,
        points = timed.len(),
        dropped_timestamps,
        duration_seconds,
        distance_km = distance_m / 1000.0,
        "aggregated source trajectory"
    );

    SourceTrajectory {
        source_id,
        points: timed.len(),
        dropped_timestamps,
        start,
        end,
        duration_seconds,
        distance_km: distance_m / 1000.0,
    }
}

/// Sum per-source spans and path lengths over the validated set.
pub fn aggregate_trajectories(validated: &[LocatedMeasurement], config: &AnalysisConfig) -> TrajectoryTotals {
    let mut order: Vec<SourceId> = Vec::new();
    let mut groups: HashMap<SourceId, Vec<&LocatedMeasurement>> = HashMap::new();
    for point in validated {
        groups
            .entry(point.source_id.clone())
            .or_insert_with(|| {
                order.push(point.source_id.clone());
                Vec::new()
            })
            .push(point);
    }

    let mut totals = TrajectoryTotals::default();
    for source_id in order {
        let points = groups.remove(&source_id).unwrap_or_default();
        let trajectory = source_trajectory(source_id, &points, config);
        totals.total_duration_seconds += trajectory.duration_seconds;
        totals.total_distance_km += trajectory.distance_km;
        totals.dropped_timestamps += trajectory.dropped_timestamps;
        totals.per_source.push(trajectory);
    }
    totals
}

/// Render whole seconds as `H:MM:SS`, prefixed with days past 24 hours.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds as u64 } else { 0 };
    let days = total / 86_400;
    let hours = (total % 86_400) / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    match days {
        0 => format!("{}:{:02}:{:02}", hours, minutes, secs),
        1 => format!("1 day, {}:{:02}:{:02}", hours, minutes, secs),
        d => format!("{} days, {}:{:02}:{:02}", d, hours, minutes, secs),
    }
}
