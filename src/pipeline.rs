/// Analysis pipeline
///
/// raw records -> validation -> classification -> dead-zone confirmation
///                    \-> trajectory aggregation          \-> summary
///
/// Every stage reads its input fully and returns a new set; the returned
/// `AnalysisRun` is a read-only snapshot of one pass.

use serde::Serialize;
use tracing::info;

use crate::classifier::{classify_signals, SignalPartition};
use crate::config::AnalysisConfig;
use crate::dead_zone::confirm_dead_zones;
use crate::measurement::{LocatedMeasurement, MeasurementRecord};
use crate::summary::{summarize, SignalSummary};
use crate::trajectory::{aggregate_trajectories, TrajectoryTotals};
use crate::validator::{validate_locations, ValidationCounts};

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRun {
    pub validation: ValidationCounts,
    pub partition: SignalPartition,
    pub dead_zones: Vec<LocatedMeasurement>,
    pub trajectory: TrajectoryTotals,
    pub summary: SignalSummary,
}

/// Scalar outputs handed to dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateMetrics {
    pub total_duration_seconds: f64,
    pub total_distance_km: f64,
}

impl AnalysisRun {
    pub fn valid_signal(&self) -> &[LocatedMeasurement] {
        &self.partition.valid
    }

    pub fn confirmed_dead_zones(&self) -> &[LocatedMeasurement] {
        &self.dead_zones
    }

    pub fn metrics(&self) -> AggregateMetrics {
        AggregateMetrics {
            total_duration_seconds: self.trajectory.total_duration_seconds,
            total_distance_km: self.trajectory.total_distance_km,
        }
    }
}

pub fn run_analysis(records: &[MeasurementRecord], config: &AnalysisConfig) -> AnalysisRun {
    let validation = validate_locations(records);
    let partition = classify_signals(&validation.validated, config);
    let dead_zones = confirm_dead_zones(&partition.valid, &partition.invalid, config);
    let trajectory = aggregate_trajectories(&validation.validated, config);
    let summary = summarize(&validation.counts, &partition, &dead_zones);

    info!(
        records = records.len(),
        dead_zones = dead_zones.len(),
        distance_km = trajectory.total_distance_km,
        duration_s = trajectory.total_duration_seconds,
        "analysis complete"
    );

    AnalysisRun {
        validation: validation.counts,
        partition,
        dead_zones,
        trajectory,
        summary,
    }
}
