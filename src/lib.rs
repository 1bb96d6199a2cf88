//! Cellular signal survey analysis.
//!
//! Takes geotagged signal measurements, drops rows without a usable fix,
//! splits readings into valid and invalid signal, confirms dead zones by a
//! great-circle radius search against valid readings, and aggregates
//! per-file trajectory distance and duration.

pub mod classifier;
pub mod config;
pub mod dead_zone;
pub mod error;
pub mod geodesy;
pub mod loader;
pub mod map_layers;
pub mod measurement;
pub mod pipeline;
pub mod summary;
pub mod trajectory;
pub mod validator;

pub use config::AnalysisConfig;
pub use error::{SurveyError, SurveyResult};
pub use measurement::{LocatedMeasurement, MeasurementRecord, SourceId};
pub use pipeline::{run_analysis, AggregateMetrics, AnalysisRun};
