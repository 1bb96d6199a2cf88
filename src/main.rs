use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use signal_survey::loader::{load_directory, SurveyLog};
use signal_survey::map_layers::{build_layers, legend, MapLayers, MapMode};
use signal_survey::summary::fmt_percentage;
use signal_survey::trajectory::format_duration;
use signal_survey::{run_analysis, AnalysisConfig, AnalysisRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MapChoice {
    Quality,
    Bands,
    #[value(name = "none")]
    Skip,
}

/// Analyse cellular signal survey logs and report confirmed dead zones.
#[derive(Debug, Parser)]
#[command(name = "signal-survey", version)]
struct Cli {
    /// Directory containing the logger's CSV exports
    data_dir: PathBuf,

    /// Which marker layer to prepare for the map summary
    #[arg(long, value_enum, default_value = "quality")]
    map_mode: MapChoice,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = AnalysisConfig::default();

    let log = load_directory(&cli.data_dir)?;
    print_load_summary(&log);
    if log.is_empty() {
        println!("No data found.");
        return Ok(());
    }

    info!("⚡ Using parallel processing on {} cores", num_cpus::get());
    let run = run_analysis(&log.records, &config);

    print_signal_report(&run, &config);
    print_trajectory_report(&run);

    let mode = match cli.map_mode {
        MapChoice::Quality => Some(MapMode::Quality),
        MapChoice::Bands => Some(MapMode::Bands),
        MapChoice::Skip => None,
    };
    if let Some(mode) = mode {
        match build_layers(run.valid_signal(), run.confirmed_dead_zones(), mode, &config) {
            Some(layers) => print_map_summary(&layers),
            None => println!("⚠️  No data to map for {:?}.", mode),
        }
    }

    Ok(())
}

fn print_load_summary(log: &SurveyLog) {
    println!("\n📁 LOADED SURVEY LOGS");
    println!("=====================");
    for source in &log.sources {
        if source.malformed_rows > 0 {
            println!("  {}: {} rows ({} malformed skipped)", source.source_id, source.rows, source.malformed_rows);
        } else {
            println!("  {}: {} rows", source.source_id, source.rows);
        }
    }
    for failed in &log.failed_sources {
        eprintln!("❌ Error reading {}: {}", failed.path.display(), failed.reason);
    }
}

fn print_signal_report(run: &AnalysisRun, config: &AnalysisConfig) {
    let summary = &run.summary;
    let counts = &summary.counts;

    println!("\n📡 NETWORK QUALITY ANALYSIS");
    println!("===========================");
    println!("Total data points: {}", counts.total);
    println!("Valid location points: {}", counts.valid_location);
    println!("Valid signal points (-150 < dBm < 0): {}", counts.valid_signal);
    println!("Percentage of valid signal data: {}", fmt_percentage(summary.valid_signal_pct));
    println!("Sentinel readings excluded: {}", counts.sentinel);

    println!("\n--- Confirmed No Signal Zones ({}m radius check) ---", config.dead_zone_radius_m);
    println!("Total invalid signal points: {}", counts.invalid_signal);
    println!("Confirmed No Signal points: {}", counts.confirmed_dead_zones);
    println!(
        "Percentage of No Signal areas in invalid data: {}",
        fmt_percentage(summary.confirmed_dead_zone_pct)
    );

    match summary.average_signal_dbm() {
        Some(avg) => println!("\nAvg Signal (dBm): {:.2}", avg),
        None => println!("\nAvg Signal (dBm): N/A"),
    }

    println!("\n--- Network Type Distribution (Valid Signals) ---");
    print!("{}", summary.network_types);
    println!("\n--- Frequency Band Distribution (Valid Signals) ---");
    print!("{}", summary.bands);
    println!("\n--- Signal Strength (dBm) Statistics (Valid Signals) ---");
    print!("{}", summary.signal_strength);
}

fn print_trajectory_report(run: &AnalysisRun) {
    let metrics = run.metrics();

    println!("\n🛣️  TRAJECTORY");
    println!("=============");
    println!("Total Duration: {}", format_duration(metrics.total_duration_seconds));
    println!("Total Distance: {:.2} km", metrics.total_distance_km);
    if run.trajectory.dropped_timestamps > 0 {
        println!("⚠️  {} points skipped (unparseable time)", run.trajectory.dropped_timestamps);
    }

    for source in &run.trajectory.per_source {
        println!(
            "  {}: {} points, {}, {:.2} km",
            source.source_id,
            source.points,
            format_duration(source.duration_seconds),
            source.distance_km
        );
    }
}

fn print_map_summary(layers: &MapLayers) {
    let (title, entries) = legend(layers.mode);
    let e = &layers.extent;

    println!("\n🗺️  MAP LAYERS ({:?})", layers.mode);
    println!("==================");
    println!("Center: {:.6}, {:.6}", e.center_lat, e.center_lon);
    println!("Bounds: [{:.6}, {:.6}] - [{:.6}, {:.6}]", e.min_lat, e.min_lon, e.max_lat, e.max_lon);
    println!("Signal markers: {}", layers.signal_markers.len());
    println!("Dead zone markers: {}", layers.dead_zone_markers.len());
    if layers.downsampled_valid > 0 || layers.downsampled_dead_zones > 0 {
        println!(
            "Downsampled: {} valid, {} dead zone points not plotted",
            layers.downsampled_valid, layers.downsampled_dead_zones
        );
    }
    println!("{}:", title);
    for entry in entries {
        println!("  {:<10} {}", entry.color.as_str(), entry.label);
    }
}
