/// Map layer preparation
///
/// Turns one analysis run into what a map renderer needs: marker positions,
/// colours, popups, the view extent and the legend. No HTML or tiles are
/// produced here. Large sets are downsampled with a fixed seed so the same
/// run always yields the same markers.

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::Serialize;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::measurement::{LocatedMeasurement, NO_SIGNAL_BAND};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MapMode {
    Quality,
    Bands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerColor {
    Green,
    Orange,
    Red,
    Blue,
    Purple,
    DarkGreen,
    CadetBlue,
    Gray,
    Black,
}

impl MarkerColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkerColor::Green => "green",
            MarkerColor::Orange => "orange",
            MarkerColor::Red => "red",
            MarkerColor::Blue => "blue",
            MarkerColor::Purple => "purple",
            MarkerColor::DarkGreen => "darkgreen",
            MarkerColor::CadetBlue => "cadetblue",
            MarkerColor::Gray => "gray",
            MarkerColor::Black => "black",
        }
    }
}

impl fmt::Display for MarkerColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SignalTier {
    Good,
    Fair,
    Poor,
}

impl SignalTier {
    pub fn of(strength_dbm: f64, config: &AnalysisConfig) -> Self {
        if strength_dbm >= config.good_signal_dbm {
            SignalTier::Good
        } else if strength_dbm >= config.fair_signal_dbm {
            SignalTier::Fair
        } else {
            SignalTier::Poor
        }
    }

    pub fn color(&self) -> MarkerColor {
        match self {
            SignalTier::Good => MarkerColor::Green,
            SignalTier::Fair => MarkerColor::Orange,
            SignalTier::Poor => MarkerColor::Red,
        }
    }
}

pub fn band_color(band: Option<i64>) -> MarkerColor {
    match band {
        Some(1) => MarkerColor::Blue,
        Some(3) => MarkerColor::Purple,
        Some(5) => MarkerColor::Orange,
        Some(8) => MarkerColor::DarkGreen,
        Some(40) => MarkerColor::CadetBlue,
        Some(NO_SIGNAL_BAND) => MarkerColor::Gray,
        _ => MarkerColor::Black,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapExtent {
    pub center_lat: f64,
    pub center_lon: f64,
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl MapExtent {
    fn of(points: &[LocatedMeasurement]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let mut extent = MapExtent {
            center_lat: 0.0,
            center_lon: 0.0,
            min_lat: f64::INFINITY,
            max_lat: f64::NEG_INFINITY,
            min_lon: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
        };
        for p in points {
            extent.center_lat += p.latitude;
            extent.center_lon += p.longitude;
            extent.min_lat = extent.min_lat.min(p.latitude);
            extent.max_lat = extent.max_lat.max(p.latitude);
            extent.min_lon = extent.min_lon.min(p.longitude);
            extent.max_lon = extent.max_lon.max(p.longitude);
        }
        extent.center_lat /= n;
        extent.center_lon /= n;
        Some(extent)
    }

    /// Centred on valid readings; falls back to dead zones when there are none.
    pub fn for_run(valid: &[LocatedMeasurement], dead_zones: &[LocatedMeasurement]) -> Option<Self> {
        Self::of(valid).or_else(|| Self::of(dead_zones))
    }
}

/// At most `cap` points, chosen with a seeded RNG and kept in input order.
pub fn downsample<'a>(points: &'a [LocatedMeasurement], cap: usize, seed: u64) -> Vec<&'a LocatedMeasurement> {
    if points.len() <= cap {
        return points.iter().collect();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = sample(&mut rng, points.len(), cap).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| &points[i]).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub time: String,
    pub network_type: Option<String>,
    pub band: Option<i64>,
    pub signal_dbm: Option<f64>,
    /// Present only on dead-zone markers.
    pub status: Option<&'static str>,
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub latitude: f64,
    pub longitude: f64,
    pub color: MarkerColor,
    pub radius_px: u32,
    pub fill_opacity: f64,
    pub popup: Popup,
}

fn popup_for(p: &LocatedMeasurement, status: Option<&'static str>) -> Popup {
    let (network_type, band, signal_dbm) = match status {
        Some(_) => (None, None, None),
        None => (p.network_type.clone(), p.band, p.signal_strength_dbm),
    };
    Popup {
        time: p.time.clone().unwrap_or_default(),
        network_type,
        band,
        signal_dbm,
        status,
        lat: format!("{:.6}", p.latitude),
        lon: format!("{:.6}", p.longitude),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapLayers {
    pub mode: MapMode,
    pub extent: MapExtent,
    pub signal_markers: Vec<Marker>,
    pub dead_zone_markers: Vec<Marker>,
    /// Points dropped by the marker caps.
    pub downsampled_valid: usize,
    pub downsampled_dead_zones: usize,
}

/// Build the marker layers for `mode`, or `None` when there is nothing to draw.
pub fn build_layers(
    valid: &[LocatedMeasurement],
    dead_zones: &[LocatedMeasurement],
    mode: MapMode,
    config: &AnalysisConfig,
) -> Option<MapLayers> {
    let extent = MapExtent::for_run(valid, dead_zones)?;

    let valid_plot = downsample(valid, config.max_valid_markers, config.downsample_seed);
    let dead_plot = downsample(dead_zones, config.max_dead_zone_markers, config.downsample_seed);

    let signal_markers: Vec<Marker> = valid_plot
        .iter()
        .filter_map(|p| {
            let color = match mode {
                MapMode::Quality => SignalTier::of(p.signal_strength_dbm?, config).color(),
                MapMode::Bands if p.band == Some(NO_SIGNAL_BAND) => return None,
                MapMode::Bands => band_color(p.band),
            };
            Some(Marker {
                latitude: p.latitude,
                longitude: p.longitude,
                color,
                radius_px: 5,
                fill_opacity: 0.7,
                popup: popup_for(p, None),
            })
        })
        .collect();

    let dead_zone_markers: Vec<Marker> = dead_plot
        .iter()
        .map(|p| Marker {
            latitude: p.latitude,
            longitude: p.longitude,
            color: MarkerColor::Black,
            radius_px: 3,
            fill_opacity: 0.5,
            popup: popup_for(p, Some("No Signal (Dead Zone)")),
        })
        .collect();

    info!(
        ?mode,
        signal_markers = signal_markers.len(),
        dead_zone_markers = dead_zone_markers.len(),
        "built map layers"
    );

    Some(MapLayers {
        mode,
        extent,
        signal_markers,
        dead_zone_markers,
        downsampled_valid: valid.len() - valid_plot.len(),
        downsampled_dead_zones: dead_zones.len() - dead_plot.len(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: MarkerColor,
    pub label: &'static str,
}

pub fn legend(mode: MapMode) -> (&'static str, Vec<LegendEntry>) {
    let entry = |color, label| LegendEntry { color, label };
    match mode {
        MapMode::Quality => (
            "Signal Quality",
            vec![
                entry(MarkerColor::Green, "≥ -90 dBm"),
                entry(MarkerColor::Orange, "-105 to -90"),
                entry(MarkerColor::Red, "< -105 dBm"),
                entry(MarkerColor::Black, "No Signal"),
            ],
        ),
        MapMode::Bands => (
            "Frequency Bands",
            vec![
                entry(MarkerColor::Purple, "Band 3 (1800)"),
                entry(MarkerColor::Blue, "Band 1 (2100)"),
                entry(MarkerColor::CadetBlue, "Band 40 (2300)"),
                entry(MarkerColor::DarkGreen, "Band 8 (900)"),
                entry(MarkerColor::Orange, "Band 5 (850)"),
                entry(MarkerColor::Black, "No Signal"),
            ],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::SourceId;

    fn point(lat: f64, lon: f64, strength: f64, band: i64) -> LocatedMeasurement {
        LocatedMeasurement {
            latitude: lat,
            longitude: lon,
            signal_strength_dbm: Some(strength),
            network_type: Some("LTE".to_string()),
            band: Some(band),
            time: Some("2024-03-01 08:00:00".to_string()),
            source_id: SourceId::new("a.csv"),
        }
    }

    #[test]
    fn test_signal_tiers() {
        let config = AnalysisConfig::default();
        assert_eq!(SignalTier::of(-90.0, &config), SignalTier::Good);
        assert_eq!(SignalTier::of(-90.5, &config), SignalTier::Fair);
        assert_eq!(SignalTier::of(-105.0, &config), SignalTier::Fair);
        assert_eq!(SignalTier::of(-105.1, &config), SignalTier::Poor);
        assert_eq!(SignalTier::Poor.color().as_str(), "red");
    }

    #[test]
    fn test_band_palette() {
        assert_eq!(band_color(Some(3)), MarkerColor::Purple);
        assert_eq!(band_color(Some(40)), MarkerColor::CadetBlue);
        assert_eq!(band_color(Some(-1)), MarkerColor::Gray);
        assert_eq!(band_color(Some(7)), MarkerColor::Black);
        assert_eq!(band_color(None), MarkerColor::Black);
    }

    #[test]
    fn test_extent_falls_back_to_dead_zones() {
        let dead = vec![point(1.0, 2.0, -160.0, -1), point(3.0, 6.0, -160.0, -1)];
        let extent = MapExtent::for_run(&[], &dead).unwrap();
        assert_eq!(extent.center_lat, 2.0);
        assert_eq!(extent.center_lon, 4.0);
        assert_eq!((extent.min_lat, extent.max_lat), (1.0, 3.0));
        assert_eq!((extent.min_lon, extent.max_lon), (2.0, 6.0));

        assert!(MapExtent::for_run(&[], &[]).is_none());
        assert!(build_layers(&[], &[], MapMode::Quality, &AnalysisConfig::default()).is_none());
    }

    #[test]
    fn test_downsample_is_deterministic_and_ordered() {
        let points: Vec<_> = (0..100).map(|i| point(1.0 + i as f64, 1.0, -80.0, 3)).collect();

        let first = downsample(&points, 10, 42);
        let second = downsample(&points, 10, 42);
        assert_eq!(first.len(), 10);
        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0].latitude < w[1].latitude));

        assert_eq!(downsample(&points, 100, 42).len(), 100);
    }

    #[test]
    fn test_bands_mode_skips_no_signal_band() {
        let valid = vec![
            point(1.0, 1.0, -80.0, 3),
            point(1.1, 1.0, -80.0, NO_SIGNAL_BAND),
            point(1.2, 1.0, -80.0, 8),
        ];
        let dead = vec![point(2.0, 2.0, -170.0, NO_SIGNAL_BAND)];
        let layers = build_layers(&valid, &dead, MapMode::Bands, &AnalysisConfig::default()).unwrap();

        let colors: Vec<_> = layers.signal_markers.iter().map(|m| m.color).collect();
        assert_eq!(colors, vec![MarkerColor::Purple, MarkerColor::DarkGreen]);
        assert_eq!(layers.dead_zone_markers.len(), 1);
        assert_eq!(layers.dead_zone_markers[0].popup.status, Some("No Signal (Dead Zone)"));
        assert_eq!(layers.dead_zone_markers[0].popup.lat, "2.000000");
    }

    #[test]
    fn test_marker_caps_apply() {
        let valid: Vec<_> = (0..30).map(|i| point(1.0 + i as f64 * 0.01, 1.0, -95.0, 1)).collect();
        let config = AnalysisConfig {
            max_valid_markers: 12,
            ..Default::default()
        };
        let layers = build_layers(&valid, &[], MapMode::Quality, &config).unwrap();
        assert_eq!(layers.signal_markers.len(), 12);
        assert_eq!(layers.downsampled_valid, 18);
        assert!(layers.signal_markers.iter().all(|m| m.color == MarkerColor::Orange));
        // Extent uses every valid point, not only the plotted ones.
        assert_eq!(layers.extent.min_lat, 1.0);
    }

    #[test]
    fn test_legend_entries() {
        let (title, entries) = legend(MapMode::Bands);
        assert_eq!(title, "Frequency Bands");
        assert_eq!(entries.len(), 6);
        assert_eq!(entries.last().unwrap().color, MarkerColor::Black);
    }
}
