/// Summary statistics for one analysis run
///
/// Everything that can be undefined on empty input is an `Option`; callers
/// print "N/A" for `None`. Nothing here divides by a zero count.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::classifier::SignalPartition;
use crate::measurement::LocatedMeasurement;
use crate::validator::ValidationCounts;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub total: usize,
    pub valid_location: usize,
    pub valid_signal: usize,
    pub invalid_signal: usize,
    pub sentinel: usize,
    pub confirmed_dead_zones: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub label: String,
    pub count: usize,
    /// Fraction of non-missing values, 0..=1.
    pub proportion: f64,
}

/// Counts per distinct value, most frequent first; ties by label.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Distribution {
    pub shares: Vec<CategoryShare>,
    /// Values left out because they were missing.
    pub missing: usize,
}

impl Distribution {
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Option<String>>,
    {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut missing = 0;
        for value in values {
            match value {
                Some(v) => *counts.entry(v).or_insert(0) += 1,
                None => missing += 1,
            }
        }

        let present: usize = counts.values().sum();
        let mut shares: Vec<CategoryShare> = counts
            .into_iter()
            .map(|(label, count)| CategoryShare {
                label,
                count,
                proportion: count as f64 / present as f64,
            })
            .collect();
        shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

        Self { shares, missing }
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<&CategoryShare> {
        self.shares.iter().find(|s| s.label == label)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.shares.is_empty() {
            return writeln!(f, "  (no data)");
        }
        for share in &self.shares {
            writeln!(f, "  {:<12} {:>6.2}%", share.label, share.proportion * 100.0)?;
        }
        Ok(())
    }
}

/// count / mean / std / min / quartiles / max, as pandas `describe` reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Linear-interpolated quantile of an ascending slice.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

impl Describe {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        if count == 0 {
            return Self::default();
        }

        let mean = sorted.iter().sum::<f64>() / count as f64;
        let std = (count > 1).then(|| {
            let ss: f64 = sorted.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            count,
            mean: Some(mean),
            std,
            min: sorted.first().copied(),
            q25: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q75: quantile(&sorted, 0.75),
            max: sorted.last().copied(),
        }
    }
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.6}", v))
}

impl fmt::Display for Describe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  count {:>14}", self.count)?;
        for (name, value) in [
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q25),
            ("50%", self.median),
            ("75%", self.q75),
            ("max", self.max),
        ] {
            writeln!(f, "  {:<5} {:>14}", name, fmt_stat(value))?;
        }
        Ok(())
    }
}

/// `part / whole * 100`, or `None` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> Option<f64> {
    (whole > 0).then(|| part as f64 / whole as f64 * 100.0)
}

pub fn fmt_percentage(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SignalSummary {
    pub counts: StageCounts,
    /// Share of location-valid points with a plausible reading.
    pub valid_signal_pct: Option<f64>,
    /// Share of invalid readings that survived spatial confirmation.
    pub confirmed_dead_zone_pct: Option<f64>,
    pub network_types: Distribution,
    pub bands: Distribution,
    pub signal_strength: Describe,
}

impl SignalSummary {
    pub fn average_signal_dbm(&self) -> Option<f64> {
        self.signal_strength.mean
    }
}

pub fn summarize(
    validation: &ValidationCounts,
    partition: &SignalPartition,
    dead_zones: &[LocatedMeasurement],
) -> SignalSummary {
    let counts = StageCounts {
        total: validation.total,
        valid_location: validation.valid_location,
        valid_signal: partition.valid.len(),
        invalid_signal: partition.invalid.len(),
        sentinel: partition.sentinel.len(),
        confirmed_dead_zones: dead_zones.len(),
    };

    let strengths: Vec<f64> = partition
        .valid
        .iter()
        .filter_map(|p| p.signal_strength_dbm)
        .collect();

    SignalSummary {
        counts,
        valid_signal_pct: percentage(counts.valid_signal, counts.valid_location),
        confirmed_dead_zone_pct: percentage(counts.confirmed_dead_zones, counts.invalid_signal),
        network_types: Distribution::from_values(partition.valid.iter().map(|p| p.network_type.clone())),
        bands: Distribution::from_values(partition.valid.iter().map(|p| p.band.map(|b| b.to_string()))),
        signal_strength: Describe::from_values(&strengths),
    }
}
