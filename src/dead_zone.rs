/// Dead-zone confirmation
///
/// An invalid-signal point is only a real dead zone if no valid reading was
/// logged nearby. Valid points go into an R-tree keyed on unit-sphere
/// vectors; a great-circle radius maps to a fixed chord length, so each
/// lookup is an ordinary Euclidean ball query followed by an exact haversine
/// check on the few candidates it returns.

use rayon::prelude::*;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::geodesy::{chord_for_arc, haversine_m, to_unit_vector};
use crate::measurement::LocatedMeasurement;

// Widens the chord query so candidates sitting exactly on the radius are not
// lost to rounding before the haversine filter sees them.
const CHORD_SLACK: f64 = 1.0 + 1e-9;

#[derive(Debug, Clone, Copy)]
struct IndexedPoint {
    idx: usize,
    xyz: [f64; 3],
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.xyz)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.xyz[0] - point[0];
        let dy = self.xyz[1] - point[1];
        let dz = self.xyz[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

/// Read-only radius index over a set of located points.
pub struct SpatialIndex<'a> {
    points: &'a [LocatedMeasurement],
    tree: RTree<IndexedPoint>,
    earth_radius_m: f64,
}

impl<'a> SpatialIndex<'a> {
    pub fn build(points: &'a [LocatedMeasurement], earth_radius_m: f64) -> Self {
        let indexed: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .map(|(idx, p)| IndexedPoint {
                idx,
                xyz: to_unit_vector(p.latitude, p.longitude),
            })
            .collect();

        Self {
            points,
            tree: RTree::bulk_load(indexed),
            earth_radius_m,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indexed points strictly closer than `radius_m` of ground distance.
    fn within(&self, latitude: f64, longitude: f64, radius_m: f64) -> impl Iterator<Item = &LocatedMeasurement> + '_ {
        let query = to_unit_vector(latitude, longitude);
        let chord = chord_for_arc(radius_m, self.earth_radius_m) * CHORD_SLACK;
        let origin = geo::point!(x: longitude, y: latitude);

        self.tree
            .locate_within_distance(query, chord * chord)
            .map(move |candidate| &self.points[candidate.idx])
            .filter(move |p| haversine_m(&origin, &p.point(), self.earth_radius_m) < radius_m)
    }

    pub fn count_within(&self, latitude: f64, longitude: f64, radius_m: f64) -> usize {
        self.within(latitude, longitude, radius_m).count()
    }

    pub fn any_within(&self, latitude: f64, longitude: f64, radius_m: f64) -> bool {
        self.within(latitude, longitude, radius_m).next().is_some()
    }

    /// Ground distance to the closest indexed point, or `None` for an empty index.
    pub fn nearest_distance_m(&self, latitude: f64, longitude: f64) -> Option<f64> {
        let query = to_unit_vector(latitude, longitude);
        let nearest = self.tree.nearest_neighbor(&query)?;
        let p = &self.points[nearest.idx];
        Some(haversine_m(
            &geo::point!(x: longitude, y: latitude),
            &p.point(),
            self.earth_radius_m,
        ))
    }
}

/// Invalid-signal points with no valid-signal point strictly within the
/// configured radius. Output keeps the input order of `invalid`.
pub fn confirm_dead_zones(
    valid: &[LocatedMeasurement],
    invalid: &[LocatedMeasurement],
    config: &AnalysisConfig,
) -> Vec<LocatedMeasurement> {
    if invalid.is_empty() {
        return Vec::new();
    }
    if valid.is_empty() {
        debug!("no valid-signal points; every invalid point is confirmed");
        return invalid.to_vec();
    }

    let index = SpatialIndex::build(valid, config.earth_radius_m);
    let radius_m = config.dead_zone_radius_m;

    let confirmed: Vec<LocatedMeasurement> = invalid
        .par_iter()
        .filter(|p| !index.any_within(p.latitude, p.longitude, radius_m))
        .cloned()
        .collect();

    info!(
        invalid = invalid.len(),
        confirmed = confirmed.len(),
        radius_m,
        "confirmed dead zones"
    );

    confirmed
}
