/// Great-circle geometry on a spherical earth
///
/// Distances use the haversine formula on a sphere of configurable radius.
/// The batch forms work over parallel coordinate slices so callers can feed
/// whole columns at once instead of calling per point.

use geo::Point;

/// Haversine distance in meters between two `geo` points (x = lon, y = lat).
pub fn haversine_m(a: &Point<f64>, b: &Point<f64>, earth_radius_m: f64) -> f64 {
    central_angle(a.y(), a.x(), b.y(), b.x()) * earth_radius_m
}

/// Central angle in radians between two lat/lon pairs given in degrees.
#[inline]
fn central_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let h = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    2.0 * h.min(1.0).sqrt().asin()
}

/// Elementwise haversine distances (meters) over parallel slices.
///
/// The output length is the shortest of the four inputs.
pub fn haversine_batch_m(
    lat1: &[f64],
    lon1: &[f64],
    lat2: &[f64],
    lon2: &[f64],
    earth_radius_m: f64,
) -> Vec<f64> {
    lat1.iter()
        .zip(lon1)
        .zip(lat2.iter().zip(lon2))
        .map(|((&la1, &lo1), (&la2, &lo2))| central_angle(la1, lo1, la2, lo2) * earth_radius_m)
        .collect()
}

/// Distances between each consecutive pair of points: N points give N-1 segments.
pub fn consecutive_distances_m(latitudes: &[f64], longitudes: &[f64], earth_radius_m: f64) -> Vec<f64> {
    let n = latitudes.len().min(longitudes.len());
    if n < 2 {
        return Vec::new();
    }
    haversine_batch_m(
        &latitudes[..n - 1],
        &longitudes[..n - 1],
        &latitudes[1..n],
        &longitudes[1..n],
        earth_radius_m,
    )
}

/// Unit-sphere Cartesian coordinates for a lat/lon pair in degrees.
pub fn to_unit_vector(latitude: f64, longitude: f64) -> [f64; 3] {
    let phi = latitude.to_radians();
    let lambda = longitude.to_radians();
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// Straight-line chord on the unit sphere subtending a ground arc of `arc_m`.
///
/// Chord length grows monotonically with arc length up to half a
/// circumference, so a Euclidean ball of this radius around a unit vector
/// holds exactly the points within `arc_m` of ground distance.
pub fn chord_for_arc(arc_m: f64, earth_radius_m: f64) -> f64 {
    let theta = (arc_m / earth_radius_m).clamp(0.0, std::f64::consts::PI);
    2.0 * (theta / 2.0).sin()
}
