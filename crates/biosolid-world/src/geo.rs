//! Great-circle distance between geocoordinates.

use biosolid_types::GeoPoint;

/// Mean earth radius in kilometres.
pub const DEFAULT_EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two points, in kilometres.
///
/// The result is a pure function of the two coordinates and the radius, so
/// recomputing it always yields bit-identical values.
pub fn haversine_km(from: GeoPoint, to: GeoPoint, earth_radius_km: f64) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let half_dlat = (to.lat - from.lat).to_radians() / 2.0;
    let half_dlon = (to.lon - from.lon).to_radians() / 2.0;

    let a = (lat1.cos() * lat2.cos()).mul_add(
        half_dlon.sin().powi(2),
        half_dlat.sin().powi(2),
    );
    let central_angle = 2.0 * a.sqrt().min(1.0).asin();
    central_angle * earth_radius_km
}
