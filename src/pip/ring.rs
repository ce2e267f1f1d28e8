//! Ray-casting point-in-polygon test.

use crate::models::LatLng;

/// Even-odd containment test of `point` against a vertex ring.
///
/// The ring is treated as closed whether or not its last vertex repeats the
/// first. Rings with fewer than 3 vertices never contain anything. Points
/// exactly on an edge may go either way.
pub fn contains(ring: &[LatLng], point: LatLng) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = ring.len() - 1;

    for (i, cur) in ring.iter().enumerate() {
        let prev = ring[j];

        // XOR on the ray side excludes edges with equal longitudes, so the
        // division below never sees a zero denominator
        if (cur.lng > point.lng) != (prev.lng > point.lng) {
            let crossing_lat =
                (prev.lat - cur.lat) * (point.lng - cur.lng) / (prev.lng - cur.lng) + cur.lat;
            if point.lat < crossing_lat {
                inside = !inside;
            }
        }

        j = i;
    }

    inside
}
