//! Nearest-attraction ranking

use crate::domain::geo;
use crate::domain::{Attraction, Coordinate};

/// Number of attractions returned for a "nearby" request
pub const DEFAULT_NEARBY_COUNT: usize = 5;

/// The `k` attractions closest to `origin`, paired with their distance in
/// miles, ascending. Ties keep input order; the input is not modified.
pub fn nearest_with_distance<'a>(
    origin: &Coordinate,
    attractions: &'a [Attraction],
    k: usize,
) -> Vec<(&'a Attraction, f64)> {
    let mut ranked: Vec<(&Attraction, f64)> =
        attractions.iter().map(|a| (a, geo::distance(origin, &a.location))).collect();
    // sort_by is stable
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked.truncate(k);
    ranked
}

/// The `k` attractions closest to `origin`, ascending by distance
pub fn nearest(origin: &Coordinate, attractions: &[Attraction], k: usize) -> Vec<Attraction> {
    nearest_with_distance(origin, attractions, k).into_iter().map(|(a, _)| a.clone()).collect()
}
