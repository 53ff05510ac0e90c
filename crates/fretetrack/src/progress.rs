//! Trip-progress estimation.
//!
//! Converts three geographic points (origin, destination, current position)
//! into a single percent-complete integer, using straight-line great-circle
//! distance as a proxy for travel progress along an unknown road route.
//! The system carries no road-network data, so displacement toward the
//! destination is the progress signal; a detour shows up as stagnation or
//! regression in the percentage, and that is accepted.

use crate::geo::{haversine_km, Coordinate};

/// Routes shorter than this are treated as already complete.
///
/// Guards against floating-point noise and duplicate geocoding results
/// producing a near-zero total distance.
pub const MIN_ROUTE_KM: f64 = 0.1;

/// Estimate how far along the route the current position lies, in percent.
///
/// Endpoints are `None` when geocoding never resolved them; progress is
/// meaningless without both endpoints, so the estimate is conservatively 0
/// ("not started"). A route whose endpoints are within [`MIN_ROUTE_KM`] of
/// each other is trivially complete. Otherwise the estimate is
/// `(1 - remaining/total) * 100`, clamped to `[0, 100]` and rounded.
///
/// A current position "behind" the origin or far past the destination is
/// not an error: the formula clamps it to 0 or 100. The function never
/// fails for any finite input.
#[must_use]
pub fn trip_progress(
    origin: Option<Coordinate>,
    destination: Option<Coordinate>,
    current: Coordinate,
) -> u8 {
    let (Some(origin), Some(destination)) = (origin, destination) else {
        return 0;
    };

    let total = haversine_km(origin, destination);
    if total <= MIN_ROUTE_KM {
        return 100;
    }

    let remaining = haversine_km(current, destination);
    let raw = (1.0 - remaining / total) * 100.0;

    // Clamp before rounding so the cast cannot overflow.
    raw.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAO_PAULO: Coordinate = Coordinate {
        lat: -23.5505,
        lon: -46.6333,
    };
    const SALVADOR: Coordinate = Coordinate {
        lat: -12.9777,
        lon: -38.5016,
    };
    const BRASILIA: Coordinate = Coordinate {
        lat: -15.7942,
        lon: -47.8822,
    };
    const RIO: Coordinate = Coordinate {
        lat: -22.9068,
        lon: -43.1729,
    };

    /// Reference computation of the same formula, for exact-output checks.
    fn reference(origin: Coordinate, destination: Coordinate, current: Coordinate) -> u8 {
        let total = haversine_km(origin, destination);
        let remaining = haversine_km(current, destination);
        let raw = (1.0 - remaining / total) * 100.0;
        raw.clamp(0.0, 100.0).round() as u8
    }

    #[test]
    fn test_zero_at_origin() {
        assert_eq!(trip_progress(Some(SAO_PAULO), Some(SALVADOR), SAO_PAULO), 0);
    }

    #[test]
    fn test_complete_at_destination() {
        assert_eq!(
            trip_progress(Some(SAO_PAULO), Some(SALVADOR), SALVADOR),
            100
        );
    }

    #[test]
    fn test_unknown_origin_reports_not_started() {
        assert_eq!(trip_progress(None, Some(SALVADOR), BRASILIA), 0);
    }

    #[test]
    fn test_unknown_destination_reports_not_started() {
        assert_eq!(trip_progress(Some(SAO_PAULO), None, BRASILIA), 0);
    }

    #[test]
    fn test_both_endpoints_unknown() {
        assert_eq!(trip_progress(None, None, BRASILIA), 0);
    }

    #[test]
    fn test_unknown_endpoint_takes_precedence_over_degenerate_route() {
        // Even with current equal to the one known point, the missing
        // endpoint wins and the result is 0, not 100.
        assert_eq!(trip_progress(None, Some(SALVADOR), SALVADOR), 0);
        assert_eq!(trip_progress(Some(SAO_PAULO), None, SAO_PAULO), 0);
    }

    #[test]
    fn test_identical_endpoints_trivially_complete() {
        assert_eq!(
            trip_progress(Some(SAO_PAULO), Some(SAO_PAULO), BRASILIA),
            100
        );
        assert_eq!(
            trip_progress(Some(SAO_PAULO), Some(SAO_PAULO), SAO_PAULO),
            100
        );
    }

    #[test]
    fn test_sub_epsilon_route_trivially_complete() {
        // Two fixes ~54 m apart, e.g. the same address geocoded twice.
        let a = Coordinate::new(-23.5505, -46.6333);
        let b = Coordinate::new(-23.5509, -46.6336);
        assert!(haversine_km(a, b) < MIN_ROUTE_KM);
        assert_eq!(trip_progress(Some(a), Some(b), BRASILIA), 100);
    }

    #[test]
    fn test_midway_scenario_sao_paulo_salvador() {
        // São Paulo → Salvador with the truck in Brasília. Brasília lies
        // well west of the great-circle path, so displacement-based
        // progress reads low; the formula is the contract, so the test
        // pins its exact output.
        let got = trip_progress(Some(SAO_PAULO), Some(SALVADOR), BRASILIA);
        assert_eq!(got, reference(SAO_PAULO, SALVADOR, BRASILIA));
        assert_eq!(got, 27);
    }

    #[test]
    fn test_on_segment_fractions() {
        // Points interpolated along São Paulo → Rio land on the expected
        // rounded fraction of the total distance.
        for (f, expected) in [(0.25, 25), (0.5, 50), (0.75, 75)] {
            let current = Coordinate::new(
                SAO_PAULO.lat + f * (RIO.lat - SAO_PAULO.lat),
                SAO_PAULO.lon + f * (RIO.lon - SAO_PAULO.lon),
            );
            let got = trip_progress(Some(SAO_PAULO), Some(RIO), current);
            assert!(
                (i32::from(got) - expected).abs() <= 1,
                "fraction {f}: got {got}, expected ~{expected}"
            );
        }
    }

    #[test]
    fn test_behind_origin_clamps_to_zero() {
        // Curitiba is south of São Paulo, i.e. farther from Salvador than
        // the origin is. The raw percentage is negative; the result is 0.
        let curitiba = Coordinate::new(-25.4284, -49.2733);
        assert_eq!(trip_progress(Some(SAO_PAULO), Some(SALVADOR), curitiba), 0);
    }

    #[test]
    fn test_idempotent() {
        let first = trip_progress(Some(SAO_PAULO), Some(SALVADOR), BRASILIA);
        let second = trip_progress(Some(SAO_PAULO), Some(SALVADOR), BRASILIA);
        assert_eq!(first, second);
    }

    #[test]
    fn test_never_panics_on_nonsense_input() {
        let garbage = Coordinate::new(9999.0, -9999.0);
        let p = trip_progress(Some(garbage), Some(SALVADOR), BRASILIA);
        assert!(p <= 100);
    }

    #[test]
    fn test_matches_reference_formula() {
        let cases = [BRASILIA, RIO, SAO_PAULO, SALVADOR];
        for current in cases {
            assert_eq!(
                trip_progress(Some(SAO_PAULO), Some(SALVADOR), current),
                reference(SAO_PAULO, SALVADOR, current)
            );
        }
    }
}
