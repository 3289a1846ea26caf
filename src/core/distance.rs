use crate::core::constants::{
    VINCENTY_MAX_ITERATIONS, VINCENTY_TOLERANCE, WGS84_A, WGS84_B, WGS84_F,
};
use crate::core::units::{DistanceAlgorithm, DistanceUnit};
use crate::error::GeoSearchError;

/// Great-circle distance on a spherical Earth using the haversine formula.
///
/// Stable for both very short and very long distances, and exactly 0 for identical points.
///
/// # Example
/// ```
/// use geo_radius::{DistanceUnit, haversine};
///
/// let d = haversine(0.0, 0.0, 0.0, 1.0, DistanceUnit::Kilometers);
/// assert!((d - 111.19).abs() < 0.01);
/// ```
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: DistanceUnit) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());

    unit.earth_radius() * c
}

/// Great-circle distance using the spherical law of cosines.
///
/// `acos` is ill-conditioned near 1, so sub-meter distances come out noisy.
/// Prefer [`haversine`] when that matters.
pub fn spherical_law(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: DistanceUnit) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let cos_c = phi1.sin() * phi2.sin() + phi1.cos() * phi2.cos() * d_lambda.cos();

    unit.earth_radius() * cos_c.clamp(-1.0, 1.0).acos()
}

/// Ellipsoidal distance on WGS84 using Vincenty's inverse formula.
///
/// Returns `0.0` when the iteration fails to converge within 100 steps (nearly
/// antipodal points) or when the points coincide. This is a known precision
/// limitation; callers needing a guaranteed answer should use [`haversine`], or
/// [`vincenty_inverse`] to observe the failure.
pub fn vincenty(lat1: f64, lon1: f64, lat2: f64, lon2: f64, unit: DistanceUnit) -> f64 {
    match vincenty_inverse(lat1, lon1, lat2, lon2) {
        Ok(meters) => unit.from_meters(meters),
        Err(err) => {
            tracing::debug!(lat1, lon1, lat2, lon2, error = %err, "Vincenty fell back to zero");
            0.0
        }
    }
}

/// Vincenty's inverse solution in meters, reporting degenerate input and
/// non-convergence as [`GeoSearchError::PrecisionLimit`].
pub fn vincenty_inverse(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> Result<f64, GeoSearchError> {
    let l = (lon2 - lon1).to_radians();
    let u1 = ((1.0 - WGS84_F) * lat1.to_radians().tan()).atan();
    let u2 = ((1.0 - WGS84_F) * lat2.to_radians().tan()).atan();
    let (sin_u1, cos_u1) = u1.sin_cos();
    let (sin_u2, cos_u2) = u2.sin_cos();

    let mut lambda = l;
    let mut converged = false;

    let mut sin_sigma = 0.0;
    let mut cos_sigma = 0.0;
    let mut sigma = 0.0;
    let mut cos_sq_alpha = 0.0;
    let mut cos_2sigma_m = 0.0;

    for _ in 0..VINCENTY_MAX_ITERATIONS {
        let (sin_lambda, cos_lambda) = lambda.sin_cos();
        let cross = cos_u1 * sin_u2 - sin_u1 * cos_u2 * cos_lambda;
        sin_sigma = ((cos_u2 * sin_lambda).powi(2) + cross * cross).sqrt();

        if sin_sigma == 0.0 {
            return Err(GeoSearchError::PrecisionLimit(
                "coincident points (sin sigma = 0)".to_string(),
            ));
        }

        cos_sigma = sin_u1 * sin_u2 + cos_u1 * cos_u2 * cos_lambda;
        sigma = sin_sigma.atan2(cos_sigma);
        let sin_alpha = cos_u1 * cos_u2 * sin_lambda / sin_sigma;
        cos_sq_alpha = 1.0 - sin_alpha * sin_alpha;
        cos_2sigma_m = if cos_sq_alpha == 0.0 {
            // equatorial line
            0.0
        } else {
            cos_sigma - 2.0 * sin_u1 * sin_u2 / cos_sq_alpha
        };

        let c = WGS84_F / 16.0 * cos_sq_alpha * (4.0 + WGS84_F * (4.0 - 3.0 * cos_sq_alpha));
        let previous = lambda;
        lambda = l
            + (1.0 - c)
                * WGS84_F
                * sin_alpha
                * (sigma
                    + c * sin_sigma
                        * (cos_2sigma_m
                            + c * cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)));

        if (lambda - previous).abs() < VINCENTY_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        return Err(GeoSearchError::PrecisionLimit(format!(
            "no convergence after {} iterations",
            VINCENTY_MAX_ITERATIONS
        )));
    }

    let u_sq = cos_sq_alpha * (WGS84_A * WGS84_A - WGS84_B * WGS84_B) / (WGS84_B * WGS84_B);
    let big_a = 1.0 + u_sq / 16384.0 * (4096.0 + u_sq * (-768.0 + u_sq * (320.0 - 175.0 * u_sq)));
    let big_b = u_sq / 1024.0 * (256.0 + u_sq * (-128.0 + u_sq * (74.0 - 47.0 * u_sq)));
    let delta_sigma = big_b
        * sin_sigma
        * (cos_2sigma_m
            + big_b / 4.0
                * (cos_sigma * (-1.0 + 2.0 * cos_2sigma_m * cos_2sigma_m)
                    - big_b / 6.0
                        * cos_2sigma_m
                        * (-3.0 + 4.0 * sin_sigma * sin_sigma)
                        * (-3.0 + 4.0 * cos_2sigma_m * cos_2sigma_m)));

    Ok(WGS84_B * big_a * (sigma - delta_sigma))
}

/// Distance between two lat/lon pairs with the chosen algorithm.
pub fn calculate_distance(
    lat1: f64,
    lon1: f64,
    lat2: f64,
    lon2: f64,
    unit: DistanceUnit,
    algorithm: DistanceAlgorithm,
) -> f64 {
    algorithm.compute(lat1, lon1, lat2, lon2, unit)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NYC: (f64, f64) = (40.7128, -74.0060);
    const LONDON: (f64, f64) = (51.5074, -0.1278);

    #[test]
    fn test_one_degree_at_equator() {
        let d = calculate_distance(
            0.0,
            0.0,
            0.0,
            1.0,
            DistanceUnit::Kilometers,
            DistanceAlgorithm::Haversine,
        );
        assert!((d - 111.19).abs() < 0.01);
    }

    #[test]
    fn test_haversine_identity_and_symmetry() {
        let samples = [NYC, LONDON, (-33.8688, 151.2093), (89.9, 10.0), (0.0, 179.9)];
        for &(lat1, lon1) in &samples {
            assert_eq!(haversine(lat1, lon1, lat1, lon1, DistanceUnit::Meters), 0.0);
            for &(lat2, lon2) in &samples {
                let ab = haversine(lat1, lon1, lat2, lon2, DistanceUnit::Kilometers);
                let ba = haversine(lat2, lon2, lat1, lon1, DistanceUnit::Kilometers);
                assert!((ab - ba).abs() < 1e-9);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn test_unit_conversion_consistency() {
        let meters = haversine(NYC.0, NYC.1, LONDON.0, LONDON.1, DistanceUnit::Meters);
        for unit in DistanceUnit::ALL {
            let direct = haversine(NYC.0, NYC.1, LONDON.0, LONDON.1, unit);
            let converted = meters / unit.meters_per_unit();
            assert!((direct - converted).abs() / direct < 1e-9, "{unit}");
        }
    }

    #[test]
    fn test_nyc_to_london() {
        let d = haversine(NYC.0, NYC.1, LONDON.0, LONDON.1, DistanceUnit::Kilometers);
        assert!((d - 5570.0).abs() < 10.0);
    }

    #[test]
    fn test_spherical_law_matches_haversine_at_city_scale() {
        let h = haversine(NYC.0, NYC.1, 40.73, -73.935, DistanceUnit::Kilometers);
        let s = spherical_law(NYC.0, NYC.1, 40.73, -73.935, DistanceUnit::Kilometers);
        assert!((h - s).abs() < 1e-3);
        assert!(spherical_law(NYC.0, NYC.1, NYC.0, NYC.1, DistanceUnit::Kilometers).abs() < 1e-3);
    }

    #[test]
    fn test_vincenty_known_distance() -> Result<(), GeoSearchError> {
        // Flinders Peak to Buninyong, the classic Vincenty reference pair.
        let meters = vincenty_inverse(-37.951033417, 144.424867889, -37.652821139, 143.926495528)?;
        assert!((meters - 54972.271).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn test_vincenty_converts_units_from_meters() -> Result<(), GeoSearchError> {
        let meters = vincenty_inverse(NYC.0, NYC.1, LONDON.0, LONDON.1)?;
        let km = vincenty(NYC.0, NYC.1, LONDON.0, LONDON.1, DistanceUnit::Kilometers);
        let miles = vincenty(NYC.0, NYC.1, LONDON.0, LONDON.1, DistanceUnit::Miles);
        assert!((km - meters / 1000.0).abs() < 1e-9);
        assert!((miles - meters / DistanceUnit::Miles.meters_per_unit()).abs() < 1e-9);
        // Ellipsoidal and spherical answers agree to within half a percent.
        let h = haversine(NYC.0, NYC.1, LONDON.0, LONDON.1, DistanceUnit::Kilometers);
        assert!((km - h).abs() / h < 0.005);
        Ok(())
    }

    #[test]
    fn test_vincenty_degenerate_inputs_fall_back_to_zero() {
        assert_eq!(vincenty(NYC.0, NYC.1, NYC.0, NYC.1, DistanceUnit::Kilometers), 0.0);
        assert!(matches!(
            vincenty_inverse(NYC.0, NYC.1, NYC.0, NYC.1),
            Err(GeoSearchError::PrecisionLimit(_))
        ));

        // Nearly antipodal points do not converge.
        assert!(vincenty_inverse(0.0, 0.0, 0.5, 179.5).is_err());
        assert_eq!(vincenty(0.0, 0.0, 0.5, 179.5, DistanceUnit::Kilometers), 0.0);
    }
}
