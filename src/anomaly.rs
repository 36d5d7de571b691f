//! Conversions between the true, eccentric, and mean anomalies of an
//! elliptic orbit.
//!
//! The true/eccentric conversions go through the tangent of the half-angle,
//! so they are insensitive to whole revolutions being added to their input
//! and their output lands in `[-pi, pi]`. Circular orbits are the exception:
//! there all three anomalies are the same angle and it is passed through as-is.

/// Gets the eccentric anomaly at a given true anomaly.
///
/// `E = 2 * atan(sqrt((1 - e) / (1 + e)) * tan(v / 2))`
///
/// # Unchecked Operation
/// The eccentricity must be in `[0, 1)`. Other values may produce NaNs.
///
/// # Example
/// ```
/// use apsis_separation::eccentric_anomaly_from_true;
///
/// // Circular orbits have no distinction between the anomalies
/// assert_eq!(eccentric_anomaly_from_true(0.0, 1.25), 1.25);
/// ```
pub fn eccentric_anomaly_from_true(eccentricity: f64, true_anomaly: f64) -> f64 {
    if eccentricity == 0.0 {
        return true_anomaly;
    }

    let ratio = ((1.0 - eccentricity) / (1.0 + eccentricity)).sqrt();
    2.0 * (ratio * (true_anomaly * 0.5).tan()).atan()
}

/// Gets the true anomaly at a given eccentric anomaly.
///
/// `v = 2 * atan(sqrt((1 + e) / (1 - e)) * tan(E / 2))`
///
/// # Unchecked Operation
/// The eccentricity must be in `[0, 1)`. Other values may produce NaNs.
pub fn true_anomaly_from_eccentric(eccentricity: f64, eccentric_anomaly: f64) -> f64 {
    if eccentricity == 0.0 {
        return eccentric_anomaly;
    }

    let ratio = ((1.0 + eccentricity) / (1.0 - eccentricity)).sqrt();
    2.0 * (ratio * (eccentric_anomaly * 0.5).tan()).atan()
}

/// Gets the mean anomaly at a given eccentric anomaly, using Kepler's equation.
///
/// `M = E - e * sin(E)`
pub fn mean_anomaly_from_eccentric(eccentricity: f64, eccentric_anomaly: f64) -> f64 {
    eccentric_anomaly - eccentricity * eccentric_anomaly.sin()
}
