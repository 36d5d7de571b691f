use core::f64::consts::{PI, TAU};

use log::trace;

use crate::{
    keplers_equation, keplers_equation_derivative, OrbitError, KEPLER_TOLERANCE,
    NUMERIC_MAX_ITERS,
};

/// Solves Kepler's equation, `E - e * sin(E) = M`, for the elliptic
/// eccentric anomaly `E`.
///
/// The mean anomaly does not need to be wrapped; whole revolutions are
/// carried through, so the returned eccentric anomaly is on the same
/// revolution as the given mean anomaly.
///
/// # Method
/// Newton-Raphson iteration seeded at `E = M`, with derivative
/// `1 - e * cos(E)`.
/// Kepler's equation is monotone in `E`, so the root is always bracketed
/// within half a revolution of `M`. Every iterate shrinks that bracket, and any
/// Newton step that would leave it, or that converges too slowly, is replaced
/// with a bisection step.
///
/// The iteration stops once a step moves `E` by less than 1e-12 rad. At least
/// one step is always taken, so small mean anomalies on very eccentric orbits,
/// where `E` is close to `M / (1 - e)`, still come out right.
///
/// # Errors
/// Returns [`OrbitError::KeplerDidNotConverge`] if the steps do not shrink
/// below 1e-12 rad before the iteration cap, or if the inputs are not finite.
///
/// # Unchecked Operation
/// The eccentricity is assumed to be in `[0, 1)`.
///
/// # Example
/// ```
/// use apsis_separation::solve_keplers_equation;
///
/// let eccentricity = 0.6;
/// let mean_anomaly = 1.0;
///
/// let ecc_anom = solve_keplers_equation(eccentricity, mean_anomaly).unwrap();
/// let residual = ecc_anom - eccentricity * ecc_anom.sin() - mean_anomaly;
///
/// assert!(residual.abs() < 1e-12);
/// ```
pub fn solve_keplers_equation(eccentricity: f64, mean_anomaly: f64) -> Result<f64, OrbitError> {
    let revolutions = (mean_anomaly / TAU).round();
    let reduced_mean_anomaly = mean_anomaly - revolutions * TAU;

    // f(-pi) = -pi - M <= 0 and f(pi) = pi - M >= 0 for M in [-pi, pi]
    let mut low = -PI;
    let mut high = PI;
    let mut eccentric_anomaly = reduced_mean_anomaly;
    let mut residual = f64::NAN;

    let mut last_step = high - low;
    let mut step_before_last = last_step;

    for iteration in 0..NUMERIC_MAX_ITERS {
        residual = keplers_equation(reduced_mean_anomaly, eccentric_anomaly, eccentricity);

        if residual == 0.0 {
            return Ok(eccentric_anomaly + revolutions * TAU);
        }

        if !residual.is_finite() {
            break;
        }

        if residual < 0.0 {
            low = eccentric_anomaly;
        } else {
            high = eccentric_anomaly;
        }

        let derivative = keplers_equation_derivative(eccentric_anomaly, eccentricity);
        let newton = eccentric_anomaly - residual / derivative;

        // Newton steps have to stay in the bracket and at least halve the
        // step from two iterations ago
        let next = if newton > low
            && newton < high
            && (2.0 * residual).abs() <= (step_before_last * derivative).abs()
        {
            newton
        } else {
            0.5 * (low + high)
        };

        step_before_last = last_step;
        last_step = next - eccentric_anomaly;
        eccentric_anomaly = next;

        if last_step.abs() < KEPLER_TOLERANCE {
            trace!(
                "Kepler's equation solved in {} iterations \
                (M = {mean_anomaly}, e = {eccentricity}, E = {eccentric_anomaly})",
                iteration + 1
            );
            return Ok(eccentric_anomaly + revolutions * TAU);
        }
    }

    Err(OrbitError::KeplerDidNotConverge {
        mean_anomaly,
        eccentricity,
        residual,
    })
}
