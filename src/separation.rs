use glam::DVec2;
use log::{debug, trace, warn};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Apsis, KeplerOrbit, OrbitError};

/// Settings for the bisection in a [`SeparationSolver`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SolverSettings {
    /// How close, in kilometers, the achieved separation has to be to the
    /// target for the search to stop.
    pub tolerance: f64,

    /// The maximum number of delta-v values to try.
    pub max_iterations: u32,
}

impl Default for SolverSettings {
    /// A tolerance of 1 meter and at most 100 iterations.
    fn default() -> Self {
        Self {
            tolerance: 0.001,
            max_iterations: 100,
        }
    }
}

/// The result of a separation study.
///
/// When the search runs out of iterations, or the delta-v bracket shrinks
/// to nothing because the target cannot be reached, this holds the last
/// delta-v that produced a bound orbit and the separation it achieved; check
/// [`converged`][SeparationOutcome::converged] before relying on it.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SeparationOutcome {
    /// The prograde delta-v applied to the burned spacecraft, in km/s.
    pub delta_v: f64,

    /// The distance between the two spacecraft after one period, in kilometers.
    pub separation: f64,

    /// How many delta-v values were tried, including ones rejected for
    /// being too close to escape.
    pub iterations: u32,

    /// Whether the separation is within tolerance of the target.
    pub converged: bool,
}

/// An error returned by a [`SeparationSolver`].
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum SeparationError {
    /// The target separation is not positive and finite.
    #[error("target separation {0} km must be positive and finite")]
    InvalidTarget(f64),

    /// The solver settings cannot produce a result.
    #[error(
        "solver needs a positive tolerance and at least one iteration \
        (got tolerance {tolerance} km, {max_iterations} iterations)"
    )]
    InvalidSettings {
        /// The configured tolerance, in kilometers.
        tolerance: f64,
        /// The configured iteration cap.
        max_iterations: u32,
    },

    /// An orbit operation failed while running the study.
    #[error(transparent)]
    Orbit(#[from] OrbitError),
}

/// Finds the prograde delta-v at periapsis or apoapsis that puts two
/// initially co-located spacecraft a given distance apart after one orbit.
///
/// Both spacecraft start on the same reference orbit. The first one is
/// left alone, and after one period of the reference orbit it is back at the
/// burn point. The second one burns at the burn point and is propagated along
/// its new orbit for the same amount of time. The solver bisects on the
/// burn's delta-v, between zero and the delta-v that would escape, until the
/// straight-line distance between them matches the target.
///
/// The bisection assumes that the separation grows with delta-v.
///
/// # Example
/// ```
/// use apsis_separation::{KeplerOrbit, SeparationSolver, SolverSettings};
/// use std::f64::consts::PI;
///
/// let orbit = KeplerOrbit::new(6787.4, 0.73, 4902.8).unwrap();
/// let solver = SeparationSolver::new(SolverSettings {
///     tolerance: 0.01,
///     max_iterations: 200,
/// });
///
/// let periapsis = solver.solve(&orbit, 10.0, 0.0).unwrap();
/// let apoapsis = solver.solve(&orbit, 10.0, PI).unwrap();
///
/// assert!(periapsis.converged && apoapsis.converged);
/// assert!(apoapsis.delta_v > periapsis.delta_v);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeparationSolver {
    settings: SolverSettings,
}

impl SeparationSolver {
    /// Creates a new solver with the given settings.
    pub fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Gets the settings of this solver.
    pub fn get_settings(&self) -> &SolverSettings {
        &self.settings
    }

    fn validate_settings(&self) -> Result<(), SeparationError> {
        let SolverSettings {
            tolerance,
            max_iterations,
        } = self.settings;

        if tolerance.is_finite() && tolerance > 0.0 && max_iterations > 0 {
            Ok(())
        } else {
            Err(SeparationError::InvalidSettings {
                tolerance,
                max_iterations,
            })
        }
    }

    /// Runs a separation study on a reference orbit.
    ///
    /// # Parameters
    /// - `reference_orbit`: The orbit both spacecraft start on. It is cloned
    ///   and never modified.
    /// - `target_separation`: The distance to achieve after one period,
    ///   in kilometers.
    /// - `initial_true_anomaly`: Where both spacecraft start and where the
    ///   burn happens. Has to be at periapsis or apoapsis.
    ///
    /// # Errors
    /// - [`SeparationError::InvalidSettings`] if the tolerance is not
    ///   positive or the iteration cap is zero.
    /// - [`SeparationError::InvalidTarget`] if the target separation
    ///   is not positive.
    /// - [`SeparationError::Orbit`] if the burn point is not an apsis, or if an
    ///   orbit operation fails along the way.
    ///
    /// Running out of iterations is not an error, and neither is a target
    /// that no bound orbit can reach; see [`SeparationOutcome`].
    pub fn solve(
        &self,
        reference_orbit: &KeplerOrbit,
        target_separation: f64,
        initial_true_anomaly: f64,
    ) -> Result<SeparationOutcome, SeparationError> {
        self.validate_settings()?;
        if !(target_separation.is_finite() && target_separation > 0.0) {
            return Err(SeparationError::InvalidTarget(target_separation));
        }
        Apsis::from_true_anomaly(initial_true_anomaly)?;

        let control = reference_orbit.clone();
        let mut burned = reference_orbit.clone();

        let time_elapsed = control.get_period();
        // One full period later the control spacecraft is back where it started
        let control_position = control.get_position_at_true_anomaly(initial_true_anomaly);

        let mut delta_v_low = 0.0;
        let mut delta_v_high =
            reference_orbit.get_max_delta_v_at_true_anomaly(initial_true_anomaly);

        // A zero burn keeps both spacecraft together
        let mut last_trial = (0.0, 0.0);
        let mut iterations = 0;

        while iterations < self.settings.max_iterations {
            let delta_v = 0.5 * (delta_v_low + delta_v_high);

            if delta_v <= delta_v_low || delta_v >= delta_v_high {
                debug!(
                    "Delta-v bracket collapsed at {delta_v} km/s \
                    after {iterations} iterations"
                );
                break;
            }

            iterations += 1;

            burned.clone_from(reference_orbit);
            let separation = match separation_after_burn(
                &mut burned,
                delta_v,
                initial_true_anomaly,
                time_elapsed,
                control_position,
            ) {
                Ok(separation) => separation,
                Err(OrbitError::EscapeDeltaV { .. }) => {
                    trace!("Iteration {iterations}: delta-v {delta_v} km/s is too close to escape");
                    delta_v_high = delta_v;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            trace!("Iteration {iterations}: delta-v {delta_v} km/s gives separation {separation} km");
            last_trial = (delta_v, separation);

            if (separation - target_separation).abs() < self.settings.tolerance {
                debug!(
                    "Separation study converged after {iterations} iterations: \
                    {delta_v} km/s for {separation} km"
                );
                return Ok(SeparationOutcome {
                    delta_v,
                    separation,
                    iterations,
                    converged: true,
                });
            }

            if separation < target_separation {
                delta_v_low = delta_v;
            } else {
                delta_v_high = delta_v;
            }
        }

        let (delta_v, separation) = last_trial;
        warn!(
            "Separation study did not converge after {iterations} iterations: \
            best was {delta_v} km/s for {separation} km (target {target_separation} km)"
        );

        Ok(SeparationOutcome {
            delta_v,
            separation,
            iterations,
            converged: false,
        })
    }
}

/// Burns `burned` at `true_anomaly`, propagates it for `time`, and measures
/// how far it ends up from `control_position`.
fn separation_after_burn(
    burned: &mut KeplerOrbit,
    delta_v: f64,
    true_anomaly: f64,
    time: f64,
    control_position: DVec2,
) -> Result<f64, OrbitError> {
    let burn_anomaly = burned.apply_delta_v(delta_v, true_anomaly)?;
    let final_anomaly = burned.get_true_anomaly_after_time(time, burn_anomaly)?;

    Ok(control_position.distance(burned.get_position_at_true_anomaly(final_anomaly)))
}

/// Runs a separation study with the default [`SolverSettings`].
///
/// See [`SeparationSolver::solve`].
pub fn separation_study(
    reference_orbit: &KeplerOrbit,
    target_separation: f64,
    initial_true_anomaly: f64,
) -> Result<SeparationOutcome, SeparationError> {
    SeparationSolver::default().solve(reference_orbit, target_separation, initial_true_anomaly)
}
