//! # Apsis Burn Separation Studies
//! This library crate models two-body Keplerian orbits in a plane and
//! answers one question about them: how big a prograde burn at periapsis
//! or apoapsis has to be for a spacecraft to drift a given distance away
//! from an unburned twin after one revolution.
//!
//! ## Getting started
//! This crate provides a few main items:
//! - [`KeplerOrbit`]: A bound orbit described by its semi-major axis,
//!   eccentricity, and the gravitational parameter of the central body.
//!   The period and apsis radii are cached and kept in sync with the elements.
//! - [`SeparationSolver`]: Bisects on the burn magnitude until two copies of
//!   an orbit, one burned and one not, end up a target distance apart
//!   after one orbital period.
//! - [`CentralBody`]: The radius and gravitational parameter of the body
//!   being orbited. Presets live in the [`body_presets`] module.
//!
//! ## Units
//! Everything in this crate is in kilometers, seconds, and radians.
//! Gravitational parameters are in km^3 s^-2 and speeds in km s^-1.
//! There is no unit conversion layer; keep your inputs consistent.
//!
//! ## Example
//!
//! ```rust
//! use apsis_separation::{body_presets::moons::the_moon, separation_study, KeplerOrbit};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let moon = the_moon();
//! let orbit = KeplerOrbit::from_altitudes(&moon, 100.0, 10_000.0)?;
//!
//! // Burn at periapsis so that the two spacecraft are 10 km apart one orbit later
//! let outcome = separation_study(&orbit, 10.0, 0.0)?;
//!
//! assert!(outcome.converged);
//! assert!((outcome.separation - 10.0).abs() < 0.001);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod anomaly;
mod body;
pub mod body_presets;
mod orbit;
mod separation;
mod solvers;

pub use anomaly::{
    eccentric_anomaly_from_true, mean_anomaly_from_eccentric, true_anomaly_from_eccentric,
};
pub use body::CentralBody;
pub use orbit::{Apsis, KeplerOrbit};
pub use separation::{
    separation_study, SeparationError, SeparationOutcome, SeparationSolver, SolverSettings,
};
pub use solvers::solve_keplers_equation;

use thiserror::Error;

/// The maximum number of iterations for the numerical approach algorithms.
///
/// This is used to prevent infinite loops in case the method fails to converge.
const NUMERIC_MAX_ITERS: u32 = 1000;

/// The eccentric anomaly solver stops once a step is smaller than this,
/// in radians.
const KEPLER_TOLERANCE: f64 = 1e-12;

/// How far, in radians, a true anomaly may sit from an apsis
/// and still count as a burn at that apsis.
const APSIS_TOLERANCE: f64 = 1e-9;

/// An error returned by the fallible operations on a [`KeplerOrbit`].
///
/// Whenever one of these is returned from a mutating method, the orbit
/// is left exactly as it was before the call.
#[derive(Clone, Copy, Debug, Error, PartialEq)]
pub enum OrbitError {
    /// ### The elements do not describe a bound orbit.
    /// The semi-major axis has to be positive and finite, and the
    /// eccentricity has to be in the range `[0, 1)`.
    /// Parabolic and hyperbolic trajectories are not supported.
    #[error(
        "elements (a = {semi_major_axis}, e = {eccentricity}) do not describe a bound orbit"
    )]
    InvalidElements {
        /// The rejected semi-major axis, in kilometers.
        semi_major_axis: f64,
        /// The rejected eccentricity.
        eccentricity: f64,
    },

    /// ### The gravitational parameter is not positive and finite.
    #[error("gravitational parameter {0} km^3/s^2 must be positive and finite")]
    InvalidGravitationalParameter(f64),

    /// ### A burn was requested away from periapsis and apoapsis.
    /// Burns are assumed to be tangential, which only holds at the apsides.
    #[error("burn can only happen at periapsis or apoapsis, got true anomaly {true_anomaly} rad")]
    BurnNotAtApsis {
        /// The rejected true anomaly, in radians.
        true_anomaly: f64,
    },

    /// ### The burn would put the spacecraft on an escape trajectory.
    #[error("delta-v {delta_v} km/s is not less than {max_delta_v:.4} km/s, resulting in escape")]
    EscapeDeltaV {
        /// The requested delta-v, in km/s.
        delta_v: f64,
        /// The (exclusive) largest delta-v that keeps the orbit bound, in km/s.
        max_delta_v: f64,
    },

    /// ### The burn would stop the spacecraft or turn it around.
    #[error(
        "delta-v {delta_v} km/s is not greater than {min_delta_v:.4} km/s, resulting in zero speed"
    )]
    NonPositiveSpeed {
        /// The requested delta-v, in km/s.
        delta_v: f64,
        /// The (exclusive) smallest delta-v that keeps the speed positive, in km/s.
        min_delta_v: f64,
    },

    /// ### Kepler's equation could not be solved to tolerance.
    #[error(
        "Kepler's equation did not converge for M = {mean_anomaly} rad, e = {eccentricity} (residual {residual:e})"
    )]
    KeplerDidNotConverge {
        /// The mean anomaly being solved for, in radians.
        mean_anomaly: f64,
        /// The eccentricity of the orbit.
        eccentricity: f64,
        /// The residual of the last evaluated iterate, in radians.
        residual: f64,
    },
}


#[inline]
fn keplers_equation(mean_anomaly: f64, eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    eccentric_anomaly - (eccentricity * eccentric_anomaly.sin()) - mean_anomaly
}
#[inline]
fn keplers_equation_derivative(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    1.0 - (eccentricity * eccentric_anomaly.cos())
}
