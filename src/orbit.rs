use core::f64::consts::{PI, TAU};
use glam::{DMat2, DVec2};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    eccentric_anomaly_from_true, mean_anomaly_from_eccentric, solve_keplers_equation,
    true_anomaly_from_eccentric, CentralBody, OrbitError, APSIS_TOLERANCE,
};

/// One of the two points of an elliptic orbit where the velocity is
/// perpendicular to the radius vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Apsis {
    /// The closest point to the central body, at true anomaly 0.
    Periapsis,
    /// The farthest point from the central body, at true anomaly pi.
    Apoapsis,
}

impl Apsis {
    /// Classifies a true anomaly as an apsis, if it is within 1e-9 rad of one.
    ///
    /// Any number of whole revolutions may be added to the true anomaly.
    ///
    /// # Errors
    /// Returns [`OrbitError::BurnNotAtApsis`] if the true anomaly is
    /// not close enough to either apsis, or is not finite.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::Apsis;
    /// use std::f64::consts::PI;
    ///
    /// assert_eq!(Apsis::from_true_anomaly(0.0), Ok(Apsis::Periapsis));
    /// assert_eq!(Apsis::from_true_anomaly(-PI), Ok(Apsis::Apoapsis));
    /// assert_eq!(Apsis::from_true_anomaly(3.0 * PI), Ok(Apsis::Apoapsis));
    /// assert!(Apsis::from_true_anomaly(PI / 2.0).is_err());
    /// ```
    pub fn from_true_anomaly(true_anomaly: f64) -> Result<Self, OrbitError> {
        let wrapped = true_anomaly.rem_euclid(TAU);

        if wrapped <= APSIS_TOLERANCE || TAU - wrapped <= APSIS_TOLERANCE {
            Ok(Self::Periapsis)
        } else if (wrapped - PI).abs() <= APSIS_TOLERANCE {
            Ok(Self::Apoapsis)
        } else {
            Err(OrbitError::BurnNotAtApsis { true_anomaly })
        }
    }

    /// Gets the true anomaly of this apsis, in radians.
    pub fn true_anomaly(self) -> f64 {
        match self {
            Self::Periapsis => 0.0,
            Self::Apoapsis => PI,
        }
    }
}

/// A struct representing a bound 2D Keplerian orbit with some cached values.
///
/// The orbit is described by its semi-major axis, its eccentricity, and the
/// gravitational parameter of the central body. The orbital period and both
/// apsis radii are derived from those and cached; they are recomputed every
/// time the elements change and can never be set on their own.
///
/// The gravitational parameter is fixed once the orbit is created.
///
/// Positions are given in a frame centered on the central body. For a newly
/// created orbit that frame is the perifocal frame, with periapsis on the +X
/// axis. A burn that swaps the apsides rotates the periapsis by pi in that
/// frame; see [`apply_delta_v`][KeplerOrbit::apply_delta_v].
///
/// # Example
/// ```
/// use apsis_separation::KeplerOrbit;
///
/// let orbit = KeplerOrbit::new(
///     // Semi-major axis, in kilometers
///     10_000.0,
///
///     // Eccentricity
///     0.1,
///
///     // Gravitational parameter of the central body, in km^3 s^-2
///     4902.8,
/// ).unwrap();
///
/// assert!((orbit.get_periapsis() - 9_000.0).abs() < 1e-9);
/// assert!((orbit.get_apoapsis() - 11_000.0).abs() < 1e-9);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeplerOrbit {
    /// The semi-major axis of the orbit, in kilometers.
    semi_major_axis: f64,

    /// The eccentricity of the orbit, in `[0, 1)`.
    eccentricity: f64,

    /// The argument of periapsis of the orbit, in radians, in `[0, tau)`.
    ///
    /// This is the angle from the +X axis of the frame to periapsis.
    /// It is zero until a burn swaps the apsides.
    arg_pe: f64,

    /// The gravitational parameter of the central body, in km^3 s^-2.
    mu: f64,

    cache: OrbitCachedCalculations,
}

// -------- MEMO --------
// When updating this struct, please review the following methods:
// `KeplerOrbit::get_cached_calculations()`
// `KeplerOrbit::set_elements()`
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct OrbitCachedCalculations {
    /// The orbital period, in seconds.
    period: f64,
    /// The periapsis radius, in kilometers.
    periapsis: f64,
    /// The apoapsis radius, in kilometers.
    apoapsis: f64,
    /// Rotates perifocal positions by the argument of periapsis.
    rotation: DMat2,
}

impl KeplerOrbit {
    /// Creates a new orbit with the given elements.
    ///
    /// # Parameters
    /// - `semi_major_axis`: The semi-major axis of the orbit, in kilometers.
    /// - `eccentricity`: The eccentricity of the orbit.
    /// - `mu`: The gravitational parameter of the central body, in km^3 s^-2.
    ///
    /// # Errors
    /// - [`OrbitError::InvalidGravitationalParameter`] if `mu` is not
    ///   positive and finite.
    /// - [`OrbitError::InvalidElements`] if the semi-major axis is not
    ///   positive and finite, or if the eccentricity is outside `[0, 1)`.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::{KeplerOrbit, OrbitError};
    ///
    /// let orbit = KeplerOrbit::new(6787.4, 0.73, 4902.8).unwrap();
    /// assert_eq!(orbit.get_semi_major_axis(), 6787.4);
    /// assert_eq!(orbit.get_eccentricity(), 0.73);
    /// assert_eq!(orbit.get_gravitational_parameter(), 4902.8);
    ///
    /// // Hyperbolic trajectories are rejected
    /// assert_eq!(
    ///     KeplerOrbit::new(6787.4, 1.5, 4902.8),
    ///     Err(OrbitError::InvalidElements {
    ///         semi_major_axis: 6787.4,
    ///         eccentricity: 1.5,
    ///     }),
    /// );
    /// ```
    pub fn new(semi_major_axis: f64, eccentricity: f64, mu: f64) -> Result<Self, OrbitError> {
        if !(mu.is_finite() && mu > 0.0) {
            return Err(OrbitError::InvalidGravitationalParameter(mu));
        }
        Self::validate_elements(semi_major_axis, eccentricity)?;

        let arg_pe = 0.0;
        let cache = Self::get_cached_calculations(semi_major_axis, eccentricity, arg_pe, mu);
        Ok(Self {
            semi_major_axis,
            eccentricity,
            arg_pe,
            mu,
            cache,
        })
    }

    /// Creates a new orbit from its periapsis and apoapsis radii.
    ///
    /// # Parameters
    /// - `periapsis`: The periapsis radius, in kilometers.
    /// - `apoapsis`: The apoapsis radius, in kilometers.
    /// - `mu`: The gravitational parameter of the central body, in km^3 s^-2.
    ///
    /// # Errors
    /// Same as [`KeplerOrbit::new`]. Swapped apsides or a non-positive
    /// periapsis show up as an [`OrbitError::InvalidElements`].
    pub fn with_apsides(periapsis: f64, apoapsis: f64, mu: f64) -> Result<Self, OrbitError> {
        let semi_major_axis = 0.5 * (periapsis + apoapsis);
        let eccentricity = (apoapsis - periapsis) / (apoapsis + periapsis);

        Self::new(semi_major_axis, eccentricity, mu)
    }

    /// Creates a new orbit around a body from the altitudes of its apsides
    /// above the body's surface.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::{body_presets::moons::the_moon, KeplerOrbit};
    ///
    /// let moon = the_moon();
    /// let orbit = KeplerOrbit::from_altitudes(&moon, 100.0, 10_000.0).unwrap();
    ///
    /// assert!((orbit.get_periapsis() - 1837.4).abs() < 1e-9);
    /// assert!((orbit.get_apoapsis() - 11_737.4).abs() < 1e-9);
    /// ```
    pub fn from_altitudes(
        body: &CentralBody,
        periapsis_altitude: f64,
        apoapsis_altitude: f64,
    ) -> Result<Self, OrbitError> {
        Self::with_apsides(
            body.radius_at_altitude(periapsis_altitude),
            body.radius_at_altitude(apoapsis_altitude),
            body.mu,
        )
    }

    fn validate_elements(semi_major_axis: f64, eccentricity: f64) -> Result<(), OrbitError> {
        let valid_sma = semi_major_axis.is_finite() && semi_major_axis > 0.0;
        let valid_ecc = (0.0..1.0).contains(&eccentricity);

        if valid_sma && valid_ecc {
            Ok(())
        } else {
            Err(OrbitError::InvalidElements {
                semi_major_axis,
                eccentricity,
            })
        }
    }

    fn get_cached_calculations(
        semi_major_axis: f64,
        eccentricity: f64,
        arg_pe: f64,
        mu: f64,
    ) -> OrbitCachedCalculations {
        OrbitCachedCalculations {
            period: TAU * (semi_major_axis.powi(3) / mu).sqrt(),
            periapsis: semi_major_axis * (1.0 - eccentricity),
            apoapsis: semi_major_axis * (1.0 + eccentricity),
            rotation: DMat2::from_angle(arg_pe),
        }
    }

    /// Only call with validated elements.
    fn set_elements(&mut self, semi_major_axis: f64, eccentricity: f64, arg_pe: f64) {
        self.semi_major_axis = semi_major_axis;
        self.eccentricity = eccentricity;
        self.arg_pe = arg_pe;
        self.cache = Self::get_cached_calculations(semi_major_axis, eccentricity, arg_pe, self.mu);
    }

    /// Replaces the semi-major axis and eccentricity of the orbit,
    /// recomputing the cached period and apsis radii.
    ///
    /// The gravitational parameter and the argument of periapsis are kept.
    ///
    /// # Errors
    /// Returns [`OrbitError::InvalidElements`] if the elements do not
    /// describe a bound orbit. The orbit is left unchanged in that case.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::KeplerOrbit;
    ///
    /// let mut orbit = KeplerOrbit::new(10_000.0, 0.1, 4902.8).unwrap();
    /// orbit.reset(20_000.0, 0.5).unwrap();
    ///
    /// assert_eq!(orbit.get_semi_major_axis(), 20_000.0);
    /// assert_eq!(orbit.get_periapsis(), 10_000.0);
    /// assert_eq!(orbit.get_apoapsis(), 30_000.0);
    ///
    /// assert!(orbit.reset(-1.0, 0.5).is_err());
    /// assert_eq!(orbit.get_semi_major_axis(), 20_000.0);
    /// ```
    pub fn reset(&mut self, semi_major_axis: f64, eccentricity: f64) -> Result<(), OrbitError> {
        Self::validate_elements(semi_major_axis, eccentricity)?;
        self.set_elements(semi_major_axis, eccentricity, self.arg_pe);
        Ok(())
    }

    /// Gets the semi-major axis of the orbit, in kilometers.
    pub fn get_semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    /// Gets the eccentricity of the orbit.
    pub fn get_eccentricity(&self) -> f64 {
        self.eccentricity
    }

    /// Gets the argument of periapsis of the orbit, in radians.
    pub fn get_arg_pe(&self) -> f64 {
        self.arg_pe
    }

    /// Gets the gravitational parameter of the central body, in km^3 s^-2.
    pub fn get_gravitational_parameter(&self) -> f64 {
        self.mu
    }

    /// Gets the orbital period, in seconds.
    ///
    /// # Performance
    /// This value is cached.
    pub fn get_period(&self) -> f64 {
        self.cache.period
    }

    /// Gets the periapsis radius, in kilometers.
    pub fn get_periapsis(&self) -> f64 {
        self.cache.periapsis
    }

    /// Gets the apoapsis radius, in kilometers.
    pub fn get_apoapsis(&self) -> f64 {
        self.cache.apoapsis
    }

    /// Gets the distance from the central body at a given true anomaly, in kilometers.
    ///
    /// `r = a * (1 - e^2) / (1 + e * cos(v))`
    pub fn get_radius_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        self.semi_major_axis * (1.0 - e * e) / (1.0 + e * true_anomaly.cos())
    }

    /// Gets the orbital speed at a given true anomaly, in km/s.
    ///
    /// Uses the vis-viva equation, `v^2 = mu * (2 / r - 1 / a)`.
    /// The radicand is always positive since the elements are validated
    /// to describe a bound orbit.
    pub fn get_speed_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let radius = self.get_radius_at_true_anomaly(true_anomaly);
        (self.mu * (2.0 / radius - self.semi_major_axis.recip())).sqrt()
    }

    /// Gets the escape speed at the distance the orbit reaches at a given
    /// true anomaly, in km/s.
    ///
    /// `v_esc = sqrt(2 * mu / r)`
    pub fn get_escape_speed_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let radius = self.get_radius_at_true_anomaly(true_anomaly);
        (2.0 * self.mu / radius).sqrt()
    }

    /// Gets the smallest prograde delta-v at a given true anomaly that
    /// would put the orbit on an escape trajectory, in km/s.
    ///
    /// [`apply_delta_v`][KeplerOrbit::apply_delta_v] only accepts burns
    /// strictly below this value.
    pub fn get_max_delta_v_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        self.get_escape_speed_at_true_anomaly(true_anomaly)
            - self.get_speed_at_true_anomaly(true_anomaly)
    }

    /// Gets the retrograde delta-v at a given true anomaly that would bring
    /// the orbiting body to a standstill, in km/s.
    ///
    /// [`apply_delta_v`][KeplerOrbit::apply_delta_v] only accepts burns
    /// strictly above this value.
    pub fn get_min_delta_v_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        -self.get_speed_at_true_anomaly(true_anomaly)
    }

    /// Gets the position at a given true anomaly in the perifocal (PQW) frame,
    /// where periapsis lies on the +X axis.
    ///
    /// `x = r * cos(v)`, `y = r * sin(v)`
    pub fn get_pqw_position_at_true_anomaly(&self, true_anomaly: f64) -> DVec2 {
        let radius = self.get_radius_at_true_anomaly(true_anomaly);
        let (sin, cos) = true_anomaly.sin_cos();
        DVec2::new(radius * cos, radius * sin)
    }

    /// Gets the position at a given true anomaly, in kilometers.
    ///
    /// This is the perifocal position rotated by the argument of periapsis.
    /// For orbits that have not had their apsides swapped by a burn, this
    /// is the same as
    /// [`get_pqw_position_at_true_anomaly`][KeplerOrbit::get_pqw_position_at_true_anomaly].
    ///
    /// # Example
    /// ```
    /// use apsis_separation::KeplerOrbit;
    /// use glam::DVec2;
    ///
    /// let orbit = KeplerOrbit::new(10_000.0, 0.1, 4902.8).unwrap();
    /// let position = orbit.get_position_at_true_anomaly(0.0);
    ///
    /// assert!(position.distance(DVec2::new(9_000.0, 0.0)) < 1e-9);
    /// ```
    pub fn get_position_at_true_anomaly(&self, true_anomaly: f64) -> DVec2 {
        self.cache.rotation * self.get_pqw_position_at_true_anomaly(true_anomaly)
    }

    /// Gets the true anomaly after some time has passed, starting from a
    /// given true anomaly.
    ///
    /// # Parameters
    /// - `time`: The time elapsed, in seconds. May be negative.
    /// - `initial_true_anomaly`: The true anomaly at the start, in radians.
    ///
    /// # Method
    /// The initial true anomaly is converted to a mean anomaly, which
    /// advances at a constant `tau / T` radians per second. Kepler's equation
    /// is then solved for the eccentric anomaly at the end, which is
    /// converted back into a true anomaly.
    ///
    /// This does not change the orbit.
    ///
    /// # Errors
    /// Returns [`OrbitError::KeplerDidNotConverge`] if Kepler's equation
    /// could not be solved, which only happens for non-finite inputs.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::KeplerOrbit;
    /// use std::f64::consts::PI;
    ///
    /// let orbit = KeplerOrbit::new(10_000.0, 0.1, 4902.8).unwrap();
    ///
    /// // Periapsis to apoapsis takes half an orbit
    /// let half_period = 0.5 * orbit.get_period();
    /// let true_anomaly = orbit.get_true_anomaly_after_time(half_period, 0.0).unwrap();
    ///
    /// assert!((true_anomaly.abs() - PI).abs() < 1e-6);
    /// ```
    pub fn get_true_anomaly_after_time(
        &self,
        time: f64,
        initial_true_anomaly: f64,
    ) -> Result<f64, OrbitError> {
        let e = self.eccentricity;

        let initial_ecc_anom = eccentric_anomaly_from_true(e, initial_true_anomaly);
        let initial_mean_anom = mean_anomaly_from_eccentric(e, initial_ecc_anom);

        let mean_anom = initial_mean_anom + TAU * (time / self.cache.period);
        let ecc_anom = solve_keplers_equation(e, mean_anom)?;

        Ok(true_anomaly_from_eccentric(e, ecc_anom))
    }

    /// Applies an instantaneous prograde (or, if negative, retrograde) burn
    /// at periapsis or apoapsis and updates the orbital elements.
    ///
    /// Returns the true anomaly of the burn point on the new orbit, which is
    /// where the body should be propagated from.
    ///
    /// # Parameters
    /// - `delta_v`: The change in speed, in km/s.
    /// - `true_anomaly`: Where the burn happens. Has to be within 1e-9 rad
    ///   of periapsis or apoapsis, since the burn is assumed to be tangential.
    ///
    /// # Method
    /// The new semi-major axis comes from the vis-viva equation at the burn
    /// radius `r` and the new speed `v`:
    /// `a = 1 / (2 / r - v^2 / mu)`.
    ///
    /// At an apsis the angular momentum is `h = r * v`, which gives
    /// the new eccentricity: `e = sqrt(1 - h^2 / (a * mu))`. The radicand
    /// is clamped to zero to absorb round-off.
    ///
    /// # Swapping apsides
    /// If the burn leaves the body faster than local circular speed, the
    /// burn point is the periapsis of the new orbit. Otherwise it is the
    /// apoapsis. When that differs from the apsis the burn started at
    /// (e.g. a large prograde burn at apoapsis), the argument of periapsis is
    /// rotated by pi so that positions stay continuous across the burn.
    ///
    /// # Errors
    /// The orbit is left unchanged if any of these are returned:
    /// - [`OrbitError::BurnNotAtApsis`] if the true anomaly is not at an apsis.
    /// - [`OrbitError::EscapeDeltaV`] if the delta-v is not below
    ///   [`get_max_delta_v_at_true_anomaly`][KeplerOrbit::get_max_delta_v_at_true_anomaly],
    ///   or is so close to it that the new orbit cannot be represented
    ///   (the semi-major axis overflows or the eccentricity rounds to 1).
    /// - [`OrbitError::NonPositiveSpeed`] if the delta-v is not above
    ///   [`get_min_delta_v_at_true_anomaly`][KeplerOrbit::get_min_delta_v_at_true_anomaly],
    ///   or is so close to it that the eccentricity rounds to 1.
    ///
    /// # Example
    /// ```
    /// use apsis_separation::{KeplerOrbit, OrbitError};
    ///
    /// let mut orbit = KeplerOrbit::new(10_000.0, 0.1, 4902.8).unwrap();
    ///
    /// // Raise the apoapsis with a burn at periapsis
    /// let burn_anomaly = orbit.apply_delta_v(0.125, 0.0).unwrap();
    ///
    /// assert_eq!(burn_anomaly, 0.0);
    /// assert!(orbit.get_semi_major_axis() > 10_000.0);
    /// assert!((orbit.get_periapsis() - 9_000.0).abs() < 1e-6);
    ///
    /// // Burns away from the apsides are rejected
    /// assert!(matches!(
    ///     orbit.apply_delta_v(0.125, 1.0),
    ///     Err(OrbitError::BurnNotAtApsis { .. }),
    /// ));
    /// ```
    pub fn apply_delta_v(&mut self, delta_v: f64, true_anomaly: f64) -> Result<f64, OrbitError> {
        let apsis = Apsis::from_true_anomaly(true_anomaly)?;

        let max_delta_v = self.get_max_delta_v_at_true_anomaly(true_anomaly);
        let min_delta_v = self.get_min_delta_v_at_true_anomaly(true_anomaly);

        if !(delta_v < max_delta_v) {
            return Err(OrbitError::EscapeDeltaV {
                delta_v,
                max_delta_v,
            });
        }
        if !(delta_v > min_delta_v) {
            return Err(OrbitError::NonPositiveSpeed {
                delta_v,
                min_delta_v,
            });
        }

        let radius = self.get_radius_at_true_anomaly(true_anomaly);
        let speed = self.get_speed_at_true_anomaly(true_anomaly) + delta_v;
        let speed_sq = speed * speed;

        let semi_major_axis = (2.0 / radius - speed_sq / self.mu).recip();

        let angular_momentum = radius * speed;
        let eccentricity = (1.0 - angular_momentum * angular_momentum / (semi_major_axis * self.mu))
            .max(0.0)
            .sqrt();

        let faster_than_circular = speed_sq * radius >= self.mu;

        if Self::validate_elements(semi_major_axis, eccentricity).is_err() {
            // Only reachable within round-off of one of the bounds
            return Err(if faster_than_circular {
                OrbitError::EscapeDeltaV {
                    delta_v,
                    max_delta_v,
                }
            } else {
                OrbitError::NonPositiveSpeed {
                    delta_v,
                    min_delta_v,
                }
            });
        }

        let new_apsis = if faster_than_circular {
            Apsis::Periapsis
        } else {
            Apsis::Apoapsis
        };

        let arg_pe =
            (self.arg_pe + apsis.true_anomaly() - new_apsis.true_anomaly()).rem_euclid(TAU);

        self.set_elements(semi_major_axis, eccentricity, arg_pe);

        Ok(new_apsis.true_anomaly())
    }
}
