#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A struct representing the celestial body at the focus of an orbit.
///
/// Orbits only need the gravitational parameter; the radius is used to turn
/// altitudes above the surface into orbital radii.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CentralBody {
    /// The name of the celestial body.
    pub name: String,

    /// The mean radius of the celestial body, in kilometers.
    pub radius: f64,

    /// The gravitational parameter of the celestial body, in km^3 s^-2.
    ///
    /// In other words, mu = GM.
    pub mu: f64,
}

impl CentralBody {
    /// Creates a new `CentralBody` instance.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the celestial body.
    /// * `radius` - The mean radius of the celestial body, in kilometers.
    /// * `mu` - The gravitational parameter of the celestial body, in km^3 s^-2.
    pub fn new(name: String, radius: f64, mu: f64) -> Self {
        Self { name, radius, mu }
    }

    /// Converts an altitude above the surface into a distance from the
    /// center of the body, in kilometers.
    pub fn radius_at_altitude(&self, altitude: f64) -> f64 {
        self.radius + altitude
    }
}
