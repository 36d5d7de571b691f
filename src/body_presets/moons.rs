//! This module contains presets for natural satellites.
//!
//! "A natural satellite is, in the most common usage, an astronomical body
//! that orbits a planet, dwarf planet, or small Solar System body."  
//!
//! \- [Wikipedia](https://en.wikipedia.org/wiki/Natural_satellite)

use crate::CentralBody;

/// Returns the Moon.
///
/// Mean radius 1737.4 km, gravitational parameter 4902.8 km^3 s^-2.
pub fn the_moon() -> CentralBody {
    CentralBody::new("The Moon".to_string(), 1737.4, 4902.8)
}
