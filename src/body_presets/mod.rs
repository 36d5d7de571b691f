//! This module contains presets for central bodies.
//!
//! Constants are mean radii and gravitational parameters in kilometers
//! and seconds, matching the rest of the crate.

pub mod moons;
