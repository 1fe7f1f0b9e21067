//! # Constants and type definitions for skysim
//!
//! Centralizes the unit conversions, photometric constants and common type
//! aliases used throughout the catalog subsystem.

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → degrees
pub const ARCSEC_TO_DEG: f64 = 1.0 / 3600.0;

/// Full sky area in square degrees (4π sr)
pub const FULL_SKY_SQDEG: f64 = 4.0 * std::f64::consts::PI / (RADEG * RADEG);

// -------------------------------------------------------------------------------------------------
// Matching and photometry
// -------------------------------------------------------------------------------------------------

/// Default sphere-matching radius for injected-vs-recovered pairs, in degrees
/// (1.5 arcsec).
pub const DEFAULT_MATCH_RADIUS_DEG: f64 = 1.5 * ARCSEC_TO_DEG;

/// Magnitude zero point of the survey flux convention (nanomaggies).
pub const MAG_ZEROPOINT: f64 = 22.5;

/// Floor applied to fluxes before taking a logarithm, so that zero or
/// negative fluxes map to a finite (very faint) magnitude.
pub const FLUX_FLOOR: f64 = 1e-16;

// -------------------------------------------------------------------------------------------------
// Brick geometry
// -------------------------------------------------------------------------------------------------

/// Side of a brick in degrees, the tile size of the survey footprint.
pub const BRICK_SIZE_DEG: f64 = 0.25;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;

/// Square degrees
pub type SqDegree = f64;
