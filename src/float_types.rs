// Re-export parry for the appropriate float size
#[cfg(feature = "f64")]
pub use parry3d_f64 as parry3d;

#[cfg(feature = "f32")]
pub use parry3d;

// Our Real scalar type:
#[cfg(feature = "f32")]
pub type Real = f32;
#[cfg(feature = "f64")]
pub type Real = f64;

/// Distance tolerance governing all near-zero tests: polygon/plane
/// classification, positional dedup and the fuzzy quantization quantum
/// (1/EPSILON is used as the multiplier).
pub const EPSILON: Real = 1e-5;

/// Squared variant of [`EPSILON`] for distance-squared comparisons.
pub const EPSILON_SQUARED: Real = EPSILON * EPSILON;

/// Angular tolerance in degrees.
pub const ANGLE_EPSILON: Real = 0.1;

/// Cross products with a squared norm below this do not define a direction.
pub const AREA_EPSILON: Real = 4.99e-12;

// Pi
/// Archimedes' constant (π)
#[cfg(feature = "f32")]
pub const PI: Real = core::f32::consts::PI;
/// Archimedes' constant (π)
#[cfg(feature = "f64")]
pub const PI: Real = core::f64::consts::PI;

// Tau
/// The full circle constant (τ)
#[cfg(feature = "f32")]
pub const TAU: Real = core::f32::consts::TAU;
/// The full circle constant (τ)
#[cfg(feature = "f64")]
pub const TAU: Real = core::f64::consts::TAU;
