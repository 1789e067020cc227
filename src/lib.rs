//! Boolean set operations over closed polyhedral solids.
//!
//! A [`Solid`](solid::Solid) is a collection of coplanar convex polygons
//! bounding a closed volume. Union, difference and intersection are
//! computed by clipping BSP trees against each other. The raw fragments are
//! then merged back into larger convex polygons
//! ([`Solid::retesselated`](solid::Solid::retesselated)) and near-duplicate
//! vertices and planes are collapsed onto single representatives
//! ([`Solid::canonicalized`](solid::Solid::canonicalized)).

#![forbid(unsafe_code)]

pub mod errors;
pub mod float_types;
pub mod properties;
pub mod solid;
pub mod traits;

#[cfg(any(
    all(feature = "f64", feature = "f32"),
    not(any(feature = "f64", feature = "f32"))
))]
compile_error!("Either 'f64' or 'f32' feature must be specified, but not both");
