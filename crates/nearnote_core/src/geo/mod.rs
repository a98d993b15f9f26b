//! Geodesic helpers.

pub mod distance;
