//! Flutter-facing bindings for the NearNote engine.

pub mod api;
mod host;
