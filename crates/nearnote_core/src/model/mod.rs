//! Domain model for geo-anchored memories and their derived regions.
//!
//! # Responsibility
//! - Define the persisted `Memory` record and its validation rules.
//! - Define the derived `GeofenceRegion` and the inbound region events.
//!
//! # Invariants
//! - Every memory is identified by a stable, time-ordered `MemoryId`.
//! - A region is never authored directly; it is always derived from a memory.

pub mod memory;
pub mod region;
