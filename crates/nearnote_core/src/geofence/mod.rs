//! Background geofencing: OS monitor contract, task registration, region
//! registry and the boundary-event handler.
//!
//! # Responsibility
//! - Keep the OS-monitored region set equal to the regions derived from the
//!   memory store, always by whole-set replacement.
//! - Turn Enter events into at-most-once notifications per memory.
//!
//! # Invariants
//! - The event handler is defined with the task host before any registry can
//!   exist (`TaskRegistration` is the proof).
//! - No operation in this module propagates an error to its caller.

pub mod handler;
pub mod monitor;
pub mod registry;
pub mod task;
