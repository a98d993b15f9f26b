//! Local notification content and delivery.
//!
//! # Responsibility
//! - Build notification copy for a memory.
//! - Send it through the OS channel without ever raising.

pub mod content;
pub mod dispatcher;
