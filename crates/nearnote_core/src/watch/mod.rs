//! Foreground proximity evaluation.

pub mod proximity;
