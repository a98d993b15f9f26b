//! Memory domain model.
//!
//! # Responsibility
//! - Define the note-anchored-to-a-place record persisted under `memories`.
//! - Validate text and coordinates before any write path accepts a record.
//!
//! # Invariants
//! - `id` is stable and never reused; UUID v7 keeps ids sortable by creation.
//! - `text` is non-empty after trim.
//! - Position is immutable after creation; only `is_important` may change.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a memory and, 1:1, for its geofence region.
pub type MemoryId = Uuid;

/// A user-authored note anchored to a WGS84 position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    pub id: MemoryId,
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Display-formatted creation timestamp. Informational only.
    #[serde(rename = "date")]
    pub created_at: String,
    #[serde(default)]
    pub is_important: bool,
    /// Presentation only.
    #[serde(default)]
    pub color: Option<String>,
    /// Presentation only, in degrees.
    #[serde(default)]
    pub rotation: Option<f64>,
}

impl Memory {
    /// Creates a memory with a freshly generated time-ordered id.
    pub fn new(
        text: impl Into<String>,
        latitude: f64,
        longitude: f64,
        created_at: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::now_v7(), text, latitude, longitude, created_at)
    }

    /// Creates a memory with a caller-provided id (import/restore paths).
    pub fn with_id(
        id: MemoryId,
        text: impl Into<String>,
        latitude: f64,
        longitude: f64,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            id,
            text: text.into(),
            latitude,
            longitude,
            created_at: created_at.into(),
            is_important: false,
            color: None,
            rotation: None,
        }
    }

    /// Builder-style importance flag.
    pub fn important(mut self, is_important: bool) -> Self {
        self.is_important = is_important;
        self
    }

    /// Checks text and coordinate ranges.
    pub fn validate(&self) -> Result<(), MemoryValidationError> {
        if self.text.trim().is_empty() {
            return Err(MemoryValidationError::EmptyText);
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(MemoryValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(MemoryValidationError::LongitudeOutOfRange(self.longitude));
        }
        Ok(())
    }
}

/// Rejected memory shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum MemoryValidationError {
    EmptyText,
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
}

impl Display for MemoryValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "memory text must not be blank"),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
        }
    }
}

impl Error for MemoryValidationError {}
