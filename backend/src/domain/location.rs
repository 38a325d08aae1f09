//! Location data model.
//!
//! A location is a capturable point with a difficulty tier. The numeric
//! value of the tier *is* the point score awarded for capturing it.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::hexpansion::HexpansionId;

/// Difficulty tier of a location.
///
/// The discriminant is the point score; ordering follows the score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[repr(i32)]
pub enum LocationDifficulty {
    /// 10 points.
    Easy = 10,
    /// 15 points.
    Medium = 15,
    /// 20 points.
    Hard = 20,
    /// 30 points.
    Insane = 30,
    /// 50 points.
    Impossible = 50,
}

impl LocationDifficulty {
    /// The points awarded for capturing a location of this difficulty.
    pub const fn points(self) -> i32 {
        self as i32
    }

    /// Human-readable label, as shown to players.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Insane => "Insane",
            Self::Impossible => "Impossible",
        }
    }

    /// Recover a difficulty from its stored point value.
    pub const fn from_points(value: i32) -> Option<Self> {
        match value {
            10 => Some(Self::Easy),
            15 => Some(Self::Medium),
            20 => Some(Self::Hard),
            30 => Some(Self::Insane),
            50 => Some(Self::Impossible),
            _ => None,
        }
    }
}

impl fmt::Display for LocationDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stable location identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationId(Uuid);

impl LocationId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A capturable installation.
///
/// A location without an installed hexpansion cannot be captured; resolution
/// happens the other way round (hexpansion serial to location), so the link
/// is represented here for completeness and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Stable identifier.
    pub id: LocationId,
    /// Name shown to players who have captured the location.
    pub display_name: String,
    /// Difficulty tier; doubles as the capture score.
    pub difficulty: LocationDifficulty,
    /// Installed hexpansion, if any.
    pub hexpansion_id: Option<HexpansionId>,
}
