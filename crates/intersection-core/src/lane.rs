use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Lane
// ---------------------------------------------------------------------------

/// One of the four fixed approaches into the intersection.
///
/// Declaration order doubles as the tie-break priority: when two lanes are
/// assigned the same duration, the one that sorts first is activated first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    North,
    East,
    South,
    West,
}

impl Lane {
    pub const COUNT: usize = 4;

    pub fn all() -> &'static [Lane; Lane::COUNT] {
        &[Lane::North, Lane::East, Lane::South, Lane::West]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Lane::North => "North",
            Lane::East => "East",
            Lane::South => "South",
            Lane::West => "West",
        }
    }

    /// Filename the density service expects for this lane's image; the
    /// service keys lanes off the prefix before the first underscore.
    pub fn upload_filename(self) -> String {
        format!("{}_image.jpg", self.as_str())
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Lane {
    type Err = crate::error::IntersectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "North" | "north" => Ok(Lane::North),
            "East" | "east" => Ok(Lane::East),
            "South" | "south" => Ok(Lane::South),
            "West" | "west" => Ok(Lane::West),
            _ => Err(crate::error::IntersectionError::InvalidLane(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
