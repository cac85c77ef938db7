//! The closed set of reaction kinds supported by the platform.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A reaction a user can leave on an invitation or its media.
///
/// The set is closed — the backend rejects anything else, and the feed UI
/// renders exactly these four buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Cheer,
    Groove,
    Chill,
    Hype,
}

impl ReactionKind {
    /// All kinds, in the order the feed displays them.
    pub const ALL: [ReactionKind; 4] = [
        ReactionKind::Cheer,
        ReactionKind::Groove,
        ReactionKind::Chill,
        ReactionKind::Hype,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Cheer => "cheer",
            ReactionKind::Groove => "groove",
            ReactionKind::Chill => "chill",
            ReactionKind::Hype => "hype",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = UnknownReactionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cheer" => Ok(ReactionKind::Cheer),
            "groove" => Ok(ReactionKind::Groove),
            "chill" => Ok(ReactionKind::Chill),
            "hype" => Ok(ReactionKind::Hype),
            other => Err(UnknownReactionKind(other.to_string())),
        }
    }
}

/// Error returned when parsing a reaction kind outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownReactionKind(pub String);

impl fmt::Display for UnknownReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown reaction kind: {}", self.0)
    }
}

impl std::error::Error for UnknownReactionKind {}
