use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TriageError;

/// Queue priority of a post. `P1` is the most urgent, `P5` the least.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    P1,
    P2,
    #[default]
    P3,
    P4,
    P5,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::P1,
        Priority::P2,
        Priority::P3,
        Priority::P4,
        Priority::P5,
    ];

    /// Numeric level, 1 (most urgent) through 5.
    pub fn level(self) -> u8 {
        match self {
            Priority::P1 => 1,
            Priority::P2 => 2,
            Priority::P3 => 3,
            Priority::P4 => 4,
            Priority::P5 => 5,
        }
    }

    /// Bump one level towards `P1`. `P1` saturates.
    pub fn escalate(self) -> Self {
        match self {
            Priority::P1 | Priority::P2 => Priority::P1,
            Priority::P3 => Priority::P2,
            Priority::P4 => Priority::P3,
            Priority::P5 => Priority::P4,
        }
    }

    /// The more urgent of the two.
    pub fn highest(self, other: Self) -> Self {
        if other.level() < self.level() {
            other
        } else {
            self
        }
    }
}

/// Ordered by urgency: `P1 < P2 < ... < P5`, so sorting ascending puts the
/// most urgent posts first.
impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.level().cmp(&other.level())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.level())
    }
}

impl FromStr for Priority {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            "P5" => Ok(Priority::P5),
            _ => Err(TriageError::InvalidPriority(s.to_string())),
        }
    }
}

// ── Resolution policy ─────────────────────────────────────────

/// How the ingestion path turns rule matches into a single priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionPolicy {
    /// The first matching rule in position order decides.
    #[default]
    FirstMatch,
    /// Every match contributes: highest `set-priority` wins, each `escalate`
    /// bumps one level.
    Accumulate,
}

impl fmt::Display for ResolutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionPolicy::FirstMatch => write!(f, "first-match"),
            ResolutionPolicy::Accumulate => write!(f, "accumulate"),
        }
    }
}

impl FromStr for ResolutionPolicy {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "first-match" => Ok(ResolutionPolicy::FirstMatch),
            "accumulate" => Ok(ResolutionPolicy::Accumulate),
            _ => Err(TriageError::InvalidPolicy(s.to_string())),
        }
    }
}
