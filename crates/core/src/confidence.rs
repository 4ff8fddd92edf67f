use serde::{Deserialize, Serialize};
use std::fmt;

/// How certain an automated annotation is.
///
/// The scale is ordered from `Null` (no confidence, never acted on) up to
/// `Full` (safe to act on without review). Adjustments saturate at both
/// ends, so a long chain of penalties can never wrap around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    Null,
    Low,
    Medium,
    High,
    Full,
}

impl ConfidenceLevel {
    pub fn increase(self, amount: u8) -> Self {
        Self::from_index(self.index().saturating_add(amount))
    }

    pub fn decrease(self, amount: u8) -> Self {
        Self::from_index(self.index().saturating_sub(amount))
    }

    fn index(self) -> u8 {
        match self {
            ConfidenceLevel::Null => 0,
            ConfidenceLevel::Low => 1,
            ConfidenceLevel::Medium => 2,
            ConfidenceLevel::High => 3,
            ConfidenceLevel::Full => 4,
        }
    }

    fn from_index(i: u8) -> Self {
        match i {
            0 => ConfidenceLevel::Null,
            1 => ConfidenceLevel::Low,
            2 => ConfidenceLevel::Medium,
            3 => ConfidenceLevel::High,
            _ => ConfidenceLevel::Full,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceLevel::Null => "null",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Full => "full",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the strongest candidate from a scored list.
///
/// A candidate wins only by strictly exceeding the running maximum, which
/// starts at `Null`: `Null` candidates are never selected, and ties keep
/// the earliest entry. Returns `None` when nothing beats `Null`.
pub fn best_candidate<T: Clone>(candidates: &[(T, ConfidenceLevel)]) -> Option<(T, ConfidenceLevel)> {
    let mut top = ConfidenceLevel::Null;
    let mut best = None;
    for candidate in candidates {
        if candidate.1 > top {
            top = candidate.1;
            best = Some(candidate);
        }
    }
    best.cloned()
}
